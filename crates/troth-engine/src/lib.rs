//! Orchestration for the troth matching pipeline.
//!
//! Three pieces sit between the pure core and the surfaces:
//!
//! - [`resolver::BatchResolver`] — the scheduled sweep that proposes,
//!   scores, reconciles, and persists new match records;
//! - [`service::MatchService`] — the online lifecycle engine, applying one
//!   pure transition per user action under optimistic concurrency;
//! - [`emitter::NotificationEmitter`] — fire-and-forget translation of
//!   transitions into fan-out deliveries.

pub mod emitter;
pub mod resolver;
pub mod service;

pub use emitter::NotificationEmitter;
pub use resolver::{BatchResolver, MatchRunSummary, ResolverConfig};
pub use service::MatchService;

#[cfg(test)]
mod tests;
