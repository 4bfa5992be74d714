//! The fan-out boundary implementation shipped with the server.
//!
//! The real-time transport is an external collaborator; deployments wire
//! their own [`Fanout`] in front of it. This default implementation writes
//! every delivery and retraction to the log so the pipeline runs (and is
//! observable) without a transport attached.

use std::{convert::Infallible, future::Future};

use troth_core::notify::{Fanout, MatchEvent};
use uuid::Uuid;

pub struct TracingFanout;

impl Fanout for TracingFanout {
  type Error = Infallible;

  fn deliver<'a>(
    &'a self,
    user_id: Uuid,
    event: &'a MatchEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    async move {
      tracing::info!(
        %user_id,
        match_id = %event.projection.match_id,
        kind = ?event.kind,
        "fan-out delivery"
      );
      Ok(())
    }
  }

  fn retract(
    &self,
    user_id: Uuid,
    match_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    async move {
      tracing::info!(%user_id, %match_id, "fan-out retraction");
      Ok(())
    }
  }
}
