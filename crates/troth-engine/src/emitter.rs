//! Notification Emitter — translates lifecycle transitions into fan-out
//! deliveries for both participants.
//!
//! Delivery is strictly fire-and-forget: a failing or slow channel must
//! never fail or roll back the lifecycle operation that produced the
//! event. Failures are logged and dropped.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use troth_core::{
  notify::{Fanout, MatchEvent, MatchEventKind, MatchProjection},
  record::MatchRecord,
};

pub struct NotificationEmitter<F> {
  fanout:        Arc<F>,
  /// How long to wait before retracting a removed match's fan-out entries,
  /// so both clients can receive the terminal event first.
  retract_grace: Duration,
}

impl<F: Fanout + 'static> NotificationEmitter<F> {
  pub fn new(fanout: Arc<F>, retract_grace: Duration) -> Self {
    Self { fanout, retract_grace }
  }

  /// Deliver `kind` for `record` to both participants, then schedule
  /// retraction if the record went terminal.
  pub async fn emit(&self, record: &MatchRecord, kind: MatchEventKind) {
    let event = MatchEvent {
      kind,
      occurred_at: Utc::now(),
      projection: MatchProjection::of(record),
    };

    for user_id in [record.user1_id, record.user2_id] {
      if let Err(e) = self.fanout.deliver(user_id, &event).await {
        tracing::warn!(
          %user_id,
          match_id = %record.match_id,
          error = %e,
          "fan-out delivery failed"
        );
      }
    }

    if kind == MatchEventKind::MatchRemoved {
      self.schedule_retraction(record);
    }
  }

  fn schedule_retraction(&self, record: &MatchRecord) {
    let fanout = Arc::clone(&self.fanout);
    let grace = self.retract_grace;
    let match_id = record.match_id;
    let users = [record.user1_id, record.user2_id];

    tokio::spawn(async move {
      tokio::time::sleep(grace).await;
      for user_id in users {
        if let Err(e) = fanout.retract(user_id, match_id).await {
          tracing::warn!(
            %user_id,
            %match_id,
            error = %e,
            "fan-out retraction failed"
          );
        }
      }
    });
  }
}
