//! Notification dispatch (§4.8): purpose-derived templating bound into a
//! `Notification`, delivered per channel with per-channel state tracking.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::approval_fsm::State;
use crate::errors::Result;
use crate::model::kinds::notification::{Notification, NotificationChannel, Purpose};

/// Why this notification is being (re)sent -- informs which purpose gets
/// bound, independent of the approval-specific policy below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Decider,
    Requester,
}

/// Approval-request notify policy (§4.8): always notify the decider on a
/// `spec.state ≠ status.last_state` transition; notify the requester only
/// when the new state is not `Pending`.
pub fn approval_notify_targets(previous_state: Option<State>, new_state: State) -> Vec<(Actor, Purpose)> {
    let purpose = if new_state == State::Pending {
        if previous_state.is_none() {
            Purpose::ApprovalRequestCreated
        } else {
            Purpose::ApprovalRequestPending
        }
    } else {
        Purpose::ApprovalRequestDecided
    };

    let mut targets = vec![(Actor::Decider, purpose)];
    if new_state != State::Pending {
        targets.push((Actor::Requester, purpose));
    }
    targets
}

/// Delivers a notification to one configured channel. Production transports
/// (SMTP, MS Teams webhook, generic webhook) implement this; the reference
/// implementations below back tests and embedders without a transport yet.
#[async_trait]
pub trait ChannelDelivery: Send + Sync {
    async fn deliver(&self, channel: &NotificationChannel, notification: &Notification) -> Result<()>;
}

/// Logs every delivery and always succeeds.
pub struct LoggingChannelDelivery;

#[async_trait]
impl ChannelDelivery for LoggingChannelDelivery {
    async fn deliver(&self, channel: &NotificationChannel, notification: &Notification) -> Result<()> {
        debug!(
            transport = ?channel.spec.transport,
            address = %channel.spec.address,
            purpose = ?notification.spec.purpose,
            "✅ delivered notification"
        );
        Ok(())
    }
}

/// Records every delivery attempt for assertions, always succeeding.
#[derive(Default)]
pub struct RecordingChannelDelivery {
    pub deliveries: std::sync::Mutex<Vec<(String, Purpose)>>,
}

#[async_trait]
impl ChannelDelivery for RecordingChannelDelivery {
    async fn deliver(&self, channel: &NotificationChannel, notification: &Notification) -> Result<()> {
        self.deliveries.lock().unwrap().push((channel.metadata.name.clone(), notification.spec.purpose));
        info!(channel = %channel.metadata.name, "✅ recorded notification delivery");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_notifies_only_decider() {
        let targets = approval_notify_targets(None, State::Pending);
        assert_eq!(targets, vec![(Actor::Decider, Purpose::ApprovalRequestCreated)]);
    }

    #[test]
    fn decision_notifies_both_with_decided_purpose() {
        let targets = approval_notify_targets(Some(State::Pending), State::Granted);
        assert_eq!(
            targets,
            vec![(Actor::Decider, Purpose::ApprovalRequestDecided), (Actor::Requester, Purpose::ApprovalRequestDecided)]
        );
    }

    #[test]
    fn semigranted_to_pending_like_transition_still_only_notifies_decider() {
        let targets = approval_notify_targets(Some(State::Suspended), State::Pending);
        assert_eq!(targets, vec![(Actor::Decider, Purpose::ApprovalRequestPending)]);
    }
}
