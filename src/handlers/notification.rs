//! `Notification` handler: delivers to each configured channel and tracks
//! per-channel send state (§4.8).

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{Error, Result};
use crate::model::kinds::notification::{ChannelState, Notification};
use crate::model::meta::{Condition, ConditionStatus, COND_PROCESSING, COND_READY};
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct NotificationHandler;

#[async_trait]
impl Handler<Notification, EngineContext> for NotificationHandler {
    async fn reconcile(&self, mut obj: Notification, ctx: Arc<EngineContext>) -> Result<Action> {
        let gen = obj.metadata.generation;

        for channel_ref in obj.spec.channels.clone() {
            let already_sent = obj.status.states.get(&channel_ref.name).map(|s| s.sent).unwrap_or(false);
            if already_sent {
                continue;
            }
            let state = match ctx.notification_channels.get(&channel_ref.namespace, &channel_ref.name).await {
                Some(channel) => match ctx.delivery.deliver(&channel, &obj).await {
                    Ok(()) => ChannelState { timestamp: now(), sent: true, error_message: None },
                    Err(e) => ChannelState { timestamp: now(), sent: false, error_message: Some(e.to_string()) },
                },
                None => ChannelState { timestamp: now(), sent: false, error_message: Some("channel not found".to_string()) },
            };
            obj.status.states.insert(channel_ref.name.clone(), state);
        }

        let all_sent = !obj.spec.channels.is_empty() && obj.spec.channels.iter().all(|c| obj.status.states.get(&c.name).map(|s| s.sent).unwrap_or(false));
        if all_sent {
            obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Delivered", "", gen, now()));
            obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));
        } else {
            obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "Delivering", "", gen, now()));
            obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::True, "Delivering", "", gen, now()));
        }

        ctx.notifications.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        if all_sent {
            Ok(Action::AwaitChange)
        } else {
            Ok(Action::requeue_after_secs(5))
        }
    }
}
