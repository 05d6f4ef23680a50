//! `Api` handler: confirms readiness for the environment-wide basePath
//! singleton its owning `ApiSpecification` materializes (§3).

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{Error, Result};
use crate::model::kinds::api::Api;
use crate::model::meta::{Condition, ConditionStatus, COND_PROCESSING, COND_READY};
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct ApiHandler;

#[async_trait]
impl Handler<Api, EngineContext> for ApiHandler {
    async fn reconcile(&self, mut obj: Api, ctx: Arc<EngineContext>) -> Result<Action> {
        let before = obj.status.conditions.clone();
        let generation = obj.metadata.generation;
        obj.status.active = true;
        obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", generation, now()));
        obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", generation, now()));

        if obj.status.conditions != before {
            ctx.apis.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        }
        Ok(Action::AwaitChange)
    }
}
