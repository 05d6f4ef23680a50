//! Demo binary: wires every top-level kind's store to its handler through a
//! `WorkQueue`, the way the teacher's `run_operator` wires `Controller::new`
//! to a single reconcile function -- generalized here because this engine
//! reconciles many kinds side by side rather than one root CRD with owned
//! children.

use std::sync::Arc;

use tracing::info;

use rover_engine::config::Config;
use rover_engine::gateway_admin::MemoryGatewayAdminClient;
use rover_engine::handlers::api::ApiHandler;
use rover_engine::handlers::api_exposure::ApiExposureHandler;
use rover_engine::handlers::api_specification::ApiSpecificationHandler;
use rover_engine::handlers::api_subscription::ApiSubscriptionHandler;
use rover_engine::handlers::application::ApplicationHandler;
use rover_engine::handlers::approval_request::ApprovalRequestHandler;
use rover_engine::handlers::environment::EnvironmentHandler;
use rover_engine::handlers::notification::NotificationHandler;
use rover_engine::handlers::remote_api_subscription::RemoteApiSubscriptionHandler;
use rover_engine::handlers::rover::RoverHandler;
use rover_engine::handlers::team::TeamHandler;
use rover_engine::handlers::zone::ZoneHandler;
use rover_engine::identity_admin::MemoryIdentityAdminClient;
use rover_engine::model::meta::ObjectRef;
use rover_engine::notifications::LoggingChannelDelivery;
use rover_engine::runtime::context::EngineContext;
use rover_engine::runtime::{spawn_worker_pool, Handler, WorkQueue};
use rover_engine::secrets::MemorySecretStore;
use rover_engine::store::{HasMeta, ObjectStore, WatchEvent};
use rover_engine::sync::MemorySyncerClient;

/// Subscribes to `store`'s watch stream, seeds the queue with whatever
/// already exists, and spawns `concurrency` workers running `handler`
/// against `ctx`. Returns the join handles so the caller can let them run
/// for the life of the process.
fn run_kind<R, H>(
    store: &dyn ObjectStore<R>,
    kind: &'static str,
    handler: H,
    ctx: Arc<EngineContext>,
    concurrency: usize,
) -> Vec<tokio::task::JoinHandle<()>>
where
    R: Clone + HasMeta + Send + Sync + 'static,
    H: Handler<R, EngineContext> + 'static,
{
    let queue: Arc<WorkQueue<R>> = WorkQueue::new();
    let mut handles = spawn_worker_pool(queue.clone(), Arc::new(handler), ctx, concurrency);

    let mut events = store.watch();
    let feeder_queue = queue.clone();
    handles.push(tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let WatchEvent::Applied(obj) = event {
                let (ns, name) = obj.meta().key();
                feeder_queue.enqueue(ObjectRef::new(kind, ns, name), obj);
            }
        }
    }));
    handles
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env("ROVER");
    let filter = format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), config.log.level);
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let environment = std::env::var("ROVER_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
    info!(%environment, "starting reconciler engine");

    let ctx = Arc::new(EngineContext::new(
        environment,
        Arc::new(MemorySecretStore::new()),
        Arc::new(MemoryGatewayAdminClient::default()),
        Arc::new(MemoryIdentityAdminClient::default()),
        Arc::new(MemorySyncerClient::default()),
        Arc::new(LoggingChannelDelivery),
    ));

    let concurrency = config.reconciler.max_concurrent_reconciles;
    let mut handles = Vec::new();
    handles.extend(run_kind(&ctx.environments, "Environment", EnvironmentHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.teams, "Team", TeamHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.zones, "Zone", ZoneHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.applications, "Application", ApplicationHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.api_specifications, "ApiSpecification", ApiSpecificationHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.apis, "Api", ApiHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.api_exposures, "ApiExposure", ApiExposureHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.api_subscriptions, "ApiSubscription", ApiSubscriptionHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.approval_requests, "ApprovalRequest", ApprovalRequestHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.notifications, "Notification", NotificationHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.remote_api_subscriptions, "RemoteApiSubscription", RemoteApiSubscriptionHandler, ctx.clone(), concurrency));
    handles.extend(run_kind(&ctx.rovers, "Rover", RoverHandler, ctx.clone(), concurrency));

    info!(workers = handles.len(), "engine running; create objects through the store to drive reconciliation");
    futures_util::future::join_all(handles).await;
    Ok(())
}
