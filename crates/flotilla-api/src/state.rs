//! Application state.

use std::sync::Arc;

use flotilla_broadcast::ConnectionRegistry;
use flotilla_config::FlotillaConfig;
use flotilla_core::catalog::CatalogStore;
use flotilla_db::{
    PgCatalogStore, PgConnectionRepo, PgEventArchive, PgStatusRepo, PgWorkQueue, StatusStore,
};
use flotilla_events::{ContainerMonitor, EventRouter, RouteTable};
use sqlx::PgPool;

use crate::gateway::WsGateway;
use crate::services::JobService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: StatusStore,
    pub registry: ConnectionRegistry,
    pub gateway: WsGateway,
    pub jobs: Arc<JobService>,
    pub router: Arc<EventRouter>,
    pub monitor: Arc<ContainerMonitor>,
    pub catalog: Arc<dyn CatalogStore>,
    pub queue: Arc<PgWorkQueue>,
    pub archive: Arc<PgEventArchive>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &FlotillaConfig) -> Self {
        let store = StatusStore::new(Arc::new(PgStatusRepo::new(pool.clone())));
        let registry = ConnectionRegistry::new(
            Arc::new(PgConnectionRepo::new(pool.clone())),
            config.websocket.connection_ttl_secs,
        );
        let gateway = WsGateway::new();
        let queue = Arc::new(PgWorkQueue::new(pool.clone()));
        let archive = Arc::new(PgEventArchive::new(
            pool.clone(),
            config.events.retention_days,
        ));
        let router = Arc::new(EventRouter::new(
            archive.clone(),
            queue.clone(),
            RouteTable::from_config(&config.events),
        ));
        let monitor = Arc::new(ContainerMonitor::new(store.clone()));
        let jobs = Arc::new(JobService::new(
            store.clone(),
            router.clone(),
            config.events.source.clone(),
        ));
        let catalog: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(pool));

        Self {
            store,
            registry,
            gateway,
            jobs,
            router,
            monitor,
            catalog,
            queue,
            archive,
        }
    }
}
