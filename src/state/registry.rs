use crate::config::Config;
use crate::db::Db;
use crate::db::repo::{AppConfigRepo, AppConfigRepository, RequisitionRepo, RequisitionRepository};
use crate::db::repo::{SessionRepo, SessionRepository, TokenRepository};
use crate::error::{AppResult, InfraError};
use crate::esi::{EsiClient, SsoTokenExchange};
use crate::inventory::{
    RefreshEngine, RefreshHandle, RefreshScheduler, ReferenceCache, RetryPolicy, SnapshotStore, TokenProvider,
};
use crate::services::{AppConfigService, BlueprintService, RequisitionService};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Repos {
    pub requisition: Arc<dyn RequisitionRepo>,
    pub app_config: Arc<dyn AppConfigRepo>,
    pub session: Arc<dyn SessionRepo>,
}

pub struct Services {
    pub blueprint: Arc<BlueprintService>,
    pub requisition: Arc<RequisitionService>,
    pub app_config: Arc<AppConfigService>,
}

pub struct Registry {
    pub db: Arc<Db>,
    pub config: Arc<Config>,
    pub repos: Arc<Repos>,
    pub services: Arc<Services>,
    pub tokens: Arc<TokenProvider>,
    pub cache: Arc<ReferenceCache>,
    pub store: Arc<SnapshotStore>,
    pub refresh: RefreshHandle,
    scheduler: Mutex<Option<RefreshScheduler>>,
}

impl Registry {
    pub fn new(db: Arc<Db>, config: Arc<Config>, shutdown: CancellationToken) -> AppResult<Self> {
        let repos = Arc::new(Repos {
            requisition: Arc::new(RequisitionRepository::new(db.clone())),
            app_config: Arc::new(AppConfigRepository::new(db.clone())),
            session: Arc::new(SessionRepository::new(db.clone())),
        });

        let api = EsiClient::new(&config.esi_base_url, &config.user_agent, config.request_timeout())
            .map_err(|e| InfraError::Net(e.to_string()))?;
        let exchange = SsoTokenExchange::new(
            &config.sso_token_url,
            &config.esi_app_id,
            &config.esi_app_secret,
            &config.user_agent,
            config.request_timeout(),
        )
        .map_err(|e| InfraError::Net(e.to_string()))?;

        let tokens = Arc::new(TokenProvider::new(
            Arc::new(TokenRepository::new(db.clone())),
            Arc::new(exchange),
            config.admin_identity(),
        ));

        let cache = Arc::new(ReferenceCache::new());
        let store = Arc::new(SnapshotStore::new());
        let engine = Arc::new(RefreshEngine::new(
            Arc::new(api),
            cache.clone(),
            store.clone(),
            RetryPolicy::default(),
        ));

        let (scheduler, refresh) = RefreshScheduler::new(engine, tokens.clone(), config.scheduler(), shutdown);

        let services = Arc::new(Services {
            blueprint: Arc::new(BlueprintService::new(store.clone())),
            requisition: Arc::new(RequisitionService::new(repos.requisition.clone(), cache.clone())),
            app_config: Arc::new(AppConfigService::new(
                repos.app_config.clone(),
                tokens.clone(),
                refresh.clone(),
            )),
        });

        Ok(Self {
            db,
            config,
            repos,
            services,
            tokens,
            cache,
            store,
            refresh,
            scheduler: Mutex::new(Some(scheduler)),
        })
    }

    /// Hands out the refresh scheduler so it can be spawned. Only the first caller gets it.
    pub fn take_scheduler(&self) -> Option<RefreshScheduler> {
        self.scheduler.lock().take()
    }
}
