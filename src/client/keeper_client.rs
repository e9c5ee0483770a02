use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_fake::FakeKeeperApi;
use crate::infra_http::ReqwestTransport;
use crate::infra_storage::*;
use crate::routing::{RouteGuard, RouteTable, Router};
use crate::session::{AuthenticatedClient, RefreshCoordinator, TokenValidator};
use crate::settings::Settings;
use crate::store::*;
use anyhow::anyhow;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEFAULT_FILE_STORE: &str = "keeper-credentials.json";

/// Every long-lived object of the client, built once and shared.
pub struct KeeperClient {
    pub http: Arc<AuthenticatedClient>,
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub bucket_service: Arc<dyn BucketService>,
    pub bucket_item_service: Arc<dyn BucketItemService>,
    pub api_key_service: Arc<dyn ApiKeyService>,
    pub public_service: Arc<dyn PublicService>,
    pub router: Arc<Router>,
    pub users: UserStore,
    pub buckets: BucketStore,
    pub items: BucketItemStore,
    pub api_keys: ApiKeyStore,
}

impl KeeperClient {
    pub fn try_new(settings: &Settings, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let transport: Arc<dyn HttpTransport> = match settings.api.backend.as_str() {
            "fake" => Arc::new(FakeKeeperApi::with_demo_user()),
            "real" => Arc::new(ReqwestTransport::try_new(
                &settings.api.base_url,
                settings.api.timeout(),
            )?),
            other => return Err(anyhow!("Unknown api backend: {}", other)),
        };

        let storage_path = || {
            settings
                .auth
                .storage_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_STORE))
        };
        let credentials: Arc<dyn CredentialStore> = match settings.auth.storage.as_str() {
            "memory" => Arc::new(MemoryCredentialStore::new()),
            "file" => Arc::new(FileCredentialStore::open(storage_path())),
            "cookie" => match &settings.auth.storage_path {
                Some(path) => Arc::new(CookieCredentialStore::persistent(
                    settings.auth.access_cookie_ttl(),
                    settings.auth.refresh_cookie_ttl(),
                    path.clone(),
                )),
                None => Arc::new(CookieCredentialStore::new(
                    settings.auth.access_cookie_ttl(),
                    settings.auth.refresh_cookie_ttl(),
                )),
            },
            other => return Err(anyhow!("Unknown credential storage: {}", other)),
        };

        info!(
            backend = %settings.api.backend,
            storage = %settings.auth.storage,
            "client configured"
        );

        Ok(Self::assemble(
            transport,
            credentials,
            notifier,
            TokenValidator::new(settings.auth.expiry_leeway()),
            RouteGuard::new(&settings.routes.login_path, &settings.routes.landing_path),
        ))
    }

    /// Wires the session core, services, router and stores around an
    /// existing transport and credential store.
    pub fn assemble(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        validator: TokenValidator,
        guard: RouteGuard,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(transport.clone(), credentials.clone(), validator);
        let http = Arc::new(AuthenticatedClient::new(
            transport,
            credentials.clone(),
            coordinator,
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(http.clone()));
        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(http.clone()));
        let bucket_service: Arc<dyn BucketService> = Arc::new(RealBucketService::new(http.clone()));
        let bucket_item_service: Arc<dyn BucketItemService> =
            Arc::new(RealBucketItemService::new(http.clone()));
        let api_key_service: Arc<dyn ApiKeyService> =
            Arc::new(RealApiKeyService::new(http.clone()));
        let public_service: Arc<dyn PublicService> = Arc::new(RealPublicService::new(http.clone()));

        let router = Arc::new(Router::new(
            RouteTable::default_routes(),
            guard.clone(),
            credentials,
            validator,
        ));
        let navigator: Arc<dyn Navigator> = router.clone();

        let users = UserStore::new(
            auth_service.clone(),
            user_service.clone(),
            notifier.clone(),
            navigator.clone(),
            guard.clone(),
        );
        let buckets = BucketStore::new(
            bucket_service.clone(),
            notifier.clone(),
            navigator,
            guard.landing_path,
        );
        let items = BucketItemStore::new(bucket_item_service.clone(), notifier.clone());
        let api_keys = ApiKeyStore::new(api_key_service.clone(), notifier);

        KeeperClient {
            http,
            auth_service,
            user_service,
            bucket_service,
            bucket_item_service,
            api_key_service,
            public_service,
            router,
            users,
            buckets,
            items,
            api_keys,
        }
    }
}
