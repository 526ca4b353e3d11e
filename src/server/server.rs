use crate::api::v1::CookieConfig;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::logger::*;
use crate::settings::Settings;
use chrono::Duration;
use std::sync::Arc;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub catalog_service: Arc<dyn CatalogService>,
    pub cookie: CookieConfig,
}

impl Server {
    pub fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let key = std::env::var("JWT_SIGNING_KEY")
            .unwrap_or_else(|_| "my-dev-secret-key".to_string())
            .into_bytes();

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_ttl: Duration::seconds(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::seconds(settings.auth.refresh_ttl_secs),
            leeway_secs: settings.auth.leeway_secs,
            signing_key: key,
        }));
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

        let user_store: Arc<dyn UserStore> = match settings.store.backend.as_str() {
            "memory" => Arc::new(MemoryUserStore::new()),
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };
        let product_store: Arc<dyn ProductStore> = match settings.store.backend.as_str() {
            "memory" => Arc::new(MemoryProductStore::new()),
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let auth_service: Arc<dyn AuthService> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeAuthService::new()),
            "real" => Arc::new(RealAuthService::new(
                user_store,
                credential_hasher,
                token_codec,
                settings.auth.admin_emails.clone(),
            )),
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        let catalog_service: Arc<dyn CatalogService> =
            Arc::new(RealCatalogService::new(product_store));

        let cookie = CookieConfig {
            secure: settings.http.secure_cookies,
            max_age_secs: settings.auth.refresh_ttl_secs,
        };

        info!("server assembled");

        Ok(Self {
            auth_service,
            catalog_service,
            cookie,
        })
    }
}
