//! Wires the loaded configuration into the hub services.

use std::sync::Arc;

use anyhow::{Context, Result};

use linkbot_core::config::{load_config, Config};
use linkbot_core::store::{FileStore, RecordStore};
use linkbot_core::types::Account;
use linkbot_hub::{
    AccountService, BindingStore, BotDirectory, DeliveryEngine, JwtIdentity, WebhookDispatcher,
};
use linkbot_line::HttpPushClient;

use crate::helpers::expand_tilde;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<FileStore>,
}

impl AppContext {
    /// Load config and open the record store it points at.
    pub async fn load() -> Result<Self> {
        let config = load_config(None);
        let path = expand_tilde(&config.store.path);
        let store = FileStore::open(&path)
            .await
            .with_context(|| format!("failed to open store at {}", path.display()))?;

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    fn identity(&self) -> Result<Arc<JwtIdentity>> {
        let identity = JwtIdentity::new(&self.config.auth)
            .context("set auth.jwtSecret in config.json or LINKBOT_AUTH__JWT_SECRET")?;
        Ok(Arc::new(identity))
    }

    fn push(&self) -> Result<Arc<HttpPushClient>> {
        let client = HttpPushClient::new(&self.config.line).context("failed to build push client")?;
        Ok(Arc::new(client))
    }

    pub fn accounts(&self) -> Result<AccountService> {
        Ok(AccountService::new(self.store(), self.identity()?))
    }

    pub fn bots(&self) -> BotDirectory {
        BotDirectory::new(self.store())
    }

    pub fn bindings(&self) -> BindingStore {
        BindingStore::new(self.store())
    }

    pub fn delivery(&self) -> Result<DeliveryEngine> {
        Ok(DeliveryEngine::new(self.store(), self.push()?))
    }

    pub fn dispatcher(&self) -> Result<WebhookDispatcher> {
        Ok(WebhookDispatcher::new(
            self.store(),
            self.identity()?,
            self.push()?,
            &self.config.line,
        ))
    }

    /// Resolve a session token to its account.
    pub async fn authenticate(&self, token: &str) -> Result<Account> {
        self.accounts()?
            .authenticate(token)
            .await
            .context("not signed in: run `linkbot account login` and pass --token")
    }

    /// Resolve a session token to an admin account.
    pub async fn authenticate_admin(&self, token: &str) -> Result<Account> {
        let account = self.authenticate(token).await?;
        self.accounts()?
            .require_admin(&account.id)
            .await
            .context("this command requires an admin account")
    }
}
