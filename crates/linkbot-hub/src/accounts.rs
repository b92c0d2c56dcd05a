//! Account registration, login and role management.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use linkbot_core::store::{collections, to_record, Document, Filter, RecordStore};
use linkbot_core::types::{Account, AccountSummary, Bot, Role};
use linkbot_core::{LinkbotError, Result};

use crate::identity::IdentityService;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord<'a> {
    email: &'a str,
    password_hash: String,
    role: Role,
}

/// Accounts over the record store, with tokens from an [`IdentityService`].
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityService>,
    hash_cost: u32,
}

impl AccountService {
    pub fn new(store: Arc<dyn RecordStore>, identity: Arc<dyn IdentityService>) -> Self {
        Self {
            store,
            identity,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt work factor.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Create a `user` account.
    pub async fn register(&self, email: &str, password: &str) -> Result<Account> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(LinkbotError::validation("email and password are required"));
        }
        if self.find_by_email(email).await?.is_some() {
            return Err(LinkbotError::Conflict(format!("email {email} is already registered")));
        }

        let password_hash = bcrypt::hash(password, self.hash_cost)
            .map_err(|e| LinkbotError::validation(format!("failed to hash password: {e}")))?;
        let record = to_record(&AccountRecord {
            email,
            password_hash,
            role: Role::User,
        })?;
        // Re-checked under the store lock; a concurrent register gets None.
        let id = self
            .store
            .insert_unique(collections::ACCOUNTS, &Filter::eq("email", email), record)
            .await?
            .ok_or_else(|| LinkbotError::Conflict(format!("email {email} is already registered")))?;

        info!(account_id = %id, email, "account registered");
        Ok(Account {
            id,
            email: email.to_string(),
            role: Role::User,
        })
    }

    /// Check credentials and issue a session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let email = email.trim();
        let doc = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| LinkbotError::NotFound(format!("account {email}")))?;

        let hash = doc
            .data
            .get("passwordHash")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        // A malformed stored hash is treated like a wrong password.
        let valid = bcrypt::verify(password, hash).unwrap_or(false);
        if !valid {
            warn!(email, "login rejected");
            return Err(LinkbotError::Forbidden("invalid credentials".into()));
        }

        let account = Account::from_document(&doc)?;
        self.identity.issue(&account.id, &account.email)
    }

    pub async fn me(&self, account_id: &str) -> Result<Account> {
        if account_id.is_empty() {
            return Err(LinkbotError::validation("account id is required"));
        }
        let doc = self
            .store
            .get(collections::ACCOUNTS, account_id)
            .await?
            .ok_or_else(|| LinkbotError::NotFound(format!("account {account_id}")))?;
        Ok(Account::from_document(&doc)?)
    }

    /// Verify `token` and load the account it names.
    pub async fn authenticate(&self, token: &str) -> Result<Account> {
        let claims = self.identity.verify(token)?;
        self.me(&claims.sub).await
    }

    pub async fn require_admin(&self, account_id: &str) -> Result<Account> {
        let account = self.me(account_id).await?;
        if !account.is_admin() {
            return Err(LinkbotError::Forbidden(format!(
                "account {account_id} is not an admin"
            )));
        }
        Ok(account)
    }

    /// Make `target_id` an admin. Only admins may promote.
    pub async fn promote(&self, actor_id: &str, target_id: &str) -> Result<Account> {
        self.require_admin(actor_id).await?;
        let mut target = self.me(target_id).await?;

        let mut partial = serde_json::Map::new();
        partial.insert("role".into(), json!(Role::Admin));
        self.store
            .update(collections::ACCOUNTS, target_id, partial)
            .await?;

        info!(actor_id, account_id = target_id, "account promoted to admin");
        target.role = Role::Admin;
        Ok(target)
    }

    /// Every account with its number of assigned bots.
    ///
    /// When `actor_id` is given it must name an admin.
    pub async fn list_with_bot_count(&self, actor_id: Option<&str>) -> Result<Vec<AccountSummary>> {
        if let Some(actor_id) = actor_id {
            self.require_admin(actor_id).await?;
        }

        let mut bot_counts: HashMap<String, usize> = HashMap::new();
        for doc in self.store.query(collections::BOTS, None, None).await? {
            let bot = Bot::from_document(&doc)?;
            if let Some(owner) = bot.assignee() {
                *bot_counts.entry(owner.to_string()).or_default() += 1;
            }
        }

        let docs = self.store.query(collections::ACCOUNTS, None, None).await?;
        docs.iter()
            .map(|doc| -> Result<AccountSummary> {
                let account = Account::from_document(doc)?;
                let bot_count = bot_counts.get(&account.id).copied().unwrap_or(0);
                Ok(AccountSummary {
                    id: account.id,
                    email: account.email,
                    role: account.role,
                    bot_count,
                    has_bot: bot_count > 0,
                })
            })
            .collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Document>> {
        let mut docs = self
            .store
            .query(collections::ACCOUNTS, Some(&Filter::eq("email", email)), Some(1))
            .await?;
        Ok(docs.pop())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::{BotDirectory, NewBot};
    use crate::identity::JwtIdentity;
    use crate::test_support::memory_store;
    use linkbot_core::config::AuthConfig;

    fn service(store: Arc<dyn RecordStore>) -> AccountService {
        let identity = JwtIdentity::new(&AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 1,
        })
        .unwrap();
        AccountService::new(store, Arc::new(identity)).with_hash_cost(4)
    }

    async fn make_admin(store: &Arc<dyn RecordStore>, id: &str) {
        let mut partial = serde_json::Map::new();
        partial.insert("role".into(), json!("admin"));
        store.update(collections::ACCOUNTS, id, partial).await.unwrap();
    }

    #[tokio::test]
    async fn test_register_and_me() {
        let accounts = service(memory_store());
        let account = accounts.register("a@x.io", "pw").await.unwrap();
        assert_eq!(account.role, Role::User);

        let me = accounts.me(&account.id).await.unwrap();
        assert_eq!(me, account);
    }

    #[tokio::test]
    async fn test_register_validation_and_conflict() {
        let accounts = service(memory_store());
        assert!(matches!(
            accounts.register("", "pw").await,
            Err(LinkbotError::Validation(_))
        ));
        assert!(matches!(
            accounts.register("a@x.io", "").await,
            Err(LinkbotError::Validation(_))
        ));

        accounts.register("a@x.io", "pw").await.unwrap();
        assert!(matches!(
            accounts.register("a@x.io", "other").await,
            Err(LinkbotError::Conflict(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_same_email() {
        let store: Arc<dyn RecordStore> = memory_store();
        let accounts = service(store.clone());

        let mut handles = Vec::new();
        for n in 0..6 {
            let accounts = accounts.clone();
            handles.push(tokio::spawn(async move {
                accounts.register("race@x.io", &format!("pw{n}")).await
            }));
        }

        let mut registered = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => registered += 1,
                Err(LinkbotError::Conflict(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(registered, 1);

        let docs = store
            .query(collections::ACCOUNTS, Some(&Filter::eq("email", "race@x.io")), None)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let store: Arc<dyn RecordStore> = memory_store();
        let accounts = service(store.clone());
        let account = accounts.register("a@x.io", "hunter2").await.unwrap();

        let doc = store.get(collections::ACCOUNTS, &account.id).await.unwrap().unwrap();
        let hash = doc.data["passwordHash"].as_str().unwrap();
        assert_ne!(hash, "hunter2");
        assert!(bcrypt::verify("hunter2", hash).unwrap());
    }

    #[tokio::test]
    async fn test_login_then_authenticate() {
        let accounts = service(memory_store());
        let account = accounts.register("a@x.io", "pw").await.unwrap();

        let token = accounts.login("a@x.io", "pw").await.unwrap();
        let authed = accounts.authenticate(&token).await.unwrap();
        assert_eq!(authed.id, account.id);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let accounts = service(memory_store());
        accounts.register("a@x.io", "pw").await.unwrap();

        assert!(matches!(
            accounts.login("a@x.io", "wrong").await,
            Err(LinkbotError::Forbidden(_))
        ));
        assert!(matches!(
            accounts.login("nobody@x.io", "pw").await,
            Err(LinkbotError::NotFound(_))
        ));
        assert!(matches!(
            accounts.authenticate("garbage").await,
            Err(LinkbotError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_promote_requires_admin() {
        let store: Arc<dyn RecordStore> = memory_store();
        let accounts = service(store.clone());
        let alice = accounts.register("alice@x.io", "pw").await.unwrap();
        let bob = accounts.register("bob@x.io", "pw").await.unwrap();

        assert!(matches!(
            accounts.promote(&alice.id, &bob.id).await,
            Err(LinkbotError::Forbidden(_))
        ));

        make_admin(&store, &alice.id).await;
        let promoted = accounts.promote(&alice.id, &bob.id).await.unwrap();
        assert!(promoted.is_admin());
        assert!(accounts.require_admin(&bob.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_with_bot_count() {
        let store: Arc<dyn RecordStore> = memory_store();
        let accounts = service(store.clone());
        let directory = BotDirectory::new(store.clone());

        let alice = accounts.register("alice@x.io", "pw").await.unwrap();
        let bob = accounts.register("bob@x.io", "pw").await.unwrap();
        directory
            .create_bot(NewBot {
                name: "B1".into(),
                access_token: "t".into(),
                chat_user_id: "U1".into(),
                assigned_to: alice.id.clone(),
            })
            .await
            .unwrap();
        directory.add_pool_bot("B2", "t", "U2").await.unwrap();

        let list = accounts.list_with_bot_count(None).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].email, "alice@x.io");
        assert_eq!(list[0].bot_count, 1);
        assert!(list[0].has_bot);
        assert_eq!(list[1].id, bob.id);
        assert!(!list[1].has_bot);

        assert!(matches!(
            accounts.list_with_bot_count(Some(&bob.id)).await,
            Err(LinkbotError::Forbidden(_))
        ));
    }
}
