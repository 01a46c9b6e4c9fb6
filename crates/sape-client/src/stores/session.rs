//! Authenticated session: the `(user, token)` pair.
//!
//! User and token always change together. They are persisted under two keys
//! (user JSON, raw token); a restore that finds only one of them, or a user
//! record that does not parse, discards both and starts logged out.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use sape_api::ApiClient;
use sape_shared::constants::{AUTH_TOKEN_KEY, AUTH_USER_KEY};
use sape_shared::models::{Session, User};
use sape_shared::UserId;

use crate::error::{ClientError, Result};
use crate::storage::{write_json, KeyValueStore};

/// Exchanges credentials for a session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Session>;
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Session> {
        Ok(self.login(identifier, secret).await?)
    }
}

pub struct AuthSessionStore {
    storage: Arc<dyn KeyValueStore>,
    authenticator: Arc<dyn Authenticator>,
    /// Client whose bearer token follows the session.
    api: Option<ApiClient>,
    session: watch::Sender<Option<Arc<Session>>>,
    write_lock: Mutex<()>,
}

impl AuthSessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            storage,
            authenticator,
            api: None,
            session,
            write_lock: Mutex::new(()),
        }
    }

    /// Keep `api`'s bearer token in step with the session.
    pub fn with_api_client(mut self, api: ApiClient) -> Self {
        self.api = Some(api);
        self
    }

    /// Rebuild the session from storage. Runs once at startup.
    pub async fn restore(&self) -> Result<Option<Arc<Session>>> {
        let _guard = self.write_lock.lock().await;

        let user_raw = self.storage.get_item(AUTH_USER_KEY).await?;
        let token_raw = self.storage.get_item(AUTH_TOKEN_KEY).await?;
        let anything_stored = user_raw.is_some() || token_raw.is_some();

        let restored = match (user_raw, token_raw.filter(|t| !t.is_empty())) {
            (Some(raw), Some(token)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(Session { user, token }),
                Err(e) => {
                    warn!(error = %e, "stored user is corrupt, discarding session");
                    None
                }
            },
            (None, None) => None,
            _ => {
                warn!("incomplete stored session, discarding");
                None
            }
        };

        match restored {
            Some(session) => {
                info!(user_id = %session.user.id, "session restored");
                Ok(Some(self.publish(session)))
            }
            None => {
                self.clear();
                if anything_stored {
                    self.clear_storage().await?;
                }
                Ok(None)
            }
        }
    }

    /// Authenticate and make the session current. Nothing changes on failure.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<Arc<Session>> {
        let _guard = self.write_lock.lock().await;

        let session = self
            .authenticator
            .authenticate(identifier, secret)
            .await
            .map_err(|e| {
                warn!(error = %e, "login failed");
                e
            })?;

        if let Err(e) = self.persist(&session).await {
            error!(error = %e, "failed to persist session, rolling back");
            // Put storage back in line with the session still in memory.
            let rollback = match self.current() {
                Some(previous) => self.persist(&previous).await,
                None => self.clear_storage().await,
            };
            if let Err(cleanup) = rollback {
                error!(error = %cleanup, "failed to roll back stored session");
            }
            return Err(e);
        }

        info!(user_id = %session.user.id, "logged in");
        Ok(self.publish(session))
    }

    /// Drop the session from storage, then from memory. If storage fails
    /// the session stays current and the error is returned.
    pub async fn logout(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.clear_storage().await.map_err(|e| {
            error!(error = %e, "failed to clear stored session");
            e
        })?;
        self.clear();
        info!("logged out");
        Ok(())
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.session.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn user_id(&self) -> Result<UserId> {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.user.id.clone())
            .ok_or(ClientError::NoSession)
    }

    pub fn token(&self) -> Option<String> {
        self.session.borrow().as_ref().map(|s| s.token.clone())
    }

    pub fn is_admin(&self) -> bool {
        self.session
            .borrow()
            .as_ref()
            .is_some_and(|s| s.user.is_admin())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Session>>> {
        self.session.subscribe()
    }

    async fn persist(&self, session: &Session) -> Result<()> {
        write_json(self.storage.as_ref(), AUTH_USER_KEY, &session.user).await?;
        self.storage.set_item(AUTH_TOKEN_KEY, &session.token).await
    }

    async fn clear_storage(&self) -> Result<()> {
        self.storage.remove_item(AUTH_USER_KEY).await?;
        self.storage.remove_item(AUTH_TOKEN_KEY).await
    }

    fn publish(&self, session: Session) -> Arc<Session> {
        if let Some(api) = &self.api {
            api.set_token(Some(session.token.clone()));
        }
        let session = Arc::new(session);
        self.session.send_replace(Some(Arc::clone(&session)));
        session
    }

    fn clear(&self) {
        if let Some(api) = &self.api {
            api.set_token(None);
        }
        self.session.send_replace(None);
    }
}
