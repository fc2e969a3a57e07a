use std::{fmt, sync::Arc, time::Duration};

use database_adapter::KeyValueStore;
use tracing::{debug, info, warn};

use crate::user::{AuthError, Credential, CredentialsExt, Session};

/// Slot holding the JSON array of registered credentials
pub const STORAGE_KEY: &str = "tm_users_v1";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Artificial delay applied to login and registration
    pub latency: Duration,
    pub storage_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(300),
            storage_key: STORAGE_KEY.to_string(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// Owns the durable credential list and the in-memory current session.
///
/// The session lives only as long as this value; it is never written to the
/// store and is not restored on restart.
pub struct SessionService {
    store: Arc<dyn KeyValueStore>,
    config: SessionConfig,
    current: Option<Session>,
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("config", &self.config)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl SessionService {
    pub fn new(store: Arc<dyn KeyValueStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            current: None,
        }
    }

    /// Registers a new shopper and signs them in.
    /// # Errors
    /// - `AuthError::AlreadyExists` if the email is taken, ignoring case
    /// - `AuthError::Storage` if the updated list cannot be written
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Session, AuthError> {
        self.simulate_latency().await;
        info!("Registration attempt for email: {email}");

        let mut users = self.read_users().await;
        if users.email_exists(email) {
            warn!("Registration refused, email already exists: {email}");
            return Err(AuthError::AlreadyExists);
        }

        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from);
        let credential = Credential::new(email.to_string(), password.to_string(), name);
        let session = Session::from(&credential);
        users.push(credential);
        self.write_users(&users).await?;

        debug!("Registered {email}, {} accounts stored", users.len());
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Signs in with an existing credential.
    /// # Errors
    /// - `AuthError::InvalidCredentials` for an unknown email or a wrong password
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.simulate_latency().await;
        info!("Login attempt for email: {email}");

        let users = self.read_users().await;
        match users.authenticate(email, password) {
            Ok(credential) => {
                let session = Session::from(credential);
                debug!("Login successful for {}", session.email);
                self.current = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                warn!("Failed authentication attempt for email: {email}");
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            info!("Logged out {}", session.email);
        }
    }

    #[must_use]
    pub fn current_session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Every stored credential, falling back to the demo account when the
    /// slot is missing or unreadable
    pub async fn registered_users(&self) -> Vec<Credential> {
        self.read_users().await
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }

    async fn read_users(&self) -> Vec<Credential> {
        let raw = match self.store.get(&self.config.storage_key).await {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return vec![Credential::demo()],
            Err(e) => {
                warn!("Credential store unreadable, using demo account: {e}");
                return vec![Credential::demo()];
            }
        };

        match serde_json::from_str(&raw) {
            Ok(users) => users,
            Err(e) => {
                warn!("Credential store corrupt, using demo account: {e}");
                vec![Credential::demo()]
            }
        }
    }

    async fn write_users(&self, users: &[Credential]) -> Result<(), AuthError> {
        let raw = serde_json::to_string(users)?;
        self.store.set(&self.config.storage_key, &raw).await?;
        Ok(())
    }
}
