use std::{collections::HashMap, fmt, sync::Arc};

use database_adapter::KeyValueStore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    catalog::{Catalog, ProductId},
    contact::{ContactForm, ContactRequest},
    purchase::{PurchaseError, PurchaseOutcome, purchase},
    session::{SessionConfig, SessionService},
    user::{AuthError, Session},
    validation::FormErrors,
};

/// Identifies one browser or API client across requests
pub type ClientId = Uuid;

/// The stock list plus one session per signed-in client.
///
/// Clients without an entry browse anonymously. Every client reads and writes
/// the same credential store.
pub struct Storefront {
    pub catalog: Catalog,
    store: Arc<dyn KeyValueStore>,
    config: SessionConfig,
    clients: HashMap<ClientId, SessionService>,
}

impl fmt::Debug for Storefront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storefront")
            .field("catalog", &self.catalog)
            .field("config", &self.config)
            .field("signed_in", &self.clients.len())
            .finish_non_exhaustive()
    }
}

impl Storefront {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: SessionConfig) -> Self {
        Self::with_catalog(Catalog::default(), store, config)
    }

    #[must_use]
    pub fn with_catalog(
        catalog: Catalog,
        store: Arc<dyn KeyValueStore>,
        config: SessionConfig,
    ) -> Self {
        Storefront {
            catalog,
            store,
            config,
            clients: HashMap::new(),
        }
    }

    /// Signs a client in.
    ///
    /// A known `client` keeps its id; anyone else gets a fresh one. On failure
    /// the client's previous session, if any, is left untouched.
    /// # Errors
    /// - `AuthError::InvalidCredentials` for an unknown email or a wrong password
    pub async fn sign_in(
        &mut self,
        client: Option<ClientId>,
        email: &str,
        password: &str,
    ) -> Result<(ClientId, Session), AuthError> {
        let (id, mut sessions) = self.take_client(client);
        let result = sessions.login(email, password).await;
        self.keep_client(id, sessions);
        result.map(|session| (id, session))
    }

    /// Registers a new account and signs the client in with it.
    /// # Errors
    /// - `AuthError::AlreadyExists` if the email is taken, ignoring case
    /// - `AuthError::Storage` or `AuthError::Encoding` if the list cannot be saved
    pub async fn register(
        &mut self,
        client: Option<ClientId>,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<(ClientId, Session), AuthError> {
        let (id, mut sessions) = self.take_client(client);
        let result = sessions.register(email, password, name).await;
        self.keep_client(id, sessions);
        result.map(|session| (id, session))
    }

    /// Ends a client's session. Unknown or missing ids are ignored.
    pub fn sign_out(&mut self, client: Option<ClientId>) {
        if let Some(mut sessions) = client.and_then(|id| self.clients.remove(&id)) {
            sessions.logout();
        }
    }

    #[must_use]
    pub fn current_session(&self, client: Option<ClientId>) -> Option<&Session> {
        client
            .and_then(|id| self.clients.get(&id))
            .and_then(SessionService::current_session)
    }

    /// Number of clients currently signed in
    #[must_use]
    pub fn signed_in_count(&self) -> usize {
        self.clients.len()
    }

    /// Buy a product as the client's signed-in shopper.
    /// # Errors
    /// - `PurchaseError::UnknownProduct` if no product has this id
    /// - `PurchaseError::OutOfStock` if the product cannot be bought
    pub fn purchase(
        &self,
        client: Option<ClientId>,
        product_id: ProductId,
    ) -> Result<PurchaseOutcome, PurchaseError> {
        let product = self
            .catalog
            .find(product_id)
            .ok_or(PurchaseError::UnknownProduct(product_id))?;

        let outcome = purchase(product, self.current_session(client));
        if let Ok(PurchaseOutcome::SignInRequired) = outcome {
            info!("Purchase of {} needs sign-in", product.title);
        }
        outcome
    }

    /// Validate a contact request; valid ones are only logged.
    /// # Errors
    /// Returns the failing fields
    pub fn submit_contact(&self, form: &ContactForm) -> Result<ContactRequest, FormErrors> {
        match form.validate() {
            Ok(request) => {
                info!(
                    "Contact request from {} about {}: {:?}",
                    request.email, request.subject, request
                );
                Ok(request)
            }
            Err(errors) => {
                warn!("Rejected contact form: {errors}");
                Err(errors)
            }
        }
    }

    fn take_client(&mut self, client: Option<ClientId>) -> (ClientId, SessionService) {
        match client.and_then(|id| self.clients.remove_entry(&id)) {
            Some(entry) => entry,
            None => {
                let id = Uuid::new_v4();
                debug!("New client {id}");
                (
                    id,
                    SessionService::new(self.store.clone(), self.config.clone()),
                )
            }
        }
    }

    fn keep_client(&mut self, id: ClientId, sessions: SessionService) {
        if sessions.current_session().is_some() {
            self.clients.insert(id, sessions);
        }
    }
}
