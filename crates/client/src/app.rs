//! Composition root wiring the session, cart, address book and admin
//! directory together.

use std::sync::Arc;

use paratha_core::{AddressId, OrderTotals, ProductId, Role, Route, UserId};
use secrecy::SecretString;
use thiserror::Error;
use tracing::instrument;

use crate::address::{Address, AddressBook, AddressDraft, AddressError, AddressPatch};
use crate::admin::{AdminDirectory, AdminError};
use crate::api::{AddressApi, AdminApi, AdminUser, ApiClient, ApiError, AuthApi};
use crate::cart::{CartError, CartManager, LineItem};
use crate::catalog::{Catalog, CatalogError, Product, StaticCatalog};
use crate::config::ClientConfig;
use crate::session::{SessionError, SessionManager};
use crate::storage::{FileTokenStore, TokenStore};

/// Errors from [`App`] construction, address and admin operations.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Admin(#[from] AdminError),
}

/// The client application.
///
/// Owns one session, one cart, one address book and the admin user
/// directory. The cart's bulk-buyer rules follow the session role, and
/// signing out empties everything the user loaded.
#[derive(Debug)]
pub struct App {
    config: ClientConfig,
    session: Arc<SessionManager>,
    cart: CartManager,
    addresses: AddressBook,
    admin: AdminDirectory,
}

impl App {
    /// Build the app from configuration: HTTP client, file-backed session
    /// store, and the configured catalog (or the built-in menu).
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the HTTP client cannot be built or the catalog
    /// file cannot be loaded.
    pub async fn from_config(config: ClientConfig) -> Result<Self, AppError> {
        let client = ApiClient::new(&config)?;
        let store = Arc::new(FileTokenStore::new(config.session_file()));
        let catalog = match &config.catalog_path {
            Some(path) => StaticCatalog::from_json_file(path).await?,
            None => StaticCatalog::builtin(),
        };

        let client = Arc::new(client);
        Ok(Self::with_parts(
            config,
            Arc::clone(&client) as Arc<dyn AuthApi>,
            Arc::clone(&client) as Arc<dyn AddressApi>,
            client,
            store,
            Arc::new(catalog),
        ))
    }

    /// Assemble the app from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        config: ClientConfig,
        auth: Arc<dyn AuthApi>,
        address_api: Arc<dyn AddressApi>,
        admin_api: Arc<dyn AdminApi>,
        store: Arc<dyn TokenStore>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self {
            config,
            session: Arc::new(SessionManager::new(auth, store)),
            cart: CartManager::new(catalog),
            addresses: AddressBook::new(address_api),
            admin: AdminDirectory::new(admin_api),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    #[must_use]
    pub const fn cart(&self) -> &CartManager {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartManager {
        &mut self.cart
    }

    #[must_use]
    pub const fn addresses(&self) -> &AddressBook {
        &self.addresses
    }

    #[must_use]
    pub const fn admin(&self) -> &AdminDirectory {
        &self.admin
    }

    /// Restore any persisted session and return the screen to show.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Busy` if a session operation is in flight.
    #[instrument(skip_all)]
    pub async fn start(&self) -> Result<Route, SessionError> {
        self.session.rehydrate().await?;
        Ok(self.session.landing_route())
    }

    /// Add a product to the cart, applying bulk rules for business users.
    ///
    /// # Errors
    ///
    /// See [`CartManager::add_item`].
    pub fn add_to_cart(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<&LineItem, CartError> {
        let bulk_buyer = self
            .session
            .state()
            .role()
            .is_some_and(|role| role.is_bulk_buyer());
        self.cart.add_item(product_id, quantity, bulk_buyer)
    }

    /// Products currently on offer, in menu order.
    #[must_use]
    pub fn menu(&self) -> Vec<Product> {
        self.cart
            .catalog()
            .list_products()
            .into_iter()
            .filter(|product| product.is_available)
            .collect()
    }

    /// Cart totals with the configured delivery fee.
    #[must_use]
    pub fn order_totals(&self) -> OrderTotals {
        self.cart.totals(self.config.delivery_fee)
    }

    /// Load the signed-in user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` when signed out, or the address book's
    /// error.
    pub async fn load_addresses(&mut self) -> Result<&[Address], AppError> {
        let token = self.require_token()?;
        Ok(self.addresses.load(&token).await?)
    }

    /// Save a new address for the signed-in user.
    ///
    /// # Errors
    ///
    /// See [`load_addresses`](Self::load_addresses).
    pub async fn add_address(&mut self, draft: AddressDraft) -> Result<Address, AppError> {
        let token = self.require_token()?;
        Ok(self.addresses.add(&token, draft).await?)
    }

    /// # Errors
    ///
    /// See [`load_addresses`](Self::load_addresses).
    pub async fn update_address(
        &mut self,
        id: &AddressId,
        patch: AddressPatch,
    ) -> Result<Address, AppError> {
        let token = self.require_token()?;
        Ok(self.addresses.update(&token, id, patch).await?)
    }

    /// # Errors
    ///
    /// See [`load_addresses`](Self::load_addresses).
    pub async fn delete_address(&mut self, id: &AddressId) -> Result<(), AppError> {
        let token = self.require_token()?;
        Ok(self.addresses.delete(&token, id).await?)
    }

    /// # Errors
    ///
    /// See [`load_addresses`](Self::load_addresses).
    pub async fn set_default_address(&mut self, id: &AddressId) -> Result<(), AppError> {
        let token = self.require_token()?;
        Ok(self.addresses.set_default(&token, id).await?)
    }

    /// Load the user listing. Admins only.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` when signed out, `AdminError::NotAdmin`
    /// for other roles, or the directory's error.
    pub async fn load_users(&mut self) -> Result<&[AdminUser], AppError> {
        let token = self.require_admin()?;
        Ok(self.admin.load(&token).await?)
    }

    /// # Errors
    ///
    /// See [`load_users`](Self::load_users).
    pub async fn update_user_role(
        &mut self,
        id: &UserId,
        role: Role,
    ) -> Result<AdminUser, AppError> {
        let token = self.require_admin()?;
        Ok(self.admin.update_role(&token, id, role).await?)
    }

    /// # Errors
    ///
    /// See [`load_users`](Self::load_users).
    pub async fn delete_user(&mut self, id: &UserId) -> Result<(), AppError> {
        let token = self.require_admin()?;
        Ok(self.admin.delete(&token, id).await?)
    }

    /// Sign out, then empty the cart, address book and user listing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Busy` if a session operation is in flight; the
    /// cart is left untouched in that case.
    #[instrument(skip_all)]
    pub async fn logout(&mut self) -> Result<Route, SessionError> {
        let route = self.session.logout().await?;
        self.cart.clear();
        self.addresses.reset();
        self.admin.reset();
        Ok(route)
    }

    fn require_token(&self) -> Result<Arc<SecretString>, SessionError> {
        if !self.session.state().is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        self.session
            .access_token()
            .ok_or(SessionError::NotAuthenticated)
    }

    fn require_admin(&self) -> Result<Arc<SecretString>, AppError> {
        let token = self.require_token()?;
        if self.session.state().role() != Some(Role::Admin) {
            return Err(AdminError::NotAdmin.into());
        }
        Ok(token)
    }
}
