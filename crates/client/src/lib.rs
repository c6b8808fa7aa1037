//! Paratha Client - ordering client core.
//!
//! Everything the Paratha app needs below its UI:
//! - [`cart`] - In-memory cart with bulk-buyer quantity rules
//! - [`session`] - Login, registration, persisted-session bootstrap and logout
//! - [`address`] - The signed-in user's saved addresses
//! - [`admin`] - User listing and role management for admins
//! - [`api`] - `reqwest` adapter for the Paratha REST API
//! - [`storage`] - Durable storage for the auth token
//! - [`app`] - Composition root wiring the pieces together
//!
//! # Architecture
//!
//! The cart is synchronous and free of I/O. The session, address book and
//! admin directory talk to the server through the [`api::AuthApi`],
//! [`api::AddressApi`] and [`api::AdminApi`] traits and persist credentials
//! through [`storage::TokenStore`], so each can be driven by in-memory fakes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod admin;
pub mod api;
pub mod app;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod session;
pub mod storage;
pub mod validation;

pub use address::{Address, AddressBook, AddressDraft, AddressError, AddressPatch};
pub use admin::{AdminDirectory, AdminError};
pub use api::{AddressApi, AdminApi, ApiClient, ApiError, AuthApi};
pub use app::{App, AppError};
pub use cart::{CartError, CartManager, LineItem};
pub use catalog::{Catalog, Product, StaticCatalog};
pub use config::{ClientConfig, ConfigError};
pub use session::{SessionError, SessionManager, SessionState, User};
pub use storage::{FileTokenStore, MemoryTokenStore, StorageError, TokenStore};
pub use validation::ValidationError;
