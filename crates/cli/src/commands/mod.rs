//! CLI command implementations.

pub mod addresses;
pub mod cart;
pub mod session;
pub mod users;

use paratha_client::{AppError, CartError, ConfigError, SessionError};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Cart(#[from] CartError),

    /// A `--item` argument that is not `PRODUCT_ID:QUANTITY`.
    #[error("Invalid item {0:?}: expected PRODUCT_ID:QUANTITY")]
    InvalidItem(String),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}
