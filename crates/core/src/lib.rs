//! Paratha Core - Shared types library.
//!
//! This crate provides the types used across the Paratha ordering client:
//! - `client` - Cart, session, address book and the HTTP API adapter
//! - `cli` - Terminal front-end for the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! anywhere, including from UI layers that only render state.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, roles and statuses
//! - [`pricing`] - Bulk quantity normalization and order totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{BULK_QUANTITY_STEP, OrderTotals, normalize_bulk_quantity};
pub use types::*;
