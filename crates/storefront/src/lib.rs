//! StyleAura storefront engine.
//!
//! Client-side session, cart synchronization and catalog aggregation for the
//! StyleAura commerce backend. Consumers build one [`AppState`] and drive the
//! services it owns.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod services;
pub mod session;
pub mod state;
pub mod task;

pub use error::{Result, StorefrontError};
pub use state::AppState;
