//! Command implementations.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;

use styleaura_storefront::StorefrontError;
use styleaura_storefront::config::ConfigError;
use thiserror::Error;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Storefront(#[from] StorefrontError),

    /// A form error, already worded for the user.
    #[error("{0}")]
    Rejected(String),

    #[error("Not signed in. Run `sa-cli login` first.")]
    NotSignedIn,
}
