//! StyleAura Core - Shared types library.
//!
//! This crate provides the domain types used across all StyleAura components:
//! - `storefront` - Session, cart synchronization and catalog engine
//! - `cli` - Command-line storefront client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps it
//! lightweight and lets the pure parts of the engine (filtering, totals,
//! averages) be tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails and ratings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
