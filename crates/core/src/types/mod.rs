//! Core types for StyleAura.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod rating;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{ListedPrice, Money, MoneyError};
pub use rating::{RatingError, RatingValue};
