//! Domain models exchanged with the commerce backend.
//!
//! Field names follow the backend's JSON (`productID`, `imageURL`, ...) via
//! serde renames; the Rust side uses plain snake case.

pub mod cart;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem};
pub use product::{AdminUser, NewProduct, Product, Review};
pub use user::{AuthResponse, UserKey, UserProfile};
