#![forbid(unsafe_code)]

//! `#[derive(Entity)]`: generates the by-name field table and one typed
//! `Field` accessor per tracked field.
//!
//! ```ignore
//! #[derive(Debug, Clone, revtrack::Entity)]
//! #[track(validate = "address_rules")]
//! pub struct Address {
//!     pub id: i64,
//!     #[track(required = "City is required")]
//!     pub city: String,
//!     #[track(skip)]
//!     pub cache: Vec<u8>,
//! }
//!
//! // Expands to `impl revtrack::Entity for Address { .. }` plus
//! // `Address::ID` and `Address::CITY`.
//! ```
//!
//! # Attributes
//!
//! - `#[track(name = "...")]` on the struct overrides `Entity::NAME`.
//! - `#[track(validate = "path")]` on the struct appends a custom rule, a
//!   `fn(&Self, &mut Vec<ValidationFailure>)`.
//! - `#[track(skip)]` on a field leaves it out of the table (nested objects,
//!   nested collections, caches).
//! - `#[track(required = "msg")]` and `#[track(email = "msg")]` on a field add
//!   the built-in rules.

use proc_macro::TokenStream;

mod attrs;
mod expand;

#[proc_macro_derive(Entity, attributes(track))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    expand::derive_entity(input.into()).into()
}
