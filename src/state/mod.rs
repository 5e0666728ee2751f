//! Client-side authentication state.
//!
//! DESIGN
//! ======
//! `auth` holds the data model and its pure transitions; `store` wraps it in
//! the operations and notification handling that talk to the identity client.

pub mod auth;
pub mod store;

#[cfg(test)]
pub mod test_helpers;
