//! Route-level page components.
//!
//! Pages only read session state and call store operations; the route guard
//! decides who may see them.

pub mod callback;
pub mod home;
pub mod login;
pub mod station;
