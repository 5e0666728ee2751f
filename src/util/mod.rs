//! Routing glue and environment helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` wires the navigation guard into the router; `clock` hides the
//! browser/native split for reading the current time.

pub mod auth;
pub mod clock;
