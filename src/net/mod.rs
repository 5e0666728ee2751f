//! Identity-provider plumbing.
//!
//! SYSTEM CONTEXT
//! ==============
//! `identity` defines the client seam the session store depends on, and
//! `oidc` implements it over the browser's `oidc-client-ts` bundle.

pub mod identity;
pub mod oidc;
