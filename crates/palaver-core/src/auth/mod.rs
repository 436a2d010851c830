//! Identity verification port.
//!
//! The identity provider is the server-side half of the session store: it
//! turns a bearer token into a [`UserProfile`](palaver_types::identity::UserProfile)
//! or rejects it. Every request re-verifies; nothing is cached here.

pub mod box_identity;
pub mod provider;

pub use box_identity::BoxIdentityProvider;
pub use provider::{IdentityProvider, parse_bearer};
