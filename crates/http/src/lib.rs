//! Ballot HTTP module providing the authenticated request gateway
//!
//! Every request to the ballot backend goes through a [`client::Gateway`],
//! which attaches the voter and admin session tokens and expires local
//! sessions the backend no longer accepts.

pub mod client;

pub use client::{
    ClientError, CredentialSlot, ExpiryPolicy, Gateway, GatewayBuilder, GatewayConfig, Navigator,
    SessionStore,
};
