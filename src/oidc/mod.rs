//! OpenID Connect relying party primitives
//!
//! This module provides the protocol pieces the flow controller builds on:
//!
//! - [`discovery`] - Fetches provider metadata from the well-known endpoint
//! - [`random`] - Opaque random tokens for session ids, state and nonces
//! - [`client`] - Authorization code exchange and userinfo fetch

pub mod client;
pub mod discovery;
pub mod random;

pub use client::{ProviderClient, TokenResponse, UserProfile};
pub use discovery::{discover, ProviderMetadata};
pub use random::random_opaque_token;
