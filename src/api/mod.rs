//! REST API client module for the Commerce storefront backend.
//!
//! This module provides the `ApiClient` for talking to the catalog, cart,
//! order, account, and auth endpoints.
//!
//! The API uses JWT bearer authentication; an expired access token shows up
//! as a 401, which the client recovers from with a single refresh-and-replay
//! before giving up and clearing the session.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
