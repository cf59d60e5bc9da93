//! Client library for the Commerce storefront REST API.
//!
//! The library owns the authenticated session lifecycle (login, token
//! storage, transparent refresh-on-401, logout) and exposes typed wrappers
//! for the catalog, cart, order, and account endpoints.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
