//! HTTP surface of the venueops backend.
//!
//! Exposes the task endpoints over axum, gated by HS256 bearer tokens, with
//! every response wrapped in a `{isSuccess, data, message}` envelope.

pub mod auth;
pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod observability;
pub mod routes;
pub mod server;
