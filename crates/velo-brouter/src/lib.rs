//! Velo BRouter - routing service client
//!
//! Resolves single route legs against a BRouter instance.

pub mod client;
pub mod response;

pub use client::{BRouterClient, DEFAULT_BASE_URL};
pub use response::parse_route_response;
