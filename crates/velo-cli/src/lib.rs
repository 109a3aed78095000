//! Velo CLI - command line tools for the route segment engine.
//!
//! Binaries:
//! - plan_route: plan a route through BRouter and print its summary

pub mod format;

pub use format::{format_distance, format_duration, format_elevation, outcome_tally, route_summary};
