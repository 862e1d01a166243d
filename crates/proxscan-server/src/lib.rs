//! # proxscan-server
//!
//! HTTP server library for proxscan.
//!
//! This library provides the API handlers and state management that host a
//! single scan coordinator behind a REST API.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
