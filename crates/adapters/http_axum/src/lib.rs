//! # twintank-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API for snapshots, pump commands and device management
//!   (`/api/snapshot`, `/api/devices`, …)
//! - Stream snapshots to live clients over Server-Sent Events
//! - Serve a **server-side-rendered HTML dashboard** that works with
//!   **zero JavaScript**: pure HTML forms plus `<meta http-equiv="refresh">`
//! - Map HTTP requests into control cycle commands and service calls
//!
//! ## No-JS dashboard approach
//! - The dashboard is rendered from the latest published snapshot.
//! - Pump and consumption buttons are `<form>` elements that POST back to
//!   the server and redirect (PRG pattern).
//! - The page reloads itself every few seconds.
//!
//! ## Dependency rule
//! Depends on `twintank-app` (ports, services, control cycle) and
//! `twintank-domain` (types used in request/response mapping). Never leaks
//! axum types into the domain.

pub mod api;
pub mod dashboard;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod testing;
