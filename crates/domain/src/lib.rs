//! # twintank-domain
//!
//! Pure domain model for the twin-tank water supply controller.
//!
//! ## Responsibilities
//! - Foundational types: store identifiers, error conventions, timestamps
//! - Define **Devices** (pumps and level sensors) and **History entries**
//! - Classify devices into the four functional **Roles**
//! - Transfer physics, threshold crossings and the safety interlock
//! - The **Snapshot** read model handed to rendering surfaces
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod history;
pub mod roles;
pub mod safety;
pub mod snapshot;
pub mod threshold;
pub mod tracker;
pub mod transfer;
