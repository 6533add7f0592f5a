//! # twintank-app
//!
//! Application layer: use-cases, the control cycle and **port definitions**.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `DeviceStore`: list, create, update, delete devices and append history
//!   - `SnapshotPublisher`: receive the read model after every cycle
//! - Run the **control cycle** (`ControlCycle`) and its background timer
//! - Provide administrative use-cases (`DeviceService`)
//! - Provide **in-process infrastructure** (`SnapshotBus`) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `twintank-domain` only (plus `tokio` for sync, time and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod control_cycle;
pub mod ports;
pub mod scheduler;
pub mod services;
pub mod snapshot_bus;

#[cfg(test)]
mod testing;
