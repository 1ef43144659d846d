//! Shared types for the rmf modem-management framework.
//!
//! This crate contains:
//! - **Data models** — power, radio, SIM, registration and connection types
//! - **Operations surface** — the `ModemOperations` capability trait that
//!   modem backends implement and the daemon drives

pub mod models;
pub mod operations;
