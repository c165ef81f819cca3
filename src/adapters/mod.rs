//! Infrastructure adapters. Implement outbound ports.
//!
//! HTTP API client, offline mock, state file, terminal UI. Map errors to DomainError.

pub mod http;
pub mod persistence;
pub mod ui;
