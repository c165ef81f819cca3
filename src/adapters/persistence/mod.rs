//! Persistence adapters. Client-local state only.

pub mod state_json;

pub use state_json::StateJson;
