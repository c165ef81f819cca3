//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by UI/adapter into the application
//! - Outbound: Called by application into infrastructure

pub mod endpoint;
pub mod inbound;
pub mod outbound;

pub use endpoint::Endpoint;
pub use inbound::InputPort;
pub use outbound::{
    decode, ApiPort, Notice, NoticeLevel, NoticePort, PromptPort, SessionStorePort,
};
