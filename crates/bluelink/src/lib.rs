//! BlueLink - Bluetooth profile channel engine
//!
//! This library terminates L2CAP-based profile channels on the host side:
//! ATT (GATT) over the LE fixed channel or a BR/EDR dynamic channel, and the
//! AVCTP browsing channel. It keeps one connection context per peer and
//! transport, runs the connect/configure/disconnect state machine, resolves
//! connect collisions, routes inbound PDUs, fans events out to registered
//! profile clients and relays congestion.
//!
//! The L2CAP channel layer itself is external and plugs in through
//! `L2capInterface`.

pub mod att;
pub mod avct;
pub mod channel;
pub mod config;
pub mod error;
pub mod gap;
pub mod l2cap;
pub mod registry;

#[cfg(test)]
mod mocks;

// Re-export common types for convenience
pub use att::{AttDispatcher, AttErrorCode, AttHandler};
pub use avct::BrowsingRelay;
pub use channel::{
    event_queue, ChannelCore, ChannelState, Clock, CoreEvent, CoreHandle, LinkInfo, PduHandler,
    PduOutcome,
};
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use gap::{BdAddr, Transport};
pub use l2cap::{ChannelId, ConfigInfo, DataWriteResult, L2capError, L2capInterface, PSM};
pub use registry::{Capabilities, ConnId, InterfaceId, LinkStatus, ProfileClient};
