//! Application registry
//!
//! This module tracks the profile clients registered with the engine and fans
//! connection, disconnection, congestion, data and link-update events out to
//! them, keyed by `ConnId`.

pub mod client;
pub mod ids;
#[allow(clippy::module_inception)]
pub mod registry;

pub use self::client::{Capabilities, ConnParams, LinkStatus, ProfileClient};
pub use self::ids::{ConnId, ContextIndex, InterfaceId};
pub use self::registry::ClientRegistry;
