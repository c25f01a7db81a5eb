//! Strongly-typed identifiers handed to profile clients

use std::fmt;

/// Identifies a registered profile client. Zero is never assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(pub u8);

/// Slot of a connection context in the control-block table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextIndex(pub u8);

/// Connection identifier seen by a client: the context slot in the high byte
/// and the client's interface id in the low byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u16);

impl ContextIndex {
    /// Used in connection failures reported before any context was allocated
    pub const NONE: ContextIndex = ContextIndex(0xFF);
}

impl ConnId {
    pub fn new(index: ContextIndex, interface: InterfaceId) -> Self {
        ConnId(((index.0 as u16) << 8) | interface.0 as u16)
    }

    pub fn context_index(&self) -> ContextIndex {
        ContextIndex((self.0 >> 8) as u8)
    }

    pub fn interface_id(&self) -> InterfaceId {
        InterfaceId((self.0 & 0xFF) as u8)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if{}", self.0)
    }
}

impl fmt::Display for ContextIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx{}", self.0)
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
