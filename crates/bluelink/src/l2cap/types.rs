//! Type definitions for the L2CAP boundary
//!
//! This module contains the data exchanged with the channel layer: channel
//! identifiers, configuration parameters and write results.

use super::constants::*;
use std::fmt;
use thiserror::Error;

/// Local L2CAP channel identifier
pub type ChannelId = u16;

/// Error types reported by the channel layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum L2capError {
    #[error("Connect request for PSM {0:#06x} refused")]
    ConnectRefused(u16),

    #[error("LE connection to {0} could not be started")]
    LeConnectRefused(String),

    #[error("Data write failed on CID {0:#06x}")]
    WriteFailed(ChannelId),
}

/// Retransmission and Flow Control modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetransmissionMode {
    /// Basic L2CAP mode (no retransmission or flow control)
    #[default]
    Basic = 0,
    /// Enhanced Retransmission mode
    EnhancedRetransmission = 3,
    /// Streaming mode
    Streaming = 4,
}

/// Configuration parameters carried in config indications and confirmations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigInfo {
    /// Maximum Transmission Unit, if the option was present
    pub mtu: Option<u16>,
    /// Flush Timeout, if the option was present
    pub flush_timeout: Option<u16>,
    /// Requested channel mode, if the option was present
    pub mode: Option<RetransmissionMode>,
}

impl ConfigInfo {
    pub fn with_mtu(mtu: u16) -> Self {
        Self {
            mtu: Some(mtu),
            ..Self::default()
        }
    }
}

/// Outcome of handing a PDU to the channel layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataWriteResult {
    /// Queued for transmission
    Success,
    /// Queued, but the channel is now congested
    Congested,
    /// Dropped
    Failed,
}

/// Effective payload size for a dynamic channel.
///
/// The peer's offered MTU (or the L2CAP default when absent) bounded by our
/// own default MTU and by what fits in a platform buffer.
pub fn effective_mtu(peer_mtu: Option<u16>, default_mtu: u16, max_payload: u16) -> u16 {
    peer_mtu
        .unwrap_or(L2CAP_DEFAULT_MTU)
        .min(default_mtu)
        .min(max_payload)
}

/// Raw L2CAP connection result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnResult(pub u16);

impl ConnResult {
    pub fn is_ok(&self) -> bool {
        self.0 == L2CAP_CONN_OK
    }
}

impl fmt::Display for ConnResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            L2CAP_CONN_OK => write!(f, "OK"),
            L2CAP_CONN_PENDING => write!(f, "pending"),
            L2CAP_CONN_NO_PSM => write!(f, "PSM not supported"),
            L2CAP_CONN_SECURITY_BLOCK => write!(f, "security block"),
            L2CAP_CONN_NO_RESOURCES => write!(f, "no resources"),
            L2CAP_CONN_TIMEOUT => write!(f, "timeout"),
            other => write!(f, "{:#06x}", other),
        }
    }
}
