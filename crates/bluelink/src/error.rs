//! Error types for the bluelink library
//!
//! This module defines the errors returned to profile clients. Problems with
//! inbound lower-layer callbacks are never errors: they are logged and dropped.

use crate::channel::ChannelState;
use crate::gap::Transport;
use crate::l2cap::L2capError;
use crate::registry::{ConnId, InterfaceId};
use thiserror::Error;

/// Errors returned by client-facing operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Control block table full ({0} links)")]
    TableFull(usize),

    #[error("Client registry full")]
    RegistryFull,

    #[error("Unknown client interface {0}")]
    UnknownInterface(InterfaceId),

    #[error("Unknown connection {0}")]
    UnknownConnection(ConnId),

    #[error("Channel not open (state {0})")]
    NotOpen(ChannelState),

    #[error("Channel is closing")]
    Closing,

    #[error("Channel congested")]
    Congested,

    #[error("Command queue full ({0} pending)")]
    QueueFull(usize),

    #[error("Payload of {len} bytes exceeds payload size {mtu}")]
    MtuExceeded { len: usize, mtu: u16 },

    #[error("Transport {0} not supported by this engine")]
    UnsupportedTransport(Transport),

    #[error("L2CAP error: {0}")]
    L2cap(#[from] L2capError),
}

/// Result type for client-facing operations
pub type CoreResult<T> = Result<T, CoreError>;
