//! What a profile client registers: its capability set and callbacks

use super::ids::{ConnId, InterfaceId};
use crate::gap::{BdAddr, Transport};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Callbacks a client wants to receive
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const CONNECTED = 1 << 0;
        const DISCONNECTED = 1 << 1;
        const CONGESTION = 1 << 2;
        const DATA = 1 << 3;
        const CONN_UPDATE = 1 << 4;
        const PHY_UPDATE = 1 << 5;
    }
}

/// Connection outcome or disconnection reason reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Connection established
    Ok,
    /// The channel layer failed to connect or configure; carries its raw result
    L2capFailure(u16),
    /// Connection attempt or supervision timeout
    ConnectionTimeout,
    /// The peer closed the channel
    PeerTerminated,
    /// The local host closed the channel
    LocalHostTerminated,
    /// No control block was available
    NoResources,
    /// The link could not be established
    FailedToEstablish,
    /// Any other controller reason code
    Other(u16),
}

impl LinkStatus {
    pub fn code(&self) -> u16 {
        match self {
            LinkStatus::Ok => 0x00,
            LinkStatus::L2capFailure(result) => *result,
            LinkStatus::ConnectionTimeout => 0x08,
            LinkStatus::NoResources => 0x0D,
            LinkStatus::PeerTerminated => 0x13,
            LinkStatus::LocalHostTerminated => 0x16,
            LinkStatus::FailedToEstablish => 0x3E,
            LinkStatus::Other(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == LinkStatus::Ok
    }
}

impl From<u16> for LinkStatus {
    fn from(code: u16) -> Self {
        match code {
            0x00 => LinkStatus::Ok,
            0x08 => LinkStatus::ConnectionTimeout,
            0x0D => LinkStatus::NoResources,
            0x13 => LinkStatus::PeerTerminated,
            0x16 => LinkStatus::LocalHostTerminated,
            0x3E => LinkStatus::FailedToEstablish,
            other => LinkStatus::Other(other),
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Ok => write!(f, "ok"),
            LinkStatus::L2capFailure(result) => write!(f, "L2CAP failure ({:#06x})", result),
            LinkStatus::ConnectionTimeout => write!(f, "connection timeout"),
            LinkStatus::NoResources => write!(f, "no resources"),
            LinkStatus::PeerTerminated => write!(f, "terminated by peer"),
            LinkStatus::LocalHostTerminated => write!(f, "terminated by local host"),
            LinkStatus::FailedToEstablish => write!(f, "failed to establish"),
            LinkStatus::Other(code) => write!(f, "reason {:#04x}", code),
        }
    }
}

/// LE connection parameters after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnParams {
    /// Connection interval (1.25ms units)
    pub interval: u16,
    /// Peripheral latency (number of events)
    pub latency: u16,
    /// Supervision timeout (10ms units)
    pub supervision_timeout: u16,
}

/// A profile consumer of the engine.
///
/// Only the callbacks named in `capabilities()` are invoked; the rest keep
/// their empty defaults.
pub trait ProfileClient {
    fn capabilities(&self) -> Capabilities;

    fn on_connected(
        &mut self,
        _interface: InterfaceId,
        _peer: BdAddr,
        _conn_id: ConnId,
        _status: LinkStatus,
        _transport: Transport,
    ) {
    }

    fn on_disconnected(
        &mut self,
        _interface: InterfaceId,
        _peer: BdAddr,
        _conn_id: ConnId,
        _reason: LinkStatus,
        _transport: Transport,
    ) {
    }

    fn on_congestion_changed(&mut self, _conn_id: ConnId, _congested: bool) {}

    fn on_data(&mut self, _conn_id: ConnId, _payload: &[u8]) {}

    fn on_conn_update(
        &mut self,
        _interface: InterfaceId,
        _conn_id: ConnId,
        _params: ConnParams,
        _status: u8,
    ) {
    }

    fn on_phy_updated(
        &mut self,
        _interface: InterfaceId,
        _conn_id: ConnId,
        _tx_phy: u8,
        _rx_phy: u8,
        _status: u8,
    ) {
    }
}
