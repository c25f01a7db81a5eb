//! Per-link connection context

use super::state::ChannelState;
use crate::gap::{BdAddr, Transport};
use crate::l2cap::ChannelId;
use crate::registry::{ContextIndex, InterfaceId, LinkStatus};
use log::{debug, error};
use std::collections::{BTreeSet, VecDeque};

/// Snapshot of a context handed to handlers and clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkInfo {
    pub index: ContextIndex,
    pub peer_addr: BdAddr,
    pub transport: Transport,
    pub cid: ChannelId,
    pub payload_size: u16,
}

/// State kept for one remote device on one transport
#[derive(Debug)]
pub struct ConnectionContext {
    pub index: ContextIndex,
    pub peer_addr: BdAddr,
    pub transport: Transport,
    /// Local CID of the primary channel; the fixed CID on LE
    pub channel_id: ChannelId,
    state: ChannelState,
    /// MTU offered by the peer during configuration
    pub peer_mtu: u16,
    /// Largest payload we may send
    pub payload_size: u16,
    /// Clients that need the link kept up
    pub held_by: BTreeSet<InterfaceId>,
    /// Result to report when a locally started disconnect completes
    pub pending_disconnect_result: Option<LinkStatus>,
    /// Losing channel of a connect collision, still to be torn down
    pub conflict_channel_id: Option<ChannelId>,
    pub congested: bool,
    /// Outbound commands waiting for the in-flight one to complete
    pub cmd_queue: VecDeque<Vec<u8>>,
    pub cmd_in_flight: bool,
    /// Whether the context ever reached OPEN
    pub was_open: bool,
}

impl ConnectionContext {
    pub fn new(
        index: ContextIndex,
        peer_addr: BdAddr,
        transport: Transport,
        channel_id: ChannelId,
        payload_size: u16,
    ) -> Self {
        Self {
            index,
            peer_addr,
            transport,
            channel_id,
            state: ChannelState::Closed,
            peer_mtu: payload_size,
            payload_size,
            held_by: BTreeSet::new(),
            pending_disconnect_result: None,
            conflict_channel_id: None,
            congested: false,
            cmd_queue: VecDeque::new(),
            cmd_in_flight: false,
            was_open: false,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Move along the state graph. Edges outside the graph are refused and
    /// logged; the state is left unchanged.
    pub fn set_state(&mut self, next: ChannelState) -> bool {
        if !self.state.can_transition_to(next) {
            error!(
                "{} {}: refusing transition {} -> {}",
                self.index, self.peer_addr, self.state, next
            );
            return false;
        }
        debug!(
            "{} {} cid {:#06x}: {} -> {}",
            self.index, self.peer_addr, self.channel_id, self.state, next
        );
        if next == ChannelState::Open {
            self.was_open = true;
        }
        self.state = next;
        true
    }

    /// LE links run over the fixed channel, which has no connect or
    /// configuration handshake.
    pub fn is_fixed(&self) -> bool {
        self.transport == Transport::Le
    }

    pub fn is_held(&self) -> bool {
        !self.held_by.is_empty()
    }

    pub fn link_info(&self) -> LinkInfo {
        LinkInfo {
            index: self.index,
            peer_addr: self.peer_addr,
            transport: self.transport,
            cid: self.channel_id,
            payload_size: self.payload_size,
        }
    }
}
