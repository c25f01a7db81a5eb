//! Event queue feeding a `ChannelCore`
//!
//! Transport glue marshals every channel-layer callback onto one FIFO queue
//! per core. The core drains it on a single thread, so no state is shared
//! between cores and nothing inside a core needs locking.

use super::machine::ChannelCore;
use crate::gap::{BdAddr, Transport};
use crate::l2cap::{ChannelId, ConfigInfo, PSM};
use crate::registry::{ConnParams, LinkStatus};
use log::{debug, info, trace};
use std::sync::mpsc::{self, Receiver, Sender};

/// One callback from the channel layer, or a control message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    ConnectIndication {
        peer: BdAddr,
        cid: ChannelId,
        psm: PSM,
        identifier: u8,
    },
    ConnectConfirm {
        cid: ChannelId,
        result: u16,
    },
    ConfigIndication {
        cid: ChannelId,
        params: ConfigInfo,
    },
    ConfigConfirm {
        cid: ChannelId,
        result: u16,
        params: ConfigInfo,
    },
    DisconnectIndication {
        cid: ChannelId,
        ack_needed: bool,
    },
    Congestion {
        cid: ChannelId,
        congested: bool,
    },
    Data {
        cid: ChannelId,
        payload: Vec<u8>,
    },
    L2capError {
        cid: ChannelId,
        result: u16,
    },
    FixedConnected {
        peer: BdAddr,
        transport: Transport,
    },
    FixedDisconnected {
        peer: BdAddr,
        transport: Transport,
        reason: LinkStatus,
    },
    FixedData {
        peer: BdAddr,
        payload: Vec<u8>,
    },
    FixedCongestion {
        peer: BdAddr,
        congested: bool,
    },
    ConnectionTimedOut {
        peer: BdAddr,
    },
    ConnUpdate {
        peer: BdAddr,
        params: ConnParams,
        status: u8,
    },
    PhyUpdated {
        peer: BdAddr,
        tx_phy: u8,
        rx_phy: u8,
        status: u8,
    },
    /// The peer's resolvable private address resolved to `identity`
    Consolidate {
        identity: BdAddr,
        rpa: BdAddr,
    },
    /// Check idle timers against the clock
    IdleTick,
    /// Stop `run`
    Shutdown,
}

/// Cloneable sending side of a core's event queue
#[derive(Debug, Clone)]
pub struct CoreHandle {
    tx: Sender<CoreEvent>,
}

impl CoreHandle {
    /// Queue an event. Returns false once the core has stopped.
    pub fn send(&self, event: CoreEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Create an event queue for one core.
pub fn event_queue() -> (CoreHandle, Receiver<CoreEvent>) {
    let (tx, rx) = mpsc::channel();
    (CoreHandle { tx }, rx)
}

impl ChannelCore {
    /// Apply one event. Returns false for `Shutdown`.
    pub fn handle_event(&mut self, event: CoreEvent) -> bool {
        trace!("event {:?}", event);
        match event {
            CoreEvent::ConnectIndication {
                peer,
                cid,
                psm,
                identifier,
            } => self.on_connect_indication(peer, cid, psm, identifier),
            CoreEvent::ConnectConfirm { cid, result } => self.on_connect_confirm(cid, result),
            CoreEvent::ConfigIndication { cid, params } => {
                if let Some(accepted) = self.on_config_indication(cid, params) {
                    trace!("cid {:#06x} accepted config {:?}", cid, accepted);
                }
            }
            CoreEvent::ConfigConfirm {
                cid,
                result,
                params,
            } => self.on_config_confirm(cid, result, params),
            CoreEvent::DisconnectIndication { cid, ack_needed } => {
                self.on_disconnect_indication(cid, ack_needed)
            }
            CoreEvent::Congestion { cid, congested } => self.on_congestion(cid, congested),
            CoreEvent::Data { cid, payload } => self.on_data(cid, &payload),
            CoreEvent::L2capError { cid, result } => self.on_l2cap_error(cid, result),
            CoreEvent::FixedConnected { peer, transport } => {
                self.on_fixed_connected(peer, transport)
            }
            CoreEvent::FixedDisconnected {
                peer,
                transport,
                reason,
            } => self.on_fixed_disconnected(peer, transport, reason),
            CoreEvent::FixedData { peer, payload } => self.on_fixed_data(peer, &payload),
            CoreEvent::FixedCongestion { peer, congested } => {
                self.on_fixed_congestion(peer, congested)
            }
            CoreEvent::ConnectionTimedOut { peer } => self.on_connection_timed_out(peer),
            CoreEvent::ConnUpdate {
                peer,
                params,
                status,
            } => self.on_conn_update(peer, params, status),
            CoreEvent::PhyUpdated {
                peer,
                tx_phy,
                rx_phy,
                status,
            } => self.on_phy_updated(peer, tx_phy, rx_phy, status),
            CoreEvent::Consolidate { identity, rpa } => self.consolidate(identity, rpa),
            CoreEvent::IdleTick => self.on_idle_tick(),
            CoreEvent::Shutdown => {
                debug!("shutdown requested");
                return false;
            }
        }
        true
    }

    /// Drain `rx` in FIFO order until `Shutdown` or every handle is dropped.
    pub fn run(&mut self, rx: Receiver<CoreEvent>) {
        info!("channel core for PSM {} running", self.config.psm);
        while let Ok(event) = rx.recv() {
            if !self.handle_event(event) {
                break;
            }
        }
        info!("channel core for PSM {} stopped", self.config.psm);
    }
}
