//! Channel core: per-link state machine driven by channel-layer callbacks
//!
//! This module provides the `ChannelCore` that handles:
//! - Dynamic channel connect, configure and disconnect callbacks
//! - Fixed channel (LE) connect and disconnect events
//! - Connect collisions between local and remote requests
//! - Client connect and disconnect requests
//! - Teardown and the fan-out of connection results
//!
//! Hold tracking lives in `lifecycle`, congestion and outbound data in
//! `congestion`, and the event queue in `event`.

use super::context::LinkInfo;
use super::handler::{PduHandler, PduOutcome};
use super::idle::{Clock, IdleTimers, SystemClock};
use super::state::ChannelState;
use super::table::ControlBlockTable;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::gap::{BdAddr, Transport};
use crate::l2cap::constants::*;
use crate::l2cap::{effective_mtu, ChannelId, ConfigInfo, ConnResult, L2capError, L2capInterface, PSM};
use crate::registry::{
    ClientRegistry, ConnId, ConnParams, ContextIndex, InterfaceId, LinkStatus, ProfileClient,
};
use log::{debug, error, info, trace, warn};

/// Protocol engine for one channel type (ATT or AVCTP browsing)
pub struct ChannelCore {
    pub(super) config: CoreConfig,
    pub(super) l2cap: Box<dyn L2capInterface + Send>,
    pub(super) handler: Box<dyn PduHandler + Send>,
    pub(super) clock: Box<dyn Clock + Send>,
    pub(super) table: ControlBlockTable,
    pub(super) registry: ClientRegistry,
    pub(super) idle: IdleTimers,
}

impl ChannelCore {
    pub fn new(
        config: CoreConfig,
        l2cap: Box<dyn L2capInterface + Send>,
        handler: Box<dyn PduHandler + Send>,
    ) -> Self {
        Self::with_clock(config, l2cap, handler, Box::new(SystemClock))
    }

    pub fn with_clock(
        config: CoreConfig,
        l2cap: Box<dyn L2capInterface + Send>,
        handler: Box<dyn PduHandler + Send>,
        clock: Box<dyn Clock + Send>,
    ) -> Self {
        info!(
            "channel core for PSM {} ({} links, {} clients)",
            config.psm, config.max_links, config.max_clients
        );
        Self {
            table: ControlBlockTable::new(config.max_links),
            registry: ClientRegistry::new(config.max_clients),
            idle: IdleTimers::new(),
            config,
            l2cap,
            handler,
            clock,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn table(&self) -> &ControlBlockTable {
        &self.table
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn idle_timers(&self) -> &IdleTimers {
        &self.idle
    }

    // ----- Clients -----

    pub fn register(&mut self, client: Box<dyn ProfileClient + Send>) -> CoreResult<InterfaceId> {
        self.registry.register(client)
    }

    /// Remove a client, releasing the holds it had on every link.
    pub fn deregister(&mut self, interface: InterfaceId) -> CoreResult<()> {
        if !self.registry.is_registered(interface) {
            return Err(CoreError::UnknownInterface(interface));
        }

        let held: Vec<ContextIndex> = self
            .table
            .iter()
            .filter(|ctx| ctx.held_by.contains(&interface))
            .map(|ctx| ctx.index)
            .collect();
        for index in held {
            self.hold(interface, index, false);
        }

        let dropped = self.registry.deregister(interface)?;
        if !dropped.is_empty() {
            debug!("{} dropped direct connects to {:?}", interface, dropped);
        }
        Ok(())
    }

    /// Connect to `peer` on behalf of `interface`.
    ///
    /// An OPEN link is shared with the caller right away. Otherwise the
    /// caller's intent is recorded and resolved when the link opens.
    pub fn connect(
        &mut self,
        interface: InterfaceId,
        peer: BdAddr,
        transport: Transport,
    ) -> CoreResult<()> {
        if !self.registry.is_registered(interface) {
            return Err(CoreError::UnknownInterface(interface));
        }
        self.check_transport(transport)?;

        if let Some(index) = self.table.find_by_address(peer, transport) {
            return self.connect_existing(interface, index);
        }

        let (channel_id, payload_size) = match transport {
            Transport::Le => (
                self.config.fixed_cid.unwrap_or(L2CAP_NULL_CID),
                self.config.le_default_mtu,
            ),
            Transport::BrEdr => (L2CAP_NULL_CID, L2CAP_DEFAULT_MTU),
        };
        let index = match self.table.allocate(peer, transport, channel_id, payload_size) {
            Ok(index) => index,
            Err(err) => {
                error!("no free control block for {} on {}", peer, transport);
                let link = LinkInfo {
                    index: ContextIndex::NONE,
                    peer_addr: peer,
                    transport,
                    cid: L2CAP_NULL_CID,
                    payload_size,
                };
                self.registry
                    .notify_connected_to(interface, &link, LinkStatus::NoResources);
                return Err(err);
            }
        };
        self.registry.add_direct_connect(interface, peer, transport)?;

        let started = match transport {
            Transport::BrEdr => match self.l2cap.connect_req(self.config.psm, peer) {
                Some(cid) => {
                    if let Some(ctx) = self.table.get_mut(index) {
                        ctx.channel_id = cid;
                        ctx.set_state(ChannelState::Connecting);
                    }
                    Ok(())
                }
                None => Err(L2capError::ConnectRefused(self.config.psm.value())),
            },
            Transport::Le => {
                if let Some(ctx) = self.table.get_mut(index) {
                    ctx.set_state(ChannelState::Connecting);
                }
                if self.l2cap.create_le_connection(peer) {
                    Ok(())
                } else {
                    Err(L2capError::LeConnectRefused(peer.to_string()))
                }
            }
        };

        if let Err(err) = started {
            warn!("connect to {} on {} failed: {}", peer, transport, err);
            self.registry.take_direct_connects(peer, transport);
            self.table.free(index);
            return Err(err.into());
        }
        info!("{} connecting to {} on {}", interface, peer, transport);
        Ok(())
    }

    fn connect_existing(&mut self, interface: InterfaceId, index: ContextIndex) -> CoreResult<()> {
        let Some(ctx) = self.table.get(index) else {
            return Err(CoreError::UnknownConnection(ConnId::new(index, interface)));
        };
        let peer = ctx.peer_addr;
        let transport = ctx.transport;
        match ctx.state() {
            ChannelState::Open => {
                debug!("{} joining open link to {}", interface, peer);
                let link = ctx.link_info();
                self.hold(interface, index, true);
                self.registry
                    .notify_connected_to(interface, &link, LinkStatus::Ok);
                Ok(())
            }
            ChannelState::Closing => {
                warn!("link to {} is disconnecting, refusing connect", peer);
                Err(CoreError::Closing)
            }
            _ => self.registry.add_direct_connect(interface, peer, transport),
        }
    }

    /// Start a local disconnect of the link behind `conn_id`.
    pub fn disconnect(&mut self, conn_id: ConnId) -> CoreResult<()> {
        let index = self.resolve(conn_id)?;
        self.disconnect_context(index)
    }

    /// Local disconnect. Idempotent while CLOSING.
    pub(super) fn disconnect_context(&mut self, index: ContextIndex) -> CoreResult<()> {
        let Some(ctx) = self.table.get_mut(index) else {
            return Ok(());
        };
        let (peer, cid, fixed, state) = (ctx.peer_addr, ctx.channel_id, ctx.is_fixed(), ctx.state());

        match state {
            ChannelState::Closing => {
                debug!("{} already closing", index);
                Ok(())
            }
            ChannelState::Closed => {
                self.cleanup(index, LinkStatus::LocalHostTerminated);
                Ok(())
            }
            ChannelState::Connecting if fixed => {
                if !self.l2cap.cancel_le_connection(peer) {
                    warn!("unable to cancel LE connection to {}", peer);
                }
                self.cleanup(index, LinkStatus::LocalHostTerminated);
                Ok(())
            }
            _ if fixed => {
                ctx.set_state(ChannelState::Closing);
                if !self.l2cap.remove_fixed_channel(cid, peer) {
                    warn!("unable to remove fixed channel {:#06x} to {}", cid, peer);
                    let reason = self.pending_result(index);
                    self.cleanup(index, reason);
                }
                Ok(())
            }
            _ => {
                ctx.set_state(ChannelState::Closing);
                if !self.l2cap.disconnect_req(cid) {
                    warn!("unable to send disconnect request for cid {:#06x}", cid);
                    let reason = self.pending_result(index);
                    self.cleanup(index, reason);
                }
                Ok(())
            }
        }
    }

    // ----- Dynamic channel callbacks -----

    pub fn on_connect_indication(&mut self, peer: BdAddr, cid: ChannelId, psm: PSM, identifier: u8) {
        debug!(
            "connect indication from {} cid {:#06x} psm {} id {}",
            peer, cid, psm, identifier
        );
        if psm != self.config.psm || !self.config.over_br_enabled {
            warn!("connect indication for psm {} not served here", psm);
            self.reject(cid);
            return;
        }

        let index = match self.table.find_by_address(peer, Transport::BrEdr) {
            Some(index) => index,
            None => match self
                .table
                .allocate(peer, Transport::BrEdr, cid, L2CAP_DEFAULT_MTU)
            {
                Ok(index) => index,
                Err(err) => {
                    error!("rejecting {} cid {:#06x}: {}", peer, cid, err);
                    self.reject(cid);
                    return;
                }
            },
        };

        let Some(ctx) = self.table.get_mut(index) else {
            return;
        };
        match ctx.state() {
            ChannelState::Closed => {
                ctx.channel_id = cid;
                ctx.set_state(ChannelState::Connecting);
                ctx.set_state(ChannelState::Configuring);
            }
            ChannelState::Connecting => {
                // Our own request is still outstanding; the peer's channel wins
                debug!(
                    "collision with {}: cid {:#06x} primary, {:#06x} conflict",
                    peer, cid, ctx.channel_id
                );
                ctx.conflict_channel_id = Some(ctx.channel_id);
                ctx.channel_id = cid;
                ctx.set_state(ChannelState::Configuring);
            }
            ChannelState::Configuring if ctx.conflict_channel_id.is_none() => {
                debug!("collision with {}: cid {:#06x} conflict", peer, cid);
                ctx.conflict_channel_id = Some(cid);
            }
            state => {
                warn!("rejecting {} cid {:#06x} in state {}", peer, cid, state);
                self.reject(cid);
            }
        }
    }

    pub fn on_connect_confirm(&mut self, cid: ChannelId, result: u16) {
        let result = ConnResult(result);
        if result.0 == L2CAP_CONN_PENDING {
            trace!("connect pending on cid {:#06x}", cid);
            return;
        }
        let Some(index) = self.table.find_by_channel_id(cid) else {
            if let Some(index) = self.table.find_by_conflict_id(cid) {
                if result.is_ok() {
                    debug!("peer accepted conflicting cid {:#06x}, disconnecting it", cid);
                    self.send_disconnect_req(cid);
                }
                self.clear_conflict(index);
            } else {
                debug!("connect confirm for stale cid {:#06x}", cid);
            }
            return;
        };

        let state = self.table.get(index).map(|ctx| ctx.state());
        match state {
            Some(ChannelState::Connecting) if result.is_ok() => {
                if let Some(ctx) = self.table.get_mut(index) {
                    ctx.set_state(ChannelState::Configuring);
                }
            }
            Some(ChannelState::Connecting) => {
                error!("connect on cid {:#06x} failed: {}", cid, result);
                self.cleanup(index, LinkStatus::L2capFailure(result.0));
            }
            Some(ChannelState::Closing) if result.is_ok() => {
                // Disconnect was requested before the channel came up
                self.send_disconnect_req(cid);
            }
            Some(ChannelState::Closing) => {
                let reason = self.pending_result(index);
                self.cleanup(index, reason);
            }
            Some(state) => warn!("connect confirm on cid {:#06x} in state {}", cid, state),
            None => {}
        }
    }

    /// Record the peer's configuration and return what we accept.
    pub fn on_config_indication(&mut self, cid: ChannelId, params: ConfigInfo) -> Option<ConfigInfo> {
        if let Some(index) = self.table.find_by_channel_id(cid) {
            self.apply_peer_config(index, params);
        } else if self.table.find_by_conflict_id(cid).is_none() {
            debug!("config indication for stale cid {:#06x}", cid);
            return None;
        }
        Some(ConfigInfo {
            mtu: params.mtu,
            flush_timeout: None,
            mode: Some(self.config.preferred_mode),
        })
    }

    pub fn on_config_confirm(&mut self, cid: ChannelId, result: u16, params: ConfigInfo) {
        let Some(index) = self.table.find_by_channel_id(cid) else {
            if let Some(index) = self.table.find_by_conflict_id(cid) {
                if result == L2CAP_CFG_OK {
                    debug!("conflicting cid {:#06x} configured, disconnecting it", cid);
                    self.send_disconnect_req(cid);
                }
                self.clear_conflict(index);
            } else {
                debug!("config confirm for stale cid {:#06x}", cid);
            }
            return;
        };

        if result != L2CAP_CFG_OK {
            self.on_l2cap_error(cid, result);
            return;
        }
        self.apply_peer_config(index, params);

        match self.table.get(index).map(|ctx| ctx.state()) {
            Some(ChannelState::Configuring) => self.open_context(index),
            Some(state) => debug!("config confirm on cid {:#06x} in state {}", cid, state),
            None => {}
        }
    }

    pub fn on_disconnect_indication(&mut self, cid: ChannelId, ack_needed: bool) {
        trace!("disconnect indication cid {:#06x} ack {}", cid, ack_needed);
        let Some(index) = self.table.find_by_channel_id(cid) else {
            if let Some(index) = self.table.find_by_conflict_id(cid) {
                debug!("conflicting cid {:#06x} disconnected", cid);
                self.clear_conflict(index);
            } else {
                debug!("disconnect indication for stale cid {:#06x}", cid);
            }
            return;
        };

        let reason = match self.table.get(index).map(|ctx| ctx.state()) {
            Some(ChannelState::Closing) => self.pending_result(index),
            _ => LinkStatus::PeerTerminated,
        };
        self.cleanup(index, reason);
    }

    /// Connect or configuration failure reported without a disconnect
    /// indication. `result` is forwarded to clients unchanged.
    pub fn on_l2cap_error(&mut self, cid: ChannelId, result: u16) {
        let Some(index) = self.table.find_by_channel_id(cid) else {
            if let Some(index) = self.table.find_by_conflict_id(cid) {
                debug!("error {:#06x} on conflicting cid {:#06x}", result, cid);
                self.clear_conflict(index);
            }
            return;
        };
        error!("L2CAP error {:#06x} on cid {:#06x}", result, cid);

        match self.table.get(index).map(|ctx| ctx.state()) {
            Some(ChannelState::Connecting) => {
                self.cleanup(index, LinkStatus::L2capFailure(result));
            }
            Some(ChannelState::Closing) => {
                let reason = self
                    .table
                    .get(index)
                    .and_then(|ctx| ctx.pending_disconnect_result)
                    .unwrap_or(LinkStatus::L2capFailure(result));
                self.cleanup(index, reason);
            }
            Some(_) => {
                if let Some(ctx) = self.table.get_mut(index) {
                    ctx.pending_disconnect_result = Some(LinkStatus::L2capFailure(result));
                }
                let _ = self.disconnect_context(index);
            }
            None => {}
        }
    }

    pub fn on_data(&mut self, cid: ChannelId, payload: &[u8]) {
        let Some(index) = self.table.find_by_channel_id(cid) else {
            debug!("dropping {} bytes on unknown cid {:#06x}", payload.len(), cid);
            return;
        };
        self.deliver(index, cid, payload);
    }

    // ----- Fixed channel events -----

    pub fn on_fixed_connected(&mut self, peer: BdAddr, transport: Transport) {
        if transport != Transport::Le {
            warn!("ignoring fixed channel connect from {} on {}", peer, transport);
            return;
        }
        let Some(fixed_cid) = self.config.fixed_cid else {
            warn!("no fixed channel served, ignoring {}", peer);
            return;
        };

        let index = match self.table.find_by_address(peer, Transport::Le) {
            Some(index) => index,
            None => match self
                .table
                .allocate(peer, Transport::Le, fixed_cid, self.config.le_default_mtu)
            {
                Ok(index) => index,
                Err(err) => {
                    error!("disconnecting {}: {}", peer, err);
                    self.l2cap.remove_fixed_channel(fixed_cid, peer);
                    return;
                }
            },
        };

        let Some(ctx) = self.table.get_mut(index) else {
            return;
        };
        match ctx.state() {
            ChannelState::Closed => {
                ctx.set_state(ChannelState::Connecting);
                self.open_context(index);
            }
            ChannelState::Connecting => self.open_context(index),
            state => debug!("fixed channel to {} already {}", peer, state),
        }
    }

    pub fn on_fixed_disconnected(&mut self, peer: BdAddr, transport: Transport, reason: LinkStatus) {
        if transport != Transport::Le {
            return;
        }
        let Some(index) = self.table.find_by_address(peer, Transport::Le) else {
            debug!("fixed disconnect for unknown {}", peer);
            return;
        };
        let reason = match self.table.get(index) {
            Some(ctx) if ctx.state() == ChannelState::Closing => {
                ctx.pending_disconnect_result.unwrap_or(reason)
            }
            _ => reason,
        };
        self.cleanup(index, reason);
    }

    pub fn on_fixed_data(&mut self, peer: BdAddr, payload: &[u8]) {
        let Some(index) = self.table.find_by_address(peer, Transport::Le) else {
            debug!("dropping {} bytes from unknown {}", payload.len(), peer);
            return;
        };
        let cid = self.config.fixed_cid.unwrap_or(L2CAP_NULL_CID);
        self.deliver(index, cid, payload);
    }

    pub fn on_connection_timed_out(&mut self, peer: BdAddr) {
        info!("connection to {} timed out", peer);
        self.on_fixed_disconnected(peer, Transport::Le, LinkStatus::ConnectionTimeout);
    }

    pub fn on_conn_update(&mut self, peer: BdAddr, params: ConnParams, status: u8) {
        match self.table.find_by_address(peer, Transport::Le) {
            Some(index) => self.registry.notify_conn_update(index, params, status),
            None => warn!("connection update for unknown {}", peer),
        }
    }

    pub fn on_phy_updated(&mut self, peer: BdAddr, tx_phy: u8, rx_phy: u8, status: u8) {
        match self.table.find_by_address(peer, Transport::Le) {
            Some(index) => self.registry.notify_phy_updated(index, tx_phy, rx_phy, status),
            None => warn!("PHY update for unknown {}", peer),
        }
    }

    /// The resolvable private address `rpa` resolved to `identity`. Rekey the
    /// link and tell clients about it under its identity address.
    pub fn consolidate(&mut self, identity: BdAddr, rpa: BdAddr) {
        let Some(index) = self.table.find_by_address(rpa, Transport::Le) else {
            return;
        };
        if !self.table.rekey(index, identity) {
            warn!("cannot consolidate {} into {}: address in use", rpa, identity);
            return;
        }
        info!("consolidated {} into {}", rpa, identity);
        if let Some(ctx) = self.table.get(index) {
            if ctx.state() == ChannelState::Open {
                let link = ctx.link_info();
                self.registry.notify_connected(&link, LinkStatus::Ok);
            }
        }
    }

    // ----- Internals -----

    /// OPEN the context: resolve direct connects, tell every client, then
    /// apply the idle policy for fixed channels.
    fn open_context(&mut self, index: ContextIndex) {
        let Some(ctx) = self.table.get_mut(index) else {
            return;
        };
        if !ctx.set_state(ChannelState::Open) {
            return;
        }
        let link = ctx.link_info();
        info!("{} open to {} on {}, payload {}", index, link.peer_addr, link.transport, link.payload_size);

        for interface in self.registry.take_direct_connects(link.peer_addr, link.transport) {
            self.hold(interface, index, true);
        }
        self.registry.notify_connected(&link, LinkStatus::Ok);

        let Some(ctx) = self.table.get(index) else {
            return;
        };
        if ctx.is_fixed() && ctx.state() == ChannelState::Open {
            if ctx.is_held() {
                self.idle.cancel(index);
            } else {
                self.arm_idle_timer(index);
            }
        }
    }

    /// Final teardown: CLOSED, queue dropped, clients told, slot freed.
    pub(super) fn cleanup(&mut self, index: ContextIndex, reason: LinkStatus) {
        let Some(ctx) = self.table.get_mut(index) else {
            return;
        };
        if ctx.state() != ChannelState::Closed {
            ctx.set_state(ChannelState::Closed);
        }
        ctx.cmd_queue.clear();
        ctx.cmd_in_flight = false;
        let conflict = ctx.conflict_channel_id.take();
        let was_open = ctx.was_open;
        let link = ctx.link_info();

        if let Some(conflict) = conflict {
            self.send_disconnect_req(conflict);
        }
        self.idle.cancel(index);
        self.registry
            .take_direct_connects(link.peer_addr, link.transport);

        info!("{} to {} closed: {}", index, link.peer_addr, reason);
        if was_open {
            self.registry.notify_disconnected(&link, reason);
        } else {
            self.registry.notify_connected(&link, reason);
        }
        self.table.free(index);
    }

    /// Route an inbound PDU through the protocol handler.
    fn deliver(&mut self, index: ContextIndex, cid: ChannelId, payload: &[u8]) {
        let Some(ctx) = self.table.get(index) else {
            return;
        };
        if ctx.state() != ChannelState::Open {
            warn!(
                "dropping {} bytes on cid {:#06x} in state {}",
                payload.len(),
                cid,
                ctx.state()
            );
            return;
        }
        let link = ctx.link_info();
        trace!("rx {} cid {:#06x}: {}", link.peer_addr, cid, hex::encode(payload));

        match self.handler.handle_pdu(&link, cid, payload) {
            PduOutcome::Consumed => {}
            PduOutcome::Reply(rsp) => {
                trace!("tx {} cid {:#06x}: {}", link.peer_addr, cid, hex::encode(&rsp));
                if let Err(err) = self.write_pdu(index, &rsp) {
                    warn!("{} reply dropped: {}", index, err);
                }
            }
            PduOutcome::CommandComplete => self.command_complete(index),
            PduOutcome::Deliver => self.registry.notify_data(index, payload),
        }
    }

    fn apply_peer_config(&mut self, index: ContextIndex, params: ConfigInfo) {
        let max_payload = self.config.max_payload_size();
        let default_mtu = self.config.default_mtu;
        if let Some(ctx) = self.table.get_mut(index) {
            ctx.peer_mtu = params.mtu.unwrap_or(L2CAP_DEFAULT_MTU);
            ctx.payload_size = effective_mtu(params.mtu, default_mtu, max_payload);
            debug!(
                "{} peer mtu {} payload size {}",
                index, ctx.peer_mtu, ctx.payload_size
            );
        }
    }

    pub(super) fn arm_idle_timer(&mut self, index: ContextIndex) {
        let deadline = self.clock.now() + self.config.idle_timeout_when_no_app;
        debug!("{} idle, disconnecting in {:?}", index, self.config.idle_timeout_when_no_app);
        self.idle.arm(index, deadline);
    }

    pub(super) fn resolve(&self, conn_id: ConnId) -> CoreResult<ContextIndex> {
        let interface = conn_id.interface_id();
        if !self.registry.is_registered(interface) {
            return Err(CoreError::UnknownInterface(interface));
        }
        let index = conn_id.context_index();
        self.table
            .get(index)
            .map(|ctx| ctx.index)
            .ok_or(CoreError::UnknownConnection(conn_id))
    }

    fn check_transport(&self, transport: Transport) -> CoreResult<()> {
        let supported = match transport {
            Transport::Le => self.config.fixed_cid.is_some(),
            Transport::BrEdr => self.config.over_br_enabled,
        };
        if supported {
            Ok(())
        } else {
            Err(CoreError::UnsupportedTransport(transport))
        }
    }

    fn pending_result(&self, index: ContextIndex) -> LinkStatus {
        self.table
            .get(index)
            .and_then(|ctx| ctx.pending_disconnect_result)
            .unwrap_or(LinkStatus::LocalHostTerminated)
    }

    fn clear_conflict(&mut self, index: ContextIndex) {
        if let Some(ctx) = self.table.get_mut(index) {
            ctx.conflict_channel_id = None;
        }
    }

    fn reject(&mut self, cid: ChannelId) {
        self.send_disconnect_req(cid);
    }

    fn send_disconnect_req(&mut self, cid: ChannelId) {
        if !self.l2cap.disconnect_req(cid) {
            warn!("unable to send disconnect request for cid {:#06x}", cid);
        }
    }
}
