//! Registered profile clients and event fan-out
//!
//! Clients occupy fixed slots; interface id N lives in slot N-1, so iterating
//! the slots visits clients in interface-id order. Every fan-out goes through
//! that iteration, which keeps callback order deterministic.

use super::client::{Capabilities, ConnParams, LinkStatus, ProfileClient};
use super::ids::{ConnId, ContextIndex, InterfaceId};
use crate::channel::LinkInfo;
use crate::error::{CoreError, CoreResult};
use crate::gap::{BdAddr, Transport};
use log::{debug, info, warn};
use std::collections::BTreeSet;

struct Registration {
    id: InterfaceId,
    client: Box<dyn ProfileClient + Send>,
    /// Links this client asked for that have not opened yet
    direct_connect: BTreeSet<(BdAddr, Transport)>,
}

/// Table of registered clients
pub struct ClientRegistry {
    slots: Vec<Option<Registration>>,
}

impl ClientRegistry {
    pub fn new(max_clients: usize) -> Self {
        let capacity = max_clients.min(u8::MAX as usize);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn register(&mut self, client: Box<dyn ProfileClient + Send>) -> CoreResult<InterfaceId> {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(CoreError::RegistryFull)?;

        let id = InterfaceId(slot as u8 + 1);
        info!("registered client {} with capabilities {:?}", id, client.capabilities());
        self.slots[slot] = Some(Registration {
            id,
            client,
            direct_connect: BTreeSet::new(),
        });
        Ok(id)
    }

    /// Remove a client. Returns the links it still had direct-connect intent for.
    pub fn deregister(&mut self, id: InterfaceId) -> CoreResult<Vec<(BdAddr, Transport)>> {
        let slot = self.slot_of(id)?;
        let registration = self.slots[slot]
            .take()
            .ok_or(CoreError::UnknownInterface(id))?;
        info!("deregistered client {}", id);
        Ok(registration.direct_connect.into_iter().collect())
    }

    pub fn is_registered(&self, id: InterfaceId) -> bool {
        self.get(id).is_some()
    }

    /// Registered interface ids in slot order
    pub fn ids(&self) -> Vec<InterfaceId> {
        self.slots.iter().flatten().map(|r| r.id).collect()
    }

    pub fn add_direct_connect(
        &mut self,
        id: InterfaceId,
        peer: BdAddr,
        transport: Transport,
    ) -> CoreResult<()> {
        let registration = self.get_mut(id).ok_or(CoreError::UnknownInterface(id))?;
        if registration.direct_connect.insert((peer, transport)) {
            debug!("{} added {} on {} to its direct connect list", id, peer, transport);
        }
        Ok(())
    }

    pub fn has_direct_connect(&self, id: InterfaceId, peer: BdAddr, transport: Transport) -> bool {
        self.get(id)
            .map(|r| r.direct_connect.contains(&(peer, transport)))
            .unwrap_or(false)
    }

    /// Clear every client's direct-connect intent for `peer` on `transport`,
    /// returning the clients that had one. Intents on the other transport stay.
    pub fn take_direct_connects(&mut self, peer: BdAddr, transport: Transport) -> Vec<InterfaceId> {
        let mut taken = Vec::new();
        for registration in self.slots.iter_mut().flatten() {
            if registration.direct_connect.remove(&(peer, transport)) {
                info!(
                    "removing {} on {} from the direct connect list of {}",
                    peer, transport, registration.id
                );
                taken.push(registration.id);
            }
        }
        taken
    }

    /// Fan out a connection result to every client listening for it.
    pub fn notify_connected(&mut self, link: &LinkInfo, status: LinkStatus) {
        for registration in self.slots.iter_mut().flatten() {
            Self::connected(registration, link, status);
        }
    }

    /// Report a connection result to one client only.
    pub fn notify_connected_to(&mut self, id: InterfaceId, link: &LinkInfo, status: LinkStatus) {
        match self.get_mut(id) {
            Some(registration) => Self::connected(registration, link, status),
            None => warn!("connected callback for unknown client {}", id),
        }
    }

    pub fn notify_disconnected(&mut self, link: &LinkInfo, reason: LinkStatus) {
        for registration in self.slots.iter_mut().flatten() {
            if !registration
                .client
                .capabilities()
                .contains(Capabilities::DISCONNECTED)
            {
                continue;
            }
            let conn_id = ConnId::new(link.index, registration.id);
            registration.client.on_disconnected(
                registration.id,
                link.peer_addr,
                conn_id,
                reason,
                link.transport,
            );
        }
    }

    pub fn notify_congestion(&mut self, index: ContextIndex, congested: bool) {
        for registration in self.slots.iter_mut().flatten() {
            if registration
                .client
                .capabilities()
                .contains(Capabilities::CONGESTION)
            {
                let conn_id = ConnId::new(index, registration.id);
                registration.client.on_congestion_changed(conn_id, congested);
            }
        }
    }

    pub fn notify_data(&mut self, index: ContextIndex, payload: &[u8]) {
        for registration in self.slots.iter_mut().flatten() {
            if registration.client.capabilities().contains(Capabilities::DATA) {
                let conn_id = ConnId::new(index, registration.id);
                registration.client.on_data(conn_id, payload);
            }
        }
    }

    pub fn notify_conn_update(&mut self, index: ContextIndex, params: ConnParams, status: u8) {
        for registration in self.slots.iter_mut().flatten() {
            if registration
                .client
                .capabilities()
                .contains(Capabilities::CONN_UPDATE)
            {
                let conn_id = ConnId::new(index, registration.id);
                registration
                    .client
                    .on_conn_update(registration.id, conn_id, params, status);
            }
        }
    }

    pub fn notify_phy_updated(&mut self, index: ContextIndex, tx_phy: u8, rx_phy: u8, status: u8) {
        for registration in self.slots.iter_mut().flatten() {
            if registration
                .client
                .capabilities()
                .contains(Capabilities::PHY_UPDATE)
            {
                let conn_id = ConnId::new(index, registration.id);
                registration
                    .client
                    .on_phy_updated(registration.id, conn_id, tx_phy, rx_phy, status);
            }
        }
    }

    fn connected(registration: &mut Registration, link: &LinkInfo, status: LinkStatus) {
        if !registration
            .client
            .capabilities()
            .contains(Capabilities::CONNECTED)
        {
            return;
        }
        let conn_id = ConnId::new(link.index, registration.id);
        registration.client.on_connected(
            registration.id,
            link.peer_addr,
            conn_id,
            status,
            link.transport,
        );
    }

    fn slot_of(&self, id: InterfaceId) -> CoreResult<usize> {
        match id.0 {
            0 => Err(CoreError::UnknownInterface(id)),
            n if n as usize > self.slots.len() => Err(CoreError::UnknownInterface(id)),
            n => Ok(n as usize - 1),
        }
    }

    fn get(&self, id: InterfaceId) -> Option<&Registration> {
        let slot = self.slot_of(id).ok()?;
        self.slots[slot].as_ref()
    }

    fn get_mut(&mut self, id: InterfaceId) -> Option<&mut Registration> {
        let slot = self.slot_of(id).ok()?;
        self.slots[slot].as_mut()
    }
}
