//! Control-block table
//!
//! A dense arena of connection contexts with a side index from
//! (address, transport) to slot. The index is updated on every allocate,
//! free and rekey so the two never disagree.

use super::context::ConnectionContext;
use crate::error::{CoreError, CoreResult};
use crate::gap::{BdAddr, Transport};
use crate::l2cap::ChannelId;
use crate::registry::ContextIndex;
use log::{debug, warn};
use std::collections::HashMap;

/// Fixed-capacity table of connection contexts
#[derive(Debug)]
pub struct ControlBlockTable {
    slots: Vec<Option<ConnectionContext>>,
    by_addr: HashMap<(BdAddr, Transport), ContextIndex>,
}

impl ControlBlockTable {
    /// Create a table. Capacity is capped below 255; `ContextIndex(0xFF)`
    /// marks "no context".
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(ContextIndex::NONE.0 as usize);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            by_addr: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.by_addr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_addr.is_empty()
    }

    pub fn find_by_address(&self, addr: BdAddr, transport: Transport) -> Option<ContextIndex> {
        self.by_addr.get(&(addr, transport)).copied()
    }

    /// Find the context whose primary dynamic channel is `cid`. Fixed
    /// channels share one CID across links and are never matched.
    pub fn find_by_channel_id(&self, cid: ChannelId) -> Option<ContextIndex> {
        self.iter()
            .find(|ctx| !ctx.is_fixed() && ctx.channel_id == cid)
            .map(|ctx| ctx.index)
    }

    pub fn find_by_conflict_id(&self, cid: ChannelId) -> Option<ContextIndex> {
        self.iter()
            .find(|ctx| ctx.conflict_channel_id == Some(cid))
            .map(|ctx| ctx.index)
    }

    /// Allocate a context for `addr` on `transport`. An existing context for
    /// the pair is returned as is. There is no eviction.
    pub fn allocate(
        &mut self,
        addr: BdAddr,
        transport: Transport,
        channel_id: ChannelId,
        payload_size: u16,
    ) -> CoreResult<ContextIndex> {
        if let Some(index) = self.find_by_address(addr, transport) {
            warn!("{} already has {} on {}", addr, index, transport);
            return Ok(index);
        }

        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(CoreError::TableFull(self.slots.len()))?;

        let index = ContextIndex(slot as u8);
        self.slots[slot] = Some(ConnectionContext::new(
            index,
            addr,
            transport,
            channel_id,
            payload_size,
        ));
        self.by_addr.insert((addr, transport), index);
        debug!("allocated {} for {} on {}", index, addr, transport);
        Ok(index)
    }

    /// Release a slot, returning the context that occupied it.
    pub fn free(&mut self, index: ContextIndex) -> Option<ConnectionContext> {
        let ctx = self.slots.get_mut(index.0 as usize)?.take()?;
        self.by_addr.remove(&(ctx.peer_addr, ctx.transport));
        debug!("freed {} for {}", index, ctx.peer_addr);
        Some(ctx)
    }

    /// Point a context at a new peer address. Fails if another context
    /// already owns that address on the same transport.
    pub fn rekey(&mut self, index: ContextIndex, new_addr: BdAddr) -> bool {
        let Some(ctx) = self.slots.get_mut(index.0 as usize).and_then(Option::as_mut) else {
            return false;
        };
        let transport = ctx.transport;
        if self.by_addr.contains_key(&(new_addr, transport)) {
            return false;
        }
        self.by_addr.remove(&(ctx.peer_addr, transport));
        ctx.peer_addr = new_addr;
        self.by_addr.insert((new_addr, transport), index);
        true
    }

    pub fn get(&self, index: ContextIndex) -> Option<&ConnectionContext> {
        self.slots.get(index.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, index: ContextIndex) -> Option<&mut ConnectionContext> {
        self.slots.get_mut(index.0 as usize)?.as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionContext> {
        self.slots.iter().flatten()
    }
}
