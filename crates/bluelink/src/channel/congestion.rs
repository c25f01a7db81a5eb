//! Congestion relay and outbound data
//!
//! One command per context may be in flight. The next queued command goes
//! out when the handler reports the in-flight one complete, or when the
//! channel leaves congestion. The latter happens before clients hear about
//! the uncongested state.

use super::machine::ChannelCore;
use super::state::ChannelState;
use crate::error::{CoreError, CoreResult};
use crate::gap::{BdAddr, Transport};
use crate::l2cap::{ChannelId, DataWriteResult, L2capError};
use crate::registry::{ConnId, ContextIndex};
use log::{debug, trace, warn};

impl ChannelCore {
    /// Congestion indication for a dynamic channel.
    pub fn on_congestion(&mut self, cid: ChannelId, congested: bool) {
        match self.table.find_by_channel_id(cid) {
            Some(index) => self.congestion_changed(index, congested),
            None => debug!("congestion for unknown cid {:#06x}", cid),
        }
    }

    /// Congestion indication for the fixed channel to `peer`.
    pub fn on_fixed_congestion(&mut self, peer: BdAddr, congested: bool) {
        match self.table.find_by_address(peer, Transport::Le) {
            Some(index) => self.congestion_changed(index, congested),
            None => debug!("congestion for unknown {}", peer),
        }
    }

    fn congestion_changed(&mut self, index: ContextIndex, congested: bool) {
        let Some(ctx) = self.table.get_mut(index) else {
            return;
        };
        if !ctx.state().is_established() {
            debug!("{} congestion {} ignored in state {}", index, congested, ctx.state());
            return;
        }
        debug!("{} congested: {}", index, congested);
        ctx.congested = congested;

        if !congested {
            self.send_next_queued(index);
        }
        self.registry.notify_congestion(index, congested);
    }

    /// Write `pdu` immediately. Fails while the channel is congested.
    pub fn send(&mut self, conn_id: ConnId, pdu: &[u8]) -> CoreResult<()> {
        let index = self.resolve(conn_id)?;
        self.check_writable(index, pdu.len())?;
        if self.table.get(index).map(|ctx| ctx.congested).unwrap_or(false) {
            return Err(CoreError::Congested);
        }
        self.write_pdu(index, pdu)
    }

    /// Queue a command that expects a response. At most one is in flight.
    pub fn queue_command(&mut self, conn_id: ConnId, pdu: Vec<u8>) -> CoreResult<()> {
        let index = self.resolve(conn_id)?;
        self.check_writable(index, pdu.len())?;

        let max_queued = self.config.max_queued_commands;
        let Some(ctx) = self.table.get_mut(index) else {
            return Err(CoreError::UnknownConnection(conn_id));
        };
        if ctx.cmd_queue.len() >= max_queued {
            return Err(CoreError::QueueFull(ctx.cmd_queue.len()));
        }
        ctx.cmd_queue.push_back(pdu);
        trace!("{} queued command, {} pending", index, ctx.cmd_queue.len());

        if !ctx.cmd_in_flight && !ctx.congested {
            self.send_next_queued(index);
        }
        Ok(())
    }

    /// Send the next queued command if none is in flight. Returns whether one
    /// was sent.
    pub(super) fn send_next_queued(&mut self, index: ContextIndex) -> bool {
        let Some(ctx) = self.table.get_mut(index) else {
            return false;
        };
        if ctx.cmd_in_flight {
            return false;
        }
        let Some(pdu) = ctx.cmd_queue.pop_front() else {
            return false;
        };
        match self.write_pdu(index, &pdu) {
            Ok(()) => {
                if let Some(ctx) = self.table.get_mut(index) {
                    ctx.cmd_in_flight = true;
                }
                true
            }
            Err(err) => {
                warn!("{} dropped queued command: {}", index, err);
                false
            }
        }
    }

    pub(super) fn command_complete(&mut self, index: ContextIndex) {
        if let Some(ctx) = self.table.get_mut(index) {
            ctx.cmd_in_flight = false;
        }
        self.send_next_queued(index);
    }

    /// Hand a PDU to the channel layer on the context's channel.
    pub(super) fn write_pdu(&mut self, index: ContextIndex, pdu: &[u8]) -> CoreResult<()> {
        let Some(ctx) = self.table.get_mut(index) else {
            return Ok(());
        };
        let (cid, peer) = (ctx.channel_id, ctx.peer_addr);
        match self.l2cap.data_write(cid, peer, pdu) {
            DataWriteResult::Success => Ok(()),
            DataWriteResult::Congested => {
                ctx.congested = true;
                Ok(())
            }
            DataWriteResult::Failed => Err(L2capError::WriteFailed(cid).into()),
        }
    }

    fn check_writable(&self, index: ContextIndex, len: usize) -> CoreResult<()> {
        let Some(ctx) = self.table.get(index) else {
            return Ok(());
        };
        match ctx.state() {
            ChannelState::Open => {}
            ChannelState::Closing => return Err(CoreError::Closing),
            state => return Err(CoreError::NotOpen(state)),
        }
        if len > ctx.payload_size as usize {
            return Err(CoreError::MtuExceeded {
                len,
                mtu: ctx.payload_size,
            });
        }
        Ok(())
    }
}
