//! Link hold tracking and the idle-disconnect policy

use super::machine::ChannelCore;
use super::state::ChannelState;
use crate::error::CoreResult;
use crate::registry::{ConnId, ContextIndex, InterfaceId};
use log::{debug, info};

impl ChannelCore {
    /// Acquire or release `interface`'s hold on a link. Returns whether the
    /// hold set was modified; re-acquiring a held link reports `true`
    /// without touching timers.
    ///
    /// Releasing the last hold arms the idle timer on a fixed channel and
    /// disconnects a dynamic channel right away.
    pub fn hold(&mut self, interface: InterfaceId, index: ContextIndex, acquire: bool) -> bool {
        let Some(ctx) = self.table.get_mut(index) else {
            return false;
        };
        let (peer, transport, fixed) = (ctx.peer_addr, ctx.transport, ctx.is_fixed());

        if acquire {
            let first = ctx.held_by.is_empty();
            if !ctx.held_by.insert(interface) {
                debug!("{} already holds {}", interface, index);
                return true;
            }
            debug!("{} holds {} ({:?})", interface, index, ctx.held_by);
            if first && fixed && self.l2cap.is_acl_connected(peer, transport) {
                self.idle.cancel(index);
            }
            return true;
        }

        if !ctx.held_by.remove(&interface) {
            return false;
        }
        debug!("{} released {} ({:?})", interface, index, ctx.held_by);
        if ctx.is_held() {
            return true;
        }

        if fixed {
            self.arm_idle_timer(index);
        } else {
            info!("no client needs {} to {}, disconnecting", index, peer);
            let _ = self.disconnect_context(index);
        }
        true
    }

    /// `hold` addressed by a client's connection id
    pub fn set_hold(&mut self, conn_id: ConnId, acquire: bool) -> CoreResult<bool> {
        let index = self.resolve(conn_id)?;
        Ok(self.hold(conn_id.interface_id(), index, acquire))
    }

    /// Disconnect links whose idle timer expired and that nobody held since.
    pub fn on_idle_tick(&mut self) {
        let now = self.clock.now();
        for index in self.idle.take_expired(now) {
            let Some(ctx) = self.table.get(index) else {
                continue;
            };
            if ctx.is_held() || ctx.state() == ChannelState::Closing {
                continue;
            }
            info!("{} to {} idle timeout", index, ctx.peer_addr);
            let _ = self.disconnect_context(index);
        }
    }
}
