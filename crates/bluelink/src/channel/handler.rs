//! Seam between the channel core and the protocol riding on the channel

use super::context::LinkInfo;
use crate::l2cap::ChannelId;

/// What the core should do with an inbound PDU after the protocol handler
/// has looked at it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PduOutcome {
    /// Fully handled; nothing further to do
    Consumed,
    /// Send this PDU back on the same channel
    Reply(Vec<u8>),
    /// Answers the command in flight; the next queued command may go out
    CommandComplete,
    /// Hand the PDU to clients through `on_data`
    Deliver,
}

/// Protocol handler for PDUs arriving on an OPEN channel
pub trait PduHandler {
    fn handle_pdu(&mut self, link: &LinkInfo, cid: ChannelId, pdu: &[u8]) -> PduOutcome;
}
