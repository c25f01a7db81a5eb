//! The TX end of the channel layer, implemented by the L2CAP glue in
//! production and by a recording mock in tests.

use super::psm::PSM;
use super::types::{ChannelId, DataWriteResult};
use crate::gap::{BdAddr, Transport};

/// Requests the engine issues towards the channel layer.
///
/// None of these block: results of connect and disconnect requests arrive
/// later as callbacks on the engine's event queue.
pub trait L2capInterface {
    /// Open a dynamic channel to `peer`. Returns the allocated local CID, or
    /// `None` if the request could not be started.
    fn connect_req(&mut self, psm: PSM, peer: BdAddr) -> Option<ChannelId>;

    /// Request disconnection of a dynamic channel. Returns whether the request
    /// was accepted by the channel layer.
    fn disconnect_req(&mut self, cid: ChannelId) -> bool;

    /// Hand a PDU to the channel layer. `peer` addresses fixed channels, whose
    /// CID is shared by every link.
    fn data_write(&mut self, cid: ChannelId, peer: BdAddr, pdu: &[u8]) -> DataWriteResult;

    /// Start an LE connection that will surface on the fixed channel.
    fn create_le_connection(&mut self, peer: BdAddr) -> bool;

    /// Cancel an LE connection started by `create_le_connection`.
    fn cancel_le_connection(&mut self, peer: BdAddr) -> bool;

    /// Tear down a fixed channel to `peer`.
    fn remove_fixed_channel(&mut self, cid: ChannelId, peer: BdAddr) -> bool;

    /// Whether an ACL link to `peer` currently exists on `transport`.
    fn is_acl_connected(&self, peer: BdAddr, transport: Transport) -> bool;
}
