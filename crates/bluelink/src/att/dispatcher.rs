//! Routes inbound ATT PDUs to the local server, the local client, or the
//! signature verifier.

use super::constants::*;
use super::error::AttErrorCode;
use super::pdu::{classify, completes_command, Dispatch, ErrorResponse};
use crate::channel::{LinkInfo, PduHandler, PduOutcome};
use crate::l2cap::ChannelId;
use log::{error, trace, warn};

/// The GATT layers above the dispatcher.
pub trait AttHandler {
    /// Handle a request or command addressed to the local server. Returns the
    /// response PDU to send back on the same channel, if any.
    fn handle_request(
        &mut self,
        link: &LinkInfo,
        cid: ChannelId,
        opcode: u8,
        payload: &[u8],
    ) -> Option<Vec<u8>>;

    /// Handle a response, notification or indication addressed to the local
    /// client.
    fn handle_response(&mut self, link: &LinkInfo, cid: ChannelId, opcode: u8, payload: &[u8]);

    /// Verify the authentication signature of a signed write command and,
    /// if it checks out, apply the write.
    fn verify_signed_write(&mut self, link: &LinkInfo, cid: ChannelId, pdu: &[u8]);
}

/// `PduHandler` for ATT bearers
pub struct AttDispatcher<H> {
    handler: H,
}

impl<H: AttHandler> AttDispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}

impl<H: AttHandler> PduHandler for AttDispatcher<H> {
    fn handle_pdu(&mut self, link: &LinkInfo, cid: ChannelId, pdu: &[u8]) -> PduOutcome {
        match classify(pdu) {
            Dispatch::Empty => {
                warn!("ATT - invalid data length from {}, ignored", link.peer_addr);
                PduOutcome::Consumed
            }
            Dispatch::Unsupported { opcode } => {
                // GATT/SR/UNS/BI-01-C requires an error for unknown requests
                error!("ATT - unknown opcode {:#04x} from {}", opcode, link.peer_addr);
                let rsp = ErrorResponse::new(opcode, 0, AttErrorCode::RequestNotSupported);
                PduOutcome::Reply(rsp.serialize())
            }
            Dispatch::SignedWrite => {
                self.handler.verify_signed_write(link, cid, pdu);
                PduOutcome::Consumed
            }
            Dispatch::Request { opcode, payload } => {
                trace!("ATT request {:#04x} on cid {:#06x}", opcode, cid);
                match self.handler.handle_request(link, cid, opcode, payload) {
                    Some(rsp) => PduOutcome::Reply(rsp),
                    None => PduOutcome::Consumed,
                }
            }
            Dispatch::Response { opcode, payload } => {
                trace!("ATT response {:#04x} on cid {:#06x}", opcode, cid);
                self.handler.handle_response(link, cid, opcode, payload);
                if completes_command(opcode) {
                    PduOutcome::CommandComplete
                } else {
                    PduOutcome::Consumed
                }
            }
        }
    }
}

/// Server-only profiles that never originate requests can use this to answer
/// everything with "request not supported".
#[derive(Debug, Default)]
pub struct RejectAllRequests;

impl AttHandler for RejectAllRequests {
    fn handle_request(
        &mut self,
        _link: &LinkInfo,
        _cid: ChannelId,
        opcode: u8,
        _payload: &[u8],
    ) -> Option<Vec<u8>> {
        // Commands never get a response
        if opcode & ATT_CMD_FLAG != 0 || opcode == ATT_HANDLE_VALUE_CONF {
            return None;
        }
        Some(ErrorResponse::new(opcode, 0, AttErrorCode::RequestNotSupported).serialize())
    }

    fn handle_response(&mut self, _link: &LinkInfo, _cid: ChannelId, _opcode: u8, _payload: &[u8]) {}

    fn verify_signed_write(&mut self, _link: &LinkInfo, _cid: ChannelId, _pdu: &[u8]) {}
}
