//! AVCTP browsing channel relay
//!
//! The browsing channel runs over ERTM, so AVCTP fragmentation is not
//! allowed there; only single packets with a 3-byte header are accepted.
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! +---------------+-------+---+---+
//! | transaction   | type  |C/R|IPID|
//! +---------------+-------+---+---+
//! |        profile identifier       |  (big endian)
//! +---------------------------------+
//! ```

use crate::channel::{LinkInfo, PduHandler, PduOutcome};
use crate::l2cap::ChannelId;
use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};
use std::collections::BTreeSet;

/// AVCTP header length on the browsing channel
pub const AVCT_BROWSE_HDR_LEN: usize = 3;
/// Packet type field value for an unfragmented packet
pub const AVCT_PKT_TYPE_SINGLE: u8 = 0;
/// C/R bit value for commands
pub const AVCT_CMD: u8 = 0;
/// C/R bit value for responses
pub const AVCT_RSP: u8 = 1;
/// AV Remote Control profile identifier
pub const UUID_SERVCLASS_AV_REMOTE_CONTROL: u16 = 0x110E;

/// Decoded AVCTP browsing header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvctHeader {
    pub label: u8,
    pub packet_type: u8,
    pub cr: u8,
    pub ipid: bool,
    pub pid: u16,
}

impl AvctHeader {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < AVCT_BROWSE_HDR_LEN {
            return None;
        }
        let first = data[0];
        Some(Self {
            label: first >> 4,
            packet_type: (first >> 2) & 0x03,
            cr: (first >> 1) & 0x01,
            ipid: first & 0x01 != 0,
            pid: BigEndian::read_u16(&data[1..3]),
        })
    }

    pub fn serialize(&self) -> [u8; AVCT_BROWSE_HDR_LEN] {
        let mut buf = [0u8; AVCT_BROWSE_HDR_LEN];
        buf[0] = (self.label << 4)
            | ((self.packet_type & 0x03) << 2)
            | ((self.cr & 0x01) << 1)
            | self.ipid as u8;
        BigEndian::write_u16(&mut buf[1..3], self.pid);
        buf
    }

    pub fn is_command(&self) -> bool {
        self.cr == AVCT_CMD
    }
}

/// `PduHandler` for the browsing channel.
///
/// Commands for a profile nobody registered are bounced with IPID set;
/// everything else goes to clients unchanged.
#[derive(Debug, Clone)]
pub struct BrowsingRelay {
    pids: BTreeSet<u16>,
}

impl Default for BrowsingRelay {
    fn default() -> Self {
        Self::new([UUID_SERVCLASS_AV_REMOTE_CONTROL])
    }
}

impl BrowsingRelay {
    pub fn new(pids: impl IntoIterator<Item = u16>) -> Self {
        Self {
            pids: pids.into_iter().collect(),
        }
    }

    pub fn register_pid(&mut self, pid: u16) {
        self.pids.insert(pid);
    }

    pub fn is_registered(&self, pid: u16) -> bool {
        self.pids.contains(&pid)
    }
}

impl PduHandler for BrowsingRelay {
    fn handle_pdu(&mut self, link: &LinkInfo, cid: ChannelId, pdu: &[u8]) -> PduOutcome {
        let Some(header) = AvctHeader::parse(pdu) else {
            warn!("browsing PDU of {} bytes from {} too short", pdu.len(), link.peer_addr);
            return PduOutcome::Consumed;
        };
        if header.packet_type != AVCT_PKT_TYPE_SINGLE {
            warn!(
                "dropping fragmented browsing packet (type {}) on cid {:#06x}",
                header.packet_type, cid
            );
            return PduOutcome::Consumed;
        }

        if self.is_registered(header.pid) {
            return PduOutcome::Deliver;
        }
        if !header.is_command() {
            debug!("response for unregistered pid {:#06x} dropped", header.pid);
            return PduOutcome::Consumed;
        }

        debug!("rejecting command for unregistered pid {:#06x}", header.pid);
        let reply = AvctHeader {
            cr: AVCT_RSP,
            ipid: true,
            ..header
        };
        PduOutcome::Reply(reply.serialize().to_vec())
    }
}
