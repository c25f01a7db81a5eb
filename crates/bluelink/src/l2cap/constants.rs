//! L2CAP constants used at the transport boundary

use super::types::ChannelId;

/// Null CID, never assigned to a channel
pub const L2CAP_NULL_CID: ChannelId = 0x0000;
/// Attribute Protocol fixed channel (LE)
pub const L2CAP_ATT_CID: ChannelId = 0x0004;

/// Default signalling MTU for BR/EDR channels
pub const L2CAP_DEFAULT_MTU: u16 = 672;
/// Default ATT MTU on the LE fixed channel
pub const L2CAP_LE_DEFAULT_MTU: u16 = 23;

/// Default platform buffer size (payload plus headroom)
pub const BT_DEFAULT_BUFFER_SIZE: u16 = 4096 + 16;
/// Headroom reserved in each buffer for L2CAP and HCI headers
pub const L2CAP_MIN_OFFSET: u16 = 13;
/// Size of the buffer descriptor header
pub const BT_HDR_SIZE: u16 = 8;

// Connection response result codes
pub const L2CAP_CONN_OK: u16 = 0x0000;
pub const L2CAP_CONN_PENDING: u16 = 0x0001;
pub const L2CAP_CONN_NO_PSM: u16 = 0x0002;
pub const L2CAP_CONN_SECURITY_BLOCK: u16 = 0x0003;
pub const L2CAP_CONN_NO_RESOURCES: u16 = 0x0004;
pub const L2CAP_CONN_TIMEOUT: u16 = 0xEEEE;

// Configuration response result codes
pub const L2CAP_CFG_OK: u16 = 0x0000;
pub const L2CAP_CFG_UNACCEPTABLE_PARAMS: u16 = 0x0001;
pub const L2CAP_CFG_FAILED_NO_REASON: u16 = 0x0002;
