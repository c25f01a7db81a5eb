//! ATT opcodes and framing sizes the dispatcher needs

/// Error Response
pub const ATT_ERROR_RSP: u8 = 0x01;
/// Read Request, and its response one above
pub const ATT_READ_REQ: u8 = 0x0A;
pub const ATT_READ_RSP: u8 = 0x0B;

// Server-initiated PDUs; they never answer a client command
pub const ATT_HANDLE_VALUE_NTF: u8 = 0x1B;
pub const ATT_HANDLE_VALUE_IND: u8 = 0x1D;
pub const ATT_MULTIPLE_HANDLE_VALUE_NTF: u8 = 0x23;

/// Handle Value Confirmation; client-to-server, but never answered
pub const ATT_HANDLE_VALUE_CONF: u8 = 0x1E;

pub const ATT_WRITE_CMD: u8 = 0x52;
pub const ATT_SIGNED_WRITE_CMD: u8 = 0xD2;

/// Command flag (bit 6): no response is ever sent
pub const ATT_CMD_FLAG: u8 = 0x40;
/// Authentication signature flag (bit 7)
pub const ATT_AUTH_SIGNATURE_FLAG: u8 = 0x80;
pub const ATT_WRITE_CMD_MASK: u8 = ATT_CMD_FLAG | ATT_AUTH_SIGNATURE_FLAG;

/// One past the highest opcode this engine understands, after masking
pub const ATT_OP_CODE_MAX: u8 = ATT_MULTIPLE_HANDLE_VALUE_NTF + 1;

/// Opcode (1) + request opcode (1) + handle (2) + error code (1)
pub const ATT_ERROR_RSP_LEN: usize = 5;
