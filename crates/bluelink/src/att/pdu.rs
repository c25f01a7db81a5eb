//! ATT PDU framing: opcode classification and the error response

use super::constants::*;
use super::error::{AttError, AttErrorCode, AttResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Where an inbound PDU has to go, decided from its first byte alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch<'a> {
    /// Zero-length PDU
    Empty,
    /// Opcode outside the known range; answered with "request not supported"
    Unsupported { opcode: u8 },
    /// Signed write command; the signature has to be verified first
    SignedWrite,
    /// Even opcode: a request or command for the local server
    Request { opcode: u8, payload: &'a [u8] },
    /// Odd opcode: a response, notification or indication for the local client
    Response { opcode: u8, payload: &'a [u8] },
}

/// Classify an inbound ATT PDU.
///
/// The two most significant bits (signature and command flags) are masked
/// off for the range check only; the original opcode is what gets routed and
/// echoed back in error responses.
pub fn classify(pdu: &[u8]) -> Dispatch<'_> {
    let Some((&opcode, payload)) = pdu.split_first() else {
        return Dispatch::Empty;
    };

    let pseudo_opcode = opcode & !ATT_WRITE_CMD_MASK;
    if pseudo_opcode >= ATT_OP_CODE_MAX {
        return Dispatch::Unsupported { opcode };
    }

    if opcode == ATT_SIGNED_WRITE_CMD {
        return Dispatch::SignedWrite;
    }

    if opcode % 2 == 0 {
        Dispatch::Request { opcode, payload }
    } else {
        Dispatch::Response { opcode, payload }
    }
}

/// Whether a client-bound opcode answers an outstanding command, as opposed
/// to a server-initiated notification or indication.
pub fn completes_command(opcode: u8) -> bool {
    !matches!(
        opcode,
        ATT_HANDLE_VALUE_NTF | ATT_HANDLE_VALUE_IND | ATT_MULTIPLE_HANDLE_VALUE_NTF
    )
}

/// ATT Error Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Opcode of the request that failed
    pub request_opcode: u8,
    /// Attribute handle that caused the failure, 0 if none
    pub handle: u16,
    /// Reason
    pub error: AttErrorCode,
}

impl ErrorResponse {
    pub fn new(request_opcode: u8, handle: u16, error: AttErrorCode) -> Self {
        Self {
            request_opcode,
            handle,
            error,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ATT_ERROR_RSP_LEN);
        buf.push(ATT_ERROR_RSP);
        buf.push(self.request_opcode);
        // Writes into a Vec cannot fail
        let _ = buf.write_u16::<LittleEndian>(self.handle);
        buf.push(self.error.into());
        buf
    }

    pub fn parse(data: &[u8]) -> AttResult<Self> {
        if data.len() < ATT_ERROR_RSP_LEN {
            return Err(AttError::InvalidPdu {
                expected: ATT_ERROR_RSP_LEN,
                actual: data.len(),
            });
        }
        if data[0] != ATT_ERROR_RSP {
            return Err(AttError::UnexpectedOpcode(data[0]));
        }

        let mut cursor = Cursor::new(&data[2..4]);
        let handle = cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| AttError::InvalidPdu {
                expected: ATT_ERROR_RSP_LEN,
                actual: data.len(),
            })?;

        Ok(Self {
            request_opcode: data[1],
            handle,
            error: AttErrorCode::from(data[4]),
        })
    }
}
