//! ATT error codes and PDU decoding errors

use thiserror::Error;

/// Error code carried in an ATT Error Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttErrorCode {
    InvalidHandle,
    ReadNotPermitted,
    WriteNotPermitted,
    InvalidPdu,
    InsufficientAuthentication,
    RequestNotSupported,
    InvalidOffset,
    InsufficientAuthorization,
    PrepareQueueFull,
    AttributeNotFound,
    AttributeNotLong,
    InsufficientEncryptionKeySize,
    InvalidAttributeValueLength,
    Unlikely,
    InsufficientEncryption,
    UnsupportedGroupType,
    InsufficientResources,
    DatabaseOutOfSync,
    ValueNotAllowed,
    /// 0x80..=0x9F, defined by the higher layer
    Application(u8),
    /// 0xE0..=0xFF, common profile and service error codes
    CommonProfile(u8),
    /// Anything else; reserved for future use
    Reserved(u8),
}

/// Codes 0x01..=0x13 in order
const DEFINED: [AttErrorCode; 19] = [
    AttErrorCode::InvalidHandle,
    AttErrorCode::ReadNotPermitted,
    AttErrorCode::WriteNotPermitted,
    AttErrorCode::InvalidPdu,
    AttErrorCode::InsufficientAuthentication,
    AttErrorCode::RequestNotSupported,
    AttErrorCode::InvalidOffset,
    AttErrorCode::InsufficientAuthorization,
    AttErrorCode::PrepareQueueFull,
    AttErrorCode::AttributeNotFound,
    AttErrorCode::AttributeNotLong,
    AttErrorCode::InsufficientEncryptionKeySize,
    AttErrorCode::InvalidAttributeValueLength,
    AttErrorCode::Unlikely,
    AttErrorCode::InsufficientEncryption,
    AttErrorCode::UnsupportedGroupType,
    AttErrorCode::InsufficientResources,
    AttErrorCode::DatabaseOutOfSync,
    AttErrorCode::ValueNotAllowed,
];

impl From<u8> for AttErrorCode {
    fn from(code: u8) -> Self {
        match code {
            0x01..=0x13 => DEFINED[usize::from(code - 1)],
            0x80..=0x9F => AttErrorCode::Application(code),
            0xE0..=0xFF => AttErrorCode::CommonProfile(code),
            _ => AttErrorCode::Reserved(code),
        }
    }
}

impl From<AttErrorCode> for u8 {
    fn from(code: AttErrorCode) -> Self {
        match code {
            AttErrorCode::Application(raw)
            | AttErrorCode::CommonProfile(raw)
            | AttErrorCode::Reserved(raw) => raw,
            defined => DEFINED
                .iter()
                .position(|known| *known == defined)
                .map_or(0, |pos| pos as u8 + 1),
        }
    }
}

/// Errors decoding ATT PDUs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttError {
    #[error("Invalid PDU: expected {expected} bytes, got {actual}")]
    InvalidPdu { expected: usize, actual: usize },

    #[error("Unexpected opcode {0:#04x}")]
    UnexpectedOpcode(u8),
}

pub type AttResult<T> = Result<T, AttError>;
