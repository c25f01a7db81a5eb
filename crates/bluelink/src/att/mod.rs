//! Attribute Protocol (ATT) data dispatch
//!
//! This module decodes the opcode byte of inbound ATT PDUs and routes them:
//! requests (even opcodes) to the local server, responses (odd opcodes) to
//! the local client, signed writes to signature verification. Opcodes the
//! engine does not know are answered with an error response.

pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod pdu;

pub use self::constants::*;
pub use self::dispatcher::{AttDispatcher, AttHandler, RejectAllRequests};
pub use self::error::{AttError, AttErrorCode, AttResult};
pub use self::pdu::{classify, Dispatch, ErrorResponse};
