//! Error types for the Remember The Milk client.
//!
//! # Design
//! The variants follow the layers a call passes through: the transport
//! (`Transport`), the HTTP status (`RequestFailed`), the XML payload (`Xml`,
//! `MalformedResponse`) and finally the service's own verdict
//! (`MethodFailed`). Only `MethodFailed` and `RequestFailed` are ever
//! downgraded to a boolean, and only by the token operations on `RtmClient`.

use thiserror::Error;

/// Errors returned by `RtmClient` and the response parser.
#[derive(Debug, Error)]
pub enum RtmError {
    /// The transport could not complete the round-trip at all.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-200 HTTP status.
    #[error("request {method} failed (HTTP). Status: {status}, reason: {reason}")]
    RequestFailed {
        method: String,
        status: u16,
        reason: String,
    },

    /// The service answered `<rsp stat="fail">`.
    #[error("request {method} failed. Code: {code}, message: {message}")]
    MethodFailed {
        method: String,
        code: String,
        message: String,
    },

    /// The payload is XML but does not follow the `<rsp>` contract.
    #[error("malformed response to {method}: {detail}")]
    MalformedResponse { method: String, detail: String },

    /// The payload is not well-formed XML.
    #[error("xml parse: {0}")]
    Xml(String),
}

impl RtmError {
    /// Remote error code, if the service reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            RtmError::MethodFailed { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the failure was reported by the service rather than by the
    /// transport or the parser. These are the failures the token operations
    /// turn into `false`.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            RtmError::MethodFailed { .. } | RtmError::RequestFailed { .. }
        )
    }
}
