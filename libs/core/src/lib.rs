//! Connect Core - Protocol data model shared by every Connect crate
//!
//! Defines sequence ids, status codes, the request/result/event payloads that
//! travel over a Connect link, and the salted password scheme used during
//! authentication.

pub mod auth;
pub mod packet;

// Re-exports for convenience
pub use auth::{password_and_salt_hash, sha1_hex};
pub use packet::{
    MessageEvent, Packet, RedirectEvent, Request, RequestKind, RequestResult, SequenceId,
    ServerEvent, StatusCode, STATUS_DISCONNECTED, STATUS_ERROR_GENERIC, STATUS_ERROR_ROLE,
    STATUS_SUCCESS,
};
