//! Connect Policy - Authentication and routing policy for Connect peers
//!
//! The authority side decides who may log in ([`AuthorityConfig`]); the proxy
//! side decides which backend servers, MOTDs and icons a requested domain
//! maps to ([`ProxyConfig`]). Both persist as TOML documents and fall back to
//! built-in defaults when no file exists yet.

mod authority;
mod document;
mod error;
mod proxy;

pub use authority::{AuthorityConfig, LoginRule};
pub use document::Document;
pub use error::PolicyError;
pub use proxy::{
    ConnectCredentials, ConnectSettings, ProxyConfig, ProxyLocale, ProxySettings, RouteRule,
};
