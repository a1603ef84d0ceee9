use serde::{Deserialize, Serialize};

/// Correlation id pairing an outbound request with its inbound result
pub type SequenceId = i32;

/// Outcome code carried by every result
pub type StatusCode = u8;

pub const STATUS_SUCCESS: StatusCode = 0;
pub const STATUS_ERROR_GENERIC: StatusCode = 1;
pub const STATUS_ERROR_ROLE: StatusCode = 2;

/// Reserved: the connection was torn down before a real result arrived.
///
/// Never sent by a peer; only produced locally when pending requests are drained.
pub const STATUS_DISCONNECTED: StatusCode = 255;

/// Request type, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Authenticate,
    AsServer,
    AsProxy,
    GetSalt,
    GetWhoami,
    Message,
    Redirect,
    GetPlayers,
}

/// Request sent to the authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    Authenticate { username: String, password: String },
    AsServer { address: String, port: u16 },
    AsProxy {
        address: String,
        port: u16,
        motd: String,
        version: String,
        max_players: u16,
    },
    GetSalt,
    GetWhoami,
    Message {
        recipients: Vec<String>,
        channel: String,
        payload: Vec<u8>,
    },
    Redirect { server: String, player: String },
    GetPlayers { list: bool },
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Authenticate { .. } => RequestKind::Authenticate,
            Request::AsServer { .. } => RequestKind::AsServer,
            Request::AsProxy { .. } => RequestKind::AsProxy,
            Request::GetSalt => RequestKind::GetSalt,
            Request::GetWhoami => RequestKind::GetWhoami,
            Request::Message { .. } => RequestKind::Message,
            Request::Redirect { .. } => RequestKind::Redirect,
            Request::GetPlayers { .. } => RequestKind::GetPlayers,
        }
    }
}

/// Decoded body of a successful result
///
/// The wire body carries no tag of its own; which variant applies is decided by
/// the kind of the request registered under the result's sequence id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestResult {
    Authenticate,
    AsServer { security_key: String },
    AsProxy,
    GetSalt { salt: String },
    GetWhoami { identification: String },
    Message,
    Redirect,
    GetPlayers {
        current: u16,
        maximum: u16,
        players: Vec<String>,
    },
}

impl RequestResult {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestResult::Authenticate => RequestKind::Authenticate,
            RequestResult::AsServer { .. } => RequestKind::AsServer,
            RequestResult::AsProxy => RequestKind::AsProxy,
            RequestResult::GetSalt { .. } => RequestKind::GetSalt,
            RequestResult::GetWhoami { .. } => RequestKind::GetWhoami,
            RequestResult::Message => RequestKind::Message,
            RequestResult::Redirect => RequestKind::Redirect,
            RequestResult::GetPlayers { .. } => RequestKind::GetPlayers,
        }
    }
}

/// Plugin message relayed from another server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub sender: String,
    pub channel: String,
    pub payload: Vec<u8>,
}

/// Instruction to move a player to another server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectEvent {
    pub server: String,
    pub player: String,
}

/// A backend server joined (`add`) or left the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    pub add: bool,
    pub server: String,
    pub security_key: String,
    pub address: String,
    pub port: u16,
}

/// A decoded Connect packet
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Liveness probe; echoed back unchanged.
    Keepalive { random: i32 },
    Request {
        sequence_id: SequenceId,
        request: Request,
    },
    /// `result` is `None` unless the status is [`STATUS_SUCCESS`] and the
    /// sequence id was known when the packet was decoded.
    Result {
        sequence_id: SequenceId,
        status_code: StatusCode,
        result: Option<RequestResult>,
    },
    MessageEvent(MessageEvent),
    RedirectEvent(RedirectEvent),
    ServerEvent(ServerEvent),
}
