use connect_core::{
    MessageEvent, Packet, RedirectEvent, Request, RequestKind, RequestResult, SequenceId,
    ServerEvent, StatusCode, STATUS_SUCCESS,
};
use serde::{Deserialize, Serialize};

use crate::codec::{BincodeCodec, Codec};
use crate::error::Result;

/// Resolves the request kind that was registered under a sequence id
///
/// Result bodies are untagged on the wire, so decoding one needs to know which
/// request it answers.
pub trait RequestKindLookup {
    fn request_kind(&self, sequence_id: SequenceId) -> Option<RequestKind>;
}

impl<F> RequestKindLookup for F
where
    F: Fn(SequenceId) -> Option<RequestKind>,
{
    fn request_kind(&self, sequence_id: SequenceId) -> Option<RequestKind> {
        self(sequence_id)
    }
}

/// Lookup for peers that never issue requests (the authority side)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPendingRequests;

impl RequestKindLookup for NoPendingRequests {
    fn request_kind(&self, _sequence_id: SequenceId) -> Option<RequestKind> {
        None
    }
}

#[derive(Serialize, Deserialize)]
enum WirePacket {
    Keepalive {
        random: i32,
    },
    Request {
        sequence_id: SequenceId,
        request: Request,
    },
    Result {
        sequence_id: SequenceId,
        status_code: StatusCode,
        body: Vec<u8>,
    },
    MessageEvent(MessageEvent),
    RedirectEvent(RedirectEvent),
    ServerEvent(ServerEvent),
}

/// Converts between [`Packet`]s and frame payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketCodec<C = BincodeCodec> {
    codec: C,
}

impl<C: Codec> PacketCodec<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn encode(&self, packet: &Packet) -> Result<Vec<u8>> {
        let wire = match packet {
            Packet::Keepalive { random } => WirePacket::Keepalive { random: *random },
            Packet::Request {
                sequence_id,
                request,
            } => WirePacket::Request {
                sequence_id: *sequence_id,
                request: request.clone(),
            },
            Packet::Result {
                sequence_id,
                status_code,
                result,
            } => {
                let body = match result {
                    Some(result) if *status_code == STATUS_SUCCESS => self.encode_body(result)?,
                    _ => Vec::new(),
                };
                WirePacket::Result {
                    sequence_id: *sequence_id,
                    status_code: *status_code,
                    body,
                }
            }
            Packet::MessageEvent(event) => WirePacket::MessageEvent(event.clone()),
            Packet::RedirectEvent(event) => WirePacket::RedirectEvent(event.clone()),
            Packet::ServerEvent(event) => WirePacket::ServerEvent(event.clone()),
        };
        self.codec.encode(&wire)
    }

    /// Decode a frame payload
    ///
    /// A result whose sequence id the lookup does not know decodes with no
    /// body; its bytes are skipped rather than treated as an error.
    pub fn decode<L>(&self, bytes: &[u8], lookup: &L) -> Result<Packet>
    where
        L: RequestKindLookup + ?Sized,
    {
        let packet = match self.codec.decode::<WirePacket>(bytes)? {
            WirePacket::Keepalive { random } => Packet::Keepalive { random },
            WirePacket::Request {
                sequence_id,
                request,
            } => Packet::Request {
                sequence_id,
                request,
            },
            WirePacket::Result {
                sequence_id,
                status_code,
                body,
            } => {
                let result = match lookup.request_kind(sequence_id) {
                    Some(kind) if status_code == STATUS_SUCCESS => {
                        Some(self.decode_body(kind, &body)?)
                    }
                    _ => None,
                };
                Packet::Result {
                    sequence_id,
                    status_code,
                    result,
                }
            }
            WirePacket::MessageEvent(event) => Packet::MessageEvent(event),
            WirePacket::RedirectEvent(event) => Packet::RedirectEvent(event),
            WirePacket::ServerEvent(event) => Packet::ServerEvent(event),
        };
        Ok(packet)
    }

    fn encode_body(&self, result: &RequestResult) -> Result<Vec<u8>> {
        match result {
            RequestResult::Authenticate
            | RequestResult::AsProxy
            | RequestResult::Message
            | RequestResult::Redirect => Ok(Vec::new()),
            RequestResult::AsServer { security_key } => self.codec.encode(security_key),
            RequestResult::GetSalt { salt } => self.codec.encode(salt),
            RequestResult::GetWhoami { identification } => self.codec.encode(identification),
            RequestResult::GetPlayers {
                current,
                maximum,
                players,
            } => self.codec.encode(&(current, maximum, players)),
        }
    }

    fn decode_body(&self, kind: RequestKind, body: &[u8]) -> Result<RequestResult> {
        let result = match kind {
            RequestKind::Authenticate => RequestResult::Authenticate,
            RequestKind::AsProxy => RequestResult::AsProxy,
            RequestKind::Message => RequestResult::Message,
            RequestKind::Redirect => RequestResult::Redirect,
            RequestKind::AsServer => RequestResult::AsServer {
                security_key: self.codec.decode(body)?,
            },
            RequestKind::GetSalt => RequestResult::GetSalt {
                salt: self.codec.decode(body)?,
            },
            RequestKind::GetWhoami => RequestResult::GetWhoami {
                identification: self.codec.decode(body)?,
            },
            RequestKind::GetPlayers => {
                let (current, maximum, players): (u16, u16, Vec<String>) =
                    self.codec.decode(body)?;
                RequestResult::GetPlayers {
                    current,
                    maximum,
                    players,
                }
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_core::STATUS_ERROR_GENERIC;

    fn codec() -> PacketCodec {
        PacketCodec::new(BincodeCodec::new())
    }

    #[test]
    fn result_body_decodes_by_registered_kind() {
        let codec = codec();
        let bytes = codec
            .encode(&Packet::Result {
                sequence_id: 3,
                status_code: STATUS_SUCCESS,
                result: Some(RequestResult::GetPlayers {
                    current: 2,
                    maximum: 20,
                    players: vec!["alex".into(), "steve".into()],
                }),
            })
            .unwrap();

        let lookup = |id: SequenceId| (id == 3).then_some(RequestKind::GetPlayers);
        let packet = codec.decode(&bytes, &lookup).unwrap();

        assert_eq!(
            packet,
            Packet::Result {
                sequence_id: 3,
                status_code: STATUS_SUCCESS,
                result: Some(RequestResult::GetPlayers {
                    current: 2,
                    maximum: 20,
                    players: vec!["alex".into(), "steve".into()],
                }),
            }
        );
    }

    #[test]
    fn unknown_sequence_decodes_without_body() {
        let codec = codec();
        let bytes = codec
            .encode(&Packet::Result {
                sequence_id: 99,
                status_code: STATUS_SUCCESS,
                result: Some(RequestResult::GetSalt { salt: "x".into() }),
            })
            .unwrap();

        let packet = codec.decode(&bytes, &NoPendingRequests).unwrap();
        assert_eq!(
            packet,
            Packet::Result {
                sequence_id: 99,
                status_code: STATUS_SUCCESS,
                result: None,
            }
        );
    }

    #[test]
    fn failed_status_carries_no_body() {
        let codec = codec();
        let bytes = codec
            .encode(&Packet::Result {
                sequence_id: 1,
                status_code: STATUS_ERROR_GENERIC,
                result: Some(RequestResult::GetSalt { salt: "x".into() }),
            })
            .unwrap();

        let lookup = |_: SequenceId| Some(RequestKind::GetSalt);
        match codec.decode(&bytes, &lookup).unwrap() {
            Packet::Result {
                status_code,
                result,
                ..
            } => {
                assert_eq!(status_code, STATUS_ERROR_GENERIC);
                assert!(result.is_none());
            }
            other => panic!("Expected result packet, got {:?}", other),
        }
    }

    #[test]
    fn body_of_wrong_shape_is_a_codec_error() {
        let codec = codec();
        let bytes = codec
            .encode(&Packet::Result {
                sequence_id: 1,
                status_code: STATUS_SUCCESS,
                result: Some(RequestResult::Authenticate),
            })
            .unwrap();

        // An empty body cannot hold the salt string a GetSalt result needs.
        let lookup = |_: SequenceId| Some(RequestKind::GetSalt);
        assert!(codec.decode(&bytes, &lookup).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(codec().decode(&[0xff, 0xff, 0xff], &NoPendingRequests).is_err());
    }
}
