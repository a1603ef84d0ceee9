use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::error::Result;

/// Default upper bound for a single decoded value (16 MiB)
pub const DEFAULT_DECODE_LIMIT: u64 = 16 * 1024 * 1024;

/// Bincode codec with varint integers and a decode size limit
///
/// The limit stops a corrupt length field inside a frame from allocating
/// more than the frame could possibly hold.
#[derive(Debug, Clone, Copy)]
pub struct BincodeCodec {
    limit: u64,
}

impl BincodeCodec {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_DECODE_LIMIT)
    }

    pub fn with_limit(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    fn options(&self) -> impl Options {
        bincode::DefaultOptions::new().with_limit(self.limit)
    }
}

impl Default for BincodeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for BincodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(self.options().serialize(value)?)
    }

    fn decode<T: for<'de> Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T> {
        Ok(self.options().deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn rejects_trailing_bytes() {
        let codec = BincodeCodec::new();
        let mut bytes = codec.encode(&7u32).unwrap();
        bytes.push(0xff);

        let result: Result<u32> = codec.decode(&bytes);
        assert!(matches!(result, Err(Error::Codec(_))));
    }

    #[test]
    fn enforces_decode_limit() {
        let codec = BincodeCodec::with_limit(8);
        let bytes = BincodeCodec::new().encode(&vec![1u8; 64]).unwrap();

        let result: Result<Vec<u8>> = codec.decode(&bytes);
        assert!(matches!(result, Err(Error::Codec(_))));
    }
}
