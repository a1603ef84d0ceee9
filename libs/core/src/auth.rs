use sha1::{Digest, Sha1};

/// Lowercase hex SHA-1 digest of the UTF-8 bytes of `data`
pub fn sha1_hex(data: &str) -> String {
    hex::encode(Sha1::digest(data.as_bytes()))
}

/// Hash a plaintext password against a server-issued salt
///
/// Both sides of the link compute `sha1(sha1(salt) + sha1(password))`, so the
/// plaintext never crosses the wire.
pub fn password_and_salt_hash(password: &str, salt: &str) -> String {
    let mut joined = sha1_hex(salt);
    joined.push_str(&sha1_hex(password));
    sha1_hex(&joined)
}
