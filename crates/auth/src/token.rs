use rand::{rngs::OsRng, RngCore};

/// Random bytes per session token.
pub const TOKEN_BYTES: usize = 32;

/// Hex-encoded token length.
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generate a session token: 32 bytes from the OS CSPRNG, lowercase hex.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether `token` has the shape of a value produced by
/// [`generate_session_token`].
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
