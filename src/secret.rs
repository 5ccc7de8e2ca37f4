use base32::Alphabet::Rfc4648;
use openssl::rand::rand_bytes;

use crate::error::{Error, Result};
use crate::percent;

/// Number of random bytes in a freshly generated secret (160 bits, the
/// RFC 4226 recommendation for HMAC-SHA1).
pub const DEFAULT_SECRET_LEN: usize = 20;

/// Smallest decoded secret accepted for a credential.
pub const MIN_SECRET_LEN: usize = 20;

const ALPHABET: base32::Alphabet = Rfc4648 { padding: false };

/// Draws `byte_length` bytes from the OpenSSL CSPRNG and returns them as
/// unpadded base32, percent-encoded for embedding in a URI.
pub fn generate_secret(byte_length: usize) -> Result<String> {
    let mut buf = vec![0u8; byte_length];
    rand_bytes(&mut buf).map_err(Error::EntropyUnavailable)?;
    Ok(percent::encode(&encode_secret(&buf)))
}

/// Encodes raw key bytes as unpadded RFC 4648 base32.
pub fn encode_secret(key: &[u8]) -> String {
    base32::encode(ALPHABET, key)
}

/// Decodes a secret (given as an RFC 4648 base32-encoded ASCII string)
/// into a byte string.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    base32::decode(ALPHABET, &secret.to_ascii_uppercase())
        .ok_or_else(|| Error::InvalidSecret(format!("{} characters of text are not base32", secret.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_decodes_to_requested_length() {
        let secret = generate_secret(DEFAULT_SECRET_LEN).unwrap();
        assert_eq!(secret.len(), 32);
        assert_eq!(decode_secret(&secret).unwrap().len(), 20);

        let longer = generate_secret(32).unwrap();
        assert_eq!(decode_secret(&longer).unwrap().len(), 32);
    }

    #[test]
    fn generated_secret_is_uri_safe() {
        let secret = generate_secret(DEFAULT_SECRET_LEN).unwrap();
        assert!(secret.chars().all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
        assert_eq!(percent::decode(&secret), secret);
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(
            generate_secret(DEFAULT_SECRET_LEN).unwrap(),
            generate_secret(DEFAULT_SECRET_LEN).unwrap()
        );
    }

    #[test]
    fn secret_codec() {
        assert_eq!(encode_secret(b"12345678901234567890"), "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
        assert_eq!(decode_secret("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").unwrap(), b"12345678901234567890");
        assert!(matches!(decode_secret("not base32!"), Err(Error::InvalidSecret(_))));
    }
}
