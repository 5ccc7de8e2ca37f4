//! otpauth is a Rust library for the Time-based One-time Password Algorithm as per RFC 6238,
//! built on the HMAC-based One-time Password Algorithm of RFC 4226, and for the
//! `otpauth://totp/` URIs used to provision authenticator apps such as Google Authenticator and Authy.
//!
//! ```rust
//! use otpauth::{new_credential, parse_uri, verify_code};
//!
//! let credential = new_credential("Test Corp", "testuser").unwrap();
//! // the uri is what gets rendered into a QR code
//! let parsed = parse_uri(credential.uri()).unwrap();
//! assert_eq!(parsed.secret(), credential.secret());
//!
//! let now = 1_700_000_000;
//! let code = parsed.code_at(now).unwrap();
//! assert!(verify_code(&credential, code, now).unwrap());
//! ```

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod credential;
pub mod error;
pub mod hotp;
pub mod percent;
pub mod secret;

pub use credential::{build_uri, parse_uri, Credential, CredentialBuilder, Label, OtpKind};
pub use error::{Error, Result};
pub use hotp::{make_hotp, make_totp, truncate, Algorithm, Digits, DEFAULT_DIGITS, DEFAULT_PERIOD};
pub use secret::{generate_secret, DEFAULT_SECRET_LEN, MIN_SECRET_LEN};

/// Creates a TOTP credential with a fresh 20-byte secret and default
/// parameters (SHA1, 6 digits, 30 second period).
pub fn new_credential(issuer: &str, account: &str) -> Result<Credential> {
    CredentialBuilder::new(issuer, account).build()
}

/// Checks `candidate` against the code for the time step containing `now`.
///
/// Only the exact step matches; neighbouring steps are not accepted.
pub fn verify_code(credential: &Credential, candidate: u32, now: i64) -> Result<bool> {
    Ok(credential.code_at(now)? == candidate)
}

/// [`verify_code`] against the current wall-clock time.
pub fn verify_current(credential: &Credential, candidate: u32) -> Result<bool> {
    verify_code(credential, candidate, hotp::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_credential_defaults() {
        let c = new_credential("Test Corp", "testuser").unwrap();
        assert!(!c.uri().is_empty());
        assert!(c.uri().starts_with("otpauth://totp/Test%20Corp:testuser?secret="));
        assert_eq!(c.secret_bytes().unwrap().len(), 20);
        assert_eq!(c.issuer(), "Test Corp");
        assert_eq!(c.label().issuer_prefix, "Test Corp");
        assert_eq!(c.label().account, "testuser");
        assert_eq!(c.digits(), 6);
        assert_eq!(c.period(), 30);
        assert_eq!(c.algorithm(), Algorithm::Sha1);
        assert_eq!(c.kind(), OtpKind::Totp);
    }

    #[test]
    fn generated_credentials_round_trip() {
        for (issuer, account) in [("Test Corp", "testuser"), ("", "bob"), ("ACME~1", "a_b-c.d")] {
            let c = new_credential(issuer, account).unwrap();
            let parsed = parse_uri(&build_uri(&c)).unwrap();
            assert_eq!(parsed.secret(), c.secret());
            assert_eq!(parsed.issuer(), c.issuer());
            assert_eq!(parsed.digits(), c.digits());
            assert_eq!(parsed.algorithm(), c.algorithm());
            assert_eq!(parsed.period(), c.period());
            assert_eq!(parsed.label().account, c.label().account);
        }
    }

    #[test]
    fn verify_exact_step_only() {
        let c = CredentialBuilder::new("Example", "alice")
            .secret("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ")
            .digits(8)
            .build()
            .unwrap();
        assert!(verify_code(&c, 94287082, 59).unwrap());
        assert!(verify_code(&c, 94287082, 30).unwrap());
        assert!(!verify_code(&c, 94287082, 60).unwrap());
        assert!(!verify_code(&c, 94287081, 59).unwrap());
        assert!(matches!(verify_code(&c, 94287082, -1), Err(Error::InvalidTime(-1))));
    }

    #[test]
    fn verify_compares_integers() {
        let c = CredentialBuilder::new("Example", "alice")
            .secret("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ")
            .digits(8)
            .build()
            .unwrap();
        // "07081804" as a number
        assert!(verify_code(&c, 7081804, 1111111109).unwrap());
    }

    #[test]
    fn verify_against_clock() {
        let c = new_credential("Example", "alice").unwrap();
        let now = hotp::now();
        let code = c.code_at(now).unwrap();
        // the step may roll over between the two reads
        let ok = verify_current(&c, code).unwrap() || c.code_at(hotp::now()).unwrap() != code;
        assert!(ok);
    }
}
