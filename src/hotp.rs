//! HMAC-based One-time Password generation as per RFC 4226, and its
//! time-based variant from RFC 6238.

use std::fmt;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::secret::decode_secret;

/// Default code width.
pub const DEFAULT_DIGITS: u32 = 6;

/// Default time step in seconds, as used by Google Authenticator.
pub const DEFAULT_PERIOD: u64 = 30;

/// Shortest digest dynamic truncation accepts (SHA-1 output size).
pub const MIN_HASH_LEN: usize = 20;

/// Hash function used for the HMAC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    Sha1,
}

impl Algorithm {
    fn message_digest(self) -> MessageDigest {
        match self {
            Algorithm::Sha1 => MessageDigest::sha1(),
        }
    }

    /// Name used for the `algorithm` URI parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Sha1 => "SHA1",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("SHA1") {
            Ok(Algorithm::Sha1)
        } else {
            Err(Error::InvalidParameter { name: "algorithm", value: s.to_owned() })
        }
    }
}

/// Width of a generated code: 6, 7 or 8 decimal digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Digits(u32);

impl Digits {
    pub fn new(digits: u32) -> Result<Digits> {
        match digits {
            6..=8 => Ok(Digits(digits)),
            other => Err(Error::UnsupportedDigitCount(other)),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// `10^digits`, the modulus applied to the truncated value.
    pub fn modulus(self) -> u32 {
        match self.0 {
            6 => 1_000_000,
            7 => 10_000_000,
            _ => 100_000_000,
        }
    }
}

impl Default for Digits {
    fn default() -> Digits {
        Digits(DEFAULT_DIGITS)
    }
}

impl fmt::Display for Digits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Calculates the HMAC digest for the given key and counter.
pub fn calc_digest(key: &[u8], counter: u64, algorithm: Algorithm) -> Result<Vec<u8>> {
    let mut msg = [0u8; 8];
    BigEndian::write_u64(&mut msg, counter);
    let pkey = PKey::hmac(key)?;
    let mut signer = Signer::new(algorithm.message_digest(), &pkey)?;
    signer.update(&msg)?;
    Ok(signer.sign_to_vec()?)
}

/// Dynamic truncation: reduces an HMAC digest to a `digits`-wide integer.
pub fn truncate(digest: &[u8], digits: u32) -> Result<u32> {
    let digits = Digits::new(digits)?;
    if digest.len() < MIN_HASH_LEN {
        return Err(Error::HashTooShort(digest.len()));
    }
    // the low nibble of the last byte picks a 4-byte window, always in bounds
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let value = BigEndian::read_u32(&digest[offset..offset + 4]) & 0x7fff_ffff;
    Ok(value % digits.modulus())
}

/// Performs the [HMAC-based One-time Password Algorithm](http://en.wikipedia.org/wiki/HMAC-based_One-time_Password_Algorithm)
/// (HOTP) given the raw key bytes and an integer counter.
pub fn make_hotp(key: &[u8], counter: u64, digits: Digits, algorithm: Algorithm) -> Result<u32> {
    let digest = calc_digest(key, counter, algorithm)?;
    truncate(&digest, digits.get())
}

/// Number of whole `period`-second steps since the Unix epoch. Times
/// before the epoch are rejected.
pub fn counter_at(unix_time: i64, period: u64) -> Result<u64> {
    if period == 0 {
        return Err(Error::InvalidPeriod);
    }
    let secs = u64::try_from(unix_time).map_err(|_| Error::InvalidTime(unix_time))?;
    let counter = secs / period;
    trace!("time {} with period {}s is step {}", unix_time, period, counter);
    Ok(counter)
}

/// Seconds until the step containing `unix_time` ends.
pub fn seconds_remaining(unix_time: i64, period: u64) -> Result<u64> {
    counter_at(unix_time, period)?;
    Ok(period - unix_time as u64 % period)
}

/// Performs the [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
/// (TOTP) given an RFC4648 base32 encoded secret, the time step in seconds,
/// and the Unix time to generate the code for.
pub fn make_totp(
    secret: &str,
    period: u64,
    digits: Digits,
    algorithm: Algorithm,
    unix_time: i64,
) -> Result<u32> {
    let key = decode_secret(secret)?;
    make_hotp(&key, counter_at(unix_time, period)?, digits, algorithm)
}

/// Current wall-clock time in Unix seconds.
pub fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
