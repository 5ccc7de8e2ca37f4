//! The provisioned credential and its `otpauth://totp/` URI form.
//!
//! ```text
//! otpauth://totp/<issuer>:<account>?secret=<base32>&issuer=<issuer>&digits=6&algorithm=SHA1&period=30
//! ```

use std::fmt;

use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::hotp::{self, Algorithm, Digits, DEFAULT_DIGITS, DEFAULT_PERIOD};
use crate::percent;
use crate::secret::{self, DEFAULT_SECRET_LEN, MIN_SECRET_LEN};

const URI_PREFIX: &str = "otpauth://totp/";

/// One-time password flavour. Only TOTP is generated and parsed; `Hotp`
/// is reserved for counter-based credentials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OtpKind {
    #[default]
    Totp,
    Hotp,
}

impl fmt::Display for OtpKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            OtpKind::Totp => "totp",
            OtpKind::Hotp => "hotp",
        })
    }
}

/// The `issuer:account` pair shown to the user by authenticator apps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Label {
    pub issuer_prefix: String,
    pub account: String,
}

/// A TOTP shared secret together with its generation parameters.
///
/// Built once, either from a fresh secret or by parsing a URI, and never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    kind: OtpKind,
    label: Label,
    secret: String,
    issuer: String,
    algorithm: Algorithm,
    digits: Digits,
    period: u64,
    uri: String,
}

impl Credential {
    /// Checks the parameters and serializes the credential to its URI.
    ///
    /// `secret` must be unpadded base32 decoding to at least 20 bytes.
    pub fn new(
        label: Label,
        secret: String,
        issuer: String,
        algorithm: Algorithm,
        digits: u32,
        period: u64,
    ) -> Result<Credential> {
        let digits = Digits::new(digits)?;
        if period == 0 {
            return Err(Error::InvalidPeriod);
        }
        let key_len = secret::decode_secret(&percent::decode(&secret))?.len();
        if key_len < MIN_SECRET_LEN {
            return Err(Error::InvalidSecret(format!(
                "decodes to {} bytes, at least {} required",
                key_len, MIN_SECRET_LEN
            )));
        }

        let mut credential = Credential {
            kind: OtpKind::Totp,
            label,
            secret,
            issuer,
            algorithm,
            digits,
            period,
            uri: String::new(),
        };
        if credential.issuer_mismatch() {
            warn!(
                "issuer {:?} differs from label prefix {:?}",
                credential.issuer, credential.label.issuer_prefix
            );
        }
        credential.uri = build_uri(&credential);
        Ok(credential)
    }

    pub fn kind(&self) -> OtpKind {
        self.kind
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Base32 secret text, as carried in the URI.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Raw HMAC key bytes.
    pub fn secret_bytes(&self) -> Result<Vec<u8>> {
        secret::decode_secret(&percent::decode(&self.secret))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn digits(&self) -> u32 {
        self.digits.get()
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// True when both the label prefix and the issuer parameter are present
    /// and disagree. Reported, never reconciled.
    pub fn issuer_mismatch(&self) -> bool {
        !self.issuer.is_empty()
            && !self.label.issuer_prefix.is_empty()
            && self.issuer != self.label.issuer_prefix
    }

    /// The code for the time step containing `unix_time`.
    pub fn code_at(&self, unix_time: i64) -> Result<u32> {
        let key = self.secret_bytes()?;
        let counter = hotp::counter_at(unix_time, self.period)?;
        hotp::make_hotp(&key, counter, self.digits, self.algorithm)
    }

    /// The code for the current time step.
    pub fn current_code(&self) -> Result<u32> {
        self.code_at(hotp::now())
    }

    /// [`Credential::code_at`] zero-padded to the credential's width.
    pub fn formatted_code_at(&self, unix_time: i64) -> Result<String> {
        let code = self.code_at(unix_time)?;
        Ok(format!("{:0width$}", code, width = self.digits.get() as usize))
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Assembles a [`Credential`] from defaults, generating a secret unless one
/// is supplied.
#[derive(Clone, Debug)]
pub struct CredentialBuilder {
    issuer: String,
    account: String,
    secret: Option<String>,
    secret_len: usize,
    algorithm: Algorithm,
    digits: u32,
    period: u64,
}

impl CredentialBuilder {
    pub fn new(issuer: &str, account: &str) -> CredentialBuilder {
        CredentialBuilder {
            issuer: issuer.to_owned(),
            account: account.to_owned(),
            secret: None,
            secret_len: DEFAULT_SECRET_LEN,
            algorithm: Algorithm::default(),
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
        }
    }

    pub fn secret(mut self, secret: &str) -> Self {
        self.secret = Some(secret.to_owned());
        self
    }

    /// Bytes of randomness drawn when no secret is supplied.
    pub fn secret_len(mut self, len: usize) -> Self {
        self.secret_len = len;
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    pub fn period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    pub fn build(self) -> Result<Credential> {
        let secret = match self.secret {
            Some(secret) => secret,
            None => secret::generate_secret(self.secret_len)?,
        };
        let label = Label {
            issuer_prefix: self.issuer.clone(),
            account: self.account,
        };
        let credential = Credential::new(
            label,
            secret,
            self.issuer,
            self.algorithm,
            self.digits,
            self.period,
        )?;
        debug!("created credential for {:?}", credential.label.account);
        Ok(credential)
    }
}

/// Serializes `credential` to its provisioning URI. Every query parameter
/// is emitted, defaults included.
pub fn build_uri(credential: &Credential) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("secret", &credential.secret)
        .append_pair("issuer", &credential.issuer)
        .append_pair("digits", &credential.digits.to_string())
        .append_pair("algorithm", credential.algorithm.as_str())
        .append_pair("period", &credential.period.to_string())
        .finish();
    format!(
        "{}{}:{}?{}",
        URI_PREFIX,
        percent::encode(&credential.label.issuer_prefix),
        percent::encode(&credential.label.account),
        query
    )
}

/// Parses an `otpauth://totp/<issuer>:<account>?<query>` URI.
///
/// The returned credential keeps `uri` verbatim rather than re-serializing.
pub fn parse_uri(uri: &str) -> Result<Credential> {
    let path = uri
        .strip_prefix(URI_PREFIX)
        .ok_or_else(|| Error::MalformedUri(format!("expected {:?} prefix", URI_PREFIX)))?;
    let query_start = path
        .find('?')
        .ok_or_else(|| Error::MalformedUri("no '?' before the parameters".to_owned()))?;
    let colon = path[..query_start]
        .find(':')
        .ok_or_else(|| Error::MalformedUri("no ':' between issuer and account".to_owned()))?;

    let label = Label {
        issuer_prefix: percent::decode(&path[..colon]),
        account: percent::decode(&path[colon + 1..query_start]),
    };

    let mut secret = None;
    let mut issuer = None;
    let mut algorithm = None;
    let mut digits = None;
    let mut period = None;
    for (key, value) in form_urlencoded::parse(path[query_start + 1..].as_bytes()) {
        let slot = match key.as_ref() {
            "secret" => &mut secret,
            "issuer" => &mut issuer,
            "algorithm" => &mut algorithm,
            "digits" => &mut digits,
            "period" => &mut period,
            other => {
                debug!("ignoring otpauth parameter {:?}", other);
                continue;
            }
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    let secret = secret.ok_or(Error::MissingSecret)?;
    let issuer = issuer.unwrap_or_default();
    let algorithm = match algorithm {
        Some(name) => name.parse()?,
        None => Algorithm::default(),
    };
    let digits = match digits {
        Some(value) => parse_int("digits", value)?,
        None => DEFAULT_DIGITS,
    };
    let period = match period {
        Some(value) => parse_int("period", value)?,
        None => DEFAULT_PERIOD,
    };

    let mut credential = Credential::new(label, secret, issuer, algorithm, digits, period)?;
    credential.uri = uri.to_owned();
    debug!("parsed credential for {:?}", credential.label.account);
    Ok(credential)
}

fn parse_int<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::InvalidParameter { name, value })
}
