//! Credentials and request signing
//!
//! Every venue signs requests the same way at heart: canonicalize the
//! parameters into a `key=value&...` string, optionally inject a nonce, and
//! HMAC that string (or the full URL) with the secret key. What differs is
//! data, captured in [`SigningScheme`]:
//!
//! - digest family (SHA-256 / SHA-512) and output encoding (hex / base64)
//! - what is signed: the canonical query or the full URL
//! - where the signature and the API key go: query parameter or header
//! - nonce policy and canonical key order
//! - whether POST/DELETE parameters travel as a JSON body
//!
//! Signing is pure: identical parameters, secret and nonce always produce
//! the same signature.

use crate::errors::{ExchangeError, Result};
use crate::http::{HttpRequest, Method};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Sha256, Sha512};
use tracing::debug;
use tradegate_core::prelude::*;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// API key and secret for one exchange account
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Read `<PREFIX>_API_KEY` and `<PREFIX>_SECRET_KEY`
    pub fn from_env(prefix: &str) -> Result<Self> {
        let prefix = prefix.to_uppercase();
        let key_var = format!("{prefix}_API_KEY");
        let secret_var = format!("{prefix}_SECRET_KEY");

        let api_key = std::env::var(&key_var).map_err(|_| ExchangeError::MissingCredentials(key_var))?;
        let secret_key = std::env::var(&secret_var).map_err(|_| ExchangeError::MissingCredentials(secret_var))?;

        Ok(Self::new(api_key, secret_key))
    }

    /// Both key and secret are non-empty
    pub fn is_valid(&self) -> bool {
        !self.api_key.is_empty() && !self.secret_key.is_empty()
    }

    /// Precondition for every credentialed call, checked before any network I/O
    pub fn ensure(&self, exchange: &str) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ExchangeError::MissingCredentials(exchange.to_string()))
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked = if self.api_key.chars().count() > 8 {
            format!("{}...", self.api_key.chars().take(8).collect::<String>())
        } else {
            "***".to_string()
        };
        f.debug_struct("Credentials")
            .field("api_key", &masked)
            .field("secret_key", &"***")
            .finish()
    }
}

/// HMAC digest family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Digest {
    Sha256,
    Sha512,
}

/// How raw MAC bytes are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureEncoding {
    #[default]
    Hex,
    Base64,
}

/// What the MAC is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignTarget {
    /// The canonical query string
    Query,
    /// `<url>?<canonical query>`
    FullUrl,
}

/// Where a value travels on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    Query(String),
    Header(String),
}

/// Replay protection injected right before signing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoncePolicy {
    None,
    /// Millisecond timestamp under this parameter name
    TimestampMillis(String),
    /// Strictly increasing nanosecond nonce under this parameter name
    NonceNanos(String),
}

/// Order of `key=value` pairs in the canonical query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyOrder {
    #[default]
    Insertion,
    Lexicographic,
}

/// How POST and DELETE parameters are sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyMode {
    /// Same query string as GET
    #[default]
    Query,
    /// JSON object of the parameters plus signature; the MAC still covers
    /// the canonical query form
    Json,
}

/// One venue's signing convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningScheme {
    pub digest: Digest,
    pub encoding: SignatureEncoding,
    pub target: SignTarget,
    pub signature: Placement,
    pub api_key: Placement,
    pub nonce: NoncePolicy,
    pub key_order: KeyOrder,
    pub body: BodyMode,
}

impl SigningScheme {
    /// HMAC-SHA256 over the query, `signature` param, key in `X-MBX-APIKEY`,
    /// millisecond `timestamp`
    pub fn binance_style() -> Self {
        Self {
            digest: Digest::Sha256,
            encoding: SignatureEncoding::Hex,
            target: SignTarget::Query,
            signature: Placement::Query("signature".to_string()),
            api_key: Placement::Header("X-MBX-APIKEY".to_string()),
            nonce: NoncePolicy::TimestampMillis("timestamp".to_string()),
            key_order: KeyOrder::Insertion,
            body: BodyMode::Query,
        }
    }
}

/// Nonce value handed to [`Signer::sign`], already in the unit the scheme
/// expects. Ignored when the scheme has no nonce policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nonce(pub u64);

/// Ordered request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Params::insert`]
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key`, replacing an existing value in place
    pub fn insert(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn ordered(&self, order: KeyOrder) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self.iter().collect();
        if order == KeyOrder::Lexicographic {
            pairs.sort_by(|a, b| a.0.cmp(b.0));
        }
        pairs
    }

    /// JSON object with every value as a string
    pub fn to_json(&self, order: KeyOrder) -> Value {
        let map: Map<String, Value> = self
            .ordered(order)
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        Value::Object(map)
    }
}

/// `key=value` pairs joined by `&`, values percent-encoded
pub fn canonical_query(params: &Params, order: KeyOrder) -> String {
    params
        .ordered(order)
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Keyed hash of `payload`, rendered per `encoding`
pub fn hmac_signature(digest: Digest, encoding: SignatureEncoding, secret: &str, payload: &str) -> Result<String> {
    let bytes = match digest {
        Digest::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|e| ExchangeError::Signing(format!("HMAC setup failed: {e}")))?;
            mac.update(payload.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        Digest::Sha512 => {
            let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
                .map_err(|e| ExchangeError::Signing(format!("HMAC setup failed: {e}")))?;
            mac.update(payload.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
    };

    Ok(match encoding {
        SignatureEncoding::Hex => hex::encode(bytes),
        SignatureEncoding::Base64 => BASE64.encode(bytes),
    })
}

/// Fully signed request, ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// The exact text the MAC was computed over
    pub signed_payload: String,
    pub signature: String,
    pub nonce: Option<u64>,
}

impl From<SignedRequest> for HttpRequest {
    fn from(signed: SignedRequest) -> Self {
        HttpRequest {
            method: signed.method,
            url: signed.url,
            headers: signed.headers,
            body: signed.body,
        }
    }
}

/// Signs requests for one account under one scheme
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
    scheme: SigningScheme,
}

impl Signer {
    pub fn new(credentials: Credentials, scheme: SigningScheme) -> Self {
        Self { credentials, scheme }
    }

    pub fn scheme(&self) -> &SigningScheme {
        &self.scheme
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// MAC of an arbitrary payload under this scheme
    pub fn signature(&self, payload: &str) -> Result<String> {
        hmac_signature(self.scheme.digest, self.scheme.encoding, &self.credentials.secret_key, payload)
    }

    pub fn verify(&self, payload: &str, signature: &str) -> bool {
        self.signature(payload).is_ok_and(|expected| expected == signature)
    }

    /// Sign `params` for `method` against `url` (scheme, host and path, no query)
    pub fn sign(&self, method: Method, url: &str, params: &Params, nonce: Nonce) -> Result<SignedRequest> {
        let _timer = PerfTimer::start("sign_request");
        let scheme = &self.scheme;
        let mut params = params.clone();

        if let Placement::Query(name) = &scheme.api_key {
            params.insert(name, &self.credentials.api_key);
        }

        let nonce = match &scheme.nonce {
            NoncePolicy::None => None,
            NoncePolicy::TimestampMillis(name) | NoncePolicy::NonceNanos(name) => {
                params.insert(name, nonce.0);
                Some(nonce.0)
            }
        };

        let canonical = canonical_query(&params, scheme.key_order);
        let signed_payload = match scheme.target {
            SignTarget::Query => canonical.clone(),
            SignTarget::FullUrl => join_query(url, &canonical),
        };
        let signature = self.signature(&signed_payload)?;

        let mut headers = Vec::new();
        if let Placement::Header(name) = &scheme.api_key {
            headers.push((name.clone(), self.credentials.api_key.clone()));
        }

        let json_body = scheme.body == BodyMode::Json && method != Method::Get;
        let (url, body) = if json_body {
            let mut body_params = params;
            if let Placement::Query(name) = &scheme.signature {
                body_params.insert(name, &signature);
            }
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            (url.to_string(), Some(body_params.to_json(scheme.key_order).to_string()))
        } else {
            let query = match &scheme.signature {
                Placement::Query(name) if canonical.is_empty() => format!("{name}={signature}"),
                Placement::Query(name) => format!("{canonical}&{name}={signature}"),
                Placement::Header(_) => canonical,
            };
            (join_query(url, &query), None)
        };

        if let Placement::Header(name) = &scheme.signature {
            headers.push((name.clone(), signature.clone()));
        }

        debug!("🔐 Signed request: {} {}", method, url);

        Ok(SignedRequest {
            method,
            url,
            headers,
            body,
            signed_payload,
            signature,
            nonce,
        })
    }

    /// Sign with a nonce drawn from `clock` in the unit the scheme expects
    pub fn sign_now(
        &self,
        method: Method,
        url: &str,
        params: &Params,
        nonces: &NonceGenerator,
        clock: &dyn Clock,
    ) -> Result<SignedRequest> {
        let nonce = match self.scheme.nonce {
            NoncePolicy::None => Nonce(0),
            NoncePolicy::TimestampMillis(_) => Nonce(clock.now().as_millis()),
            NoncePolicy::NonceNanos(_) => Nonce(nonces.next(clock)),
        };
        self.sign(method, url, params, nonce)
    }
}

fn join_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else {
        format!("{url}?{query}")
    }
}
