//! Signing-key set: JWKS fetching, key materialization and lookup.
//!
//! The JWKS document is fetched once before the server binds and then
//! periodically by the refresh task. Each fetch builds a fresh immutable
//! [`SigningKeySet`]; [`KeySetCache`] swaps the whole set atomically so a
//! request always verifies against one consistent snapshot.
//!
//! # Security
//!
//! - Key material is decoded once, at fetch time, never on the request path
//! - Lookup is by exact `kid`; there is no fallback key
//! - A `kid` published more than once is ambiguous and resolves to nothing,
//!   even when one of the records could not be materialized

use crate::observability::metrics;
use common::jwt::decode_ed25519_public_key_jwk;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

/// Default HTTP timeout for JWKS fetches.
const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound on a JWKS response body.
pub const MAX_JWKS_BYTES: usize = 512 * 1024;

/// JSON Web Key as published in a JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA", "EC" or "OKP").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: Option<String>,

    /// Algorithm the key is meant for.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// Curve name for EC and OKP keys.
    #[serde(default)]
    pub crv: Option<String>,

    /// EC x coordinate or OKP public key (base64url).
    #[serde(default)]
    pub x: Option<String>,

    /// EC y coordinate (base64url).
    #[serde(default)]
    pub y: Option<String>,
}

/// JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("JWKS request failed: {0}")]
    Fetch(String),

    #[error("JWKS endpoint returned status {0}")]
    Status(u16),

    #[error("Failed to parse JWKS document: {0}")]
    Parse(String),

    #[error("JWKS document exceeds {0} bytes")]
    TooLarge(usize),

    #[error("Unusable JWK: {0}")]
    InvalidKey(String),

    #[error("JWKS document contains no usable signing keys")]
    NoUsableKeys,
}

/// Why a `kid` did not select exactly one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyResolutionError {
    #[error("no key published under this kid")]
    NotFound,

    #[error("more than one key published under this kid")]
    Ambiguous,
}

/// Key family, from the JWK `kty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ec,
    Okp,
}

impl KeyFamily {
    /// Whether a token `alg` can be verified by a key of this family.
    pub fn supports(self, alg: Algorithm) -> bool {
        match self {
            KeyFamily::Rsa => matches!(
                alg,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ),
            KeyFamily::Ec => matches!(alg, Algorithm::ES256 | Algorithm::ES384),
            KeyFamily::Okp => matches!(alg, Algorithm::EdDSA),
        }
    }
}

/// A materialized verification key.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    family: KeyFamily,
    alg: Option<Algorithm>,
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("family", &self.family)
            .field("alg", &self.alg)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Materialize a key from a JWK record.
    ///
    /// # Errors
    ///
    /// Returns `JwksError::InvalidKey` when the record has no `kid`, is not a
    /// signing key, has an unsupported type or algorithm, or its key material
    /// is missing or malformed.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, JwksError> {
        let kid = jwk
            .kid
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| JwksError::InvalidKey("missing kid".to_string()))?
            .to_string();

        if let Some(key_use) = &jwk.key_use {
            if key_use != "sig" {
                return Err(JwksError::InvalidKey(format!("use '{}' is not sig", key_use)));
            }
        }

        let alg = jwk
            .alg
            .as_deref()
            .map(|a| {
                Algorithm::from_str(a)
                    .map_err(|_| JwksError::InvalidKey(format!("unsupported alg '{}'", a)))
            })
            .transpose()?;

        let (family, decoding_key) = match jwk.kty.as_str() {
            "RSA" => {
                let n = required_member(jwk.n.as_deref(), "n")?;
                let e = required_member(jwk.e.as_deref(), "e")?;
                let key = DecodingKey::from_rsa_components(n, e)
                    .map_err(|err| JwksError::InvalidKey(format!("bad RSA components: {err}")))?;
                (KeyFamily::Rsa, key)
            }
            "EC" => {
                match jwk.crv.as_deref() {
                    Some("P-256") | Some("P-384") => {}
                    other => {
                        return Err(JwksError::InvalidKey(format!(
                            "unsupported EC curve {:?}",
                            other
                        )))
                    }
                }
                let x = required_member(jwk.x.as_deref(), "x")?;
                let y = required_member(jwk.y.as_deref(), "y")?;
                let key = DecodingKey::from_ec_components(x, y)
                    .map_err(|err| JwksError::InvalidKey(format!("bad EC components: {err}")))?;
                (KeyFamily::Ec, key)
            }
            "OKP" => {
                if jwk.crv.as_deref() != Some("Ed25519") {
                    return Err(JwksError::InvalidKey(format!(
                        "unsupported OKP curve {:?}",
                        jwk.crv
                    )));
                }
                let x = required_member(jwk.x.as_deref(), "x")?;
                let bytes = decode_ed25519_public_key_jwk(x)
                    .map_err(|err| JwksError::InvalidKey(format!("bad OKP key: {err}")))?;
                (KeyFamily::Okp, DecodingKey::from_ed_der(&bytes))
            }
            other => {
                return Err(JwksError::InvalidKey(format!("unsupported kty '{}'", other)));
            }
        };

        if let Some(alg) = alg {
            if !family.supports(alg) {
                return Err(JwksError::InvalidKey(format!(
                    "alg {:?} does not match kty '{}'",
                    alg, jwk.kty
                )));
            }
        }

        Ok(Self {
            kid,
            family,
            alg,
            decoding_key,
        })
    }

    /// Build an RS256 key from base64url modulus and exponent.
    ///
    /// # Errors
    ///
    /// Returns `JwksError::InvalidKey` if the components do not decode.
    pub fn from_rsa_components(kid: &str, n: &str, e: &str) -> Result<Self, JwksError> {
        let decoding_key = DecodingKey::from_rsa_components(n, e)
            .map_err(|err| JwksError::InvalidKey(format!("bad RSA components: {err}")))?;
        Ok(Self {
            kid: kid.to_string(),
            family: KeyFamily::Rsa,
            alg: Some(Algorithm::RS256),
            decoding_key,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn family(&self) -> KeyFamily {
        self.family
    }

    /// The algorithm pinned by the JWK, if it published one.
    pub fn alg(&self) -> Option<Algorithm> {
        self.alg
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Whether a token header `alg` may be verified with this key.
    pub fn accepts(&self, alg: Algorithm) -> bool {
        self.family.supports(alg) && self.alg.map_or(true, |pinned| pinned == alg)
    }
}

fn required_member<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, JwksError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| JwksError::InvalidKey(format!("missing '{}'", name)))
}

/// Immutable set of verification keys.
#[derive(Debug, Clone, Default)]
pub struct SigningKeySet {
    keys: Vec<SigningKey>,

    /// Kids of published records that were skipped as unusable.
    skipped_kids: HashSet<String>,
}

impl SigningKeySet {
    /// Build a set from already materialized keys. Duplicated kids are kept.
    pub fn new(keys: Vec<SigningKey>) -> Self {
        Self {
            keys,
            skipped_kids: HashSet::new(),
        }
    }

    /// Build a set from a JWKS document, skipping unusable records.
    ///
    /// # Errors
    ///
    /// Returns `JwksError::NoUsableKeys` if no record could be materialized.
    pub fn from_jwks(jwks: &JwksResponse) -> Result<Self, JwksError> {
        let mut keys = Vec::with_capacity(jwks.keys.len());
        let mut skipped_kids = HashSet::new();
        for jwk in &jwks.keys {
            match SigningKey::from_jwk(jwk) {
                Ok(key) => keys.push(key),
                Err(e) => {
                    if let Some(kid) = jwk.kid.as_deref().filter(|kid| !kid.is_empty()) {
                        skipped_kids.insert(kid.to_string());
                    }
                    tracing::warn!(
                        target: "sync.auth.jwks",
                        kid = ?jwk.kid,
                        kty = %jwk.kty,
                        error = %e,
                        "Skipping JWK"
                    );
                }
            }
        }

        if keys.is_empty() {
            return Err(JwksError::NoUsableKeys);
        }

        Ok(Self { keys, skipped_kids })
    }

    /// Select the key published under exactly this `kid`.
    ///
    /// A skipped record still counts as a publication of its `kid`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no usable key matches, `Ambiguous` when the `kid`
    /// was published more than once.
    pub fn resolve(&self, kid: &str) -> Result<&SigningKey, KeyResolutionError> {
        let mut matches = self.keys.iter().filter(|k| k.kid == kid);
        match (matches.next(), matches.next()) {
            (None, _) => Err(KeyResolutionError::NotFound),
            (Some(_), Some(_)) => Err(KeyResolutionError::Ambiguous),
            (Some(_), None) if self.skipped_kids.contains(kid) => {
                Err(KeyResolutionError::Ambiguous)
            }
            (Some(key), None) => Ok(key),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key IDs in publication order.
    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.kid.as_str())
    }
}

/// Holder for the active key set.
///
/// Readers take an `Arc` snapshot; the refresh task replaces the whole set.
pub struct KeySetCache {
    current: RwLock<Arc<SigningKeySet>>,
}

impl KeySetCache {
    pub fn new(initial: SigningKeySet) -> Self {
        metrics::set_jwks_keys(initial.len());
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Snapshot of the active key set.
    pub async fn current(&self) -> Arc<SigningKeySet> {
        Arc::clone(&*self.current.read().await)
    }

    /// Swap in a newly fetched key set.
    pub async fn replace(&self, keys: SigningKeySet) {
        let count = keys.len();
        let mut current = self.current.write().await;
        *current = Arc::new(keys);
        drop(current);

        metrics::set_jwks_keys(count);
        tracing::debug!(target: "sync.auth.jwks", key_count = count, "Key set replaced");
    }
}

/// HTTP client for the JWKS endpoint.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,
}

impl JwksClient {
    /// Create a new JWKS client with the default 10s timeout.
    pub fn new(jwks_url: String) -> Self {
        Self::with_timeout(jwks_url, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS))
    }

    /// Create a new JWKS client with a custom request timeout.
    pub fn with_timeout(jwks_url: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "sync.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
        }
    }

    pub fn url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch the JWKS document and materialize its keys.
    ///
    /// # Errors
    ///
    /// Returns `JwksError` if the request fails, the endpoint returns a
    /// non-success status, the body is not a JWKS document, or no key in it
    /// is usable.
    #[instrument(skip(self), fields(url = %self.jwks_url))]
    pub async fn fetch(&self) -> Result<SigningKeySet, JwksError> {
        let result = self.fetch_inner().await;
        metrics::record_jwks_refresh(result.is_ok());
        result
    }

    async fn fetch_inner(&self) -> Result<SigningKeySet, JwksError> {
        tracing::debug!(target: "sync.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let mut response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "sync.auth.jwks", error = %e, "Failed to fetch JWKS");
                JwksError::Fetch(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "sync.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(JwksError::Status(response.status().as_u16()));
        }

        if response
            .content_length()
            .is_some_and(|len| len > MAX_JWKS_BYTES as u64)
        {
            tracing::error!(target: "sync.auth.jwks", "JWKS response exceeds size limit");
            return Err(JwksError::TooLarge(MAX_JWKS_BYTES));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            tracing::error!(target: "sync.auth.jwks", error = %e, "Failed to read JWKS response");
            JwksError::Fetch(e.to_string())
        })? {
            if body.len() + chunk.len() > MAX_JWKS_BYTES {
                tracing::error!(target: "sync.auth.jwks", "JWKS response exceeds size limit");
                return Err(JwksError::TooLarge(MAX_JWKS_BYTES));
            }
            body.extend_from_slice(&chunk);
        }

        let jwks: JwksResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(target: "sync.auth.jwks", error = %e, "Failed to parse JWKS response");
            JwksError::Parse(e.to_string())
        })?;

        let keys = SigningKeySet::from_jwks(&jwks)?;

        tracing::info!(
            target: "sync.auth.jwks",
            key_count = keys.len(),
            "JWKS fetched"
        );

        Ok(keys)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sync_test_utils::{PRIMARY_RSA_MODULUS, SECONDARY_RSA_MODULUS, TEST_RSA_EXPONENT};

    // P-256 public point from RFC 7515 appendix A.3
    const EC_X: &str = "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU";
    const EC_Y: &str = "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0";

    // Ed25519 public key from RFC 8037 appendix A.2
    const OKP_X: &str = "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo";

    fn rsa_jwk(kid: &str) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: Some(kid.to_string()),
            alg: Some("RS256".to_string()),
            key_use: Some("sig".to_string()),
            n: Some(PRIMARY_RSA_MODULUS.to_string()),
            e: Some(TEST_RSA_EXPONENT.to_string()),
            crv: None,
            x: None,
            y: None,
        }
    }

    fn rsa_key(kid: &str, modulus: &str) -> SigningKey {
        SigningKey::from_rsa_components(kid, modulus, TEST_RSA_EXPONENT).unwrap()
    }

    #[test]
    fn test_jwk_deserialization_google_rsa() {
        let json = r#"{
            "kty": "RSA",
            "kid": "6f7254101f56e41cf35c9926de84a2d552b4c6f1",
            "alg": "RS256",
            "use": "sig",
            "n": "abc",
            "e": "AQAB"
        }"#;

        let jwk: Jwk = serde_json::from_str(json).unwrap();

        assert_eq!(jwk.kty, "RSA");
        assert_eq!(
            jwk.kid.as_deref(),
            Some("6f7254101f56e41cf35c9926de84a2d552b4c6f1")
        );
        assert_eq!(jwk.alg.as_deref(), Some("RS256"));
        assert_eq!(jwk.key_use.as_deref(), Some("sig"));
        assert_eq!(jwk.e.as_deref(), Some("AQAB"));
        assert!(jwk.x.is_none());
    }

    #[test]
    fn test_jwks_response_deserialization() {
        let json = r#"{
            "keys": [
                {"kty": "RSA", "kid": "key-1"},
                {"kty": "OKP"}
            ]
        }"#;

        let jwks: JwksResponse = serde_json::from_str(json).unwrap();
        assert_eq!(jwks.keys.len(), 2);
        assert!(jwks.keys.get(1).unwrap().kid.is_none());
    }

    #[test]
    fn test_from_jwk_rsa() {
        let key = SigningKey::from_jwk(&rsa_jwk("rsa-1")).unwrap();
        assert_eq!(key.kid(), "rsa-1");
        assert_eq!(key.family(), KeyFamily::Rsa);
        assert_eq!(key.alg(), Some(Algorithm::RS256));
    }

    #[test]
    fn test_from_jwk_ec() {
        let jwk = Jwk {
            kty: "EC".to_string(),
            kid: Some("ec-1".to_string()),
            alg: Some("ES256".to_string()),
            key_use: None,
            n: None,
            e: None,
            crv: Some("P-256".to_string()),
            x: Some(EC_X.to_string()),
            y: Some(EC_Y.to_string()),
        };

        let key = SigningKey::from_jwk(&jwk).unwrap();
        assert_eq!(key.family(), KeyFamily::Ec);
        assert!(key.accepts(Algorithm::ES256));
        assert!(!key.accepts(Algorithm::ES384));
    }

    #[test]
    fn test_from_jwk_okp() {
        let jwk = Jwk {
            kty: "OKP".to_string(),
            kid: Some("ed-1".to_string()),
            alg: None,
            key_use: Some("sig".to_string()),
            n: None,
            e: None,
            crv: Some("Ed25519".to_string()),
            x: Some(OKP_X.to_string()),
            y: None,
        };

        let key = SigningKey::from_jwk(&jwk).unwrap();
        assert_eq!(key.family(), KeyFamily::Okp);
        assert!(key.accepts(Algorithm::EdDSA));
        assert!(!key.accepts(Algorithm::RS256));
    }

    #[test]
    fn test_from_jwk_rejects_missing_kid() {
        let mut jwk = rsa_jwk("x");
        jwk.kid = None;
        assert!(matches!(
            SigningKey::from_jwk(&jwk),
            Err(JwksError::InvalidKey(msg)) if msg.contains("kid")
        ));

        jwk.kid = Some(String::new());
        assert!(SigningKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn test_from_jwk_rejects_encryption_key() {
        let mut jwk = rsa_jwk("enc");
        jwk.key_use = Some("enc".to_string());
        assert!(SigningKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn test_from_jwk_rejects_unknown_kty() {
        let mut jwk = rsa_jwk("oct");
        jwk.kty = "oct".to_string();
        assert!(matches!(
            SigningKey::from_jwk(&jwk),
            Err(JwksError::InvalidKey(msg)) if msg.contains("kty")
        ));
    }

    #[test]
    fn test_from_jwk_rejects_missing_material() {
        let mut jwk = rsa_jwk("no-n");
        jwk.n = None;
        assert!(SigningKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn test_from_jwk_rejects_family_alg_mismatch() {
        let mut jwk = rsa_jwk("mismatch");
        jwk.alg = Some("ES256".to_string());
        assert!(SigningKey::from_jwk(&jwk).is_err());

        jwk.alg = Some("HS256".to_string());
        assert!(SigningKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn test_accepts_pins_published_alg() {
        let key = SigningKey::from_jwk(&rsa_jwk("pinned")).unwrap();
        assert!(key.accepts(Algorithm::RS256));
        assert!(!key.accepts(Algorithm::RS512));
        assert!(!key.accepts(Algorithm::HS256));

        let mut unpinned = rsa_jwk("unpinned");
        unpinned.alg = None;
        let key = SigningKey::from_jwk(&unpinned).unwrap();
        assert!(key.accepts(Algorithm::RS512));
        assert!(!key.accepts(Algorithm::EdDSA));
    }

    #[test]
    fn test_signing_key_debug_omits_key_material() {
        let key = rsa_key("debug", PRIMARY_RSA_MODULUS);
        let debug_str = format!("{:?}", key);
        assert!(debug_str.contains("debug"));
        assert!(!debug_str.contains(PRIMARY_RSA_MODULUS));
    }

    #[test]
    fn test_from_jwks_skips_unusable_records() {
        let mut no_kid = rsa_jwk("x");
        no_kid.kid = None;
        let jwks = JwksResponse {
            keys: vec![no_kid, rsa_jwk("good")],
        };

        let set = SigningKeySet::from_jwks(&jwks).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.kids().collect::<Vec<_>>(), vec!["good"]);
    }

    #[test]
    fn test_from_jwks_no_usable_keys() {
        let jwks = JwksResponse { keys: vec![] };
        assert!(matches!(
            SigningKeySet::from_jwks(&jwks),
            Err(JwksError::NoUsableKeys)
        ));
    }

    #[test]
    fn test_resolve_exact_match() {
        let set = SigningKeySet::new(vec![
            rsa_key("a", PRIMARY_RSA_MODULUS),
            rsa_key("b", SECONDARY_RSA_MODULUS),
        ]);

        assert_eq!(set.resolve("a").unwrap().kid(), "a");
        assert_eq!(set.resolve("b").unwrap().kid(), "b");
        // Matching is case-sensitive
        assert!(matches!(set.resolve("B"), Err(KeyResolutionError::NotFound)));
    }

    #[test]
    fn test_resolve_not_found() {
        let set = SigningKeySet::new(vec![rsa_key("a", PRIMARY_RSA_MODULUS)]);
        assert!(matches!(
            set.resolve("missing"),
            Err(KeyResolutionError::NotFound)
        ));
        assert!(matches!(set.resolve(""), Err(KeyResolutionError::NotFound)));
    }

    #[test]
    fn test_resolve_empty_set() {
        let set = SigningKeySet::default();
        assert!(set.is_empty());
        assert!(matches!(set.resolve("a"), Err(KeyResolutionError::NotFound)));
    }

    #[test]
    fn test_resolve_duplicate_kid_is_ambiguous() {
        let set = SigningKeySet::new(vec![
            rsa_key("dup", PRIMARY_RSA_MODULUS),
            rsa_key("dup", SECONDARY_RSA_MODULUS),
        ]);
        assert!(matches!(
            set.resolve("dup"),
            Err(KeyResolutionError::Ambiguous)
        ));
    }

    #[test]
    fn test_resolve_kid_shared_with_skipped_record_is_ambiguous() {
        let mut broken = rsa_jwk("dup");
        broken.n = Some("!!notb64".to_string());
        let jwks = JwksResponse {
            keys: vec![rsa_jwk("dup"), broken, rsa_jwk("other")],
        };

        let set = SigningKeySet::from_jwks(&jwks).unwrap();
        assert_eq!(set.len(), 2);
        assert!(matches!(
            set.resolve("dup"),
            Err(KeyResolutionError::Ambiguous)
        ));
        assert_eq!(set.resolve("other").unwrap().kid(), "other");
    }

    #[test]
    fn test_resolve_kid_only_on_skipped_record_is_not_found() {
        let mut broken = rsa_jwk("broken");
        broken.n = Some("!!notb64".to_string());
        let jwks = JwksResponse {
            keys: vec![broken, rsa_jwk("good")],
        };

        let set = SigningKeySet::from_jwks(&jwks).unwrap();
        assert!(matches!(
            set.resolve("broken"),
            Err(KeyResolutionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_key_set_cache_replace_swaps_snapshot() {
        let cache = KeySetCache::new(SigningKeySet::new(vec![rsa_key(
            "old",
            PRIMARY_RSA_MODULUS,
        )]));

        let before = cache.current().await;
        cache
            .replace(SigningKeySet::new(vec![rsa_key(
                "new",
                SECONDARY_RSA_MODULUS,
            )]))
            .await;
        let after = cache.current().await;

        // Snapshots taken earlier are unaffected by the swap
        assert!(before.resolve("old").is_ok());
        assert!(after.resolve("old").is_err());
        assert!(after.resolve("new").is_ok());
    }

    #[test]
    fn test_jwks_client_creation() {
        let client = JwksClient::new("http://localhost:9999/certs".to_string());
        assert_eq!(client.url(), "http://localhost:9999/certs");
    }
}
