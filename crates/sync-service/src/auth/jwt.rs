//! Identity token verification.
//!
//! Verifies Google-issued identity tokens against the cached key set.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - The signing key is selected by exact `kid`; the header `alg` must match it
//! - `exp` and `nbf` are checked against the current time with no leeway
//! - `iat`, when present, may run ahead of local time by the clock skew
//! - Every failure maps to one `JwtValidationError` kind with a generic message

use crate::auth::claims::IdentityClaims;
use crate::auth::jwks::KeySetCache;
use crate::config::{Config, DEFAULT_TOKEN_ISSUERS};
use crate::observability::metrics;
use common::jwt::{
    decode_unverified_claims, extract_kid, validate_iat, JwtValidationError, DEFAULT_CLOCK_SKEW,
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Validation policy for identity tokens.
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    /// How far `iat` may lie in the future. Not applied to `exp`/`nbf`.
    pub clock_skew: Duration,

    /// Accepted `iss` values.
    pub issuers: Vec<String>,

    /// Whether `aud` must equal the expected audience.
    pub enforce_audience: bool,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            clock_skew: DEFAULT_CLOCK_SKEW,
            issuers: DEFAULT_TOKEN_ISSUERS
                .iter()
                .map(ToString::to_string)
                .collect(),
            enforce_audience: true,
        }
    }
}

impl VerifierSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            clock_skew: Duration::from_secs(config.jwt_clock_skew_seconds.unsigned_abs()),
            issuers: config.token_issuers.clone(),
            enforce_audience: config.enforce_audience,
        }
    }
}

/// Identity token verifier backed by the shared key set.
pub struct IdTokenVerifier {
    key_cache: Arc<KeySetCache>,
    settings: VerifierSettings,
}

impl IdTokenVerifier {
    pub fn new(key_cache: Arc<KeySetCache>, settings: VerifierSettings) -> Self {
        Self {
            key_cache,
            settings,
        }
    }

    /// Verify a bearer token and return its claims.
    ///
    /// # Checks
    ///
    /// 1. Size check and structural parse, `kid` extraction
    /// 2. Key lookup by `kid` in the current key set
    /// 3. Header `alg` must match the key
    /// 4. Signature, `exp`, `nbf` and issuer
    /// 5. `iat`, if present, not too far in the future
    /// 6. Audience, when enforcement is enabled
    ///
    /// # Errors
    ///
    /// Returns the `JwtValidationError` kind of the first failed check.
    #[instrument(skip_all, name = "sync.auth.verify")]
    pub async fn verify(
        &self,
        token: &str,
        expected_audience: &str,
    ) -> Result<IdentityClaims, JwtValidationError> {
        let start = Instant::now();
        let result = self.verify_inner(token, expected_audience).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.as_label(),
        };
        metrics::record_token_validation(outcome, start.elapsed());

        result
    }

    async fn verify_inner(
        &self,
        token: &str,
        expected_audience: &str,
    ) -> Result<IdentityClaims, JwtValidationError> {
        // 1. Extract kid from JWT header (includes size check via common::jwt)
        let kid = extract_kid(token).map_err(|e| {
            tracing::debug!(target: "sync.auth.jwt", error = ?e, "Token kid extraction failed");
            e
        })?;

        let header = decode_header(token).map_err(|e| {
            tracing::debug!(target: "sync.auth.jwt", error = %e, "Token header decode failed");
            JwtValidationError::MalformedToken
        })?;

        // Logged for every structurally valid token, whatever the outcome
        let unverified = decode_unverified_claims(token)?;
        tracing::info!(
            target: "sync.auth.jwt",
            aud = %claim_for_log(&unverified, "aud"),
            iss = %claim_for_log(&unverified, "iss"),
            "Token parsed"
        );

        // 2. Resolve the signing key from the current snapshot
        let keys = self.key_cache.current().await;
        let key = keys.resolve(&kid).map_err(|e| {
            tracing::debug!(target: "sync.auth.jwt", kid = %kid, error = %e, "Signing key not resolved");
            JwtValidationError::UnknownKey
        })?;

        // 3. Algorithm must match the key family and any pinned alg
        if !key.accepts(header.alg) {
            tracing::debug!(
                target: "sync.auth.jwt",
                kid = %kid,
                alg = ?header.alg,
                "Token algorithm does not match signing key"
            );
            return Err(JwtValidationError::UnsupportedAlgorithm);
        }

        // 4. Signature, exp, nbf and issuer
        let mut validation = Validation::new(header.alg);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Audience is compared below so that it can be switched off
        validation.validate_aud = false;
        validation.set_issuer(&self.settings.issuers);
        validation.set_required_spec_claims(&["exp", "iss"]);

        let token_data =
            decode::<IdentityClaims>(token, key.decoding_key(), &validation).map_err(|e| {
                let kind = map_decode_error(e.kind());
                tracing::debug!(target: "sync.auth.jwt", error = %e, kind = kind.as_label(), "Token verification failed");
                kind
            })?;
        let claims = token_data.claims;

        // 5. iat with clock skew tolerance
        if let Some(iat) = claims.iat {
            validate_iat(iat, self.settings.clock_skew)?;
        }

        // 6. Audience
        if self.settings.enforce_audience && !claims.aud.contains(expected_audience) {
            tracing::debug!(
                target: "sync.auth.jwt",
                aud = %claims.aud,
                expected = %expected_audience,
                "Token audience mismatch"
            );
            return Err(JwtValidationError::InvalidAudience);
        }

        tracing::debug!(target: "sync.auth.jwt", "Token validated successfully");
        Ok(claims)
    }
}

fn claim_for_log(claims: &serde_json::Map<String, serde_json::Value>, name: &str) -> String {
    match claims.get(name) {
        Some(serde_json::Value::String(value)) => value.clone(),
        Some(other) => other.to_string(),
        None => "<absent>".to_string(),
    }
}

/// Map a `jsonwebtoken` failure onto the validation error taxonomy.
fn map_decode_error(kind: &ErrorKind) -> JwtValidationError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::Crypto(_) => JwtValidationError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtValidationError::Expired,
        ErrorKind::ImmatureSignature => JwtValidationError::NotYetValid,
        ErrorKind::InvalidIssuer => JwtValidationError::InvalidIssuer,
        ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => {
            JwtValidationError::InvalidIssuer
        }
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            JwtValidationError::UnsupportedAlgorithm
        }
        _ => JwtValidationError::MalformedToken,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::jwks::{Jwk, JwksResponse, SigningKey, SigningKeySet};
    use jsonwebtoken::Algorithm;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use sync_test_utils::{
        IdTokenClaimsBuilder, TestCurveKeypair, TestKeypair, PRIMARY_KID, PRIMARY_RSA_MODULUS, SECONDARY_KID,
        SECONDARY_RSA_MODULUS, TEST_AUDIENCE, TEST_RSA_EXPONENT,
    };

    fn rsa_key(kid: &str, modulus: &str) -> SigningKey {
        SigningKey::from_rsa_components(kid, modulus, TEST_RSA_EXPONENT).unwrap()
    }

    fn verifier_with(keys: Vec<SigningKey>, settings: VerifierSettings) -> IdTokenVerifier {
        let cache = Arc::new(KeySetCache::new(SigningKeySet::new(keys)));
        IdTokenVerifier::new(cache, settings)
    }

    /// Verifier holding both fixture keys under their own kids.
    fn verifier() -> IdTokenVerifier {
        verifier_with(
            vec![
                rsa_key(PRIMARY_KID, PRIMARY_RSA_MODULUS),
                rsa_key(SECONDARY_KID, SECONDARY_RSA_MODULUS),
            ],
            VerifierSettings::default(),
        )
    }

    fn sign(claims: &serde_json::Value) -> String {
        TestKeypair::primary().sign(claims).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_returns_payload_claims() {
        let claims = IdTokenClaimsBuilder::new()
            .for_email("nightly-sync@ops-project.iam.gserviceaccount.com")
            .with_subject("998877665544332211")
            .build();
        let token = sign(&claims);

        let verified = verifier().verify(&token, TEST_AUDIENCE).await.unwrap();

        let expected: IdentityClaims = serde_json::from_value(claims).unwrap();
        assert_eq!(verified, expected);
    }

    #[tokio::test]
    async fn test_secondary_key_verifies_its_own_tokens() {
        let claims = IdTokenClaimsBuilder::new().build();
        let token = TestKeypair::secondary().sign(&claims).unwrap();

        assert!(verifier().verify(&token, TEST_AUDIENCE).await.is_ok());
    }

    fn curve_verifier(keypair: &TestCurveKeypair) -> IdTokenVerifier {
        let jwk: Jwk = serde_json::from_value(keypair.jwk_json()).unwrap();
        verifier_with(
            vec![SigningKey::from_jwk(&jwk).unwrap()],
            VerifierSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_es256_token_round_trip() {
        let keypair = TestCurveKeypair::p256("ec-sig-1");
        let claims = IdTokenClaimsBuilder::new().build();
        let token = keypair.sign(&claims).unwrap();

        let verified = curve_verifier(&keypair)
            .verify(&token, TEST_AUDIENCE)
            .await
            .unwrap();
        assert_eq!(verified, serde_json::from_value(claims).unwrap());
    }

    #[tokio::test]
    async fn test_eddsa_token_round_trip() {
        let keypair = TestCurveKeypair::ed25519("ed-sig-1");
        let claims = IdTokenClaimsBuilder::new().build();
        let token = keypair.sign(&claims).unwrap();

        let verified = curve_verifier(&keypair)
            .verify(&token, TEST_AUDIENCE)
            .await
            .unwrap();
        assert_eq!(verified, serde_json::from_value(claims).unwrap());
    }

    #[tokio::test]
    async fn test_curve_key_rejects_rsa_signed_token_under_its_kid() {
        let keypair = TestCurveKeypair::p256("ec-sig-1");
        let token = TestKeypair::primary()
            .sign_with(Algorithm::RS256, Some("ec-sig-1"), &IdTokenClaimsBuilder::new().build())
            .unwrap();

        let err = curve_verifier(&keypair)
            .verify(&token, TEST_AUDIENCE)
            .await
            .unwrap_err();
        assert_eq!(err, JwtValidationError::UnsupportedAlgorithm);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_malformed() {
        let token = sign(&IdTokenClaimsBuilder::new().build());
        let mut parts = token.split('.');
        let header = parts.next().unwrap();
        let signature = parts.nth(1).unwrap();

        let err = verifier()
            .verify(&format!("{header}.!!!.{signature}"), TEST_AUDIENCE)
            .await
            .unwrap_err();
        assert_eq!(err, JwtValidationError::MalformedToken);
    }

    #[test]
    fn test_claim_for_log() {
        let claims = serde_json::json!({"aud": "https://svc", "iss": 7})
            .as_object()
            .cloned()
            .unwrap();

        assert_eq!(claim_for_log(&claims, "aud"), "https://svc");
        assert_eq!(claim_for_log(&claims, "iss"), "7");
        assert_eq!(claim_for_log(&claims, "sub"), "<absent>");
    }

    #[tokio::test]
    async fn test_unknown_kid() {
        let claims = IdTokenClaimsBuilder::new().build();
        let token = TestKeypair::primary()
            .with_kid("rotated-away")
            .sign(&claims)
            .unwrap();

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::UnknownKey);
    }

    #[tokio::test]
    async fn test_duplicate_kid_is_unknown_key() {
        let verifier = verifier_with(
            vec![
                rsa_key(PRIMARY_KID, PRIMARY_RSA_MODULUS),
                rsa_key(PRIMARY_KID, SECONDARY_RSA_MODULUS),
            ],
            VerifierSettings::default(),
        );
        let token = sign(&IdTokenClaimsBuilder::new().build());

        let err = verifier.verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::UnknownKey);
    }

    #[tokio::test]
    async fn test_kid_shared_with_unusable_record_is_unknown_key() {
        let mut broken = TestKeypair::primary().jwk_json();
        broken["n"] = serde_json::json!("!!notb64");
        let jwks: JwksResponse = serde_json::from_value(serde_json::json!({
            "keys": [TestKeypair::primary().jwk_json(), broken],
        }))
        .unwrap();
        let cache = Arc::new(KeySetCache::new(SigningKeySet::from_jwks(&jwks).unwrap()));
        let verifier = IdTokenVerifier::new(cache, VerifierSettings::default());
        let token = sign(&IdTokenClaimsBuilder::new().build());

        let err = verifier.verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::UnknownKey);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let claims = IdTokenClaimsBuilder::new().expires_in(-3600).build();
        let token = sign(&claims);

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::Expired);
    }

    #[tokio::test]
    async fn test_token_expired_one_second_ago() {
        let claims = IdTokenClaimsBuilder::new()
            .issued_at(chrono::Utc::now().timestamp() - 3600)
            .expires_in(-1)
            .build();
        let token = sign(&claims);

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::Expired);
    }

    #[tokio::test]
    async fn test_clock_skew_does_not_extend_expiry() {
        let verifier = verifier_with(
            vec![rsa_key(PRIMARY_KID, PRIMARY_RSA_MODULUS)],
            VerifierSettings {
                clock_skew: Duration::from_secs(600),
                ..VerifierSettings::default()
            },
        );
        let token = sign(
            &IdTokenClaimsBuilder::new()
                .issued_at(chrono::Utc::now().timestamp() - 3600)
                .expires_in(-45)
                .build(),
        );

        let err = verifier.verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::Expired);
    }

    #[tokio::test]
    async fn test_token_without_iat_accepted() {
        let claims = IdTokenClaimsBuilder::new().without_issued_at().build();
        let token = sign(&claims);

        let verified = verifier().verify(&token, TEST_AUDIENCE).await.unwrap();
        assert!(verified.iat.is_none());
        assert_eq!(verified, serde_json::from_value(claims).unwrap());
    }

    #[tokio::test]
    async fn test_signature_from_different_key() {
        let claims = IdTokenClaimsBuilder::new().build();
        // Header names the primary key, signature comes from the secondary
        let token = TestKeypair::secondary()
            .sign_with(Algorithm::RS256, Some(PRIMARY_KID), &claims)
            .unwrap();

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::InvalidSignature);
    }

    #[tokio::test]
    async fn test_tampered_payload() {
        let token = sign(&IdTokenClaimsBuilder::new().build());
        let other = sign(&IdTokenClaimsBuilder::new().for_email("attacker@example.com").build());

        let mut parts = token.split('.');
        let header = parts.next().unwrap();
        let signature = parts.nth(1).unwrap();
        let other_payload = other.split('.').nth(1).unwrap();
        let tampered = format!("{}.{}.{}", header, other_payload, signature);

        let err = verifier().verify(&tampered, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::InvalidSignature);
    }

    #[tokio::test]
    async fn test_algorithm_not_pinned_by_key() {
        let claims = IdTokenClaimsBuilder::new().build();
        let token = TestKeypair::primary()
            .sign_with(Algorithm::RS512, Some(PRIMARY_KID), &claims)
            .unwrap();

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::UnsupportedAlgorithm);
    }

    #[tokio::test]
    async fn test_missing_kid() {
        let claims = IdTokenClaimsBuilder::new().build();
        let token = TestKeypair::primary()
            .sign_with(Algorithm::RS256, None, &claims)
            .unwrap();

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::MissingKid);
    }

    #[tokio::test]
    async fn test_malformed_tokens() {
        let verifier = verifier();
        for token in ["invalid.token.value", "", "a.b", "a.b.c.d", "..."] {
            let err = verifier.verify(token, TEST_AUDIENCE).await.unwrap_err();
            assert_eq!(err, JwtValidationError::MalformedToken, "token {:?}", token);
        }
    }

    #[tokio::test]
    async fn test_oversized_token() {
        let token = "a".repeat(common::jwt::MAX_JWT_SIZE_BYTES + 1);
        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::TokenTooLarge);
    }

    #[tokio::test]
    async fn test_missing_exp_is_malformed() {
        let mut claims = IdTokenClaimsBuilder::new().build();
        claims.as_object_mut().unwrap().remove("exp");
        let token = sign(&claims);

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::MalformedToken);
    }

    #[tokio::test]
    async fn test_not_yet_valid() {
        let claims = IdTokenClaimsBuilder::new().not_before_in(600).build();
        let token = sign(&claims);

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::NotYetValid);
    }

    #[tokio::test]
    async fn test_not_before_checked_without_leeway() {
        let claims = IdTokenClaimsBuilder::new().not_before_in(30).build();
        let token = sign(&claims);

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::NotYetValid);
    }

    #[tokio::test]
    async fn test_iat_too_far_in_future() {
        let claims = IdTokenClaimsBuilder::new()
            .issued_at(chrono::Utc::now().timestamp() + 600)
            .build();
        let token = sign(&claims);

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::IatTooFarInFuture);
    }

    #[tokio::test]
    async fn test_both_google_issuer_forms_accepted() {
        let verifier = verifier();
        for iss in ["https://accounts.google.com", "accounts.google.com"] {
            let token = sign(&IdTokenClaimsBuilder::new().with_issuer(iss).build());
            assert!(
                verifier.verify(&token, TEST_AUDIENCE).await.is_ok(),
                "issuer {} should be accepted",
                iss
            );
        }
    }

    #[tokio::test]
    async fn test_foreign_issuer_rejected() {
        let token = sign(
            &IdTokenClaimsBuilder::new()
                .with_issuer("https://evil.example.com")
                .build(),
        );

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::InvalidIssuer);
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected_when_enforced() {
        let token = sign(
            &IdTokenClaimsBuilder::new()
                .with_audience("https://other-service.run.app")
                .build(),
        );

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::InvalidAudience);
    }

    #[tokio::test]
    async fn test_wrong_audience_accepted_when_not_enforced() {
        let verifier = verifier_with(
            vec![rsa_key(PRIMARY_KID, PRIMARY_RSA_MODULUS)],
            VerifierSettings {
                enforce_audience: false,
                ..VerifierSettings::default()
            },
        );
        let token = sign(
            &IdTokenClaimsBuilder::new()
                .with_audience("https://other-service.run.app")
                .build(),
        );

        let claims = verifier.verify(&token, TEST_AUDIENCE).await.unwrap();
        assert!(claims.aud.contains("https://other-service.run.app"));
    }

    #[tokio::test]
    async fn test_audience_list_containing_expected_audience() {
        let mut claims = IdTokenClaimsBuilder::new().build();
        claims["aud"] = serde_json::json!(["https://other-service.run.app", TEST_AUDIENCE]);
        let token = sign(&claims);

        let verified = verifier().verify(&token, TEST_AUDIENCE).await.unwrap();
        assert_eq!(verified, serde_json::from_value(claims).unwrap());
    }

    #[tokio::test]
    async fn test_audience_list_without_expected_audience() {
        let mut claims = IdTokenClaimsBuilder::new().build();
        claims["aud"] = serde_json::json!(["https://other-service.run.app"]);
        let token = sign(&claims);

        let err = verifier().verify(&token, TEST_AUDIENCE).await.unwrap_err();
        assert_eq!(err, JwtValidationError::InvalidAudience);
    }

    #[tokio::test]
    async fn test_rotation_picks_up_new_key() {
        let cache = Arc::new(KeySetCache::new(SigningKeySet::new(vec![rsa_key(
            PRIMARY_KID,
            PRIMARY_RSA_MODULUS,
        )])));
        let verifier = IdTokenVerifier::new(cache.clone(), VerifierSettings::default());
        let token = TestKeypair::secondary()
            .sign(&IdTokenClaimsBuilder::new().build())
            .unwrap();

        assert_eq!(
            verifier.verify(&token, TEST_AUDIENCE).await.unwrap_err(),
            JwtValidationError::UnknownKey
        );

        cache
            .replace(SigningKeySet::new(vec![rsa_key(
                SECONDARY_KID,
                SECONDARY_RSA_MODULUS,
            )]))
            .await;

        assert!(verifier.verify(&token, TEST_AUDIENCE).await.is_ok());
    }

    #[test]
    fn test_verify_records_outcome_metric() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let verifier = verifier();
        let token = sign(&IdTokenClaimsBuilder::new().expires_in(-3600).build());

        ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let _ = verifier.verify(&token, TEST_AUDIENCE).await;
            })
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let counter = snapshot
            .iter()
            .find(|(key, _, _, _)| {
                key.key().name() == "sync_token_validations_total"
                    && key
                        .key()
                        .labels()
                        .any(|l| l.key() == "outcome" && l.value() == "expired")
            })
            .expect("validation counter should be recorded");
        assert!(matches!(counter.3, DebugValue::Counter(1)));
    }

    #[test]
    fn test_map_decode_error() {
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidSignature),
            JwtValidationError::InvalidSignature
        );
        assert_eq!(
            map_decode_error(&ErrorKind::ExpiredSignature),
            JwtValidationError::Expired
        );
        assert_eq!(
            map_decode_error(&ErrorKind::ImmatureSignature),
            JwtValidationError::NotYetValid
        );
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidIssuer),
            JwtValidationError::InvalidIssuer
        );
        assert_eq!(
            map_decode_error(&ErrorKind::MissingRequiredClaim("iss".to_string())),
            JwtValidationError::InvalidIssuer
        );
        assert_eq!(
            map_decode_error(&ErrorKind::MissingRequiredClaim("exp".to_string())),
            JwtValidationError::MalformedToken
        );
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidAlgorithm),
            JwtValidationError::UnsupportedAlgorithm
        );
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidToken),
            JwtValidationError::MalformedToken
        );
    }

    #[test]
    fn test_settings_from_config() {
        let vars = std::collections::HashMap::from([
            ("GCS_SRC".to_string(), "src".to_string()),
            ("GCS_DEST".to_string(), "dest".to_string()),
            ("AUDIENCE".to_string(), "aud".to_string()),
            ("JWT_CLOCK_SKEW_SECONDS".to_string(), "30".to_string()),
            ("ENFORCE_AUDIENCE".to_string(), "false".to_string()),
        ]);
        let config = Config::from_vars(&vars).unwrap();

        let settings = VerifierSettings::from_config(&config);
        assert_eq!(settings.clock_skew, Duration::from_secs(30));
        assert!(!settings.enforce_audience);
        assert_eq!(settings.issuers.len(), 2);
    }
}
