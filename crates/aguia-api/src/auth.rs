use std::time::Duration;

use aguia_core::{Caller, Capability, UserId};
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;

/// The verified principal of a request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub caller: Caller,
    pub token_id: Option<String>,
}

/// Claims carried by access tokens the host platform issues for this service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Capability names, e.g. `user:editownprofile`
    #[serde(default)]
    pub caps: Vec<String>,
}

/// HS256 verifier for bearer tokens signed with the shared secret
pub struct TokenVerifier {
    key: DecodingKey,
    issuer: Option<String>,
    clock_skew: Duration,
}

impl TokenVerifier {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            clock_skew: config.auth_clock_skew,
        }
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }

        let decoded = decode::<AccessClaims>(token, &self.key, &validation).map_err(|error| {
            AppError::unauthorized(format!("Token validation failed: {}", sanitize(&error)))
        })?;
        let claims = decoded.claims;

        if self.issuer.is_some() && claims.iss.is_none() {
            return Err(AppError::unauthorized("Token missing `iss` claim"));
        }
        validate_temporal_claims(&claims, self.clock_skew)?;

        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Token subject is missing"))?;
        let capabilities = claims
            .caps
            .iter()
            .filter_map(|name| Capability::parse(name));

        Ok(AuthenticatedUser {
            caller: Caller::new(user_id, capabilities),
            token_id: claims.jti,
        })
    }
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Authorization header is not valid UTF-8"))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AppError::unauthorized("Authorization header must be `Bearer <token>`"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::unauthorized(
            "Authorization scheme must be `Bearer`",
        ));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::unauthorized("Bearer token is empty"));
    }

    Ok(token)
}

fn validate_temporal_claims(claims: &AccessClaims, clock_skew: Duration) -> Result<(), AppError> {
    let now = chrono::Utc::now().timestamp();
    let skew = i64::try_from(clock_skew.as_secs()).unwrap_or(0);

    let exp = claims
        .exp
        .ok_or_else(|| AppError::unauthorized("Token missing `exp` claim"))?;
    if exp <= now.saturating_sub(skew) {
        return Err(AppError::unauthorized("Token is expired"));
    }

    let iat = claims
        .iat
        .ok_or_else(|| AppError::unauthorized("Token missing `iat` claim"))?;
    if iat > now.saturating_add(skew) {
        return Err(AppError::unauthorized("Token `iat` is in the future"));
    }

    if let Some(nbf) = claims.nbf {
        if nbf > now.saturating_add(skew) {
            return Err(AppError::unauthorized("Token is not yet valid"));
        }
    }

    Ok(())
}

fn sanitize(error: &impl std::fmt::Display) -> String {
    error.to_string().replace('\n', " ").trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;
    use crate::config::tests::TEST_SECRET;

    pub(crate) fn claims(sub: &str, caps: &[&str]) -> AccessClaims {
        let now = chrono::Utc::now().timestamp();
        AccessClaims {
            sub: sub.to_string(),
            exp: Some(now + 300),
            iat: Some(now),
            nbf: None,
            iss: None,
            jti: None,
            caps: caps.iter().map(|cap| (*cap).to_string()).collect(),
        }
    }

    pub(crate) fn sign(claims: &AccessClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier(issuer: Option<&str>) -> TokenVerifier {
        TokenVerifier {
            key: DecodingKey::from_secret(TEST_SECRET.as_bytes()),
            issuer: issuer.map(str::to_string),
            clock_skew: Duration::from_secs(30),
        }
    }

    #[test]
    fn bearer_token_extractor_accepts_standard_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );

        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn bearer_token_extractor_rejects_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn valid_token_yields_caller_with_known_capabilities() {
        let token = sign(
            &claims("42", &["user:editownprofile", "moodle/site:config"]),
            TEST_SECRET,
        );
        let user = verifier(None).verify_access_token(&token).unwrap();

        assert_eq!(user.caller.user_id.as_str(), "42");
        assert!(user.caller.has(Capability::EditOwnProfile));
        assert!(!user.caller.has(Capability::ManagePrivacy));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = sign(
            &claims("42", &[]),
            "another-secret-that-is-also-long-enough!",
        );
        let err = verifier(None).verify_access_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn issuer_is_enforced_when_configured() {
        let token = sign(&claims("42", &[]), TEST_SECRET);
        assert!(verifier(Some("https://lms.example.edu"))
            .verify_access_token(&token)
            .is_err());

        let mut with_issuer = claims("42", &[]);
        with_issuer.iss = Some("https://lms.example.edu".to_string());
        let token = sign(&with_issuer, TEST_SECRET);
        assert!(verifier(Some("https://lms.example.edu"))
            .verify_access_token(&token)
            .is_ok());
    }

    #[test]
    fn temporal_claims_require_exp_and_iat() {
        let mut missing = claims("42", &[]);
        missing.exp = None;
        missing.iat = None;
        let err = validate_temporal_claims(&missing, Duration::from_secs(60)).unwrap_err();
        assert!(err.to_string().contains("missing `exp`"));
    }

    #[test]
    fn temporal_claims_reject_expired_and_future_tokens() {
        let now = chrono::Utc::now().timestamp();

        let mut expired = claims("42", &[]);
        expired.exp = Some(now - 120);
        let err = validate_temporal_claims(&expired, Duration::from_secs(30)).unwrap_err();
        assert!(err.to_string().contains("expired"));

        let mut future = claims("42", &[]);
        future.iat = Some(now + 120);
        let err = validate_temporal_claims(&future, Duration::from_secs(30)).unwrap_err();
        assert!(err.to_string().contains("future"));
    }

    #[test]
    fn blank_subject_is_rejected() {
        let token = sign(&claims("  ", &[]), TEST_SECRET);
        let err = verifier(None).verify_access_token(&token).unwrap_err();
        assert!(err.to_string().contains("subject"));
    }
}
