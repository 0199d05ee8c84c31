//! Supabase Auth (GoTrue) client.
//!
//! Drives the PKCE sign-in flow for the configured OAuth provider, refreshes
//! tokens and revokes them on logout. Only the verified identity and the tokens
//! leave this module; admin lookup happens in [`super::identity`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use nya_core::{AdminId, Email};

use crate::config::SupabaseConfig;
use crate::models::ProviderTokens;

/// Length of the PKCE code verifier (RFC 7636 allows 43-128).
const VERIFIER_LENGTH: usize = 64;

/// Errors that can occur when talking to the auth provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider returned a user without a usable email.
    #[error("provider identity has no valid email")]
    MissingEmail,
}

/// An identity verified by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Provider user id, used as the admin's stable key.
    pub id: AdminId,
    /// Verified email, normalized.
    pub email: Email,
    /// Display name reported by the OAuth provider, if any.
    pub name: Option<String>,
}

/// A signed-in provider session.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub tokens: ProviderTokens,
    pub identity: ExternalIdentity,
}

/// PKCE verifier/challenge pair for one sign-in attempt.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Kept in the session until the callback.
    pub verifier: String,
    /// Sent to the provider (S256 of the verifier).
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a fresh random verifier and its S256 challenge.
    #[must_use]
    pub fn generate() -> Self {
        let verifier: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(VERIFIER_LENGTH)
            .map(char::from)
            .collect();
        let challenge = Self::challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    fn challenge_for(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }
}

/// Supabase Auth API client.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: reqwest::Client,
    base_url: Url,
    oauth_provider: String,
}

impl std::fmt::Debug for SupabaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAuth")
            .field("base_url", &self.base_url.as_str())
            .field("oauth_provider", &self.oauth_provider)
            .finish_non_exhaustive()
    }
}

impl SupabaseAuth {
    /// Create a new Supabase Auth client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| ProviderError::Parse(format!("Invalid anon key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            oauth_provider: config.oauth_provider.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    /// URL that starts the OAuth sign-in at the provider.
    #[must_use]
    pub fn authorize_url(&self, redirect_to: &Url, pkce: &PkceChallenge) -> Url {
        let mut url = self.endpoint("/auth/v1/authorize");
        url.query_pairs_mut()
            .append_pair("provider", &self.oauth_provider)
            .append_pair("redirect_to", redirect_to.as_str())
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "s256");
        url
    }

    /// Exchange an authorization code for a session.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the user has no valid email.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let mut url = self.endpoint("/auth/v1/token");
        url.set_query(Some("grant_type=pkce"));

        let body = serde_json::json!({
            "auth_code": code,
            "code_verifier": verifier,
        });

        self.token_request(url, &body).await
    }

    /// Trade a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the user has no valid email.
    pub async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession, ProviderError> {
        let mut url = self.endpoint("/auth/v1/token");
        url.set_query(Some("grant_type=refresh_token"));

        let body = serde_json::json!({ "refresh_token": refresh_token });

        self.token_request(url, &body).await
    }

    /// Revoke the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(self.endpoint("/auth/v1/logout"))
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    async fn token_request(
        &self,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<ProviderSession, ProviderError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        token.into_session()
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: ProviderUser,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    name: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Result<ProviderSession, ProviderError> {
        let email = self
            .user
            .email
            .as_deref()
            .and_then(|e| Email::parse(e).ok())
            .ok_or(ProviderError::MissingEmail)?;

        let metadata = self.user.user_metadata;
        let name = metadata
            .full_name
            .or(metadata.name)
            .filter(|n| !n.trim().is_empty());

        let expires_at = Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                ProviderError::Parse(format!("expires_in out of range: {}", self.expires_in))
            })?;

        Ok(ProviderSession {
            tokens: ProviderTokens {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at,
            },
            identity: ExternalIdentity {
                id: AdminId::from(self.user.id),
                email,
                name,
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn client() -> SupabaseAuth {
        SupabaseAuth::new(&SupabaseConfig {
            url: Url::parse("https://abc.supabase.co").unwrap(),
            anon_key: SecretString::from("anon-key-value"),
            oauth_provider: "google".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_pkce_challenge_matches_rfc_7636_vector() {
        // Appendix B of RFC 7636.
        assert_eq!(
            PkceChallenge::challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_pkce_generate() {
        let pkce = PkceChallenge::generate();
        assert_eq!(pkce.verifier.len(), VERIFIER_LENGTH);
        assert_eq!(pkce.challenge, PkceChallenge::challenge_for(&pkce.verifier));
        assert_ne!(pkce.verifier, PkceChallenge::generate().verifier);
    }

    #[test]
    fn test_authorize_url() {
        let pkce = PkceChallenge {
            verifier: "v".to_string(),
            challenge: "c".to_string(),
        };
        let redirect = Url::parse("https://admin.nya.org/admin/auth/callback").unwrap();
        let url = client().authorize_url(&redirect, &pkce);

        assert_eq!(url.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("provider".into(), "google".into())));
        assert!(pairs.contains(&(
            "redirect_to".into(),
            "https://admin.nya.org/admin/auth/callback".into()
        )));
        assert!(pairs.contains(&("code_challenge".into(), "c".into())));
        assert!(pairs.contains(&("code_challenge_method".into(), "s256".into())));
    }

    #[test]
    fn test_token_response_into_session() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": {
                "id": "0b6f1f4e-5d8a-4b43-9a53-6f2a3c9c0d11",
                "email": "Priya@NYA.org",
                "user_metadata": { "full_name": "Priya Sharma" }
            }
        }))
        .unwrap();

        let session = token.into_session().unwrap();
        assert_eq!(session.identity.email.as_str(), "priya@nya.org");
        assert_eq!(session.identity.name.as_deref(), Some("Priya Sharma"));
        assert_eq!(
            session.identity.id.as_str(),
            "0b6f1f4e-5d8a-4b43-9a53-6f2a3c9c0d11"
        );
        assert!(!session.tokens.is_expired(Utc::now()));
    }

    #[test]
    fn test_token_response_without_email_is_rejected() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": { "id": "0b6f1f4e-5d8a-4b43-9a53-6f2a3c9c0d11", "email": null }
        }))
        .unwrap();

        assert!(matches!(token.into_session(), Err(ProviderError::MissingEmail)));
    }

    #[test]
    fn test_token_response_with_huge_lifetime_is_rejected() {
        for expires_in in [i64::MAX, i64::MIN] {
            let token: TokenResponse = serde_json::from_value(serde_json::json!({
                "access_token": "at",
                "expires_in": expires_in,
                "refresh_token": "rt",
                "user": { "id": "0b6f1f4e-5d8a-4b43-9a53-6f2a3c9c0d11", "email": "priya@nya.org" }
            }))
            .unwrap();

            assert!(matches!(token.into_session(), Err(ProviderError::Parse(_))));
        }
    }
}
