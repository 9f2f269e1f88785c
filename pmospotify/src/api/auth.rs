//! Échange client credentials (OAuth2, sans utilisateur final)

use super::SpotifyApi;
use crate::error::{Result, SpotifyError};
use crate::models::{Credential, DEFAULT_TOKEN_LIFETIME_SECS};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

/// Réponse de l'endpoint /api/token
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl SpotifyApi {
    /// Échange le couple client id / secret contre un bearer token
    ///
    /// # Errors
    ///
    /// * `SpotifyError::Http` - Erreur réseau
    /// * `SpotifyError::Unauthorized` / `ApiError` - Statut non 2xx
    /// * `SpotifyError::JsonParse` - Réponse illisible
    /// * `SpotifyError::Credential` - Réponse sans `access_token`
    pub async fn exchange_client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Credential> {
        info!("Requesting Spotify access token (client credentials)");

        let issued_at = Utc::now();
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let body: TokenResponse = Self::handle_response(response).await?;

        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SpotifyError::Credential("token response without access_token".into()))?;
        let lifetime = body.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        let credential = Credential::issued(token, issued_at, lifetime);
        debug!(lifetime, expires_at = %credential.expires_at, "Access token issued");

        Ok(credential)
    }
}
