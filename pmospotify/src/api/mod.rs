//! Couche d'accès à l'API REST Spotify
//!
//! Ce module fournit une interface bas-niveau, sans état d'authentification :
//! chaque appel reçoit le bearer token à utiliser. La gestion du token est
//! faite par [`crate::SpotifyClient`].

pub mod auth;
pub mod catalog;

use crate::error::{Result, SpotifyError};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// URL de base de l'API Web Spotify
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// URL de l'endpoint d'échange de token
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Timeout par défaut des requêtes HTTP
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client API bas-niveau pour communiquer avec Spotify
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    client: Client,
    api_base: String,
    token_url: String,
}

impl SpotifyApi {
    /// Crée une nouvelle instance de l'API
    pub fn new(
        api_base: impl Into<String>,
        token_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pmospotify/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
        })
    }

    /// Retourne l'URL de base de l'API
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Retourne l'URL d'échange de token
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// URL d'un endpoint, chaque segment étant encodé séparément
    ///
    /// Un segment contenant `/` ou `?` reste un seul segment de chemin.
    pub(crate) fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| SpotifyError::Configuration(format!("invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SpotifyError::Configuration("API base URL cannot have a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Effectue une requête GET authentifiée par bearer token
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        token: &str,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint_url(segments)?;

        debug!("GET {} with {} params", url, params.len());

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Traite la réponse HTTP
    pub(crate) async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("API error ({}): {}", status.as_u16(), error_text);
            return Err(SpotifyError::from_status_code(status.as_u16(), error_text));
        }

        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            SpotifyError::JsonParse(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_creation_trims_trailing_slash() {
        let api = SpotifyApi::new(
            "http://localhost:1234/v1/",
            "http://localhost:1234/token",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(api.api_base(), "http://localhost:1234/v1");
        assert_eq!(api.token_url(), "http://localhost:1234/token");
    }

    #[test]
    fn test_endpoint_url_escapes_segments() {
        let api = SpotifyApi::new(
            "http://localhost:1234/v1",
            "http://localhost:1234/token",
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            api.endpoint_url(&["search"]).unwrap().as_str(),
            "http://localhost:1234/v1/search"
        );
        assert_eq!(
            api.endpoint_url(&["audio-features", "a/b?x=1"]).unwrap().as_str(),
            "http://localhost:1234/v1/audio-features/a%2Fb%3Fx=1"
        );
    }
}
