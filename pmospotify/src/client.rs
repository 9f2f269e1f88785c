//! Client principal pour interagir avec l'API Spotify
//!
//! Ce module fournit un client haut-niveau qui possède le token d'accès
//! (client credentials) et le renouvelle de façon transparente avant chaque
//! appel quand il est absent ou périmé.

use crate::api::{DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TOKEN_URL, SpotifyApi};
use crate::catalog::{CatalogOutcome, TrackCatalog};
use crate::config_ext::SpotifyConfigExt;
use crate::error::{Result, SpotifyError};
use crate::models::{AudioFeatures, Credential, Track};
use async_trait::async_trait;
use pmoconfig::Config;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Nombre de résultats par défaut d'une recherche
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Borne haute acceptée par l'endpoint /search
const MAX_SEARCH_LIMIT: u32 = 50;

/// Client Spotify haut-niveau avec cache de credential
///
/// Le client est partagé entre les handlers HTTP (derrière un `Arc`) ; le
/// credential est protégé par un `RwLock` asynchrone. Deux requêtes qui
/// trouvent simultanément un token périmé peuvent chacune en redemander un :
/// le dernier écrit gagne, les deux tokens restent valides.
pub struct SpotifyClient {
    api: SpotifyApi,
    client_id: Option<String>,
    client_secret: Option<String>,
    credential: RwLock<Option<Credential>>,
}

impl SpotifyClient {
    /// Crée un client avec les URLs Spotify par défaut
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// use pmospotify::SpotifyClient;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let client = SpotifyClient::new("client-id", "client-secret")?;
    ///     let tracks = client.search("daft punk", 5).await.into_list();
    ///     println!("{} tracks", tracks.len());
    ///     Ok(())
    /// }
    /// ```
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self> {
        Self::builder()
            .client_id(client_id)
            .client_secret(client_secret)
            .build()
    }

    /// Builder pour personnaliser URLs et timeout (tests, proxys)
    pub fn builder() -> SpotifyClientBuilder {
        SpotifyClientBuilder::default()
    }

    /// Crée un client en utilisant la configuration de pmoconfig
    pub fn from_config() -> Result<Self> {
        let config = pmoconfig::get_config();
        Self::from_config_obj(config.as_ref())
    }

    /// Crée un client depuis un objet Config spécifique
    ///
    /// # Errors
    ///
    /// `SpotifyError::Config` si le client id ou le secret manque
    pub fn from_config_obj(config: &Config) -> Result<Self> {
        let (client_id, client_secret) = config.get_spotify_credentials()?;
        Self::builder()
            .client_id(client_id)
            .client_secret(client_secret)
            .api_base(config.get_spotify_api_base())
            .token_url(config.get_spotify_token_url())
            .timeout(Duration::from_secs(config.get_spotify_timeout_secs()))
            .build()
    }

    /// Retourne l'API bas-niveau
    pub fn api(&self) -> &SpotifyApi {
        &self.api
    }

    /// Retourne un bearer token valide, en le renouvelant si nécessaire
    ///
    /// # Errors
    ///
    /// `SpotifyError::Credential` si l'échange échoue pour une raison
    /// quelconque (credentials absents, réseau, réponse invalide). Le
    /// credential en cache n'est remplacé que par un échange réussi.
    pub async fn ensure_credential(&self) -> Result<String> {
        if let Some(credential) = self.credential.read().await.as_ref() {
            if credential.is_fresh() {
                return Ok(credential.token.clone());
            }
            debug!("Cached Spotify token is stale, refreshing");
        }

        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(SpotifyError::Credential(
                "client id or client secret not configured".into(),
            ));
        };

        let credential = self
            .api
            .exchange_client_credentials(client_id, client_secret)
            .await
            .map_err(|e| match e {
                SpotifyError::Credential(_) => e,
                other => SpotifyError::Credential(other.to_string()),
            })?;

        let token = credential.token.clone();
        *self.credential.write().await = Some(credential);
        info!("Spotify access token refreshed");
        Ok(token)
    }

    /// Recherche de pistes, erreurs propagées
    pub async fn try_search(&self, query: &str, limit: u32) -> Result<Vec<Track>> {
        let token = self.ensure_credential().await?;
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        self.api.search_tracks(&token, query, limit).await
    }

    /// Audio features, erreurs propagées
    pub async fn try_audio_features(&self, track_id: &str) -> Result<AudioFeatures> {
        let token = self.ensure_credential().await?;
        self.api.get_audio_features(&token, track_id).await
    }

    /// Recherche de pistes, en mode dégradé
    ///
    /// Une requête vide ne déclenche aucun appel et renvoie
    /// [`CatalogOutcome::NoInput`]. Toute erreur (credential, transport,
    /// réponse illisible) est journalisée et renvoyée comme
    /// [`CatalogOutcome::Unavailable`].
    pub async fn search(&self, query: &str, limit: u32) -> CatalogOutcome<Vec<Track>> {
        let query = query.trim();
        if query.is_empty() {
            return CatalogOutcome::NoInput;
        }

        match self.try_search(query, limit).await {
            Ok(tracks) => {
                debug!(query, count = tracks.len(), "Spotify search done");
                CatalogOutcome::Found(tracks)
            }
            Err(e) => {
                warn!(query, error = %e, "Spotify search unavailable");
                CatalogOutcome::Unavailable(e.to_string())
            }
        }
    }

    /// Audio features d'une piste, en mode dégradé
    pub async fn audio_features(&self, track_id: &str) -> CatalogOutcome<AudioFeatures> {
        let track_id = track_id.trim();
        if track_id.is_empty() {
            return CatalogOutcome::NoInput;
        }

        match self.try_audio_features(track_id).await {
            Ok(features) => CatalogOutcome::Found(features),
            Err(e) => {
                warn!(track_id, error = %e, "Spotify audio features unavailable");
                CatalogOutcome::Unavailable(e.to_string())
            }
        }
    }
}

#[async_trait]
impl TrackCatalog for SpotifyClient {
    async fn search(&self, query: &str, limit: u32) -> CatalogOutcome<Vec<Track>> {
        SpotifyClient::search(self, query, limit).await
    }

    async fn audio_features(&self, track_id: &str) -> CatalogOutcome<AudioFeatures> {
        SpotifyClient::audio_features(self, track_id).await
    }
}

/// Builder pour configurer un [`SpotifyClient`]
#[derive(Debug)]
pub struct SpotifyClientBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    api_base: String,
    token_url: String,
    timeout: Duration,
}

impl Default for SpotifyClientBuilder {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl SpotifyClientBuilder {
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Set the API base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Set the token exchange URL
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client
    ///
    /// Les credentials peuvent manquer : le client est alors construit mais
    /// chaque appel sera rapporté comme indisponible.
    pub fn build(self) -> Result<SpotifyClient> {
        if self.client_id.is_none() || self.client_secret.is_none() {
            warn!("Spotify client built without credentials, catalogue calls will degrade");
        }

        Ok(SpotifyClient {
            api: SpotifyApi::new(self.api_base, self.token_url, self.timeout)?,
            client_id: self.client_id,
            client_secret: self.client_secret,
            credential: RwLock::new(None),
        })
    }
}
