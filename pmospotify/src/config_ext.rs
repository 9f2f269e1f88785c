//! Extension pour intégrer la configuration Spotify dans pmoconfig
//!
//! Les valeurs vivent sous `accounts.spotify`. Le client id et le secret
//! peuvent aussi venir de `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET`,
//! auquel cas ils ne sont jamais écrits dans `config.yaml`.

use crate::api::{DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TOKEN_URL};
use anyhow::{Result, anyhow};
use pmoconfig::Config;
use serde_yaml::{Number, Value};

/// Trait d'extension pour gérer la configuration Spotify dans pmoconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmospotify::SpotifyConfigExt;
///
/// let config = get_config();
/// let (client_id, _secret) = config.get_spotify_credentials()?;
/// println!("Spotify app: {}", client_id);
/// ```
pub trait SpotifyConfigExt {
    /// Récupère le client id de l'application Spotify
    fn get_spotify_client_id(&self) -> Option<String>;

    /// Définit le client id de l'application Spotify
    fn set_spotify_client_id(&self, client_id: &str) -> Result<()>;

    /// Récupère le client secret de l'application Spotify
    fn get_spotify_client_secret(&self) -> Option<String>;

    /// Définit le client secret de l'application Spotify
    fn set_spotify_client_secret(&self, secret: &str) -> Result<()>;

    /// Récupère le couple (client id, client secret)
    ///
    /// # Errors
    ///
    /// Retourne une erreur si l'une des deux valeurs manque
    fn get_spotify_credentials(&self) -> Result<(String, String)>;

    /// URL de l'endpoint d'échange de token
    fn get_spotify_token_url(&self) -> String;

    /// URL de base de l'API Web
    fn get_spotify_api_base(&self) -> String;

    /// Timeout des requêtes HTTP, en secondes
    fn get_spotify_timeout_secs(&self) -> u64;

    /// Définit le timeout des requêtes HTTP
    fn set_spotify_timeout_secs(&self, secs: u64) -> Result<()>;
}

impl SpotifyConfigExt for Config {
    fn get_spotify_client_id(&self) -> Option<String> {
        self.get_string(&["accounts", "spotify", "client_id"])
    }

    fn set_spotify_client_id(&self, client_id: &str) -> Result<()> {
        self.set_value(
            &["accounts", "spotify", "client_id"],
            Value::String(client_id.to_string()),
        )
    }

    fn get_spotify_client_secret(&self) -> Option<String> {
        self.get_string(&["accounts", "spotify", "client_secret"])
    }

    fn set_spotify_client_secret(&self, secret: &str) -> Result<()> {
        self.set_value(
            &["accounts", "spotify", "client_secret"],
            Value::String(secret.to_string()),
        )
    }

    fn get_spotify_credentials(&self) -> Result<(String, String)> {
        let client_id = self
            .get_spotify_client_id()
            .ok_or_else(|| anyhow!("Spotify client id not configured"))?;
        let secret = self
            .get_spotify_client_secret()
            .ok_or_else(|| anyhow!("Spotify client secret not configured"))?;
        Ok((client_id, secret))
    }

    fn get_spotify_token_url(&self) -> String {
        self.get_string(&["accounts", "spotify", "token_url"])
            .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string())
    }

    fn get_spotify_api_base(&self) -> String {
        self.get_string(&["accounts", "spotify", "api_base"])
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    fn get_spotify_timeout_secs(&self) -> u64 {
        self.get_u64(&["accounts", "spotify", "timeout_secs"])
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    fn set_spotify_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &["accounts", "spotify", "timeout_secs"],
            Value::Number(Number::from(secs)),
        )
    }
}
