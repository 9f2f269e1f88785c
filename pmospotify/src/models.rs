//! Structures de données pour représenter les objets Spotify

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Marge retranchée à la durée de vie déclarée d'un token, en secondes,
/// pour forcer un rafraîchissement avant l'expiration réelle.
pub const CREDENTIAL_SAFETY_MARGIN_SECS: i64 = 60;

/// Durée de vie supposée quand le serveur d'autorisation ne la précise pas.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Représente une piste du catalogue
///
/// Immuable une fois construite depuis les données du catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Track {
    /// Identifiant Spotify (unique)
    pub id: String,
    /// Titre de la piste
    pub title: String,
    /// Artistes, joints par ", "
    #[serde(default)]
    pub artist: String,
    /// URI Spotify jouable (`spotify:track:…`)
    #[serde(default)]
    pub uri: Option<String>,
    /// Durée en millisecondes
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            uri: None,
            duration_ms: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Premier artiste crédité (utile pour les recherches de voisinage)
    pub fn main_artist(&self) -> &str {
        self.artist.split(", ").next().unwrap_or_default().trim()
    }
}

/// Caractéristiques audio d'une piste
///
/// `key` suit la notation « pitch class » (0 = C … 11 = B, -1 = inconnue),
/// `mode` vaut 1 pour majeur et 0 pour mineur.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AudioFeatures {
    pub tempo: Option<f64>,
    pub key: Option<i32>,
    pub mode: Option<i32>,
    /// Tonalité lisible (`"C#"`, `"Am"`), calculée depuis `key` et `mode`
    #[serde(default)]
    pub key_name: Option<String>,
}

impl AudioFeatures {
    pub fn new(tempo: Option<f64>, key: Option<i32>, mode: Option<i32>) -> Self {
        Self {
            tempo,
            key,
            mode,
            key_name: key_label(key, mode),
        }
    }

    /// Tonalité lisible, ou `None` si la clé est inconnue
    pub fn key_label(&self) -> Option<&str> {
        self.key_name.as_deref()
    }

    /// Vrai si la piste est en mode mineur
    pub fn is_minor(&self) -> bool {
        self.mode == Some(0)
    }
}

fn key_label(key: Option<i32>, mode: Option<i32>) -> Option<String> {
    let index = usize::try_from(key?).ok()?;
    let name = PITCH_CLASSES.get(index)?;
    let suffix = if mode == Some(0) { "m" } else { "" };
    Some(format!("{}{}", name, suffix))
}

/// Token d'accès obtenu par l'échange client credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Bearer token opaque
    pub token: String,
    /// Instant à partir duquel le token est considéré comme périmé
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Construit un credential émis à `issued_at` pour `lifetime_secs` secondes
    ///
    /// L'expiration retenue est avancée de [`CREDENTIAL_SAFETY_MARGIN_SECS`].
    pub fn issued(token: impl Into<String>, issued_at: DateTime<Utc>, lifetime_secs: i64) -> Self {
        Self {
            token: token.into(),
            expires_at: issued_at + Duration::seconds(lifetime_secs - CREDENTIAL_SAFETY_MARGIN_SECS),
        }
    }

    /// Vrai tant que `now` est strictement avant l'expiration
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}
