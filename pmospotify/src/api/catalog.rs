//! Module d'accès au catalogue Spotify (recherche, audio features)

use super::SpotifyApi;
use crate::error::Result;
use crate::models::{AudioFeatures, Track};
use serde::Deserialize;
use tracing::debug;

/// Page de résultats
#[derive(Debug, Deserialize)]
struct Paging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<Option<T>>,
}

/// Réponse de l'endpoint /search
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: Option<Paging<TrackObject>>,
}

/// Objet track tel que renvoyé par l'API
#[derive(Debug, Deserialize)]
pub(crate) struct TrackObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    duration_ms: Option<u64>,
}

/// Artiste simplifié
#[derive(Debug, Deserialize)]
struct ArtistObject {
    #[serde(default)]
    name: Option<String>,
}

/// Réponse de l'endpoint /audio-features/{id}
#[derive(Debug, Deserialize)]
struct AudioFeaturesResponse {
    #[serde(default)]
    tempo: Option<f64>,
    #[serde(default)]
    key: Option<i32>,
    #[serde(default)]
    mode: Option<i32>,
}

impl SpotifyApi {
    /// Recherche des pistes
    ///
    /// Les éléments sans identifiant ou sans titre (pistes locales,
    /// entrées nulles) sont ignorés.
    pub async fn search_tracks(&self, token: &str, query: &str, limit: u32) -> Result<Vec<Track>> {
        debug!("Searching tracks for '{}' (limit {})", query, limit);
        let limit = limit.to_string();
        let params = [("q", query), ("type", "track"), ("limit", limit.as_str())];
        let response: SearchResponse = self.get(token, &["search"], &params).await?;

        Ok(response
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(Self::parse_track)
            .collect())
    }

    /// Récupère tempo, tonalité et mode d'une piste
    pub async fn get_audio_features(&self, token: &str, track_id: &str) -> Result<AudioFeatures> {
        debug!("Fetching audio features for {}", track_id);
        let response: AudioFeaturesResponse =
            self.get(token, &["audio-features", track_id], &[]).await?;
        Ok(AudioFeatures::new(response.tempo, response.key, response.mode))
    }

    pub(crate) fn parse_track(object: TrackObject) -> Option<Track> {
        let id = object.id.filter(|id| !id.is_empty())?;
        let title = object.name.filter(|name| !name.is_empty())?;
        let artist = object
            .artists
            .into_iter()
            .filter_map(|a| a.name)
            .collect::<Vec<_>>()
            .join(", ");

        Some(Track {
            id,
            title,
            artist,
            uri: object.uri,
            duration_ms: object.duration_ms,
        })
    }
}
