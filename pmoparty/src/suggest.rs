//! Suggestions de pistes compatibles avec celle en cours
//!
//! Les candidats viennent d'une recherche (texte libre, ou à défaut
//! l'artiste principal de la piste en cours) et sont classés par
//! [`compatibility_distance`](crate::compat::compatibility_distance).

use crate::compat::{compatibility_distance, reason_text};
use crate::store::QueueStore;
use futures::future::join_all;
use pmospotify::TrackCatalog;
use serde::Serialize;
use tracing::debug;

/// Une suggestion, telle que renvoyée par `/api/suggest`
#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub uri: Option<String>,
    /// Explication lisible (tempo, tonalité)
    pub reason: String,
    pub distance: f64,
}

/// Calcule jusqu'à `limit` suggestions
///
/// Renvoie une liste vide si rien n'est en cours, si les caractéristiques
/// de la piste en cours sont indisponibles ou si la recherche échoue.
/// Les pistes déjà en file (ou en cours) sont exclues, ainsi que les
/// candidats dont les caractéristiques manquent.
pub async fn suggest(
    catalog: &dyn TrackCatalog,
    store: &QueueStore,
    query: Option<&str>,
    limit: usize,
    candidates: u32,
) -> Vec<Suggestion> {
    let snapshot = store.snapshot();
    let Some(current) = snapshot.current.clone() else {
        return Vec::new();
    };

    let Some(target) = catalog.audio_features(&current.id).await.ok() else {
        debug!(id = %current.id, "No features for current track, no suggestions");
        return Vec::new();
    };

    let query = match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => q.to_string(),
        None => current.track().main_artist().to_string(),
    };

    let found: Vec<_> = catalog
        .search(&query, candidates)
        .await
        .into_list()
        .into_iter()
        .filter(|t| !snapshot.contains(&t.id))
        .collect();

    let features = join_all(found.iter().map(|t| catalog.audio_features(&t.id))).await;

    let mut suggestions: Vec<Suggestion> = found
        .into_iter()
        .zip(features)
        .filter_map(|(track, features)| {
            let features = features.ok()?;
            Some(Suggestion {
                reason: reason_text(&target, &features),
                distance: compatibility_distance(&target, &features),
                id: track.id,
                title: track.title,
                artist: track.artist,
                uri: track.uri,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    suggestions.truncate(limit);

    debug!(query = %query, count = suggestions.len(), "Suggestions computed");
    suggestions
}
