//! Structures de données de la file d'attente

use pmospotify::Track;
use serde::{Deserialize, Serialize};

/// Attribution par défaut d'une proposition
pub const DEFAULT_PROPOSER: &str = "guest";

/// Attribution des pistes ajoutées au démarrage
pub const SEED_PROPOSER: &str = "default";

/// Une piste dans la file, avec les champs propres à la soirée
///
/// Deux entrées sont considérées identiques si elles ont le même `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct QueueEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    /// Toujours vrai à l'ajout ; l'admin peut le repositionner explicitement
    pub approved: bool,
    pub proposed_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl QueueEntry {
    /// Nouvelle entrée approuvée
    ///
    /// Une attribution vide devient [`DEFAULT_PROPOSER`].
    pub fn from_track(track: Track, proposed_by: &str) -> Self {
        let proposed_by = match proposed_by.trim() {
            "" => DEFAULT_PROPOSER,
            name => name,
        };

        Self {
            id: track.id,
            title: track.title,
            artist: track.artist,
            approved: true,
            proposed_by: proposed_by.to_string(),
            uri: track.uri,
            duration_ms: track.duration_ms,
        }
    }

    /// La piste sous-jacente
    pub fn track(&self) -> Track {
        Track {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            uri: self.uri.clone(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Copie de l'état de la file à un instant donné
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub pending: Vec<QueueEntry>,
    pub current: Option<QueueEntry>,
}

impl QueueSnapshot {
    /// Vrai si `id` est en attente ou en cours de lecture
    pub fn contains(&self, id: &str) -> bool {
        self.current.as_ref().is_some_and(|c| c.id == id) || self.pending.iter().any(|e| e.id == id)
    }
}

/// Résultat de `QueueStore::propose`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposeOutcome {
    Accepted,
    DuplicateIgnored,
}

/// Résultat de `QueueStore::approve`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveOutcome {
    Found,
    NotFound,
}

/// Résultat de `QueueStore::remove` (toujours un succès)
///
/// `count` vaut le nombre d'entrées retirées, zéro compris.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_shape() {
        let entry = QueueEntry::from_track(Track::new("abc", "Get Lucky", "Daft Punk"), "Léa");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": "abc",
                "title": "Get Lucky",
                "artist": "Daft Punk",
                "approved": true,
                "proposed_by": "Léa"
            })
        );
    }

    #[test]
    fn test_entry_keeps_optional_details() {
        let track = Track::new("abc", "Get Lucky", "Daft Punk")
            .with_uri("spotify:track:abc")
            .with_duration_ms(248413);
        let entry = QueueEntry::from_track(track.clone(), "  ");

        assert_eq!(entry.proposed_by, DEFAULT_PROPOSER);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["uri"], "spotify:track:abc");
        assert_eq!(json["duration_ms"], 248413);
        assert_eq!(entry.track(), track);
    }
}
