//! Abstraction du catalogue de pistes
//!
//! Le reste de l'application ne parle qu'à [`TrackCatalog`], ce qui permet
//! de substituer un faux catalogue dans les tests de la file d'attente et du
//! seeder.

use crate::models::{AudioFeatures, Track};
use async_trait::async_trait;

/// Résultat d'un appel au catalogue
///
/// Distingue « rien demandé » de « le fournisseur n'a pas répondu », deux cas
/// que l'API HTTP rend pourtant de la même façon (liste vide ou `null`).
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogOutcome<T> {
    /// Le fournisseur a répondu
    Found(T),
    /// Entrée vide : aucun appel réseau n'a été fait
    NoInput,
    /// Credential ou appel en échec (le message est destiné aux logs)
    Unavailable(String),
}

impl<T> CatalogOutcome<T> {
    /// Convertit en `Option`, en perdant la cause de l'absence
    pub fn ok(self) -> Option<T> {
        match self {
            CatalogOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, CatalogOutcome::Found(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, CatalogOutcome::Unavailable(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> CatalogOutcome<U> {
        match self {
            CatalogOutcome::Found(value) => CatalogOutcome::Found(f(value)),
            CatalogOutcome::NoInput => CatalogOutcome::NoInput,
            CatalogOutcome::Unavailable(reason) => CatalogOutcome::Unavailable(reason),
        }
    }
}

impl<T> CatalogOutcome<Vec<T>> {
    /// Liste trouvée, ou liste vide
    pub fn into_list(self) -> Vec<T> {
        self.ok().unwrap_or_default()
    }
}

/// Source de pistes et de caractéristiques audio
///
/// Les implémentations ne renvoient jamais d'erreur : toute défaillance est
/// journalisée puis rapportée comme [`CatalogOutcome::Unavailable`].
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Recherche jusqu'à `limit` pistes correspondant à `query`
    async fn search(&self, query: &str, limit: u32) -> CatalogOutcome<Vec<Track>>;

    /// Tempo, tonalité et mode d'une piste
    async fn audio_features(&self, track_id: &str) -> CatalogOutcome<AudioFeatures>;
}
