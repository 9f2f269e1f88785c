//! Remplissage initial de la file au démarrage

use crate::config_ext::{DEFAULT_SEED_LIMIT, DEFAULT_SEED_THEMES, PartyConfigExt};
use crate::models::{ProposeOutcome, SEED_PROPOSER};
use crate::store::QueueStore;
use pmoconfig::Config;
use pmospotify::{CatalogOutcome, TrackCatalog};
use tracing::{info, warn};

/// Bilan d'une passe de seeding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Pistes ajoutées à la file
    pub accepted: usize,
    /// Pistes déjà présentes
    pub duplicates: usize,
    /// Thèmes pour lesquels le catalogue n'a pas répondu
    pub failed_themes: Vec<String>,
}

/// Recherche une liste de thèmes et verse les résultats dans la file
///
/// Les ajouts passent par [`QueueStore::propose`] : si rien n'est en cours,
/// la première piste ajoutée démarre.
#[derive(Debug, Clone)]
pub struct BootstrapSeeder {
    themes: Vec<String>,
    limit: u32,
}

impl Default for BootstrapSeeder {
    fn default() -> Self {
        Self::new(
            DEFAULT_SEED_THEMES.iter().map(|t| t.to_string()).collect(),
            DEFAULT_SEED_LIMIT,
        )
    }
}

impl BootstrapSeeder {
    pub fn new(themes: Vec<String>, limit: u32) -> Self {
        Self { themes, limit }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.get_party_seed_themes(), config.get_party_seed_limit())
    }

    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    /// Exécute la passe de seeding
    ///
    /// Ne renvoie jamais d'erreur : un thème en échec est journalisé et les
    /// suivants sont tentés.
    pub async fn run(&self, catalog: &dyn TrackCatalog, store: &QueueStore) -> SeedReport {
        let mut report = SeedReport::default();

        for theme in &self.themes {
            let tracks = match catalog.search(theme, self.limit).await {
                CatalogOutcome::Found(tracks) => tracks,
                CatalogOutcome::NoInput => continue,
                CatalogOutcome::Unavailable(reason) => {
                    warn!(theme = %theme, reason = %reason, "Could not seed theme");
                    report.failed_themes.push(theme.clone());
                    continue;
                }
            };

            for track in tracks {
                match store.propose(track, SEED_PROPOSER) {
                    ProposeOutcome::Accepted => report.accepted += 1,
                    ProposeOutcome::DuplicateIgnored => report.duplicates += 1,
                }
            }
        }

        info!(
            accepted = report.accepted,
            duplicates = report.duplicates,
            failed = report.failed_themes.len(),
            "Queue seeding done"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pmospotify::{AudioFeatures, Track};
    use std::sync::Mutex;

    /// Catalogue en mémoire : chaque thème renvoie ses pistes, `"down"` échoue
    struct FakeCatalog {
        calls: Mutex<Vec<(String, u32)>>,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TrackCatalog for FakeCatalog {
        async fn search(&self, query: &str, limit: u32) -> CatalogOutcome<Vec<Track>> {
            self.calls.lock().unwrap().push((query.to_string(), limit));
            match query {
                "down" => CatalogOutcome::Unavailable("503".into()),
                "funk" => CatalogOutcome::Found(vec![
                    Track::new("f1", "Superstition", "Stevie Wonder"),
                    Track::new("f2", "Le Freak", "Chic"),
                ]),
                "disco" => CatalogOutcome::Found(vec![
                    Track::new("f2", "Le Freak", "Chic"),
                    Track::new("d1", "I Feel Love", "Donna Summer"),
                ]),
                _ => CatalogOutcome::Found(vec![]),
            }
        }

        async fn audio_features(&self, _track_id: &str) -> CatalogOutcome<AudioFeatures> {
            CatalogOutcome::Unavailable("not used".into())
        }
    }

    fn seeder(themes: &[&str]) -> BootstrapSeeder {
        BootstrapSeeder::new(themes.iter().map(|t| t.to_string()).collect(), 5)
    }

    #[tokio::test]
    async fn test_seeding_fills_queue_and_starts_first_track() {
        let catalog = FakeCatalog::new();
        let store = QueueStore::new();

        let report = seeder(&["funk", "disco"]).run(&catalog, &store).await;

        assert_eq!(report.accepted, 3);
        assert_eq!(report.duplicates, 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.current.as_ref().unwrap().id, "f1");
        let pending: Vec<_> = snapshot.pending.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(pending, vec!["f2", "d1"]);
        assert!(snapshot.pending.iter().all(|e| e.proposed_by == "default" && e.approved));
        assert_eq!(
            *catalog.calls.lock().unwrap(),
            vec![("funk".to_string(), 5), ("disco".to_string(), 5)]
        );
    }

    #[tokio::test]
    async fn test_failed_theme_does_not_stop_seeding() {
        let catalog = FakeCatalog::new();
        let store = QueueStore::new();

        let report = seeder(&["down", "funk"]).run(&catalog, &store).await;

        assert_eq!(report.failed_themes, vec!["down"]);
        assert_eq!(report.accepted, 2);
        assert!(store.current().is_some());
    }

    #[tokio::test]
    async fn test_total_failure_leaves_queue_empty() {
        let catalog = FakeCatalog::new();
        let store = QueueStore::new();

        let report = seeder(&["down", "down"]).run(&catalog, &store).await;

        assert_eq!(report.accepted, 0);
        assert_eq!(report.failed_themes.len(), 2);
        assert_eq!(store.snapshot(), Default::default());
    }

    #[test]
    fn test_default_themes() {
        let seeder = BootstrapSeeder::default();
        assert_eq!(seeder.themes().len(), 3);
        assert_eq!(seeder.themes()[1], "Électro chill");
    }
}
