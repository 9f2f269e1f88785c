//! Extension pour intégrer la configuration de la soirée dans pmoconfig
//!
//! Les valeurs vivent sous `party`. Le mot de passe admin peut aussi venir
//! de `PARTY_ADMIN_PASSWORD`.

use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;

/// Thèmes recherchés au démarrage si la configuration n'en fournit pas
pub const DEFAULT_SEED_THEMES: [&str; 3] = ["Hits populaires 2025", "Électro chill", "Funk groove"];

/// Pistes retenues par thème
pub const DEFAULT_SEED_LIMIT: u32 = 5;

pub const DEFAULT_SUGGEST_LIMIT: usize = 4;
pub const DEFAULT_SUGGEST_MAX_LIMIT: usize = 6;
pub const DEFAULT_SUGGEST_CANDIDATES: u32 = 15;

/// Trait d'extension pour la configuration de la file d'attente
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmoparty::PartyConfigExt;
///
/// let themes = get_config().get_party_seed_themes();
/// ```
pub trait PartyConfigExt {
    /// Thèmes utilisés par le seeding, dans l'ordre
    fn get_party_seed_themes(&self) -> Vec<String>;

    fn set_party_seed_themes(&self, themes: &[String]) -> Result<()>;

    /// Nombre de pistes recherchées par thème
    fn get_party_seed_limit(&self) -> u32;

    /// Mot de passe protégeant `/api/admin/*`, `None` si l'admin est ouvert
    fn get_party_admin_password(&self) -> Option<String>;

    fn set_party_admin_password(&self, password: &str) -> Result<()>;

    /// Nombre de suggestions renvoyées quand `limit` est absent
    fn get_party_suggest_default_limit(&self) -> usize;

    /// Borne haute du paramètre `limit` des suggestions
    fn get_party_suggest_max_limit(&self) -> usize;

    /// Nombre de candidats évalués par demande de suggestions
    fn get_party_suggest_candidates(&self) -> u32;
}

impl PartyConfigExt for Config {
    fn get_party_seed_themes(&self) -> Vec<String> {
        match self.get_string_list(&["party", "seed", "themes"]) {
            Some(themes) => themes
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            None => DEFAULT_SEED_THEMES.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn set_party_seed_themes(&self, themes: &[String]) -> Result<()> {
        self.set_value(
            &["party", "seed", "themes"],
            Value::Sequence(themes.iter().cloned().map(Value::String).collect()),
        )
    }

    fn get_party_seed_limit(&self) -> u32 {
        self.get_u64(&["party", "seed", "limit"])
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SEED_LIMIT)
    }

    fn get_party_admin_password(&self) -> Option<String> {
        self.get_string(&["party", "admin_password"])
    }

    fn set_party_admin_password(&self, password: &str) -> Result<()> {
        self.set_value(
            &["party", "admin_password"],
            Value::String(password.to_string()),
        )
    }

    fn get_party_suggest_default_limit(&self) -> usize {
        self.get_u64(&["party", "suggest", "default_limit"])
            .map(|n| n as usize)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SUGGEST_LIMIT)
    }

    fn get_party_suggest_max_limit(&self) -> usize {
        self.get_u64(&["party", "suggest", "max_limit"])
            .map(|n| n as usize)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SUGGEST_MAX_LIMIT)
    }

    fn get_party_suggest_candidates(&self) -> u32 {
        self.get_u64(&["party", "suggest", "candidates"])
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SUGGEST_CANDIDATES)
    }
}

/// Réglages de la file, figés au démarrage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartySettings {
    pub admin_password: Option<String>,
    pub search_limit: u32,
    pub suggest_default_limit: usize,
    pub suggest_max_limit: usize,
    pub suggest_candidates: u32,
}

impl Default for PartySettings {
    fn default() -> Self {
        Self {
            admin_password: None,
            search_limit: pmospotify::DEFAULT_SEARCH_LIMIT,
            suggest_default_limit: DEFAULT_SUGGEST_LIMIT,
            suggest_max_limit: DEFAULT_SUGGEST_MAX_LIMIT,
            suggest_candidates: DEFAULT_SUGGEST_CANDIDATES,
        }
    }
}

impl PartySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin_password: config.get_party_admin_password(),
            search_limit: pmospotify::DEFAULT_SEARCH_LIMIT,
            suggest_default_limit: config.get_party_suggest_default_limit(),
            suggest_max_limit: config.get_party_suggest_max_limit(),
            suggest_candidates: config.get_party_suggest_candidates(),
        }
    }

    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(password.into()).filter(|p: &String| !p.is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(
            config.get_party_seed_themes(),
            vec!["Hits populaires 2025", "Électro chill", "Funk groove"]
        );
        assert_eq!(config.get_party_seed_limit(), 5);
        assert_eq!(config.get_party_admin_password(), None);

        let settings = PartySettings::from_config(&config);
        assert_eq!(settings, PartySettings::default());
    }

    #[test]
    fn test_overrides_from_yaml() {
        let config = Config::from_yaml_str(
            "party:\n  admin_password: s3cret\n  seed:\n    limit: 2\n    themes: [Disco, '  ']\n  suggest:\n    max_limit: 3\n",
        )
        .unwrap();

        assert_eq!(config.get_party_seed_themes(), vec!["Disco"]);
        assert_eq!(config.get_party_seed_limit(), 2);
        assert_eq!(config.get_party_admin_password().as_deref(), Some("s3cret"));
        assert_eq!(config.get_party_suggest_max_limit(), 3);
    }

    #[test]
    fn test_set_themes() {
        let config = Config::from_yaml_str("{}").unwrap();
        config
            .set_party_seed_themes(&["Rock".to_string(), "Jazz".to_string()])
            .unwrap();
        assert_eq!(config.get_party_seed_themes(), vec!["Rock", "Jazz"]);
    }
}
