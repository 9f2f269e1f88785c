//! # pmoparty - File d'attente collaborative pour une soirée
//!
//! Les invités cherchent des pistes dans le catalogue et les proposent ;
//! l'admin approuve, retire ou passe à la suivante.
//!
//! ## Composants
//!
//! - [`QueueStore`] : pistes en attente + piste en cours, derrière un mutex
//! - [`BootstrapSeeder`] : pré-remplit la file au démarrage à partir de thèmes
//! - [`suggest`](suggest::suggest) : pistes compatibles (tempo, tonalité) avec celle en cours
//! - [`api_rest`] : handlers Axum et documentation OpenAPI
//! - [`PartyServerExt`] : enregistrement de l'ensemble sur `pmoserver::Server`
//!
//! ## Exemple
//!
//! ```rust,ignore
//! use pmoparty::{BootstrapSeeder, PartyServerExt, PartySettings, PartyState, QueueStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(QueueStore::new());
//! BootstrapSeeder::from_config(&config).run(catalog.as_ref(), &store).await;
//!
//! let state = PartyState::new(store, catalog, PartySettings::from_config(&config));
//! server.init_party(state).await;
//! ```

pub mod api_rest;
pub mod compat;
pub mod config_ext;
pub mod models;
pub mod pmoserver_ext;
pub mod seeder;
pub mod store;
pub mod suggest;
pub mod webapp;

pub use api_rest::{ApiError, PartyApiDoc, PartyState, create_router};
pub use config_ext::{PartyConfigExt, PartySettings};
pub use models::{
    ApproveOutcome, DEFAULT_PROPOSER, ProposeOutcome, QueueEntry, QueueSnapshot, RemoveOutcome,
    SEED_PROPOSER,
};
pub use pmoserver_ext::PartyServerExt;
pub use seeder::{BootstrapSeeder, SeedReport};
pub use store::QueueStore;
pub use suggest::Suggestion;
pub use webapp::PartyWebapp;
