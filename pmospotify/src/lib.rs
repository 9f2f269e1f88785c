//! # pmospotify - Client Spotify pour PMOParty
//!
//! Cette crate fournit l'accès au catalogue Spotify nécessaire à la file
//! d'attente de la soirée : recherche de pistes et caractéristiques audio
//! (tempo, tonalité, mode). L'authentification se fait par échange
//! « client credentials », sans connexion d'un utilisateur final.
//!
//! ## Architecture
//!
//! - `SpotifyClient` : client haut-niveau, possède le token et le renouvelle
//! - `api` : couche d'accès à l'API REST, sans état
//! - `catalog` : trait [`TrackCatalog`] et [`CatalogOutcome`], seule interface
//!   vue par `pmoparty`
//! - `models` : `Track`, `AudioFeatures`, `Credential`
//! - `config_ext` : trait [`SpotifyConfigExt`] pour pmoconfig
//!
//! ```text
//! pmospotify/
//! ├── src/
//! │   ├── lib.rs
//! │   ├── client.rs           # Client avec cache de credential
//! │   ├── catalog.rs          # Trait TrackCatalog
//! │   ├── models.rs
//! │   ├── api/
//! │   │   ├── mod.rs          # Client HTTP bas-niveau
//! │   │   ├── auth.rs         # Échange client credentials
//! │   │   └── catalog.rs      # /search et /audio-features
//! │   ├── config_ext.rs
//! │   └── error.rs
//! ```
//!
//! ## Dégradation
//!
//! Les appels de données ne renvoient jamais d'erreur à l'appelant : un
//! échec est journalisé puis rapporté comme [`CatalogOutcome::Unavailable`].
//! Les variantes `try_*` du client propagent au contraire l'erreur.
//!
//! ```rust,no_run
//! use pmospotify::{CatalogOutcome, SpotifyClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SpotifyClient::from_config()?;
//!
//!     match client.search("Funk groove", 5).await {
//!         CatalogOutcome::Found(tracks) => {
//!             for track in tracks {
//!                 println!("{} - {}", track.artist, track.title);
//!             }
//!         }
//!         CatalogOutcome::NoInput => {}
//!         CatalogOutcome::Unavailable(reason) => eprintln!("catalogue down: {}", reason),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;

pub use catalog::{CatalogOutcome, TrackCatalog};
pub use client::{DEFAULT_SEARCH_LIMIT, SpotifyClient, SpotifyClientBuilder};
pub use config_ext::SpotifyConfigExt;
pub use error::{Result, SpotifyError};
pub use models::{AudioFeatures, Credential, Track};
