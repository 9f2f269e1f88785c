//! # pmoserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour créer le serveur HTTP de
//! PMOParty. Les crates de domaine (comme `pmoparty`) y ajoutent leurs routes
//! par des traits d'extension, sans que `pmoserver` les connaisse.
//!
//! ## Fonctionnalités
//!
//! - **API de haut niveau** : enregistrement de routers, handlers et APIs OpenAPI
//! - **Server-Sent Events (SSE)** : logs en temps réel via `/log-sse`
//! - **Pages embarquées** : fichiers statiques servis depuis `RustEmbed`
//! - **Documentation OpenAPI** : Swagger UI par API
//! - **Port de repli** et **arrêt gracieux** sur Ctrl+C
//!
//! ## Architecture
//!
//! - [`server`] : serveur principal et builder
//! - [`logs`] : logs en mémoire, SSE et niveau de log à chaud
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use pmoserver::{ServerBuilder, logs::LoggingOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", "localhost", 8080).build();
//!     server.init_logging(LoggingOptions::default()).await;
//!
//!     server
//!         .add_router("/", Router::new().route("/api/status", get(|| async { "ok" })))
//!         .await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, LoggingOptions, SseLayer, log_dump, log_sse};
pub use server::{Server, ServerBuilder};
