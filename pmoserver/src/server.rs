//! # Module Server - API de haut niveau pour Axum
//!
//! Ce module fournit une abstraction simple pour créer des serveurs HTTP
//! avec Axum, en cachant la complexité de la configuration et du routage.
//!
//! ## Fonctionnalités
//!
//! - **Handlers avec état** : SSE, JSON… avec `add_handler_with_state()`
//! - **Sous-routers** : `add_router()`
//! - **Pages statiques** : `add_spa()` (fichiers embarqués par `RustEmbed`)
//! - **Documentation API** : OpenAPI/Swagger avec `add_openapi()`
//! - **Port de repli** : si le port est pris, les suivants sont essayés
//! - **CORS permissif** et arrêt propre sur Ctrl+C

use crate::logs::{
    LogState, LoggingOptions, LogsApiDoc, create_logs_router, init_logging, log_dump, log_sse,
};
use anyhow::{Context, Result};
use axum::Router;
use axum::handler::Handler;
use axum::http::{Method, header};
use axum::response::Redirect;
use axum::routing::get;
use axum_embed::ServeEmbed;
use pmoconfig::get_config;
use pmoutils::bind_first_available;
use rust_embed::RustEmbed;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Nom par défaut du serveur
pub const DEFAULT_SERVER_NAME: &str = "PMOParty";

/// Nombre de ports essayés par défaut
pub const DEFAULT_PORT_ATTEMPTS: u16 = 20;

/// Serveur principal
pub struct Server {
    name: String,
    base_url: String,
    http_port: u16,
    port_attempts: u16,
    router: Arc<RwLock<Router>>,
    join_handle: Option<JoinHandle<()>>,
    log_state: Option<LogState>,
}

impl Server {
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `base_url` - Hôte annoncé (ex: "192.168.1.10")
    /// * `http_port` - Port HTTP demandé
    ///
    /// # Exemple
    ///
    /// ```rust
    /// # use pmoserver::Server;
    /// let server = Server::new("MyAPI", "localhost", 3000);
    /// ```
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            port_attempts: DEFAULT_PORT_ATTEMPTS,
            router: Arc::new(RwLock::new(Router::new())),
            join_handle: None,
            log_state: None,
        }
    }

    pub fn new_configured() -> Self {
        ServerBuilder::new_configured().build()
    }

    /// Port HTTP (le port effectivement lié après `start()`)
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// État du logging, si `init_logging` a été appelé
    pub fn log_state(&self) -> Option<&LogState> {
        self.log_state.as_ref()
    }

    /// Ajoute un handler GET avec état
    pub async fn add_handler_with_state<H, T, S>(&mut self, path: &str, handler: H, state: S)
    where
        H: Handler<T, S> + Clone + 'static,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let route = Router::new().route(path, get(handler)).with_state(state);

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(route);
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let mut r = self.router.write().await;

        *r = if path == "/" || path.is_empty() {
            std::mem::take(&mut *r).merge(sub_router)
        } else {
            let normalized = format!("/{}", path.trim_start_matches('/'));
            std::mem::take(&mut *r).nest(&normalized, sub_router)
        };
    }

    /// Ajoute une redirection permanente
    pub async fn add_redirect(&mut self, from: &str, to: &str) {
        let target = to.to_string();
        let route = Router::new().route(
            from,
            get(move || async move { Redirect::permanent(&target) }),
        );

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(route);
    }

    /// Sert des pages statiques embarquées
    ///
    /// Les chemins inconnus renvoient `index.html`. Un seul appel par
    /// serveur : le service est installé comme fallback du router.
    ///
    /// ```rust,no_run
    /// # use pmoserver::Server;
    /// # use rust_embed::RustEmbed;
    /// #[derive(RustEmbed, Clone)]
    /// #[folder = "static"]
    /// struct Pages;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", "localhost", 3000);
    /// server.add_spa::<Pages>("/").await;
    /// # }
    /// ```
    pub async fn add_spa<E>(&mut self, path: &str)
    where
        E: RustEmbed + Clone + Send + Sync + 'static,
    {
        let serve = ServeEmbed::<E>::with_parameters(
            Some("index.html".to_string()),
            axum_embed::FallbackBehavior::Ok,
            Some("index.html".to_string()),
        );

        let route = Router::new().fallback_service(serve);

        let mut r = self.router.write().await;
        *r = if path == "/" {
            std::mem::take(&mut *r).merge(route)
        } else {
            std::mem::take(&mut *r).nest(path, route)
        };
    }

    /// Ajoute une API documentée avec OpenAPI et Swagger UI
    ///
    /// # Arguments
    ///
    /// * `base` - Préfixe des routes ("/" pour les monter telles quelles)
    /// * `api_router` - Router Axum contenant les routes
    /// * `openapi` - Spécification générée par `utoipa`
    /// * `name` - Nom unique de l'API
    ///
    /// Résultat :
    ///
    /// - la documentation interactive sous `/swagger-ui/{name}`
    /// - la spécification sous `/api-docs/{name}.json`
    pub async fn add_openapi(
        &mut self,
        base: &str,
        api_router: Router,
        openapi: utoipa::openapi::OpenApi,
        name: &str,
    ) {
        let swagger_path: &'static str =
            Box::leak(format!("/swagger-ui/{}", name).into_boxed_str());
        let openapi_json_path: &'static str =
            Box::leak(format!("/api-docs/{}.json", name).into_boxed_str());

        let swagger = SwaggerUi::new(swagger_path).url(openapi_json_path, openapi);

        self.add_router(base, api_router).await;

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(swagger);
    }

    /// Router final, avec la couche CORS
    ///
    /// Utile aussi pour piloter le serveur sans socket (tests).
    pub async fn app(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        self.router.read().await.clone().layer(cors)
    }

    /// Démarre le serveur HTTP
    ///
    /// Écoute sur `0.0.0.0`, au port configuré ou au premier port libre qui
    /// le suit, et met en place la gestion de Ctrl+C.
    ///
    /// # Errors
    ///
    /// Échoue si aucun port n'a pu être lié.
    ///
    /// ```rust,no_run
    /// # use pmoserver::Server;
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// # let mut server = Server::new("Test", "localhost", 3000);
    /// let addr = server.start().await?;
    /// server.wait().await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let std_listener =
            bind_first_available("0.0.0.0", self.http_port, self.port_attempts)
                .with_context(|| format!("Cannot bind HTTP port {}", self.http_port))?;
        let listener = tokio::net::TcpListener::from_std(std_listener)?;
        let addr = listener.local_addr()?;

        if addr.port() != self.http_port {
            warn!(
                "Port {} unavailable, {} listening on {} instead",
                self.http_port,
                self.name,
                addr.port()
            );
            self.http_port = addr.port();
        }

        info!(
            "Server {} running at http://{}:{}",
            self.name, self.base_url, self.http_port
        );

        let app = self.app().await;
        let server_task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                error!("HTTP server stopped: {}", e);
            }
        });

        let shutdown_task = tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => info!("Ctrl+C received, shutting down"),
                Err(e) => {
                    error!("Cannot listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        });

        self.join_handle = Some(tokio::spawn(async move {
            tokio::select! {
                _ = server_task => {},
                _ = shutdown_task => {},
            }
        }));

        Ok(addr)
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Initialise le système de logging et enregistre les routes de logs
    ///
    /// Routes enregistrées :
    ///
    /// - `GET /log-sse` - flux SSE (historique puis direct)
    /// - `GET /log-dump` - contenu du buffer en JSON
    /// - `GET|POST /api/logs/level` - niveau de log courant
    pub async fn init_logging(&mut self, options: LoggingOptions) -> LogState {
        let log_state = init_logging(options);
        self.register_logging(log_state.clone()).await;
        log_state
    }

    /// Enregistre les routes de logs pour un `LogState` déjà initialisé
    pub async fn register_logging(&mut self, log_state: LogState) {
        self.add_handler_with_state("/log-sse", log_sse, log_state.clone())
            .await;
        self.add_handler_with_state("/log-dump", log_dump, log_state.clone())
            .await;
        self.add_openapi(
            "/",
            create_logs_router(log_state.clone()),
            LogsApiDoc::openapi(),
            "logs",
        )
        .await;

        self.log_state = Some(log_state);
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    base_url: String,
    http_port: u16,
    port_attempts: u16,
}

impl ServerBuilder {
    /// Crée un nouveau builder
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            port_attempts: DEFAULT_PORT_ATTEMPTS,
        }
    }

    /// Builder initialisé depuis `pmoconfig`
    pub fn new_configured() -> Self {
        let config = get_config();
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            base_url: config.get_base_url(),
            http_port: config.get_http_port(),
            port_attempts: u16::try_from(config.get_port_attempts())
                .unwrap_or(u16::MAX),
        }
    }

    /// Nombre de ports essayés au démarrage
    pub fn port_attempts(mut self, attempts: u16) -> Self {
        self.port_attempts = attempts.max(1);
        self
    }

    /// Construit le serveur
    ///
    /// ```rust
    /// # use pmoserver::ServerBuilder;
    /// let server = ServerBuilder::new("MyAPI", "localhost", 3000)
    ///     .port_attempts(5)
    ///     .build();
    /// ```
    pub fn build(self) -> Server {
        let mut server = Server::new(self.name, self.base_url, self.http_port);
        server.port_attempts = self.port_attempts;
        server
    }
}
