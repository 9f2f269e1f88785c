//! Extension pmoserver pour la file d'attente de la soirée
//!
//! `pmoparty` enregistre son API et ses pages sur `pmoserver::Server` sans
//! que `pmoserver` connaisse la soirée.

use crate::api_rest::{PartyApiDoc, PartyState, create_router};
use crate::webapp::PartyWebapp;
use pmoserver::Server;
use tracing::info;
use utoipa::OpenApi;

/// Trait d'extension pour pmoserver::Server
pub trait PartyServerExt {
    /// Initialise la soirée sur le serveur
    ///
    /// # Routes créées
    ///
    /// - API : `/api/search`, `/api/queue`, `/api/current`, `/api/add`,
    ///   `/api/admin/*`…
    /// - Swagger : `/swagger-ui/party`
    /// - Pages : `/` (invités), `/admin.html` (`/admin` redirige)
    async fn init_party(&mut self, state: PartyState);
}

impl PartyServerExt for Server {
    async fn init_party(&mut self, state: PartyState) {
        let protected = state.settings.admin_password.is_some();

        self.add_openapi("/", create_router(state), PartyApiDoc::openapi(), "party")
            .await;
        self.add_redirect("/admin", "/admin.html").await;
        self.add_spa::<PartyWebapp>("/").await;

        info!(admin_protected = protected, "Party API registered");
    }
}
