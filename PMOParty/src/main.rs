use pmoconfig::get_config;
use pmoparty::{BootstrapSeeder, PartyServerExt, PartySettings, PartyState, QueueStore};
use pmoserver::{LoggingOptions, ServerBuilder};
use pmospotify::{SpotifyClient, SpotifyConfigExt, TrackCatalog};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Configuration et logs ==========
    let config = get_config();

    let mut server = ServerBuilder::new_configured().build();
    server
        .init_logging(LoggingOptions::from_config(&config))
        .await;

    // ========== PHASE 2 : Catalogue et file d'attente ==========
    info!("🎧 Connecting to Spotify catalogue...");
    let client = match SpotifyClient::from_config_obj(&config) {
        Ok(client) => client,
        Err(e) => {
            warn!("⚠️ Spotify not configured ({}), search and features will be empty", e);
            SpotifyClient::builder()
                .api_base(config.get_spotify_api_base())
                .token_url(config.get_spotify_token_url())
                .timeout(Duration::from_secs(config.get_spotify_timeout_secs()))
                .build()?
        }
    };
    let catalog: Arc<dyn TrackCatalog> = Arc::new(client);
    let store = Arc::new(QueueStore::new());

    info!("🎵 Seeding the queue...");
    let report = BootstrapSeeder::from_config(&config)
        .run(catalog.as_ref(), &store)
        .await;
    info!("✅ {} track(s) queued at startup", report.accepted);

    // ========== PHASE 3 : Routes HTTP ==========
    let settings = PartySettings::from_config(&config);
    if settings.admin_password.is_none() {
        warn!("⚠️ No admin password set, /api/admin/* is open to everyone");
    }
    server
        .init_party(PartyState::new(store, catalog, settings))
        .await;

    // ========== PHASE 4 : Démarrage du serveur ==========
    info!("🌐 Starting HTTP server...");
    let addr = server.start().await?;

    info!("✅ PMOParty is ready on port {}!", addr.port());
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
