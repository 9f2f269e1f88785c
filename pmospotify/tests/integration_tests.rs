//! Integration tests for pmospotify

use pmospotify::{CatalogOutcome, SpotifyClient, TrackCatalog};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client pointé sur le serveur mock pour le token et l'API
fn client_for(server: &MockServer) -> SpotifyClient {
    SpotifyClient::builder()
        .client_id("id")
        .client_secret("secret")
        .token_url(format!("{}/api/token", server.uri()))
        .api_base(format!("{}/v1", server.uri()))
        .build()
        .unwrap()
}

async fn mount_token(server: &MockServer, token: &str, expires_in: i64, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        // base64("id:secret")
        .and(header("authorization", "Basic aWQ6c2VjcmV0"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": expires_in
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn search_body() -> serde_json::Value {
    json!({
        "tracks": {
            "items": [
                {
                    "id": "2Foc5Q5nqNiosCNqttzHof",
                    "name": "Get Lucky",
                    "artists": [{"name": "Daft Punk"}, {"name": "Pharrell Williams"}],
                    "uri": "spotify:track:2Foc5Q5nqNiosCNqttzHof",
                    "duration_ms": 248413
                },
                null,
                {
                    "id": "0DiWol3AO6WpXZgp0goxAV",
                    "name": "One More Time",
                    "artists": [{"name": "Daft Punk"}],
                    "uri": "spotify:track:0DiWol3AO6WpXZgp0goxAV",
                    "duration_ms": 320357
                }
            ]
        }
    })
}

async fn mount_search(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .and(query_param("type", "track"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_credential_exchange() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    let client = client_for(&server);
    let token = client.ensure_credential().await.unwrap();
    assert_eq!(token, "tok-1");
}

#[tokio::test]
async fn test_fresh_credential_is_reused() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    mount_search(&server, "tok-1").await;

    let client = client_for(&server);
    assert!(client.search("daft punk", 10).await.is_found());
    assert!(client.search("daft punk", 10).await.is_found());
    // `expect(1)` est vérifié à la destruction du serveur
}

#[tokio::test]
async fn test_credential_refreshed_inside_safety_margin() {
    let server = MockServer::start().await;
    // 30 s de durée de vie < marge de 60 s : périmé dès l'émission
    mount_token(&server, "tok-short", 30, 2).await;
    mount_search(&server, "tok-short").await;

    let client = client_for(&server);
    assert!(client.search("daft punk", 10).await.is_found());
    assert!(client.search("daft punk", 10).await.is_found());
}

#[tokio::test]
async fn test_credential_failure_degrades_search() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_client"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.ensure_credential().await.unwrap_err();
    assert!(err.is_credential_error());

    assert!(client.search("daft punk", 10).await.is_unavailable());
}

#[tokio::test]
async fn test_search_maps_tracks() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "daft punk"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tracks = match client.search("daft punk", 5).await {
        CatalogOutcome::Found(tracks) => tracks,
        other => panic!("unexpected outcome: {:?}", other),
    };

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, "2Foc5Q5nqNiosCNqttzHof");
    assert_eq!(tracks[0].title, "Get Lucky");
    assert_eq!(tracks[0].artist, "Daft Punk, Pharrell Williams");
    assert_eq!(
        tracks[0].uri.as_deref(),
        Some("spotify:track:2Foc5Q5nqNiosCNqttzHof")
    );
    assert_eq!(tracks[0].duration_ms, Some(248413));
    assert_eq!(tracks[1].title, "One More Time");
}

#[tokio::test]
async fn test_search_server_error_degrades() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = client.search("daft punk", 10).await;
    assert!(outcome.is_unavailable());
    assert!(outcome.into_list().is_empty());
}

#[tokio::test]
async fn test_malformed_search_degrades() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.search("daft punk", 10).await.is_unavailable());
}

#[tokio::test]
async fn test_rejected_data_call_keeps_cached_token() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "expired"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.search("daft punk", 10).await.is_unavailable());
    assert!(client.search("daft punk", 10).await.is_unavailable());

    // Un 401 ne détruit pas le token : il reste servi jusqu'à expiration
    assert_eq!(client.ensure_credential().await.unwrap(), "tok-1");
}

#[tokio::test]
async fn test_failed_exchange_after_rejection_keeps_valid_token() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.ensure_credential().await.unwrap(), "tok-1");
    assert!(client.search("daft punk", 10).await.is_unavailable());

    // Les échanges suivants échoueraient : ils ne doivent pas être tentés
    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(client.ensure_credential().await.unwrap(), "tok-1");
}

#[tokio::test]
async fn test_audio_features() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/audio-features/2Foc5Q5nqNiosCNqttzHof"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "2Foc5Q5nqNiosCNqttzHof",
            "tempo": 116.047,
            "key": 6,
            "mode": 0,
            "danceability": 0.794
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let features = client
        .audio_features("2Foc5Q5nqNiosCNqttzHof")
        .await
        .ok()
        .unwrap();

    assert_eq!(features.tempo, Some(116.047));
    assert_eq!(features.key, Some(6));
    assert_eq!(features.mode, Some(0));
    assert_eq!(features.key_label(), Some("F#m"));
}

#[tokio::test]
async fn test_audio_features_not_found_degrades() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/audio-features/unknown"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.audio_features("unknown").await.is_unavailable());
}

#[tokio::test]
async fn test_empty_query_makes_no_call() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 0).await;

    let client = client_for(&server);
    let catalog: &dyn TrackCatalog = &client;
    assert_eq!(catalog.search("", 10).await, CatalogOutcome::NoInput);
}
