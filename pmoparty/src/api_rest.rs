//! # API REST de la soirée
//!
//! ## Invités
//!
//! - `GET /api/search?q=` - Recherche dans le catalogue
//! - `GET /api/queue` - Pistes en attente
//! - `GET /api/current` - Piste en cours (`{}` si aucune)
//! - `GET /api/current/features` - Piste en cours et ses caractéristiques audio
//! - `GET /api/audio_features?id=` - Caractéristiques audio d'une piste
//! - `GET /api/suggest?q=&limit=` - Pistes compatibles avec celle en cours
//! - `POST /api/add` - Propose une piste
//!
//! ## Administration
//!
//! Protégées par HTTP Basic si un mot de passe admin est configuré.
//!
//! - `POST /api/admin/approve` - Approuve une piste en attente
//! - `POST /api/admin/remove` - Retire une piste en attente
//! - `POST /api/admin/next` - Passe à la piste suivante
//!
//! Les appels au catalogue ne produisent jamais de code d'erreur : un
//! fournisseur indisponible donne une liste vide ou un objet vide.

use crate::config_ext::PartySettings;
use crate::models::{DEFAULT_PROPOSER, ProposeOutcome, QueueEntry};
use crate::store::QueueStore;
use crate::suggest::{Suggestion, suggest};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use pmospotify::{AudioFeatures, Track, TrackCatalog};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

/// Realm annoncé dans `WWW-Authenticate`
pub const ADMIN_REALM: &str = "PMOParty";

/// État partagé par les handlers
#[derive(Clone)]
pub struct PartyState {
    pub store: Arc<QueueStore>,
    pub catalog: Arc<dyn TrackCatalog>,
    pub settings: Arc<PartySettings>,
}

impl PartyState {
    pub fn new(
        store: Arc<QueueStore>,
        catalog: Arc<dyn TrackCatalog>,
        settings: PartySettings,
    ) -> Self {
        Self {
            store,
            catalog,
            settings: Arc::new(settings),
        }
    }
}

/// Erreurs renvoyées au client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Paramètre obligatoire absent ou vide
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,
}

/// Corps JSON d'une erreur
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        let mut response = (status, body).into_response();
        if matches!(self, ApiError::Unauthorized) {
            let challenge = format!("Basic realm=\"{}\"", ADMIN_REALM);
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

/// Valeur, ou objet vide `{}` en son absence
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OrEmpty<T> {
    Value(T),
    Empty {},
}

impl<T> From<Option<T>> for OrEmpty<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => OrEmpty::Value(value),
            None => OrEmpty::Empty {},
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Texte recherché
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct FeaturesQuery {
    /// Identifiant catalogue de la piste
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct SuggestQuery {
    /// Recherche des candidats (par défaut : artiste de la piste en cours)
    q: Option<String>,
    /// Nombre de suggestions
    limit: Option<String>,
}

/// Proposition d'une piste
///
/// Seuls `id` et `title` sont obligatoires. Un champ optionnel du mauvais
/// type est ignoré.
#[derive(Debug, Default, ToSchema)]
pub struct AddRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub proposed_by: Option<String>,
    pub uri: Option<String>,
    pub duration_ms: Option<u64>,
}

impl AddRequest {
    fn from_json(body: &Value) -> Self {
        Self {
            id: string_field(body, "id"),
            title: string_field(body, "title"),
            artist: string_field(body, "artist"),
            proposed_by: string_field(body, "proposed_by"),
            uri: string_field(body, "uri"),
            duration_ms: u64_field(body, "duration_ms"),
        }
    }
}

/// Corps des actions admin ciblant une piste
#[derive(Debug, Default, ToSchema)]
pub struct TrackIdRequest {
    pub id: Option<String>,
}

impl TrackIdRequest {
    fn from_json(body: &Value) -> Self {
        Self {
            id: string_field(body, "id"),
        }
    }
}

/// Réponse de `/api/current/features`
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CurrentFeatures {
    Idle {
        playing: bool,
    },
    Playing {
        playing: bool,
        track: QueueEntry,
        features: Option<AudioFeatures>,
    },
}

/// Décode un corps JSON sans jamais échouer (corps invalide = `{}`)
fn lenient_json(body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!("Ignoring malformed JSON body: {}", e);
        Value::Null
    })
}

/// Champ texte non blanc, conservé tel qu'envoyé
fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Entier positif, y compris écrit sous forme flottante (`248413.0`)
fn u64_field(body: &Value, key: &str) -> Option<u64> {
    let value = body.get(key)?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

/// Chaîne non blanche, conservée telle quelle
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Recherche des pistes dans le catalogue
///
/// Une requête vide renvoie `[]` sans interroger le catalogue.
#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Pistes trouvées (vide si le catalogue est indisponible)", body = Vec<Track>)
    ),
    tag = "party"
)]
async fn search_tracks(
    State(state): State<PartyState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<Track>> {
    let Some(query) = non_blank(params.q) else {
        return Json(Vec::new());
    };

    Json(
        state
            .catalog
            .search(&query, state.settings.search_limit)
            .await
            .into_list(),
    )
}

/// Pistes en attente, dans l'ordre de lecture
#[utoipa::path(
    get,
    path = "/api/queue",
    responses((status = 200, description = "File d'attente", body = Vec<QueueEntry>)),
    tag = "party"
)]
async fn get_queue(State(state): State<PartyState>) -> Json<Vec<QueueEntry>> {
    Json(state.store.pending())
}

#[utoipa::path(
    get,
    path = "/api/current",
    responses((status = 200, description = "Piste en cours, ou `{}`", body = QueueEntry)),
    tag = "party"
)]
async fn get_current(State(state): State<PartyState>) -> Json<OrEmpty<QueueEntry>> {
    Json(state.store.current().into())
}

/// Piste en cours et ses caractéristiques audio
///
/// `features` vaut `null` si le catalogue ne les fournit pas.
#[utoipa::path(
    get,
    path = "/api/current/features",
    responses((status = 200, description = "État de lecture", body = CurrentFeatures)),
    tag = "party"
)]
async fn get_current_features(State(state): State<PartyState>) -> Json<CurrentFeatures> {
    let Some(track) = state.store.current() else {
        return Json(CurrentFeatures::Idle { playing: false });
    };

    let features = state.catalog.audio_features(&track.id).await.ok();
    Json(CurrentFeatures::Playing {
        playing: true,
        track,
        features,
    })
}

#[utoipa::path(
    get,
    path = "/api/audio_features",
    params(FeaturesQuery),
    responses((status = 200, description = "Caractéristiques audio, ou `{}`", body = AudioFeatures)),
    tag = "party"
)]
async fn get_audio_features(
    State(state): State<PartyState>,
    Query(params): Query<FeaturesQuery>,
) -> Json<OrEmpty<AudioFeatures>> {
    let Some(id) = non_blank(params.id) else {
        return Json(OrEmpty::Empty {});
    };

    Json(state.catalog.audio_features(&id).await.ok().into())
}

/// Pistes compatibles avec celle en cours (tempo, tonalité)
#[utoipa::path(
    get,
    path = "/api/suggest",
    params(SuggestQuery),
    responses((status = 200, description = "Suggestions triées par distance croissante", body = Vec<Suggestion>)),
    tag = "party"
)]
async fn get_suggestions(
    State(state): State<PartyState>,
    Query(params): Query<SuggestQuery>,
) -> Json<Vec<Suggestion>> {
    let settings = &state.settings;
    let limit = params
        .limit
        .and_then(|l| l.trim().parse::<usize>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(settings.suggest_default_limit)
        .min(settings.suggest_max_limit);

    Json(
        suggest(
            state.catalog.as_ref(),
            &state.store,
            params.q.as_deref(),
            limit,
            settings.suggest_candidates,
        )
        .await,
    )
}

/// Propose une piste
///
/// Une piste déjà en file ou en cours est ignorée, mais la réponse reste 201.
#[utoipa::path(
    post,
    path = "/api/add",
    request_body = AddRequest,
    responses(
        (status = 201, description = "Proposition enregistrée"),
        (status = 400, description = "id ou title manquant", body = ErrorResponse)
    ),
    tag = "party"
)]
async fn add_track(State(state): State<PartyState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let request = AddRequest::from_json(&lenient_json(&body));

    let (Some(id), Some(title)) = (request.id, request.title) else {
        return Err(ApiError::BadRequest("Missing track details".into()));
    };

    let mut track = Track::new(id, title, request.artist.unwrap_or_default());
    track.uri = request.uri;
    track.duration_ms = request.duration_ms;

    let proposed_by = request.proposed_by.unwrap_or_else(|| DEFAULT_PROPOSER.to_string());
    if state.store.propose(track, &proposed_by) == ProposeOutcome::Accepted {
        info!(proposed_by = %proposed_by, "New proposal accepted");
    }

    Ok(StatusCode::CREATED)
}

fn required_id(body: &Bytes) -> Result<String, ApiError> {
    TrackIdRequest::from_json(&lenient_json(body))
        .id
        .ok_or_else(|| ApiError::BadRequest("Missing track ID".into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/approve",
    request_body = TrackIdRequest,
    responses(
        (status = 204, description = "Piste approuvée (ou absente)"),
        (status = 400, description = "id manquant", body = ErrorResponse),
        (status = 401, description = "Mot de passe admin requis", body = ErrorResponse)
    ),
    tag = "admin"
)]
async fn admin_approve(
    State(state): State<PartyState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let id = required_id(&body)?;
    let outcome = state.store.approve(&id);
    info!(id = %id, ?outcome, "Admin approve");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/remove",
    request_body = TrackIdRequest,
    responses(
        (status = 204, description = "Piste retirée de la file (idempotent)"),
        (status = 400, description = "id manquant", body = ErrorResponse),
        (status = 401, description = "Mot de passe admin requis", body = ErrorResponse)
    ),
    tag = "admin"
)]
async fn admin_remove(
    State(state): State<PartyState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let id = required_id(&body)?;
    let outcome = state.store.remove(&id);
    info!(id = %id, ?outcome, "Admin remove");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/next",
    responses(
        (status = 204, description = "Piste suivante lancée (ou lecture arrêtée si la file est vide)"),
        (status = 401, description = "Mot de passe admin requis", body = ErrorResponse)
    ),
    tag = "admin"
)]
async fn admin_next(State(state): State<PartyState>) -> StatusCode {
    state.store.advance();
    StatusCode::NO_CONTENT
}

/// Mot de passe porté par un en-tête `Authorization: Basic …`
fn basic_password(value: &str) -> Option<String> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (_user, password) = decoded.split_once(':')?;
    Some(password.to_string())
}

/// Middleware des routes admin
///
/// Sans mot de passe configuré, tout passe.
async fn require_admin(
    State(state): State<PartyState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.settings.admin_password.as_deref() else {
        return Ok(next.run(request).await);
    };

    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(basic_password);

    if supplied.as_deref() == Some(expected) {
        Ok(next.run(request).await)
    } else {
        warn!(path = %request.uri().path(), "Rejected admin request");
        Err(ApiError::Unauthorized)
    }
}

/// Documentation OpenAPI de l'API de la soirée
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PMOParty API",
        version = "1.0.0",
        description = "File d'attente collaborative : recherche, propositions, suggestions et administration"
    ),
    paths(
        search_tracks,
        get_queue,
        get_current,
        get_current_features,
        get_audio_features,
        get_suggestions,
        add_track,
        admin_approve,
        admin_remove,
        admin_next
    ),
    components(schemas(
        Track,
        AudioFeatures,
        QueueEntry,
        Suggestion,
        CurrentFeatures,
        AddRequest,
        TrackIdRequest,
        ErrorResponse
    )),
    tags(
        (name = "party", description = "Endpoints invités"),
        (name = "admin", description = "Endpoints d'administration")
    )
)]
pub struct PartyApiDoc;

/// Crée le router de l'API (chemins complets, à fusionner à la racine)
pub fn create_router(state: PartyState) -> Router {
    let admin = Router::new()
        .route("/api/admin/approve", post(admin_approve))
        .route("/api/admin/remove", post(admin_remove))
        .route("/api/admin/next", post(admin_next))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/api/search", get(search_tracks))
        .route("/api/queue", get(get_queue))
        .route("/api/current", get(get_current))
        .route("/api/current/features", get(get_current_features))
        .route("/api/audio_features", get(get_audio_features))
        .route("/api/suggest", get(get_suggestions))
        .route("/api/add", post(add_track))
        .merge(admin)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_password() {
        // "admin:s3cret"
        assert_eq!(basic_password("Basic YWRtaW46czNjcmV0").as_deref(), Some("s3cret"));
        // ":s3cret", utilisateur vide
        assert_eq!(basic_password("basic OnMzY3JldA==").as_deref(), Some("s3cret"));
        assert_eq!(basic_password("Bearer YWRtaW46czNjcmV0"), None);
        assert_eq!(basic_password("Basic !!!"), None);
        // "admin" sans ':'
        assert_eq!(basic_password("Basic YWRtaW4="), None);
    }

    #[test]
    fn test_or_empty_serialization() {
        let empty: OrEmpty<QueueEntry> = None.into();
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");

        let features: OrEmpty<AudioFeatures> =
            Some(AudioFeatures::new(Some(120.0), Some(0), Some(1))).into();
        assert_eq!(
            serde_json::to_value(&features).unwrap(),
            serde_json::json!({"tempo": 120.0, "key": 0, "mode": 1, "key_name": "C"})
        );
    }

    #[test]
    fn test_lenient_json() {
        let request = AddRequest::from_json(&lenient_json(&Bytes::from_static(b"not json")));
        assert!(request.id.is_none());

        let request =
            AddRequest::from_json(&lenient_json(&Bytes::from_static(br#"{"id":"a","title":"t"}"#)));
        assert_eq!(request.id.as_deref(), Some("a"));
    }

    #[test]
    fn test_add_request_ignores_mistyped_optional_fields() {
        let body = json!({
            "id": " abc",
            "title": "Alpha",
            "artist": ["X"],
            "proposed_by": 42,
            "uri": false,
            "duration_ms": 248413.0
        });
        let request = AddRequest::from_json(&body);

        // L'identifiant est conservé tel qu'envoyé
        assert_eq!(request.id.as_deref(), Some(" abc"));
        assert_eq!(request.title.as_deref(), Some("Alpha"));
        assert_eq!(request.artist, None);
        assert_eq!(request.proposed_by, None);
        assert_eq!(request.uri, None);
        assert_eq!(request.duration_ms, Some(248413));

        assert_eq!(u64_field(&json!({"d": -1}), "d"), None);
        assert_eq!(u64_field(&json!({"d": 1.5}), "d"), None);
        assert_eq!(u64_field(&json!({"d": "12"}), "d"), None);
    }

    #[test]
    fn test_track_id_request() {
        assert_eq!(TrackIdRequest::from_json(&json!({"id": 7})).id, None);
        assert_eq!(TrackIdRequest::from_json(&json!({"id": "  "})).id, None);
        assert_eq!(TrackIdRequest::from_json(&json!({"id": "x "})).id.as_deref(), Some("x "));
    }

    #[test]
    fn test_error_response() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"PMOParty\""
        );

        let response = ApiError::BadRequest("Missing track ID".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
