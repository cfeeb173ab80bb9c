// Stub of the event backend served on an ephemeral port, one per test.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use guest_client::interface_adapters::clients::EventApiClient;

pub const SLUG: &str = "mariage-sarah-david";
pub const EVENT_ID: &str = "5f1c7a2e-0000-4000-8000-000000000001";

#[derive(Clone, Default)]
pub struct BackendState {
    pub config_fetches: Arc<AtomicUsize>,
    // Query string of the last list request, by path suffix.
    pub queries: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
    pub uploads: Arc<Mutex<Vec<String>>>,
    pub subscriptions: Arc<Mutex<Vec<Value>>>,
    pub rsvps: Arc<Mutex<Vec<Value>>>,
    pub revoked_codes: Arc<Mutex<Vec<String>>>,
}

impl BackendState {
    pub fn config_fetches(&self) -> usize {
        self.config_fetches.load(Ordering::SeqCst)
    }

    pub fn query(&self, name: &str) -> HashMap<String, String> {
        self.queries
            .lock()
            .expect("queries mutex poisoned")
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn revoke(&self, code: &str) {
        self.revoked_codes
            .lock()
            .expect("revoked mutex poisoned")
            .push(code.to_string());
    }

    fn record_query(&self, name: &str, query: HashMap<String, String>) {
        self.queries
            .lock()
            .expect("queries mutex poisoned")
            .insert(name.to_string(), query);
    }
}

pub struct Backend {
    pub base_url: String,
    pub state: BackendState,
}

impl Backend {
    pub fn client(&self) -> EventApiClient {
        EventApiClient::new(&self.base_url, Duration::from_secs(5)).expect("client should build")
    }
}

// Bind 127.0.0.1:0 and serve the stub on the current runtime.
pub async fn spawn_backend() -> Backend {
    let state = BackendState::default();
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub backend failed");
    });

    Backend {
        base_url: format!("http://{addr}"),
        state,
    }
}

fn router(state: BackendState) -> Router {
    Router::new()
        .route("/api/events/slug/{slug}/config", get(config))
        .route("/api/events/{event_id}/guests/identify", post(identify))
        .route("/api/events/{event_id}/guests/code/{code}", get(guest_by_code))
        .route("/api/events/{event_id}/guests/{code}/program", get(program))
        .route("/api/events/{event_id}/guests/{code}/rsvp", post(sub_event_rsvp))
        .route("/api/events/{event_id}/rsvp", post(rsvp))
        .route("/api/events/{event_id}/photos", get(photos).post(upload_photo))
        .route("/api/events/{event_id}/guestbook", get(guestbook).post(sign_guestbook))
        .route("/api/events/{event_id}/donations", post(donate))
        .route("/api/events/{event_id}/donations/stats", get(donation_stats))
        .route("/api/events/{event_id}/playlist", get(playlist).post(suggest_song))
        .route("/api/events/{event_id}/seating", get(seating))
        .route("/api/events/subscribe/{event_id}", post(subscribe))
        .route("/api/events/unsubscribe/{event_id}", post(unsubscribe))
        .with_state(state)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn event_missing() -> Response {
    detail(StatusCode::NOT_FOUND, "Événement non trouvé")
}

pub fn config_json(title: &str) -> Value {
    json!({
        "version": "1.0",
        "event_id": EVENT_ID,
        "event": { "type": "wedding", "title": title, "date": "2026-06-14T15:00:00Z" },
        "branding": { "app_name": title, "colors": { "primary": "#8B7355" } },
        "modules": {
            "rsvp": { "enabled": true, "max_plus_ones": 1 },
            "gallery": { "enabled": true, "allow_upload": true },
            "guestbook": { "enabled": true },
            "donation": { "enabled": true, "min_amount": 5, "currency": "EUR" },
            "playlist": { "enabled": true },
            "seating_plan": { "enabled": false },
            "invitation_groups": { "enabled": true }
        }
    })
}

fn guests() -> Vec<Value> {
    vec![
        json!({ "id": "g-1", "name": "Sarah Levy", "first_name": "Sarah", "personal_code": "SARAH1", "email": "sarah@example.com", "status": "pending" }),
        json!({ "id": "g-2", "name": "David Cohen", "first_name": "David", "personal_code": "DAVID1", "status": "confirmed" }),
        json!({ "id": "g-3", "name": "Rachel Cohen", "first_name": "Rachel", "personal_code": "RACHL1", "status": "pending" }),
        json!({ "id": "g-4", "name": "Léa Haddad", "first_name": "Léa", "personal_code": "LEA001", "status": "partial" }),
    ]
}

fn find_guest(state: &BackendState, code: &str) -> Option<Value> {
    let code = code.to_uppercase();
    let revoked = state.revoked_codes.lock().expect("revoked mutex poisoned");
    if revoked.contains(&code) {
        return None;
    }
    guests()
        .into_iter()
        .find(|g| g["personal_code"].as_str() == Some(code.as_str()))
}

async fn config(State(state): State<BackendState>, Path(slug): Path<String>) -> Response {
    state.config_fetches.fetch_add(1, Ordering::SeqCst);
    if slug != SLUG {
        return event_missing();
    }
    Json(config_json("Sarah & David")).into_response()
}

async fn identify(Path(event_id): Path<String>, Json(body): Json<Value>) -> Response {
    if event_id != EVENT_ID {
        return event_missing();
    }
    let name = body["name"].as_str().map(str::to_lowercase);
    let email = body["email"].as_str();

    let matches: Vec<Value> = guests()
        .into_iter()
        .filter(|g| {
            let guest_name = g["name"].as_str().unwrap_or_default().to_lowercase();
            name.as_ref().is_none_or(|n| guest_name.contains(n.as_str()))
                && email.is_none_or(|e| g["email"].as_str() == Some(e))
        })
        .collect();

    let body = match matches.as_slice() {
        [] => json!({ "found": false, "multiple_matches": false, "message": "Aucun invité trouvé" }),
        [guest] => json!({
            "found": true,
            "personal_code": guest["personal_code"],
            "guest_name": guest["name"],
            "multiple_matches": false,
            "message": "Invité trouvé"
        }),
        _ => json!({
            "found": false,
            "multiple_matches": true,
            "message": "Plusieurs invités correspondent, précisez votre email ou téléphone"
        }),
    };
    Json(body).into_response()
}

async fn guest_by_code(
    State(state): State<BackendState>,
    Path((event_id, code)): Path<(String, String)>,
) -> Response {
    if event_id != EVENT_ID {
        return event_missing();
    }
    match find_guest(&state, &code) {
        Some(guest) => Json(guest).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Code invité invalide"),
    }
}

async fn program(
    State(state): State<BackendState>,
    Path((_event_id, code)): Path<(String, String)>,
) -> Response {
    let Some(guest) = find_guest(&state, &code) else {
        return detail(StatusCode::NOT_FOUND, "Code invité invalide");
    };
    Json(json!({
        "guest_id": guest["id"],
        "guest_name": guest["name"],
        "first_name": guest["first_name"],
        "group_name": "Famille",
        "sub_events": [
            { "slug": "party", "name": "Soirée", "date": "2026-06-14", "start_time": "21:00", "rsvp_status": "pending", "attendees_count": 1 },
            { "slug": "henne", "name": "Henné", "date": "2026-06-12", "start_time": "19:00", "rsvp_status": "pending", "attendees_count": 1 },
            { "slug": "houppa", "name": "Houppa", "date": "2026-06-14", "start_time": "16:30", "rsvp_status": "pending", "attendees_count": 1 }
        ],
        "rsvp_deadline": "2026-05-01",
        "global_rsvp_status": "pending"
    }))
    .into_response()
}

async fn sub_event_rsvp(
    State(state): State<BackendState>,
    Path((_event_id, code)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if find_guest(&state, &code).is_none() {
        return detail(StatusCode::NOT_FOUND, "Code invité invalide");
    }
    state.rsvps.lock().expect("rsvps mutex poisoned").push(body);
    Json(json!({ "success": true, "message": "Réponses enregistrées" })).into_response()
}

async fn rsvp(State(state): State<BackendState>, Json(body): Json<Value>) -> Response {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let status = if body["attending"].as_bool().unwrap_or(false) {
        "confirmed"
    } else {
        "declined"
    };
    state.rsvps.lock().expect("rsvps mutex poisoned").push(body);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "name": name,
            "status": status
        })),
    )
        .into_response()
}

async fn photos(
    State(state): State<BackendState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record_query("photos", query);
    Json(json!([
        { "id": "p-1", "url": "https://cdn.test/p-1.jpg", "uploaded_by": "Léa", "created_at": "2026-06-14T22:00:00Z" }
    ]))
    .into_response()
}

async fn upload_photo(
    State(state): State<BackendState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("multipart/form-data") {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "file is required");
    }
    let text = String::from_utf8_lossy(&body).into_owned();
    if !text.contains("name=\"file\"") {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "file is required");
    }
    state.uploads.lock().expect("uploads mutex poisoned").push(text);
    (
        StatusCode::CREATED,
        Json(json!({ "id": "p-2", "url": "https://cdn.test/p-2.jpg", "created_at": "" })),
    )
        .into_response()
}

async fn guestbook(
    State(state): State<BackendState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record_query("guestbook", query);
    Json(json!([
        { "id": "m-1", "author_name": "Léa", "message": "Mazel tov !", "created_at": "" }
    ]))
    .into_response()
}

async fn sign_guestbook(Json(body): Json<Value>) -> Response {
    let message = body["message"].as_str().unwrap_or_default();
    if message.len() > 500 {
        return detail(StatusCode::BAD_REQUEST, "Message trop long");
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "id": "m-2",
            "author_name": body["author_name"],
            "message": message,
            "created_at": ""
        })),
    )
        .into_response()
}

async fn donate(Json(body): Json<Value>) -> Response {
    if body["amount"].as_f64().unwrap_or_default() > 10_000.0 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", "amount"], "msg": "too large" }] })),
        )
            .into_response();
    }
    Json(json!({ "client_secret": "pi_secret", "payment_intent_id": "pi_123" })).into_response()
}

async fn donation_stats() -> Response {
    Json(json!({ "total_amount": "350.00", "total_count": 7, "currency": "EUR" })).into_response()
}

async fn playlist() -> Response {
    Json(json!([
        { "id": "s-1", "guest_name": "Noah", "song_title": "September", "artist": "Earth, Wind & Fire", "created_at": "", "votes": 3 },
        { "id": "s-2", "guest_name": "Léa", "song_title": "Valerie", "artist": "Amy Winehouse", "created_at": "", "votes": 5 }
    ]))
    .into_response()
}

async fn suggest_song(Json(body): Json<Value>) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({
            "id": "s-3",
            "guest_name": body["guest_name"],
            "song_title": body["song_title"],
            "artist": body["artist"],
            "created_at": ""
        })),
    )
        .into_response()
}

async fn seating(Query(query): Query<HashMap<String, String>>) -> Response {
    let name = query.get("name").cloned().unwrap_or_default();
    let body = if name.to_lowercase().contains("cohen") {
        json!({ "found": true, "table_name": "Table 5 - Les Orchidées", "guest_name": name, "message": "Table trouvée" })
    } else {
        json!({ "found": false, "message": "Aucune table trouvée" })
    };
    Json(body).into_response()
}

async fn subscribe(
    State(state): State<BackendState>,
    Path(event_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if body["token"].as_str().is_none_or(str::is_empty) {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "token is required");
    }
    state
        .subscriptions
        .lock()
        .expect("subscriptions mutex poisoned")
        .push(json!({ "event_id": event_id, "body": body }));
    Json(json!({ "success": true, "message": "Abonné" })).into_response()
}

async fn unsubscribe(
    State(state): State<BackendState>,
    Path(event_id): Path<String>,
) -> Response {
    state
        .subscriptions
        .lock()
        .expect("subscriptions mutex poisoned")
        .retain(|s| s["event_id"].as_str() != Some(event_id.as_str()));
    Json(json!({ "success": true, "message": "Désabonné" })).into_response()
}
