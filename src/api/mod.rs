//! API gateway client for the Healova backend.
//!
//! One thin wrapper owns every outbound HTTP call: it attaches the bearer
//! token from the shared cookie jar, speaks JSON for the resource endpoints
//! and multipart for uploads, and normalizes every response through the
//! backend's `{success, message?, <payload>}` envelope. Workflows consume
//! the [`PortalApi`] trait, so tests swap in [`mock::MockPortal`] without
//! touching a network.

pub mod auth;
pub mod consultations;
pub mod mock;
pub mod prescriptions;
pub mod upload;
pub mod wire;

pub use auth::{AuthSession, SignUpDetails};
pub use consultations::ConsultationPayload;
pub use mock::MockPortal;
pub use prescriptions::PrescriptionPayload;
pub use upload::UploadedFile;

use thiserror::Error;

use crate::config;
use crate::models::{Consultation, ConsultationStatus, MediaFile, ModelError, Prescription, User};
use crate::session::cookies::{CookieError, SharedCookieJar};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Cannot reach backend at {0}")]
    Connection(String),

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Response parsing failed: {0}")]
    Decode(String),

    #[error("{message}")]
    Rejected { message: String },

    #[error(transparent)]
    Cookie(#[from] CookieError),
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl ApiError {
    /// Non-success envelope with the backend's message, or a fallback when
    /// the backend sent none.
    pub(crate) fn rejected(message: Option<String>, fallback: &str) -> Self {
        ApiError::Rejected {
            message: message.unwrap_or_else(|| fallback.to_string()),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// PortalApi — the seam the workflows consume
// ═══════════════════════════════════════════════════════════

/// Every backend operation the portal performs. `ApiClient` is the real
/// implementation; `MockPortal` scripts responses for tests.
#[allow(async_fn_in_trait)]
pub trait PortalApi {
    async fn sign_up(&self, details: &SignUpDetails) -> Result<AuthSession, ApiError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ApiError>;
    /// Purely local: forgets the stored bearer token. No network call.
    fn sign_out(&self) -> Result<(), ApiError>;
    async fn get_current_user(&self) -> Result<Option<User>, ApiError>;

    async fn create_consultation(
        &self,
        payload: &ConsultationPayload,
    ) -> Result<Consultation, ApiError>;
    async fn get_consultations_for_patient(&self) -> Result<Vec<Consultation>, ApiError>;
    async fn get_consultations_for_doctor(&self) -> Result<Vec<Consultation>, ApiError>;
    async fn get_consultation_by_id(&self, id: &str) -> Result<Option<Consultation>, ApiError>;
    async fn update_consultation_status(
        &self,
        id: &str,
        status: ConsultationStatus,
    ) -> Result<(), ApiError>;

    async fn create_prescription(
        &self,
        payload: &PrescriptionPayload,
    ) -> Result<Prescription, ApiError>;
    async fn get_prescriptions_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Prescription>, ApiError>;
    async fn get_prescription_by_consultation(
        &self,
        consultation_id: &str,
    ) -> Result<Option<Prescription>, ApiError>;
    async fn get_prescription_by_id(&self, id: &str) -> Result<Option<Prescription>, ApiError>;

    async fn upload_file(&self, file: &MediaFile) -> Result<UploadedFile, ApiError>;
    async fn upload_multiple(&self, files: &[MediaFile]) -> Result<Vec<UploadedFile>, ApiError>;
}

// ═══════════════════════════════════════════════════════════
// ApiClient — reqwest implementation
// ═══════════════════════════════════════════════════════════

/// HTTP client for the external REST backend.
///
/// Deliberately built without a request timeout: a hung request leaves the
/// initiating action busy, matching the observed portal behavior.
///
/// Cheap to clone; clones share the connection pool and cookie jar.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    cookies: SharedCookieJar,
}

impl ApiClient {
    pub fn new(base_url: &str, cookies: SharedCookieJar) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            cookies,
        }
    }

    /// Client pointed at the configured backend (HEALOVA_API_URL or the
    /// localhost default).
    pub fn from_env(cookies: SharedCookieJar) -> Self {
        Self::new(&config::api_base_url(), cookies)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn cookies(&self) -> &SharedCookieJar {
        &self.cookies
    }

    /// Build a request for `path` with the bearer token attached when one
    /// is stored. JSON content type is added by `.json(..)` at call sites;
    /// multipart bodies set their own boundary.
    pub(crate) fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.cookies.token()? {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Send with transport failures mapped to user-presentable variants.
    pub(crate) async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        builder.send().await.map_err(|e| {
            if e.is_connect() {
                ApiError::Connection(self.base_url.clone())
            } else {
                ApiError::Transport(e.to_string())
            }
        })
    }

    /// Decode a response body as JSON. The backend wraps failures in the
    /// envelope rather than bare HTTP statuses, so the body is parsed
    /// regardless of status code.
    pub(crate) async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl PortalApi for ApiClient {
    async fn sign_up(&self, details: &SignUpDetails) -> Result<AuthSession, ApiError> {
        ApiClient::sign_up(self, details).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        ApiClient::sign_in(self, email, password).await
    }

    fn sign_out(&self) -> Result<(), ApiError> {
        ApiClient::sign_out(self)
    }

    async fn get_current_user(&self) -> Result<Option<User>, ApiError> {
        ApiClient::get_current_user(self).await
    }

    async fn create_consultation(
        &self,
        payload: &ConsultationPayload,
    ) -> Result<Consultation, ApiError> {
        ApiClient::create_consultation(self, payload).await
    }

    async fn get_consultations_for_patient(&self) -> Result<Vec<Consultation>, ApiError> {
        ApiClient::get_consultations_for_patient(self).await
    }

    async fn get_consultations_for_doctor(&self) -> Result<Vec<Consultation>, ApiError> {
        ApiClient::get_consultations_for_doctor(self).await
    }

    async fn get_consultation_by_id(&self, id: &str) -> Result<Option<Consultation>, ApiError> {
        ApiClient::get_consultation_by_id(self, id).await
    }

    async fn update_consultation_status(
        &self,
        id: &str,
        status: ConsultationStatus,
    ) -> Result<(), ApiError> {
        ApiClient::update_consultation_status(self, id, status).await
    }

    async fn create_prescription(
        &self,
        payload: &PrescriptionPayload,
    ) -> Result<Prescription, ApiError> {
        ApiClient::create_prescription(self, payload).await
    }

    async fn get_prescriptions_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Prescription>, ApiError> {
        ApiClient::get_prescriptions_by_patient(self, patient_id).await
    }

    async fn get_prescription_by_consultation(
        &self,
        consultation_id: &str,
    ) -> Result<Option<Prescription>, ApiError> {
        ApiClient::get_prescription_by_consultation(self, consultation_id).await
    }

    async fn get_prescription_by_id(&self, id: &str) -> Result<Option<Prescription>, ApiError> {
        ApiClient::get_prescription_by_id(self, id).await
    }

    async fn upload_file(&self, file: &MediaFile) -> Result<UploadedFile, ApiError> {
        ApiClient::upload_file(self, file).await
    }

    async fn upload_multiple(&self, files: &[MediaFile]) -> Result<Vec<UploadedFile>, ApiError> {
        ApiClient::upload_multiple(self, files).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::extract::{Multipart, Path, State};
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, patch, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::sync::{oneshot, Mutex};
    use uuid::Uuid;

    use super::consultations::{
        BasicDetailsPayload, MediaPayload, MedicalHistoryPayload, SymptomsPayload,
    };
    use crate::models::{MediaKind, MenstrualCycle};

    // -- Unit ------------------------------------------------------------------

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/api/", SharedCookieJar::in_memory());
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn from_env_uses_default_without_override() {
        // Serial-unsafe env mutation is avoided: just check the default.
        let client = ApiClient::from_env(SharedCookieJar::in_memory());
        assert!(client.base_url().starts_with("http"));
    }

    #[test]
    fn rejected_prefers_backend_message() {
        let err = ApiError::rejected(Some("Email already registered".into()), "Sign up failed");
        assert_eq!(err.to_string(), "Email already registered");

        let fallback = ApiError::rejected(None, "Sign up failed");
        assert_eq!(fallback.to_string(), "Sign up failed");
    }

    // -- Loopback backend ------------------------------------------------------
    //
    // A real axum server on an ephemeral port stands in for the REST backend,
    // so these tests cover the whole reqwest path: URL joining, bearer
    // attachment, JSON bodies, multipart encoding, envelope decoding.

    /// What the scripted backend observed, for cross-checking from the
    /// client side after each call.
    #[derive(Default)]
    struct Seen {
        bearer: Mutex<Option<String>>,
        create_body: Mutex<Option<Value>>,
        status_body: Mutex<Option<(String, Value)>>,
        upload: Mutex<Option<(String, String, usize)>>,
    }

    fn patient_json() -> Value {
        json!({
            "id": "patient-1",
            "email": "sarah@example.com",
            "role": "patient",
            "name": "Sarah Johnson"
        })
    }

    async fn handle_signin(Json(body): Json<Value>) -> Json<Value> {
        if body["password"] == "correct-horse" {
            Json(json!({
                "success": true,
                "user": patient_json(),
                "token": "bearer-token-1",
            }))
        } else {
            Json(json!({ "success": false, "message": "Invalid credentials" }))
        }
    }

    async fn handle_me(State(seen): State<Arc<Seen>>, headers: HeaderMap) -> Response {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *seen.bearer.lock().await = bearer.clone();
        match bearer.as_deref() {
            Some("Bearer bearer-token-1") => {
                Json(json!({ "success": true, "user": patient_json() })).into_response()
            }
            // Plain-text 401: the client must short-circuit before parsing.
            _ => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
        }
    }

    async fn handle_create(
        State(seen): State<Arc<Seen>>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        *seen.create_body.lock().await = Some(body.clone());
        // Echo the received camelCase fields back as a snake_case record.
        Json(json!({
            "success": true,
            "consultation": {
                "id": "consult-9",
                "patient_id": "patient-1",
                "status": "pending",
                "created_at": "2024-03-01T10:30:00Z",
                "updated_at": "2024-03-01T10:30:00Z",
                "basic_details": {
                    "age": body["basicDetails"]["age"],
                    "height": body["basicDetails"]["height"],
                    "weight": body["basicDetails"]["weight"],
                    "menstrual_cycle_regularity": body["basicDetails"]["menstrualCycleRegularity"],
                },
                "symptoms": {},
                "medical_history": {
                    "previous_diagnosis": body["medicalHistory"]["previousDiagnosis"],
                    "reports_available": body["medicalHistory"]["reportsAvailable"],
                },
            }
        }))
    }

    async fn handle_patient_list() -> Json<Value> {
        Json(json!({ "success": false, "message": "Database unavailable" }))
    }

    async fn handle_status(
        State(seen): State<Arc<Seen>>,
        Path(id): Path<String>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        *seen.status_body.lock().await = Some((id, body));
        Json(json!({ "success": true }))
    }

    async fn handle_upload(
        State(seen): State<Arc<Seen>>,
        mut multipart: Multipart,
    ) -> Json<Value> {
        while let Some(field) = multipart.next_field().await.unwrap() {
            if field.name() == Some("file") {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.unwrap();
                *seen.upload.lock().await = Some((file_name.clone(), content_type, bytes.len()));
                return Json(json!({
                    "success": true,
                    "url": format!("/uploads/images/{file_name}"),
                    "type": "images",
                }));
            }
        }
        Json(json!({ "success": false, "message": "No file field" }))
    }

    fn portal_router(seen: Arc<Seen>) -> Router {
        let api = Router::new()
            .route("/auth/signin", post(handle_signin))
            .route("/auth/me", get(handle_me))
            .route("/consultations", post(handle_create))
            .route("/consultations/patient", get(handle_patient_list))
            .route("/consultations/:id/status", patch(handle_status))
            .route("/upload", post(handle_upload))
            .with_state(seen);
        Router::new().nest("/api", api)
    }

    /// Bind an ephemeral port, serve until the shutdown signal, hand back a
    /// client pointed at the server.
    async fn spawn_backend(seen: Arc<Seen>) -> (ApiClient, SharedCookieJar, oneshot::Sender<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, portal_router(seen))
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        let jar = SharedCookieJar::in_memory();
        let client = ApiClient::new(&format!("http://{addr}/api"), jar.clone());
        (client, jar, shutdown_tx)
    }

    fn sample_payload() -> ConsultationPayload {
        ConsultationPayload {
            basic_details: BasicDetailsPayload {
                age: 28,
                height: 165,
                weight: 70,
                menstrual_cycle_regularity: "irregular".into(),
            },
            symptoms: SymptomsPayload {
                irregular_periods: true,
                acne: false,
                weight_gain: true,
                hair_loss: false,
                facial_hair: false,
                mood_changes: false,
                fatigue: false,
                other: None,
            },
            medical_history: MedicalHistoryPayload {
                previous_diagnosis: "pcos".into(),
                medications: "Metformin 500mg".into(),
                reports_available: true,
            },
            media: MediaPayload::default(),
            language: "English".into(),
        }
    }

    #[tokio::test]
    async fn sign_in_persists_token_and_later_calls_carry_it() {
        let seen = Arc::new(Seen::default());
        let (client, jar, shutdown) = spawn_backend(seen.clone()).await;

        let session = client
            .sign_in("sarah@example.com", "correct-horse")
            .await
            .unwrap();
        assert_eq!(session.user.name, "Sarah Johnson");
        assert_eq!(session.token, "bearer-token-1");
        assert_eq!(jar.token().unwrap().as_deref(), Some("bearer-token-1"));

        let user = client.get_current_user().await.unwrap().unwrap();
        assert_eq!(user.id, "patient-1");
        assert_eq!(
            seen.bearer.lock().await.as_deref(),
            Some("Bearer bearer-token-1")
        );

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn rejected_envelope_surfaces_backend_message() {
        let seen = Arc::new(Seen::default());
        let (client, jar, shutdown) = spawn_backend(seen).await;

        let err = client
            .sign_in("sarah@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            ApiError::Rejected { message } if message == "Invalid credentials"
        ));
        assert_eq!(jar.token().unwrap(), None);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn unauthorized_me_short_circuits_to_none() {
        let seen = Arc::new(Seen::default());
        let (client, _jar, shutdown) = spawn_backend(seen).await;

        // No stored token, so the backend answers 401 with a non-JSON body.
        let user = client.get_current_user().await.unwrap();
        assert!(user.is_none());

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn failed_list_fetch_reads_as_empty() {
        let seen = Arc::new(Seen::default());
        let (client, _jar, shutdown) = spawn_backend(seen).await;

        let consultations = client.get_consultations_for_patient().await.unwrap();
        assert!(consultations.is_empty());

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn create_consultation_round_trips_camel_case_payload() {
        let seen = Arc::new(Seen::default());
        let (client, _jar, shutdown) = spawn_backend(seen.clone()).await;

        let consultation = client.create_consultation(&sample_payload()).await.unwrap();
        assert_eq!(consultation.id, "consult-9");
        assert_eq!(consultation.basic_details.age, 28);
        assert_eq!(
            consultation.basic_details.menstrual_cycle,
            MenstrualCycle::Irregular
        );

        let body = seen.create_body.lock().await.take().unwrap();
        assert_eq!(body["basicDetails"]["menstrualCycleRegularity"], "irregular");
        assert_eq!(body["medicalHistory"]["reportsAvailable"], true);
        assert!(body["symptoms"].get("other").is_none());
        assert_eq!(body["language"], "English");

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn status_update_sends_wire_value() {
        let seen = Arc::new(Seen::default());
        let (client, _jar, shutdown) = spawn_backend(seen.clone()).await;

        client
            .update_consultation_status("consult-9", ConsultationStatus::InReview)
            .await
            .unwrap();

        let (id, body) = seen.status_body.lock().await.take().unwrap();
        assert_eq!(id, "consult-9");
        assert_eq!(body["status"], "in-review");

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn upload_carries_multipart_name_and_mime() {
        let seen = Arc::new(Seen::default());
        let (client, _jar, shutdown) = spawn_backend(seen.clone()).await;

        let file = MediaFile {
            id: Uuid::new_v4(),
            name: "photo-123.jpg".into(),
            kind: MediaKind::Image,
            content_type: "image/jpeg".into(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            local_url: "blob:local".into(),
        };
        let uploaded = client.upload_file(&file).await.unwrap();
        assert_eq!(uploaded.url, "/uploads/images/photo-123.jpg");
        assert_eq!(uploaded.kind, MediaKind::Image);

        let (name, mime, size) = seen.upload.lock().await.take().unwrap();
        assert_eq!(name, "photo-123.jpg");
        assert_eq!(mime, "image/jpeg");
        assert_eq!(size, 4);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn connection_refused_maps_to_connection_error() {
        // Grab a port the kernel just released; nothing listens on it.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&format!("http://{addr}/api"), SharedCookieJar::in_memory());
        let err = client.get_current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_)));
    }
}
