//! Shared test utilities for wizard and remote client integration tests.
//!
//! Two doubles for the verification service:
//! - `ScriptedApi`: an in-process `VerificationApi` whose responses are queued up
//!   front, for orchestrator tests
//! - `MockService`: an axum server on an ephemeral port, for exercising the real
//!   reqwest client over HTTP
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use kyc_wizard::error::{ClientError, ClientResult};
use kyc_wizard::{
    AccessCredential, Settings, VerificationApi, VerificationInput, VerificationOutcome,
    VerificationSession,
};
use kyc_wizard::test_support::{valid_id_image, valid_selfie};
use serde_json::{Value, json};
use tokio::sync::Notify;

// ============================================================================
// Scripted in-process API
// ============================================================================

#[derive(Default)]
struct Script {
    acquired: AtomicUsize,
    submitted: AtomicUsize,
    credentials: Mutex<VecDeque<ClientResult<AccessCredential>>>,
    outcomes: Mutex<VecDeque<ClientResult<VerificationOutcome>>>,
    tokens_seen: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

/// `VerificationApi` double. Unscripted calls succeed: a one-hour key named
/// `key-N`, and an 87.5% match.
#[derive(Clone, Default)]
pub struct ScriptedApi {
    script: Arc<Script>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every submission waits for `gate` to be notified before answering.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            script: Arc::new(Script {
                gate: Some(gate),
                ..Script::default()
            }),
        }
    }

    pub fn push_credential(&self, credential: ClientResult<AccessCredential>) -> &Self {
        self.script.credentials.lock().unwrap().push_back(credential);
        self
    }

    pub fn push_outcome(&self, outcome: ClientResult<VerificationOutcome>) -> &Self {
        self.script.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn acquired(&self) -> usize {
        self.script.acquired.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> usize {
        self.script.submitted.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.script.tokens_seen.lock().unwrap().clone()
    }
}

impl VerificationApi for ScriptedApi {
    async fn acquire_credential(&self) -> ClientResult<AccessCredential> {
        let n = self.script.acquired.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted = self.script.credentials.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(AccessCredential::new(
                format!("key-{n}"),
                Utc::now() + Duration::hours(1),
            ))
        })
    }

    async fn submit(
        &self,
        _input: &VerificationInput,
        credential: &AccessCredential,
    ) -> ClientResult<VerificationOutcome> {
        self.script.submitted.fetch_add(1, Ordering::SeqCst);
        self.script
            .tokens_seen
            .lock()
            .unwrap()
            .push(credential.token().to_string());

        if let Some(gate) = &self.script.gate {
            gate.notified().await;
        }

        let scripted = self.script.outcomes.lock().unwrap().pop_front();
        scripted.unwrap_or(Ok(VerificationOutcome::Success {
            similarity_percent: 87.5,
        }))
    }
}

/// A credential that is already inside the expiry margin.
pub fn nearly_expired(token: &str) -> AccessCredential {
    AccessCredential::new(token, Utc::now() + Duration::seconds(5))
}

pub fn rejected_credential() -> ClientResult<VerificationOutcome> {
    Err(ClientError::CredentialRejected("Invalid API key".to_string()))
}

pub fn session<A: VerificationApi>(api: A) -> VerificationSession<A> {
    VerificationSession::new(api, &Settings::for_tests("http://localhost:1"))
}

/// Drive a fresh or restarted session to the selfie step with a selfie set.
pub fn fill_in<A: VerificationApi>(session: &mut VerificationSession<A>) {
    session.submit_email("user@example.com").unwrap();
    session.select_id_image(valid_id_image()).unwrap();
    session.continue_to_selfie().unwrap();
    session.set_selfie(valid_selfie()).unwrap();
}

// ============================================================================
// HTTP mock of the verification service
// ============================================================================

/// One multipart field as received by the mock.
#[derive(Debug, Clone)]
pub struct ReceivedField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
    pub text: Option<String>,
}

pub struct MockState {
    pub api_key_calls: AtomicUsize,
    pub kyc_calls: AtomicUsize,
    pub api_key_reply: Mutex<(StatusCode, Value)>,
    pub kyc_reply: Mutex<(StatusCode, Value)>,
    pub last_authorization: Mutex<Option<String>>,
    pub last_fields: Mutex<Vec<ReceivedField>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            api_key_calls: AtomicUsize::new(0),
            kyc_calls: AtomicUsize::new(0),
            api_key_reply: Mutex::new((
                StatusCode::OK,
                json!({
                    "success": true,
                    "api_key": "mock-key",
                    "expires": (Utc::now() + Duration::hours(1)).to_rfc3339(),
                }),
            )),
            kyc_reply: Mutex::new((
                StatusCode::OK,
                json!({ "success": true, "verified": true, "similarity": 87.5 }),
            )),
            last_authorization: Mutex::new(None),
            last_fields: Mutex::new(Vec::new()),
        }
    }
}

pub struct MockService {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockService {
    /// Bind to an ephemeral port and serve until the test runtime shuts down.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api-key", post(api_key))
            .route("/kyc", post(kyc))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn settings(&self) -> Settings {
        Settings::for_tests(&self.base_url)
    }

    pub fn reply_api_key(&self, status: StatusCode, body: Value) {
        *self.state.api_key_reply.lock().unwrap() = (status, body);
    }

    pub fn reply_kyc(&self, status: StatusCode, body: Value) {
        *self.state.kyc_reply.lock().unwrap() = (status, body);
    }

    pub fn api_key_calls(&self) -> usize {
        self.state.api_key_calls.load(Ordering::SeqCst)
    }

    pub fn kyc_calls(&self) -> usize {
        self.state.kyc_calls.load(Ordering::SeqCst)
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }

    pub fn last_fields(&self) -> Vec<ReceivedField> {
        self.state.last_fields.lock().unwrap().clone()
    }
}

async fn api_key(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.api_key_calls.fetch_add(1, Ordering::SeqCst);
    let (status, body) = state.api_key_reply.lock().unwrap().clone();
    (status, Json(body))
}

async fn kyc(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    state.kyc_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_authorization.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap_or_default();
        let text = if file_name.is_none() {
            String::from_utf8(data.to_vec()).ok()
        } else {
            None
        };
        fields.push(ReceivedField {
            name,
            file_name,
            content_type,
            len: data.len(),
            text,
        });
    }
    *state.last_fields.lock().unwrap() = fields;

    let (status, body) = state.kyc_reply.lock().unwrap().clone();
    (status, Json(body))
}
