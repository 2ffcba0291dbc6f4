use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use meetbook::client::{Coordinator, HttpBackend, RetryPolicy, SchedulerBackend};
use meetbook::config::{AppConfig, GOOGLE_CALENDAR_API, GOOGLE_TOKEN_URI};
use meetbook::db::{InMemoryRepository, MeetingRepository};
use meetbook::errors::AppError;
use meetbook::handlers;
use meetbook::models::{
    CalendarEvent, ConfirmationState, CreatedEvent, Meeting, OAuthCredentials, Phase,
    ProposalResult, User,
};
use meetbook::services::calendar::CalendarGateway;
use meetbook::services::interpreter::AnchorRounding;
use meetbook::services::proposal::ProposalService;
use meetbook::services::slots::SlotSpacing;
use meetbook::state::AppState;

// ── Mock Collaborators ──

#[derive(Clone, Default)]
struct MockCalendar {
    created: Arc<Mutex<Vec<CalendarEvent>>>,
    fail_with: Option<String>,
    require_token: bool,
}

#[async_trait]
impl CalendarGateway for MockCalendar {
    async fn create_event(
        &self,
        event: &CalendarEvent,
        credentials: Option<&OAuthCredentials>,
    ) -> Result<CreatedEvent, AppError> {
        if self.require_token {
            credentials.cloned().unwrap_or_default().validate()?;
        }
        if let Some(detail) = &self.fail_with {
            return Err(AppError::Gateway(detail.clone()));
        }
        let mut created = self.created.lock().unwrap();
        created.push(event.clone());
        Ok(CreatedEvent {
            id: format!("evt_{}", created.len()),
            html_link: None,
            status: Some("confirmed".to_string()),
        })
    }
}

/// Shares the in-memory store with the test so recorded meetings can be inspected.
#[derive(Clone, Default)]
struct SharedRepo(Arc<InMemoryRepository>);

impl MeetingRepository for SharedRepo {
    fn save_meeting(&self, meeting: &Meeting) -> Result<(), AppError> {
        self.0.save_meeting(meeting)
    }

    fn save_user(&self, user: &User) -> Result<(), AppError> {
        self.0.save_user(user)
    }

    fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        self.0.get_user(email)
    }
}

/// Backend stand-in counting calls, with scripted confirm outcomes.
#[derive(Default)]
struct ScriptedBackend {
    propose_calls: Mutex<Vec<String>>,
    confirm_calls: Mutex<Vec<CalendarEvent>>,
    confirm_tokens: Mutex<Vec<Option<OAuthCredentials>>>,
    propose_error: Option<String>,
    confirm_error: Option<String>,
}

#[async_trait]
impl SchedulerBackend for ScriptedBackend {
    async fn propose(&self, prompt: &str) -> Result<ProposalResult, AppError> {
        self.propose_calls.lock().unwrap().push(prompt.to_string());
        if let Some(e) = &self.propose_error {
            return Err(AppError::Transport(e.clone()));
        }
        ProposalService::from_config(&test_config()).propose(prompt, 3)
    }

    async fn confirm(
        &self,
        event: &CalendarEvent,
        token: Option<&OAuthCredentials>,
    ) -> Result<CreatedEvent, AppError> {
        self.confirm_calls.lock().unwrap().push(event.clone());
        self.confirm_tokens.lock().unwrap().push(token.cloned());
        match &self.confirm_error {
            Some(e) => Err(AppError::Transport(e.clone())),
            None => Ok(CreatedEvent {
                id: "evt_scripted".to_string(),
                html_link: None,
                status: None,
            }),
        }
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        backend_url: "http://localhost:8000".to_string(),
        demo_mode: true,
        timezone: chrono_tz::Asia::Kolkata,
        demo_refresh_token: String::new(),
        user_refresh_token: String::new(),
        google_client_id: String::new(),
        google_client_secret: String::new(),
        google_token_uri: GOOGLE_TOKEN_URI.to_string(),
        google_calendar_api: GOOGLE_CALENDAR_API.to_string(),
        database_url: None,
        slot_count: 3,
        slot_spacing: SlotSpacing::FixedHour,
        anchor_rounding: AnchorRounding::Verbatim,
    }
}

fn test_state(calendar: MockCalendar, repo: SharedRepo) -> Arc<AppState> {
    let config = test_config();
    Arc::new(AppState {
        proposals: ProposalService::from_config(&config),
        calendar: Box::new(calendar),
        repository: Box::new(repo),
        config,
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/propose", post(handlers::propose::propose))
        .route("/confirm", post(handlers::confirm::confirm))
        .with_state(state)
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn event_json() -> serde_json::Value {
    serde_json::json!({
        "summary": "Meeting",
        "start": "2026-10-20T15:00:00+05:30",
        "end": "2026-10-20T15:45:00+05:30",
        "human": "2026-10-20 15:00 - 15:45 (Asia/Kolkata)"
    })
}

/// Serves the router on an ephemeral port and returns its base URL.
async fn spawn_server(state: Arc<AppState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = test_app(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let app = test_app(test_state(MockCalendar::default(), SharedRepo::default()));

    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "ok");
}

// ── Propose ──

#[tokio::test]
async fn test_propose_returns_three_slots() {
    let app = test_app(test_state(MockCalendar::default(), SharedRepo::default()));
    let prompt = "Schedule a 45 minute sync with bob@corp.com tomorrow 3pm";

    let res = app
        .oneshot(json_request("/propose", serde_json::json!({ "prompt": prompt })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["summary"], "Meeting");
    assert_eq!(body["emails"], serde_json::json!(["bob@corp.com"]));

    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 3);
    for (i, slot) in slots.iter().enumerate() {
        let start = chrono::DateTime::parse_from_rfc3339(slot["start"].as_str().unwrap()).unwrap();
        let end = chrono::DateTime::parse_from_rfc3339(slot["end"].as_str().unwrap()).unwrap();
        assert_eq!((end - start).num_minutes(), 45);
        assert_eq!(start.format("%H:%M").to_string(), format!("{}:00", 15 + i));
        assert!(slot["human"].as_str().unwrap().ends_with("(Asia/Kolkata)"));
    }
}

#[tokio::test]
async fn test_propose_malformed_body_is_still_structured() {
    let app = test_app(test_state(MockCalendar::default(), SharedRepo::default()));

    let res = app
        .oneshot(json_request("/propose", serde_json::json!({"text": "oops"})))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());
}

// ── Confirm ──

#[tokio::test]
async fn test_confirm_creates_event_and_records_meeting() {
    let calendar = MockCalendar::default();
    let repo = SharedRepo::default();
    let app = test_app(test_state(calendar.clone(), repo.clone()));

    let res = app
        .oneshot(json_request("/confirm", serde_json::json!({"event": event_json()})))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["created"]["id"], "evt_1");

    let created = calendar.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].timezone.as_deref(), Some("Asia/Kolkata"));

    let meetings = repo.0.meetings();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0].event_id, "evt_1");
    assert_eq!((meetings[0].end - meetings[0].start).num_minutes(), 45);
}

#[tokio::test]
async fn test_confirm_missing_credentials_is_400() {
    let calendar = MockCalendar {
        require_token: true,
        ..Default::default()
    };
    let app = test_app(test_state(calendar.clone(), SharedRepo::default()));

    let res = app
        .oneshot(json_request(
            "/confirm",
            serde_json::json!({
                "event": event_json(),
                "token_dict": {"refresh_token": "r", "client_id": "", "client_secret": "s"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("client_id"));
    assert!(calendar.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_confirm_provider_rejection_is_500() {
    let calendar = MockCalendar {
        fail_with: Some(r#"{"error":{"code":403,"message":"insufficient scopes"}}"#.to_string()),
        ..Default::default()
    };
    let repo = SharedRepo::default();
    let app = test_app(test_state(calendar, repo.clone()));

    let res = app
        .oneshot(json_request("/confirm", serde_json::json!({"event": event_json()})))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(res).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Google API error:"));
    assert!(body["message"].as_str().unwrap().contains("insufficient scopes"));
    assert!(repo.0.meetings().is_empty());
}

#[tokio::test]
async fn test_confirm_malformed_event_is_400() {
    let app = test_app(test_state(MockCalendar::default(), SharedRepo::default()));

    let res = app
        .oneshot(json_request(
            "/confirm",
            serde_json::json!({"event": {"summary": "Meeting", "start": "not a date"}}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["status"], "error");
}

// ── Coordinator ──

#[tokio::test]
async fn test_coordinator_happy_path() {
    let mut coordinator = Coordinator::new(ScriptedBackend::default(), false);

    coordinator
        .submit("Schedule a 45 minute sync with bob@corp.com tomorrow 3pm")
        .await;
    assert_eq!(coordinator.phase(), Phase::Proposed);
    let proposal = coordinator.state().pending_proposal.clone().unwrap();
    assert_eq!(proposal.slots.len(), 3);

    coordinator.select(1).await;
    assert_eq!(coordinator.phase(), Phase::Confirmed);
    assert!(!coordinator.state().lock_held);

    let confirms = coordinator.backend().confirm_calls.lock().unwrap().clone();
    assert_eq!(confirms.len(), 1);
    assert_eq!(confirms[0].start, proposal.slots[1].start);
}

#[tokio::test]
async fn test_coordinator_sends_configured_user_token() {
    let mut config = test_config();
    config.user_refresh_token = "user-refresh".to_string();
    let token = config.user_credentials().unwrap();

    let mut coordinator =
        Coordinator::new(ScriptedBackend::default(), false).with_token(token.clone());
    coordinator.submit("tomorrow 10am").await;
    coordinator.select(0).await;

    let tokens = coordinator.backend().confirm_tokens.lock().unwrap().clone();
    assert_eq!(tokens, vec![Some(token)]);
}

#[tokio::test]
async fn test_coordinator_refuses_selection_while_confirming() {
    let mut coordinator = Coordinator::new(ScriptedBackend::default(), false);
    coordinator.submit("tomorrow 10am").await;

    // A confirmation is outstanding for this session
    let mut state: ConfirmationState = coordinator.into_state();
    state.lock_held = true;
    let mut coordinator =
        Coordinator::new(ScriptedBackend::default(), false).with_state(state);

    coordinator.select(0).await;
    coordinator.select(2).await;

    assert!(coordinator.backend().confirm_calls.lock().unwrap().is_empty());
    let notices = coordinator
        .state()
        .messages
        .iter()
        .filter(|m| m.content == meetbook::client::coordinator::IN_PROGRESS_NOTICE)
        .count();
    assert_eq!(notices, 2);
    assert_eq!(coordinator.phase(), Phase::Confirming);
}

#[tokio::test]
async fn test_coordinator_failed_confirm_allows_another_pick() {
    let backend = ScriptedBackend {
        confirm_error: Some("Google API error: backendError".to_string()),
        ..Default::default()
    };
    let mut coordinator = Coordinator::new(backend, false);
    coordinator.submit("tomorrow 10am").await;

    coordinator.select(0).await;
    assert_eq!(coordinator.phase(), Phase::Proposed);
    assert_eq!(
        coordinator.state().messages.last().unwrap().content,
        "❌ Failed to create event: Google API error: backendError"
    );

    coordinator.select(0).await;
    assert_eq!(coordinator.backend().confirm_calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_coordinator_retry_and_clear() {
    let mut coordinator = Coordinator::new(ScriptedBackend::default(), false);

    coordinator.retry().await;
    assert!(coordinator.backend().propose_calls.lock().unwrap().is_empty());

    coordinator.submit("friday 2pm").await;
    coordinator.retry().await;
    assert_eq!(coordinator.state().retry_count, 1);
    assert_eq!(
        *coordinator.backend().propose_calls.lock().unwrap(),
        vec!["friday 2pm", "friday 2pm"]
    );
    assert_eq!(
        coordinator.state().messages.last().unwrap().content,
        "Retry result: Found 3 slots."
    );

    coordinator.clear().await;
    assert_eq!(coordinator.phase(), Phase::Idle);
    assert!(coordinator.state().messages.is_empty());
    assert_eq!(coordinator.state().last_request_text.as_deref(), Some("friday 2pm"));
}

#[tokio::test]
async fn test_coordinator_surfaces_proposal_failure() {
    let backend = ScriptedBackend {
        propose_error: Some("Failed to propose: connection refused".to_string()),
        ..Default::default()
    };
    let mut coordinator = Coordinator::new(backend, false);
    coordinator.submit("tomorrow").await;

    assert_eq!(coordinator.phase(), Phase::Idle);
    assert!(coordinator.state().pending_proposal.is_none());
    assert_eq!(
        coordinator.state().messages.last().unwrap().content,
        "❌ Failed to propose: connection refused"
    );
}

// ── End to End ──

#[tokio::test]
async fn test_end_to_end_over_http() {
    let calendar = MockCalendar::default();
    let base_url = spawn_server(test_state(calendar.clone(), SharedRepo::default())).await;

    let backend = HttpBackend::new(base_url).with_retry(RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(10),
    });
    let mut coordinator = Coordinator::new(backend, true);

    coordinator
        .submit("1 hour review with ann@corp.com and ann@corp.com next monday 11am")
        .await;
    let proposal = coordinator.state().pending_proposal.clone().unwrap();
    assert_eq!(proposal.duration_minutes, 60);
    assert_eq!(proposal.emails, vec!["ann@corp.com", "ann@corp.com"]);

    coordinator.select(2).await;
    assert!(coordinator.state().confirmed);

    let created = calendar.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].start, proposal.slots[2].start);
}

#[tokio::test]
async fn test_end_to_end_retry_exhaustion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/propose")
        .with_status(503)
        .with_body(r#"{"status":"error","message":"service unavailable"}"#)
        .expect(3)
        .create_async()
        .await;

    let backend = HttpBackend::new(server.url()).with_retry(RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(10),
    });
    let mut coordinator = Coordinator::new(backend, false);
    coordinator.submit("tomorrow 3pm").await;

    mock.assert_async().await;
    assert!(coordinator.state().pending_proposal.is_none());
    assert_eq!(
        coordinator.state().messages.last().unwrap().content,
        "❌ Failed to propose: service unavailable"
    );
}
