//! End-to-end tests against a stub scheduling backend.
//!
//! Each test starts a real Axum server on a random port that mimics the
//! backend's `/api` routes, then drives it through `HttpTransport`,
//! `ApiClient`, `EntityStore` and `FormSession`:
//! - client creation through the form, followed by a reload
//! - backend `erro` messages surfaced as notifications
//! - appointment filters arriving as decoded query parameters
//! - non-JSON error bodies falling back to the generic message

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{FixedOffset, NaiveDate};
use serde_json::{Value, json};
use url::Url;

use salonbook::api::{ApiClient, GENERIC_ERROR_MESSAGE, HttpTransport, NotificationLevel, Notifier};
use salonbook::error::{ApiError, Error};
use salonbook::form::{FormField, FormSession};
use salonbook::model::{AppointmentStatus, EntityKind};
use salonbook::store::{AppointmentFilter, AutoConfirm, EntityStore, Outcome, Page};

#[derive(Default)]
struct Backend {
    clients: Mutex<Vec<Value>>,
    appointment_queries: Mutex<Vec<HashMap<String, String>>>,
    status_updates: Mutex<Vec<(i64, Value)>>,
}

type Shared = Arc<Backend>;

async fn list_clients(State(backend): State<Shared>) -> Json<Value> {
    Json(Value::Array(backend.clients.lock().unwrap().clone()))
}

async fn create_client(State(backend): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    let phone = body["telefone"].as_str().unwrap_or_default();
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"erro": "Telefone inválido"})),
        );
    }
    let mut clients = backend.clients.lock().unwrap();
    let created = json!({
        "id": clients.len() + 1,
        "nome": body["nome"],
        "telefone": phone,
        "email": body["email"],
        "data_cadastro": "2024-01-02T09:00:00",
    });
    clients.push(created.clone());
    (StatusCode::CREATED, Json(created))
}

async fn list_appointments(
    State(backend): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    backend.appointment_queries.lock().unwrap().push(query);
    Json(json!([{
        "id": 7,
        "cliente_id": 1,
        "servico_id": 2,
        "data_agendamento": "2024-01-05T14:30:00",
        "status": "agendado",
        "cliente_nome": "Ana",
        "servico_nome": "Corte",
        "servico_preco": 35.0,
        "servico_duracao": 30
    }]))
}

async fn update_status(
    State(backend): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.status_updates.lock().unwrap().push((id, body));
    Json(json!({"id": id}))
}

async fn broken_statistics() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

async fn start_backend() -> (SocketAddr, Shared) {
    let backend = Shared::default();
    let app = Router::new()
        .route("/api/clientes", get(list_clients).post(create_client))
        .route("/api/agendamentos", get(list_appointments))
        .route("/api/agendamentos/{id}/status", patch(update_status))
        .route("/api/dashboard/estatisticas", get(broken_statistics))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub backend");
    });
    (addr, backend)
}

fn store_for(addr: SocketAddr) -> EntityStore {
    let base_url = Url::parse(&format!("http://{addr}/api")).expect("base url");
    let transport = HttpTransport::new(base_url, Some(std::time::Duration::from_secs(5)))
        .expect("transport");
    let api = Arc::new(ApiClient::new(Arc::new(transport), Notifier::default()));
    EntityStore::new(api, Arc::new(AutoConfirm))
}

fn brt() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

#[tokio::test]
async fn creating_a_client_through_the_form_reloads_the_collection() {
    let (addr, _backend) = start_backend().await;
    let store = store_for(addr);
    let mut session = FormSession::new(brt());

    session
        .open(EntityKind::Client, None, &store)
        .expect("open form");
    session.set_field(FormField::ClientName, "Ana").unwrap();
    session
        .set_field(FormField::ClientPhone, "11999999999")
        .unwrap();
    session.submit(&store).await.expect("submit");

    assert!(!session.is_open());
    let clients = store.clients();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].name, "Ana");
    assert_eq!(clients[0].email, None);
    assert!(clients[0].registered_at.is_some());

    let notes = store.api().notifier().drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Success);
    assert_eq!(notes[0].message, "Cliente criado com sucesso!");
    assert!(!store.api().loading().is_active());
}

#[tokio::test]
async fn backend_error_message_reaches_the_notification() {
    let (addr, backend) = start_backend().await;
    let store = store_for(addr);
    let mut session = FormSession::new(brt());

    session
        .open(EntityKind::Client, None, &store)
        .expect("open form");
    session.set_field(FormField::ClientName, "Bia").unwrap();
    session.set_field(FormField::ClientPhone, "abc").unwrap();
    let err = session.submit(&store).await.expect_err("must fail");

    let Error::Api(ApiError::Request { status, message }) = err else {
        panic!("expected a request error");
    };
    assert_eq!(status, 400);
    assert_eq!(message, "Telefone inválido");
    assert!(session.is_open());
    assert!(store.clients().is_empty());
    assert!(backend.clients.lock().unwrap().is_empty());

    let notes = store.api().notifier().drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert_eq!(notes[0].message, "Telefone inválido");
}

#[tokio::test]
async fn date_filter_arrives_as_day_bounds() {
    let (addr, backend) = start_backend().await;
    let store = store_for(addr);

    let filter = AppointmentFilter {
        date: NaiveDate::from_ymd_opt(2024, 1, 5),
        status: Some(AppointmentStatus::Scheduled),
        client_id: None,
    };
    store.filter_appointments(&filter).await.expect("filter");

    let queries = backend.appointment_queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].get("data_inicio").map(String::as_str), Some("2024-01-05T00:00:00"));
    assert_eq!(queries[0].get("data_fim").map(String::as_str), Some("2024-01-05T23:59:59"));
    assert_eq!(queries[0].get("status").map(String::as_str), Some("agendado"));
    assert!(!queries[0].contains_key("cliente_id"));
    assert_eq!(store.appointments().len(), 1);
}

#[tokio::test]
async fn completing_an_appointment_patches_status_then_reloads_unfiltered() {
    let (addr, backend) = start_backend().await;
    let store = store_for(addr);
    store.set_active_page(Page::Appointments);

    let outcome = store
        .set_appointment_status(7, AppointmentStatus::Completed)
        .await
        .expect("complete");

    assert_eq!(outcome, Outcome::Applied);
    let updates = backend.status_updates.lock().unwrap().clone();
    assert_eq!(updates, vec![(7, json!({"status": "concluido"}))]);
    let queries = backend.appointment_queries.lock().unwrap().clone();
    assert_eq!(queries, vec![HashMap::new()]);
}

#[tokio::test]
async fn non_json_error_body_uses_the_generic_message() {
    let (addr, _backend) = start_backend().await;
    let store = store_for(addr);

    let err = store.load_dashboard().await.expect_err("must fail");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    assert!(store.dashboard().is_none());
    let notes = store.api().notifier().drain();
    assert_eq!(notes[0].message, "Erro na requisição");
}
