use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use coopboard_core::config::Settings;
use coopboard_core::domain::error::ValidationError;
use coopboard_core::domain::record::{DailyRecord, DailyRecordForm, DATE_FORMAT};
use coopboard_core::report::{self, DEFAULT_WINDOW_DAYS};
use coopboard_core::storage::MetricsStore;

const SESSION_COOKIE: &str = "coopboard_session";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let mut store = MetricsStore::new();
    if settings.seed_demo_data {
        store.seed_demo(Utc::now().date_naive());
    }

    let state = AppState::new(settings, store);
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    settings: Arc<Settings>,
    store: Arc<RwLock<MetricsStore>>,
    sessions: Arc<RwLock<HashSet<String>>>,
}

impl AppState {
    fn new(settings: Settings, store: MetricsStore) -> Self {
        Self {
            settings: Arc::new(settings),
            store: Arc::new(RwLock::new(store)),
            sessions: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    // Lock poisoning only happens if a handler panicked mid-write; the store
    // holds plain data, so reading through it is still sound.
    fn store_read(&self) -> RwLockReadGuard<'_, MetricsStore> {
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn store_write(&self) -> RwLockWriteGuard<'_, MetricsStore> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }

    fn sessions_read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn sessions_write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/api/summary", get(get_summary))
        .route("/api/chart_data", get(get_chart_data))
        .route("/api/records", get(list_records).post(upsert_record))
        .route("/api/records/:date", get(get_record))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Per-handler session check, as the original dashboard guarded every route.
fn require_session(state: &AppState, jar: &CookieJar) -> Result<(), Response> {
    let authorized = jar
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| state.sessions_read().contains(cookie.value()));
    if authorized {
        Ok(())
    } else {
        Err(error_json(StatusCode::UNAUTHORIZED, "unauthorized"))
    }
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if !state.settings.verify_login(&form.username, &form.password) {
        tracing::warn!("rejected login attempt");
        return error_json(StatusCode::UNAUTHORIZED, "invalid username or password");
    }

    let token = Uuid::new_v4().to_string();
    state.sessions_write().insert(token.clone());

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    tracing::info!("admin logged in");
    (jar.add(cookie), Json(json!({ "ok": true }))).into_response()
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions_write().remove(cookie.value());
    }
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Json(json!({ "ok": true }))).into_response()
}

async fn get_summary(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Err(denied) = require_session(&state, &jar) {
        return denied;
    }

    let store = state.store_read();
    Json(report::latest_summary(&store, &state.settings.pricing)).into_response()
}

#[derive(Debug, Deserialize)]
struct ChartParams {
    days: Option<String>,
}

async fn get_chart_data(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<ChartParams>,
) -> Response {
    if let Err(denied) = require_session(&state, &jar) {
        return denied;
    }

    let window_days = match params.days.as_deref() {
        None => DEFAULT_WINDOW_DAYS,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n >= 1 => n,
            _ => return error_json(StatusCode::BAD_REQUEST, "days must be a positive integer"),
        },
    };

    let store = state.store_read();
    Json(report::trailing_series(&store, window_days)).into_response()
}

async fn list_records(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Err(denied) = require_session(&state, &jar) {
        return denied;
    }

    let store = state.store_read();
    let records: Vec<DailyRecord> = store.records().cloned().collect();
    Json(records).into_response()
}

async fn get_record(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(date): Path<String>,
) -> Response {
    if let Err(denied) = require_session(&state, &jar) {
        return denied;
    }

    let Ok(date) = NaiveDate::parse_from_str(&date, DATE_FORMAT) else {
        return error_json(StatusCode::BAD_REQUEST, "expected YYYY-MM-DD date");
    };

    let store = state.store_read();
    match store.get(date) {
        Some(record) => Json(record.clone()).into_response(),
        None => error_json(StatusCode::NOT_FOUND, "no record for date"),
    }
}

async fn upsert_record(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DailyRecordForm>,
) -> Response {
    if let Err(denied) = require_session(&state, &jar) {
        return denied;
    }

    match form.validate_into_record() {
        Ok(record) => {
            let date = record.date;
            state.store_write().upsert(record);
            (
                StatusCode::CREATED,
                Json(json!({ "ok": true, "date": date.format(DATE_FORMAT).to_string() })),
            )
                .into_response()
        }
        Err(err) => {
            if let Some(validation) = err.downcast_ref::<ValidationError>() {
                return error_json(StatusCode::UNPROCESSABLE_ENTITY, &validation.to_string());
            }
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "record upsert failed");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
