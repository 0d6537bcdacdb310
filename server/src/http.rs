use std::{
    marker::PhantomData,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Path, Query, State, rejection::JsonRejection},
    http::{self, HeaderName, HeaderValue, Method, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use platform_api::{ApiError, StatusBanner};
use platform_authn::{
    IdentityService, Registration, Role, Session, SessionBackend, SessionStore,
};
use platform_authz::{Access, EmployeeGuard, Guard, HrGuard};
use platform_store::{EmployeeId, EmployeeRecord, EmployeeStore};
use products_hr::{
    DashboardView, EmployeeListing, LifecycleEngine, OnboardingForm, PasswordChange,
    ProfileUpdate, StaffProfile, TimeOffDecision, TimeOffSubmission,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub identity: Arc<IdentityService>,
    pub engine: LifecycleEngine,
    pub store: Arc<dyn EmployeeStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Restores persisted sessions and wires the services around one store.
    pub async fn build(
        config: Arc<AppConfig>,
        store: Arc<dyn EmployeeStore>,
        backend: Arc<dyn SessionBackend>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::restore(backend).await);
        let identity = Arc::new(IdentityService::new(
            store.clone(),
            sessions.clone(),
            config.hr.clone(),
        ));
        Self {
            sessions,
            identity,
            engine: LifecycleEngine::new(store.clone()),
            store,
            config,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "portal server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(directory_handler))
        .route(
            "/LoginEmployee",
            get(employee_session_handler).post(employee_sign_in_handler),
        )
        .route("/LoginEmployee/signout", post(employee_sign_out_handler))
        .route("/LoginEmployee/register", post(register_handler))
        .route("/LoginHR", get(hr_session_handler).post(hr_sign_in_handler))
        .route("/LoginHR/signout", post(hr_sign_out_handler))
        .route("/userDashboard", get(dashboard_handler))
        .route("/userDashboard/profile", put(profile_handler))
        .route("/userDashboard/assignment", put(assignment_handler))
        .route("/userDashboard/password", put(password_handler))
        .route("/userDashboard/onboarding", post(onboarding_handler))
        .route("/userDashboard/time-off", post(time_off_request_handler))
        .route("/HRDashboard", get(hr_dashboard_handler))
        .route("/HRDashboard/employees", post(create_employee_handler))
        .route(
            "/HRDashboard/employees/{id}",
            put(edit_employee_handler).delete(delete_employee_handler),
        )
        .route("/HRDashboard/employees/{id}/approve", post(approve_handler))
        .route("/HRDashboard/employees/{id}/time-off", post(decide_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

/// Identity bound to the role `G` protects. Rejects with a redirect to that
/// role's login page.
pub struct Authenticated<G> {
    pub identity: String,
    _guard: PhantomData<fn() -> G>,
}

impl<G: Guard> FromRequestParts<AppState> for Authenticated<G> {
    type Rejection = Redirect;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match G::check(&state.sessions) {
            Access::Granted { identity } => Ok(Self {
                identity,
                _guard: PhantomData,
            }),
            Access::Redirect { location } => Err(Redirect::to(location)),
        }
    }
}

type EmployeeOnly = Authenticated<EmployeeGuard>;
type HrOnly = Authenticated<HrGuard>;

/// Status banner plus the affected resource, if any.
#[derive(Serialize)]
struct Reply<T> {
    #[serde(flatten)]
    status: StatusBanner,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> Reply<T> {
    fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            status: StatusBanner::success(message),
            data: Some(data),
        })
    }
}

impl Reply<()> {
    fn banner(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: StatusBanner::success(message),
            data: None,
        })
    }
}

/// JSON body whose decode failures answer with a validation banner.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(HttpError))]
struct JsonBody<T>(T);

#[derive(Default, Deserialize)]
#[serde(default)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AssignmentUpdate {
    current_assignment: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    store_ok: bool,
    version: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = state.store.list_employees().await.is_ok();
    Json(HealthResponse {
        ok: store_ok,
        store_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn directory_handler(
    State(state): State<AppState>,
) -> HttpResult<Json<Vec<StaffProfile>>> {
    Ok(Json(state.engine.directory().await?))
}

async fn employee_session_handler(State(state): State<AppState>) -> Json<Session> {
    Json(state.sessions.get(Role::Employee))
}

async fn hr_session_handler(State(state): State<AppState>) -> Json<Session> {
    Json(state.sessions.get(Role::Hr))
}

async fn sign_in(
    state: &AppState,
    role: Role,
    credentials: Credentials,
) -> HttpResult<Json<Reply<Session>>> {
    state
        .identity
        .sign_in(role, &credentials.username, &credentials.password)
        .await?;
    Ok(Reply::ok("Signed in", state.sessions.get(role)))
}

async fn employee_sign_in_handler(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> HttpResult<Json<Reply<Session>>> {
    sign_in(&state, Role::Employee, credentials).await
}

async fn hr_sign_in_handler(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> HttpResult<Json<Reply<Session>>> {
    sign_in(&state, Role::Hr, credentials).await
}

async fn employee_sign_out_handler(State(state): State<AppState>) -> Json<Reply<()>> {
    state.identity.sign_out(Role::Employee).await;
    Reply::banner("Signed out")
}

async fn hr_sign_out_handler(State(state): State<AppState>) -> Json<Reply<()>> {
    state.identity.sign_out(Role::Hr).await;
    Reply::banner("Signed out")
}

async fn register_handler(
    State(state): State<AppState>,
    JsonBody(registration): JsonBody<Registration>,
) -> HttpResult<(StatusCode, Json<Reply<EmployeeRecord>>)> {
    let record = state.identity.register(registration).await?;
    Ok((StatusCode::CREATED, Reply::ok("Account created", record)))
}

async fn dashboard_handler(
    State(state): State<AppState>,
    user: EmployeeOnly,
) -> HttpResult<Json<DashboardView>> {
    Ok(Json(state.engine.employee(user.identity).dashboard().await?))
}

async fn profile_handler(
    State(state): State<AppState>,
    user: EmployeeOnly,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> HttpResult<Json<Reply<EmployeeRecord>>> {
    let record = state.engine.employee(user.identity).update_profile(update).await?;
    Ok(Reply::ok("Profile updated", record))
}

async fn assignment_handler(
    State(state): State<AppState>,
    user: EmployeeOnly,
    JsonBody(update): JsonBody<AssignmentUpdate>,
) -> HttpResult<Json<Reply<EmployeeRecord>>> {
    let record = state
        .engine
        .employee(user.identity)
        .update_assignment(update.current_assignment)
        .await?;
    Ok(Reply::ok("Current assignment updated", record))
}

async fn password_handler(
    State(state): State<AppState>,
    user: EmployeeOnly,
    JsonBody(change): JsonBody<PasswordChange>,
) -> HttpResult<Json<Reply<()>>> {
    state.engine.employee(user.identity).change_password(change).await?;
    Ok(Reply::banner("Password changed"))
}

async fn onboarding_handler(
    State(state): State<AppState>,
    user: EmployeeOnly,
    JsonBody(form): JsonBody<OnboardingForm>,
) -> HttpResult<Json<Reply<EmployeeRecord>>> {
    let record = state
        .engine
        .employee(user.identity)
        .complete_onboarding(form)
        .await?;
    Ok(Reply::ok("Onboarding complete", record))
}

async fn time_off_request_handler(
    State(state): State<AppState>,
    user: EmployeeOnly,
    JsonBody(submission): JsonBody<TimeOffSubmission>,
) -> HttpResult<Json<Reply<EmployeeRecord>>> {
    let record = state
        .engine
        .employee(user.identity)
        .submit_time_off(submission)
        .await?;
    Ok(Reply::ok("Time off request submitted", record))
}

async fn hr_dashboard_handler(
    State(state): State<AppState>,
    _hr: HrOnly,
    Query(query): Query<SearchQuery>,
) -> HttpResult<Json<EmployeeListing>> {
    let listing = state
        .engine
        .hr()
        .list_employees(query.search.as_deref())
        .await?;
    Ok(Json(listing))
}

async fn create_employee_handler(
    State(state): State<AppState>,
    _hr: HrOnly,
    JsonBody(credentials): JsonBody<Credentials>,
) -> HttpResult<(StatusCode, Json<Reply<EmployeeRecord>>)> {
    let record = state
        .engine
        .hr()
        .create_employee(&credentials.username, &credentials.password)
        .await?;
    Ok((StatusCode::CREATED, Reply::ok("Employee created", record)))
}

async fn edit_employee_handler(
    State(state): State<AppState>,
    _hr: HrOnly,
    Path(id): Path<String>,
    JsonBody(record): JsonBody<EmployeeRecord>,
) -> HttpResult<Json<Reply<EmployeeRecord>>> {
    let record = state
        .engine
        .hr()
        .edit_employee(&EmployeeId::from(id), record)
        .await?;
    Ok(Reply::ok("Employee updated", record))
}

async fn delete_employee_handler(
    State(state): State<AppState>,
    _hr: HrOnly,
    Path(id): Path<String>,
) -> HttpResult<Json<Reply<()>>> {
    state
        .engine
        .hr()
        .delete_employee(&EmployeeId::from(id))
        .await?;
    Ok(Reply::banner("Employee deleted"))
}

async fn approve_handler(
    State(state): State<AppState>,
    _hr: HrOnly,
    Path(id): Path<String>,
) -> HttpResult<Json<Reply<EmployeeRecord>>> {
    let record = state
        .engine
        .hr()
        .approve_new_hire(&EmployeeId::from(id))
        .await?;
    Ok(Reply::ok("New hire approved", record))
}

async fn decide_handler(
    State(state): State<AppState>,
    _hr: HrOnly,
    Path(id): Path<String>,
    JsonBody(decision): JsonBody<TimeOffDecision>,
) -> HttpResult<Json<Reply<EmployeeRecord>>> {
    let message = if decision.approved {
        "Time off approved"
    } else {
        "Time off rejected"
    };
    let record = state
        .engine
        .hr()
        .decide_time_off(&EmployeeId::from(id), decision)
        .await?;
    Ok(Reply::ok(message, record))
}

type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug)]
struct HttpError(ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ApiError::validation(rejection.body_text()))
    }
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self.0 {
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::UsernameTaken(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::StoreUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if let ApiError::StoreUnavailable(source) = &self.0 {
            warn!(error = %source, "request failed: record store unavailable");
        }
        (self.status(), Json(StatusBanner::failure(&self.0))).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
