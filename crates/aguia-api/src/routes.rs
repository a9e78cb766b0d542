use std::sync::Arc;

use aguia_core::export::{render_markdown_export, ExportFormat};
use aguia_core::models::FrontendPrefs;
use aguia_core::util::bare_method_name;
use aguia_core::{Capability, ClientPrefs, PreferenceService, SaveOutcome, UserId};
use axum::extract::{Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use chrono::Utc;
use http::header;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{extract_bearer_token, AuthenticatedUser, TokenVerifier};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::rate_limit::{
    user_fingerprint, RateLimitMetricsSnapshot, WriteEndpoint, WriteRateLimiter,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    service: PreferenceService,
    verifier: Arc<TokenVerifier>,
    rate_limiter: Arc<WriteRateLimiter>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, service: PreferenceService) -> Self {
        Self {
            verifier: Arc::new(TokenVerifier::from_config(&config)),
            rate_limiter: Arc::new(WriteRateLimiter::from_config(&config)),
            service,
            config,
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/service", post(call_service))
        .route("/preferences", get(get_frontend_preferences))
        .route("/preferences/{key}", put(put_preference))
        .route("/privacy/users/{id}", get(export_user).delete(erase_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/v1", protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    rate_limit: RateLimitMetricsSnapshot,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        rate_limit: state.rate_limiter.metrics_snapshot(),
    })
}

async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;
    let user = state.verifier.verify_access_token(token)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// One entry of a batched web-service request
#[derive(Debug, Deserialize)]
struct ServiceCall {
    methodname: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
struct CallException {
    errorcode: &'static str,
    message: String,
}

/// One entry of the batched response, in request order
#[derive(Debug, Serialize)]
struct CallResult {
    error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<CallException>,
}

impl CallResult {
    fn ok(data: Value) -> Self {
        Self {
            error: false,
            data: Some(data),
            exception: None,
        }
    }

    fn fail(errorcode: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: true,
            data: None,
            exception: Some(CallException {
                errorcode,
                message: message.into(),
            }),
        }
    }
}

async fn call_service(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(calls): Json<Vec<ServiceCall>>,
) -> Json<Vec<CallResult>> {
    let mut results = Vec::with_capacity(calls.len());
    for call in calls {
        results.push(dispatch(&state, &user, call).await);
    }
    Json(results)
}

async fn dispatch(state: &AppState, user: &AuthenticatedUser, call: ServiceCall) -> CallResult {
    let user_hash = user_fingerprint(user.caller.user_id.as_str());
    match bare_method_name(&call.methodname) {
        "get_preferences" => {
            let prefs = state.service.fetch_preferences(&user.caller.user_id).await;
            to_data(&prefs)
        }
        "save_preferences" => {
            let args = if call.args.is_null() {
                Value::Object(serde_json::Map::new())
            } else {
                call.args
            };
            let prefs: ClientPrefs = match serde_json::from_value(args) {
                Ok(prefs) => prefs,
                Err(error) => return CallResult::fail("invalidparameter", error.to_string()),
            };
            if let Err(denied) = PreferenceService::authorize(&user.caller, &user.caller.user_id) {
                return CallResult::fail("nopermissions", denied.to_string());
            }
            if let Err(error) = state
                .rate_limiter
                .check(WriteEndpoint::SavePreferences, user.caller.user_id.as_str())
                .await
            {
                return CallResult::fail("ratelimited", error.to_string());
            }

            match state
                .service
                .save_preferences(&user.caller, &user.caller.user_id, &prefs)
                .await
            {
                Ok(outcome) => {
                    tracing::info!(
                        endpoint = "save_preferences",
                        user = user_hash,
                        token = user.token_id.as_deref().unwrap_or("none"),
                        success = outcome.success,
                        "Handled preference save"
                    );
                    to_data(&outcome)
                }
                Err(denied) => CallResult::fail("nopermissions", denied.to_string()),
            }
        }
        other => {
            tracing::debug!(method = other, user = user_hash, "Unknown service method");
            CallResult::fail("invalidmethod", format!("Unknown method: {other}"))
        }
    }
}

fn to_data(value: &impl Serialize) -> CallResult {
    match serde_json::to_value(value) {
        Ok(data) => CallResult::ok(data),
        Err(error) => {
            tracing::error!(%error, "Failed to encode service response");
            CallResult::fail("internalerror", "Failed to encode response")
        }
    }
}

async fn get_frontend_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<FrontendPrefs> {
    Json(
        state
            .service
            .fetch_frontend_preferences(&user.caller.user_id)
            .await,
    )
}

#[derive(Debug, Deserialize)]
struct PreferenceValue {
    value: Value,
}

async fn put_preference(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(key): Path<String>,
    Json(body): Json<PreferenceValue>,
) -> Result<Json<SaveOutcome>, AppError> {
    PreferenceService::authorize(&user.caller, &user.caller.user_id)
        .map_err(|denied| AppError::forbidden(denied.to_string()))?;
    state
        .rate_limiter
        .check(WriteEndpoint::UpdatePreference, user.caller.user_id.as_str())
        .await?;

    let outcome = state
        .service
        .update_preference(&user.caller, &user.caller.user_id, &key, &body.value)
        .await
        .map_err(|denied| AppError::forbidden(denied.to_string()))?;
    tracing::info!(
        endpoint = "update_preference",
        user = user_fingerprint(user.caller.user_id.as_str()),
        key_len = key.len(),
        success = outcome.success,
        "Handled single preference update"
    );
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    format: Option<ExportFormat>,
}

async fn export_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let target = parse_user_id(&id)?;
    if target != user.caller.user_id && !user.caller.has(Capability::ManagePrivacy) {
        return Err(AppError::forbidden(
            "Exporting another user's data requires privacy:manage",
        ));
    }

    let export = state
        .service
        .export_user_data(&target)
        .await?
        .ok_or_else(|| AppError::not_found("No stored preferences for this user"))?;
    tracing::info!(
        endpoint = "privacy_export",
        user = user_fingerprint(user.caller.user_id.as_str()),
        target = user_fingerprint(target.as_str()),
        "Exported stored preferences"
    );

    Ok(match query.format.unwrap_or(ExportFormat::Json) {
        ExportFormat::Json => Json(export).into_response(),
        ExportFormat::Markdown => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            render_markdown_export(&export),
        )
            .into_response(),
    })
}

#[derive(Debug, Serialize)]
struct EraseResponse {
    deleted: bool,
}

async fn erase_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<EraseResponse>, AppError> {
    let target = parse_user_id(&id)?;
    PreferenceService::authorize_erase(&user.caller, &target)
        .map_err(|denied| AppError::forbidden(denied.to_string()))?;
    state
        .rate_limiter
        .check(WriteEndpoint::ErasePreferences, user.caller.user_id.as_str())
        .await?;

    let deleted = state.service.delete_preferences(&user.caller, &target).await?;
    tracing::info!(
        endpoint = "privacy_erase",
        user = user_fingerprint(user.caller.user_id.as_str()),
        target = user_fingerprint(target.as_str()),
        deleted,
        "Handled erase request"
    );
    Ok(Json(EraseResponse { deleted }))
}

fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse()
        .map_err(|_| AppError::bad_request("User id must not be empty"))
}
