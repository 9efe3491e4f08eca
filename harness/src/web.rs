use std::sync::Arc;

use async_graphql_value::Variables;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use graphql_authz::{
    AuthorizationError, AuthorizationEvaluator, AuthorizationSettings, AuthorizationValidationRule,
    Claim, IntrospectionSkipCondition, Principal, ProvideClaimsPrincipal, SchemaModel,
};
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use serde_json::json;

use crate::schema;
use crate::settings::Settings;

pub struct AppState {
    schema: SchemaModel,
    rule: AuthorizationValidationRule,
}

impl AppState {
    pub fn new() -> Result<Self> {
        let schema = schema::build_schema()?;

        let mut policies = AuthorizationSettings::new();
        policies.add_policy_with("AdminPolicy", |b| {
            b.require_claim_values("role", ["Admin"])
        });

        let evaluator = AuthorizationEvaluator::new(Arc::new(policies));
        let rule = AuthorizationValidationRule::with_skip_conditions(
            evaluator,
            vec![Box::new(IntrospectionSkipCondition)],
        );

        Ok(Self { schema, rule })
    }
}

/// The ambient user context of one request: the principal decoded from the
/// `x-user-claims` header, if any.
struct GraphQLUserContext {
    principal: Option<Principal>,
}

impl ProvideClaimsPrincipal for GraphQLUserContext {
    fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

#[derive(Debug, Deserialize)]
struct GraphQLRequest {
    query: String,
    #[serde(rename = "operationName")]
    operation_name: Option<String>,
    #[serde(default)]
    variables: serde_json::Value,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/graphql", post(handle_graphql))
        .route("/healthz", get(health))
        .with_state(state)
}

async fn handle_graphql(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<GraphQLRequest>,
) -> impl IntoResponse {
    let document = match async_graphql_parser::parse_query(&request.query) {
        Ok(document) => document,
        Err(e) => {
            return Json(json!({ "errors": [{ "message": e.to_string() }] })).into_response();
        }
    };

    let variables = if request.variables.is_null() {
        Variables::default()
    } else {
        Variables::from_json(request.variables.clone())
    };

    let user_context = GraphQLUserContext {
        principal: principal_from_headers(&headers),
    };

    let errors = state
        .rule
        .validate(
            &state.schema,
            &document,
            request.operation_name.as_deref(),
            &variables,
            &user_context,
        )
        .await;

    if !errors.is_empty() {
        let errors: Vec<_> = errors.iter().map(error_json).collect();
        return Json(json!({ "errors": errors })).into_response();
    }

    let data = schema::resolve(&document, request.operation_name.as_deref());
    Json(json!({ "data": data })).into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn error_json(error: &AuthorizationError) -> serde_json::Value {
    json!({
        "message": error.message(),
        "locations": [{ "line": error.position().line, "column": error.position().column }],
        "extensions": { "code": error.code() },
    })
}

/// `x-user-claims: [{"type":"role","value":"Admin"}]`, a stand-in for the
/// host application's real authentication middleware.
fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let raw = headers.get("x-user-claims")?.to_str().ok()?;
    let claims: Vec<Claim> = serde_json::from_str(raw).ok()?;
    Some(Principal::authenticated(claims))
}

pub async fn serve(settings: Settings, state: AppState) -> Result<()> {
    let router = router(Arc::new(state));
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.into_diagnostic()?;
    tracing::info!(%addr, "Harness listening");
    axum::serve(listener, router).await.into_diagnostic()?;
    Ok(())
}
