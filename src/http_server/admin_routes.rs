//! # Admin HTTP Routes
//!
//! The eight admin actions for every registered resource, under
//! `/admin/:resource`.
//!
//! | Method      | Path                           | Action        |
//! |-------------|--------------------------------|---------------|
//! | GET         | `/admin`                       | catalog       |
//! | GET         | `/admin/:resource`             | index         |
//! | GET         | `/admin/:resource/create`      | create form   |
//! | POST        | `/admin/:resource`             | store         |
//! | POST        | `/admin/:resource/bulk-destroy`| bulk destroy  |
//! | GET         | `/admin/:resource/:id`         | show          |
//! | GET         | `/admin/:resource/:id/edit`    | edit form     |
//! | POST, PUT   | `/admin/:resource/:id`         | update        |
//! | DELETE      | `/admin/:resource/:id`         | destroy       |
//!
//! A request is programmatic when it carries `X-Requested-With:
//! XMLHttpRequest` or accepts `application/json`; otherwise it gets a
//! rendered page or a redirect. The caller is named by `X-Admin-User`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::admin::{
    AdminError, AdminResult, AdminService, Location, Payload, RequestMode, ResourceController,
    ViewRenderer,
};
use crate::auth::{Ability, Caller};
use crate::listing::ListParams;
use crate::resource::RecordId;
use crate::validation::ValidationErrors;

/// Header naming the authenticated admin user
pub const CALLER_HEADER: &str = "x-admin-user";

/// Shared state for admin routes
pub struct AdminState {
    pub service: AdminService,
    pub renderer: Arc<dyn ViewRenderer>,
}

impl AdminState {
    pub fn new(service: AdminService, renderer: Arc<dyn ViewRenderer>) -> Self {
        Self { service, renderer }
    }
}

/// Create admin routes
pub fn admin_routes(state: Arc<AdminState>) -> Router {
    Router::new()
        .route("/", get(catalog_handler))
        .route("/:resource", get(index_handler).post(store_handler))
        .route("/:resource/create", get(create_handler))
        .route("/:resource/bulk-destroy", post(bulk_destroy_handler))
        .route(
            "/:resource/:id",
            get(show_handler)
                .post(update_handler)
                .put(update_handler)
                .delete(destroy_handler),
        )
        .route("/:resource/:id/edit", get(edit_handler))
        .with_state(state)
}

// ==================
// Request Decoding
// ==================

fn caller(headers: &HeaderMap) -> Caller {
    Caller::from_header(headers.get(CALLER_HEADER).and_then(|v| v.to_str().ok()))
}

fn is_programmatic(headers: &HeaderMap) -> bool {
    let ajax = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    ajax || wants_json
}

fn request_mode(headers: &HeaderMap, bulk: bool) -> RequestMode {
    if is_programmatic(headers) {
        RequestMode::Programmatic { bulk }
    } else {
        RequestMode::Page
    }
}

/// Path ids that are not keys can never name a record
fn parse_id(resource: &str, raw: &str) -> AdminResult<RecordId> {
    raw.parse().map_err(|_| AdminError::not_found(resource, raw))
}

/// An empty body is an empty input map
fn parse_body(body: &Bytes) -> AdminResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|_| {
        AdminError::Validation(ValidationErrors::single("body", "The body must be valid JSON."))
    })
}

// ==================
// Response Encoding
// ==================

fn respond(state: &AdminState, headers: &HeaderMap, result: AdminResult<Payload>) -> Response {
    match result.and_then(|payload| encode(state, headers, payload)) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

fn encode(state: &AdminState, headers: &HeaderMap, payload: Payload) -> AdminResult<Response> {
    let response = match payload {
        Payload::View(view) => {
            let page = state.renderer.render(&view)?;
            ([(header::CONTENT_TYPE, page.content_type)], page.body).into_response()
        }
        Payload::Redirect(Location::To(url)) => Redirect::to(&absolute(&url)).into_response(),
        Payload::Redirect(Location::Back { fallback }) => {
            let target = headers
                .get(header::REFERER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .unwrap_or_else(|| absolute(&fallback));
            Redirect::to(&target).into_response()
        }
        other => Json(other).into_response(),
    };
    Ok(response)
}

fn absolute(url: &str) -> String {
    if url.starts_with('/') {
        url.to_string()
    } else {
        format!("/{}", url)
    }
}

// ==================
// Handlers
// ==================

/// Registered resource summary
#[derive(Debug, Serialize)]
pub struct ResourceSummary {
    pub name: String,
    pub plural: String,
    pub listable: Vec<String>,
    pub searchable: Vec<String>,
    pub fillable: Vec<String>,
}

async fn catalog_handler(State(state): State<Arc<AdminState>>) -> impl IntoResponse {
    let resources: Vec<ResourceSummary> = state
        .service
        .registry()
        .iter()
        .map(|d| ResourceSummary {
            name: d.name().to_string(),
            plural: d.plural().to_string(),
            listable: d.listable().to_vec(),
            searchable: d.searchable().to_vec(),
            fillable: d.fillable().to_vec(),
        })
        .collect();
    Json(resources)
}

async fn index_handler(
    State(state): State<Arc<AdminState>>,
    Path(resource): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mode = request_mode(&headers, query.contains_key("bulk"));
    let caller = caller(&headers);
    let result = (|| -> AdminResult<Payload> {
        let controller = ResourceController::for_plural(&state.service, &resource)?;
        // A denied caller gets 403 even for malformed parameters. `list`
        // repeats the check for callers that reach the service directly.
        state
            .service
            .authorize(&caller, controller.descriptor(), Ability::Index, None)?;
        let params = ListParams::parse(&query)?;
        controller.index(&caller, &params, mode)
    })();
    respond(&state, &headers, result)
}

async fn create_handler(
    State(state): State<Arc<AdminState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mode = request_mode(&headers, false);
    let result = ResourceController::for_plural(&state.service, &resource)
        .and_then(|controller| controller.create(&caller(&headers), mode));
    respond(&state, &headers, result)
}

async fn store_handler(
    State(state): State<Arc<AdminState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mode = request_mode(&headers, false);
    let result = (|| -> AdminResult<Payload> {
        let controller = ResourceController::for_plural(&state.service, &resource)?;
        let input = parse_body(&body)?;
        controller.store(&caller(&headers), &input, mode)
    })();
    respond(&state, &headers, result)
}

async fn show_handler(
    State(state): State<Arc<AdminState>>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mode = request_mode(&headers, false);
    let result = (|| -> AdminResult<Payload> {
        let controller = ResourceController::for_plural(&state.service, &resource)?;
        let id = parse_id(controller.descriptor().name(), &id)?;
        controller.show(&caller(&headers), id, mode)
    })();
    respond(&state, &headers, result)
}

async fn edit_handler(
    State(state): State<Arc<AdminState>>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mode = request_mode(&headers, false);
    let result = (|| -> AdminResult<Payload> {
        let controller = ResourceController::for_plural(&state.service, &resource)?;
        let id = parse_id(controller.descriptor().name(), &id)?;
        controller.edit(&caller(&headers), id, mode)
    })();
    respond(&state, &headers, result)
}

async fn update_handler(
    State(state): State<Arc<AdminState>>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mode = request_mode(&headers, false);
    let result = (|| -> AdminResult<Payload> {
        let controller = ResourceController::for_plural(&state.service, &resource)?;
        let id = parse_id(controller.descriptor().name(), &id)?;
        let input = parse_body(&body)?;
        controller.update(&caller(&headers), id, &input, mode)
    })();
    respond(&state, &headers, result)
}

async fn destroy_handler(
    State(state): State<Arc<AdminState>>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mode = request_mode(&headers, false);
    let result = (|| -> AdminResult<Payload> {
        let controller = ResourceController::for_plural(&state.service, &resource)?;
        let id = parse_id(controller.descriptor().name(), &id)?;
        controller.destroy(&caller(&headers), id, mode)
    })();
    respond(&state, &headers, result)
}

async fn bulk_destroy_handler(
    State(state): State<Arc<AdminState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let result = (|| -> AdminResult<Payload> {
        let controller = ResourceController::for_plural(&state.service, &resource)?;
        let input = parse_body(&body)?;
        controller.bulk_destroy(&caller(&headers), &input)
    })();
    respond(&state, &headers, result)
}
