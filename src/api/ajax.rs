//! Form channel: `POST /admin-ajax` with an `action` field

use super::rest::AJAX_NONCE_ACTION;
use super::{ApiError, AppState};
use crate::admin::{parse_flag, SchemaInput};
use crate::error::{Error, Result};
use axum::{
    extract::{Form, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

const ACTIONS: &[&str] = &[
    "baseo_save_schema",
    "baseo_update_schema",
    "baseo_delete_schema",
    "baseo_toggle_schema",
    "baseo_get_schemas",
    "baseo_get_single_schema",
    "baseo_get_bulk_urls",
];

fn success(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "success": false, "data": message }))).into_response()
}

fn form_id(form: &HashMap<String, String>) -> Result<i64> {
    form.get("id")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(Error::NotFound(0))
}

/// Path and query of an absolute URL
fn relative_link(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(q) => format!("{}?{}", parsed.path(), q),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

/// Dispatch on the `action` field
pub async fn dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let action = form.get("action").map(String::as_str).unwrap_or("");
    if !ACTIONS.contains(&action) {
        return failure(StatusCode::BAD_REQUEST, format!("Unknown action: {}", action));
    }

    match handle(&state, &headers, action, &form).await {
        Ok(data) => success(data),
        Err(e) => {
            let err = ApiError(e);
            let response = failure(err.status(), err.public_message());
            debug!("{} failed: {}", action, err.0);
            response
        }
    }
}

async fn handle(
    state: &AppState,
    headers: &HeaderMap,
    action: &str,
    form: &HashMap<String, String>,
) -> Result<Value> {
    let user = state.authorize(headers)?;
    state.authorizer.check_nonce(
        form.get("nonce").map(String::as_str),
        AJAX_NONCE_ACTION,
        &user,
    )?;

    let service = &state.service;
    match action {
        "baseo_save_schema" => {
            let saved = service.create(&SchemaInput::from_form(form)).await?;
            Ok(json!(format!("Schema \"{}\" saved successfully", saved.name)))
        }
        "baseo_update_schema" => {
            let id = form_id(form)?;
            let saved = service.update(id, &SchemaInput::from_form(form)).await?;
            Ok(json!(format!("Schema \"{}\" updated successfully", saved.name)))
        }
        "baseo_delete_schema" => {
            service.delete(form_id(form)?).await?;
            Ok(Value::Null)
        }
        "baseo_toggle_schema" => {
            let id = form_id(form)?;
            let requested = form
                .get("active")
                .or_else(|| form.get("is_active"))
                .and_then(|v| parse_flag(v));
            let active = match requested {
                Some(active) => {
                    service.set_active(id, active).await?;
                    active
                }
                None => service.toggle(id).await?,
            };
            Ok(json!({ "is_active": u8::from(active) }))
        }
        "baseo_get_schemas" => Ok(json!(service.list_all().await?)),
        "baseo_get_single_schema" => Ok(json!(service.get(form_id(form)?).await?)),
        "baseo_get_bulk_urls" => {
            let selector = form
                .get("type")
                .map(String::as_str)
                .filter(|t| !t.is_empty())
                .unwrap_or("all-pages");
            let urls: Vec<Value> = service
                .bulk_candidates(selector)
                .await?
                .into_iter()
                .map(|c| {
                    json!({
                        "title": c.title,
                        "path": relative_link(&c.url),
                        "url": c.url,
                        "type": c.kind,
                        "schema_count": c.schema_count,
                    })
                })
                .collect();
            Ok(json!({ "urls": urls }))
        }
        other => Err(Error::Other(format!("Unhandled action: {}", other))),
    }
}
