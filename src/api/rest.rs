//! JSON channel handlers

use super::{link_header, ApiError, AppState, LinkFilters};
use crate::admin::{BulkApplyInput, PageRequest, SchemaInput};
use crate::error::Error;
use crate::meta::{SchemaFilter, SchemaRecord};
use crate::validate::{sanitize_text_field, validate_schema_type};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Nonce action shared by every form-channel request
pub const AJAX_NONCE_ACTION: &str = "baseo_schema_nonce";

/// Listing query; numbers stay strings so junk falls back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub url: Option<String>,
    pub schema_type: Option<String>,
    pub search: Option<String>,
}

fn lenient_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError(Error::InvalidJson(e.body_text())))
}

/// `GET /schemas`
pub async fn list_schemas(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    state.authorize(&headers)?;

    let schema_type = match query.schema_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(t) => Some(validate_schema_type(t)?),
    };
    let url = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);
    let search = query
        .search
        .as_deref()
        .map(sanitize_text_field)
        .filter(|s| !s.is_empty());

    let filter = SchemaFilter {
        url: url.clone(),
        schema_type,
        search: search.clone(),
    };
    let request = PageRequest::new(
        lenient_int(query.page.as_deref()),
        lenient_int(query.per_page.as_deref()),
        state.default_per_page,
        state.max_per_page,
    );

    let page = state.service.list(&filter, request).await?;
    let link = link_header(
        &state.collection_url,
        &page.info,
        &LinkFilters {
            schema_type: schema_type.map(|t| t.to_string()),
            url,
            search,
        },
    );

    let mut response = Json(page.items).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        HeaderName::from_static("x-wp-total"),
        HeaderValue::from(page.info.total_items),
    );
    response_headers.insert(
        HeaderName::from_static("x-wp-totalpages"),
        HeaderValue::from(page.info.total_pages),
    );
    response_headers.insert(
        HeaderName::from_static("x-wp-page"),
        HeaderValue::from(page.info.page),
    );
    response_headers.insert(
        HeaderName::from_static("x-wp-per-page"),
        HeaderValue::from(page.info.per_page),
    );
    let link = HeaderValue::from_str(&link)
        .map_err(|e| Error::Other(format!("Invalid Link header: {}", e)))?;
    response_headers.insert(axum::http::header::LINK, link);

    Ok(response)
}

/// `POST /schemas`
pub async fn create_schema(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<SchemaInput>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    state.authorize(&headers)?;
    let input = body(payload)?;

    let saved = state.service.create(&input).await?;
    Ok(Json(json!({
        "id": saved.id,
        "success": true,
        "warnings": saved.warnings,
    })))
}

/// `GET /schemas/{id}`
pub async fn get_schema(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<SchemaRecord>> {
    state.authorize(&headers)?;
    Ok(Json(state.service.get(id).await?))
}

/// `PUT /schemas/{id}`
pub async fn update_schema(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<SchemaInput>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    state.authorize(&headers)?;
    let input = body(payload)?;

    let saved = state.service.update(id, &input).await?;
    Ok(Json(json!({ "success": true, "warnings": saved.warnings })))
}

/// `DELETE /schemas/{id}`
pub async fn delete_schema(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.authorize(&headers)?;
    state.service.delete(id).await?;
    Ok(Json(json!({ "success": true })))
}

/// `POST /schemas/{id}/toggle`
pub async fn toggle_schema(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.authorize(&headers)?;
    let active = state.service.toggle(id).await?;
    Ok(Json(json!({ "is_active": u8::from(active) })))
}

/// `POST /schemas/bulk-apply`
pub async fn bulk_apply(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<BulkApplyInput>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    state.authorize(&headers)?;
    let input = body(payload)?;

    let outcome = state.service.bulk_apply(&input).await?;
    Ok(Json(json!(outcome)))
}

#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    #[serde(default)]
    pub action: Option<String>,
}

/// `GET /nonce?action=..`
pub async fn create_nonce(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NonceQuery>,
) -> ApiResult<Json<Value>> {
    let user = state.authorize(&headers)?;
    let action = query
        .action
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or(AJAX_NONCE_ACTION);

    Ok(Json(json!({
        "nonce": state.authorizer.create_nonce(action, &user),
    })))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body_json, send, setup_app, TOKEN};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};

    fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", TOKEN));
        match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn schema(url: &str) -> Value {
        json!({
            "url": url,
            "schema_name": "Home",
            "schema_type": "WebPage",
            "schema_data": "{\"@type\": \"WebPage\"}",
        })
    }

    #[tokio::test]
    async fn test_auth_required() {
        let (app, _state, _tmp) = setup_app().await;

        let response = send(
            &app,
            Request::get("/baseo/v1/schemas").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["code"], "unauthorized");
        assert_eq!(body["data"]["status"], 401);

        let response = send(
            &app,
            Request::get("/baseo/v1/schemas")
                .header("authorization", "Bearer editor-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "forbidden");
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let (app, _state, _tmp) = setup_app().await;

        let response = send(
            &app,
            authed("POST", "/baseo/v1/schemas", Some(schema("http://example.com/a"))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response).await;
        assert_eq!(created["success"], true);
        let id = created["id"].as_i64().unwrap();

        let record = body_json(
            send(&app, authed("GET", &format!("/baseo/v1/schemas/{}", id), None)).await,
        )
        .await;
        assert_eq!(record["url"], "https://example.com/a");
        assert_eq!(record["is_active"], 1);

        let mut changed = schema("https://example.com/a");
        changed["schema_name"] = json!("Renamed");
        let response = send(
            &app,
            authed("PUT", &format!("/baseo/v1/schemas/{}", id), Some(changed)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &app,
            authed("DELETE", &format!("/baseo/v1/schemas/{}", id), None),
        )
        .await;
        assert_eq!(body_json(response).await["success"], true);

        let response = send(&app, authed("GET", &format!("/baseo/v1/schemas/{}", id), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "not_found");
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (app, _state, _tmp) = setup_app().await;

        let response = send(
            &app,
            authed("POST", "/baseo/v1/schemas", Some(schema("https://evil.com/"))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "invalid_url");

        let mut bad = schema("https://example.com/");
        bad["schema_data"] = json!("<script>{}</script>");
        let response = send(&app, authed("POST", "/baseo/v1/schemas", Some(bad))).await;
        assert_eq!(body_json(response).await["code"], "script_tags");

        let request = Request::post("/baseo/v1/schemas")
            .header("authorization", format!("Bearer {}", TOKEN))
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "invalid_json");
    }

    #[tokio::test]
    async fn test_list_headers_and_links() {
        let (app, _state, _tmp) = setup_app().await;
        for n in 0..5 {
            send(
                &app,
                authed(
                    "POST",
                    "/baseo/v1/schemas",
                    Some(schema(&format!("https://example.com/{}", n))),
                ),
            )
            .await;
        }

        let response = send(
            &app,
            authed("GET", "/baseo/v1/schemas?page=2&per_page=2&search=example", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers().clone();
        assert_eq!(headers["x-wp-total"], "5");
        assert_eq!(headers["x-wp-totalpages"], "3");
        assert_eq!(headers["x-wp-page"], "2");
        assert_eq!(headers["x-wp-per-page"], "2");

        let link = headers["link"].to_str().unwrap();
        assert!(link.starts_with(
            "<https://example.com/wp-json/baseo/v1/schemas?page=2&per_page=2&search=example>; rel=\"self\""
        ));
        assert!(link.contains("page=1&per_page=2&search=example>; rel=\"first\""));
        assert!(link.contains("page=3&per_page=2&search=example>; rel=\"last\""));

        let items = body_json(response).await;
        assert_eq!(items.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_lenient_and_pinned() {
        let (app, _state, _tmp) = setup_app().await;

        let response = send(
            &app,
            authed("GET", "/baseo/v1/schemas?page=abc&per_page=9999", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-wp-page"], "1");
        assert_eq!(response.headers()["x-wp-per-page"], "100");
        assert_eq!(response.headers()["x-wp-totalpages"], "1");

        let response = send(&app, authed("GET", "/baseo/v1/schemas?schema_type=Banana", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "invalid_type");
    }

    #[tokio::test]
    async fn test_toggle_and_bulk_apply() {
        let (app, _state, _tmp) = setup_app().await;
        let created = body_json(
            send(
                &app,
                authed("POST", "/baseo/v1/schemas", Some(schema("https://example.com/a"))),
            )
            .await,
        )
        .await;
        let id = created["id"].as_i64().unwrap();

        let toggled = body_json(
            send(&app, authed("POST", &format!("/baseo/v1/schemas/{}/toggle", id), None)).await,
        )
        .await;
        assert_eq!(toggled, json!({ "is_active": 0 }));

        let outcome = body_json(
            send(
                &app,
                authed(
                    "POST",
                    "/baseo/v1/schemas/bulk-apply",
                    Some(json!({
                        "urls": ["https://example.com/b", "ftp://example.com/c"],
                        "schema_type": "Article",
                        "schema_data": "{}",
                    })),
                ),
            )
            .await,
        )
        .await;
        assert_eq!(outcome["success"], 1);
        assert_eq!(outcome["failed"], 1);
        assert_eq!(outcome["errors"][0]["error"], "Invalid URL");

        let response = send(
            &app,
            authed("POST", "/baseo/v1/schemas/bulk-apply", Some(json!({ "urls": [] }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "no_urls");
    }
}
