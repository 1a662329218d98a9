//! HTTP surface: four `POST /car/*` routes over a shared [`CarStore`].
//!
//! Bodies are read as raw bytes. An `application/x-www-form-urlencoded` body
//! is decoded as a form whose values are all strings; anything else is parsed
//! as JSON. An empty body counts as `{}`. Every failure answers
//! `{"error": true, "error_message": "..."}`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, error, info, Level};

use crate::model::{Car, CarPatch, RecordId, ID_FIELD, REQUIRED_FIELDS};
use crate::CarStore;

/// Store handle carried as router state.
pub type SharedStore = Arc<CarStore>;

/// Body of every create/update/delete response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// `true` when the request was rejected.
    pub error: bool,
    /// Why it was rejected. Absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Outcome {
    /// The success body, `{"error": false}`.
    pub fn ok() -> Self {
        Self {
            error: false,
            error_message: None,
        }
    }

    /// A failure body carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            error_message: Some(message.into()),
        }
    }
}

/// Request failures, each rendered as an [`Outcome`] with a matching status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Create body lacks one or more car fields.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// Update/delete body lacks the identifier.
    #[error("send the record as returned by /car/read, including its `id`")]
    MissingId,
    /// Identifier present but not a non-negative integer.
    #[error("`id` must be a non-negative integer")]
    InvalidId,
    /// Fields present but of the wrong shape.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// Body is neither a JSON object nor a decodable form.
    #[error("malformed body: {0}")]
    MalformedBody(String),
    /// No record with this identifier.
    #[error("no car with id {0}")]
    NotFound(RecordId),
    /// Disk or serialization failure in the store.
    #[error("storage failure: {0}")]
    Store(crate::Error),
    /// The blocking task running the store call died.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields(_)
            | ApiError::MissingId
            | ApiError::InvalidId
            | ApiError::InvalidPayload(_)
            | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.to_string();
        if status.is_server_error() {
            error!(error = %msg, "request failed");
        } else {
            debug!(error = %msg, %status, "request rejected");
        }
        (status, Json(Outcome::failure(msg))).into_response()
    }
}

/// Build the application router around `store`.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/car/create", post(create))
        .route("/car/read", post(read))
        .route("/car/update", post(update))
        .route("/car/delete", post(delete))
        .with_state(store)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

/// `POST /car/create`: all five car fields required.
async fn create(
    State(store): State<SharedStore>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Outcome>, ApiError> {
    let body = parse_body(&headers, &body)?;
    let missing = missing_fields(&body, &REQUIRED_FIELDS);
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }
    let car: Car = serde_json::from_value(Value::Object(body))
        .map_err(|e| ApiError::InvalidPayload(e.to_string()))?;
    let id = blocking(move || store.insert(car)).await?;
    info!(id, "car created");
    Ok(Json(Outcome::ok()))
}

/// `POST /car/read`: whole collection, or the record at 1-based `index`.
async fn read(
    State(store): State<SharedStore>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = parse_body(&headers, &body)?;
    let resp = match body.get("index") {
        None => Json(store.all()).into_response(),
        Some(index) => Json(parse_index(index).and_then(|pos| store.at(pos))).into_response(),
    };
    Ok(resp)
}

/// `POST /car/update`: the record's `id` plus the fields to change.
async fn update(
    State(store): State<SharedStore>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Outcome>, ApiError> {
    let body = parse_body(&headers, &body)?;
    let id = parse_id(&body)?;
    let patch: CarPatch = serde_json::from_value(Value::Object(body))
        .map_err(|e| ApiError::InvalidPayload(e.to_string()))?;
    blocking(move || store.update(id, |car| patch.apply(car))).await?;
    info!(id, "car updated");
    Ok(Json(Outcome::ok()))
}

/// `POST /car/delete`: the record's `id`.
async fn delete(
    State(store): State<SharedStore>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Outcome>, ApiError> {
    let body = parse_body(&headers, &body)?;
    let id = parse_id(&body)?;
    blocking(move || store.remove(id)).await?;
    info!(id, "car deleted");
    Ok(Json(Outcome::ok()))
}

/// Store calls write the whole file before returning, so they run on the
/// blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

fn parse_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    if is_form(headers) {
        return parse_form(bytes);
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::MalformedBody("expected a JSON object".into())),
        Err(e) => Err(ApiError::MalformedBody(e.to_string())),
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

// Repeated keys keep the last value.
fn parse_form(bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(bytes).map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    Ok(pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect())
}

/// Names from `required` that `body` does not carry, in `required` order.
pub fn missing_fields(body: &Map<String, Value>, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|field| !body.contains_key(*field))
        .collect()
}

// Accepts numbers and strings with a leading integer ("3", " 3rd").
// Fractions truncate; anything negative or unparseable reads as absent.
fn parse_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                usize::try_from(u).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as usize)
            }
        }
        Value::String(s) => {
            let s = s.trim_start();
            let s = s.strip_prefix('+').unwrap_or(s);
            let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
            s[..end].parse().ok()
        }
        _ => None,
    }
}

fn parse_id(body: &Map<String, Value>) -> Result<RecordId, ApiError> {
    match body.get(ID_FIELD) {
        None => Err(ApiError::MissingId),
        Some(Value::Number(n)) => n.as_u64().ok_or(ApiError::InvalidId),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| ApiError::InvalidId),
        Some(_) => Err(ApiError::InvalidId),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn form_headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn empty_body_is_an_empty_object() {
        let none = HeaderMap::new();
        assert!(parse_body(&none, b"").unwrap().is_empty());
        assert!(parse_body(&none, b"  \n").unwrap().is_empty());
        let form = form_headers("application/x-www-form-urlencoded");
        assert!(parse_body(&form, b"").unwrap().is_empty());
    }

    #[test]
    fn non_object_body_is_malformed() {
        let none = HeaderMap::new();
        assert!(matches!(parse_body(&none, b"[1,2]"), Err(ApiError::MalformedBody(_))));
        assert!(matches!(parse_body(&none, b"{oops"), Err(ApiError::MalformedBody(_))));
    }

    #[test]
    fn form_body_decodes_to_string_fields() {
        let headers = form_headers("Application/X-WWW-Form-Urlencoded; charset=UTF-8");
        let body = parse_body(&headers, b"name=Ibiza+FR&year=2019&color=r%C3%B6d").unwrap();
        assert_eq!(body["name"], "Ibiza FR");
        assert_eq!(body["year"], "2019");
        assert_eq!(body["color"], "r\u{f6}d");
        assert!(missing_fields(&body, &REQUIRED_FIELDS).contains(&"manufacturer"));
    }

    #[test]
    fn form_is_not_parsed_as_json() {
        let headers = form_headers("application/x-www-form-urlencoded");
        let body = parse_body(&headers, br#"{"name":"a"}"#).unwrap();
        assert!(body.get("name").is_none());
        // Without the header the same bytes are JSON.
        let body = parse_body(&HeaderMap::new(), br#"{"name":"a"}"#).unwrap();
        assert_eq!(body["name"], "a");
    }

    #[test]
    fn missing_fields_lists_absent_names_in_order() {
        let body = obj(json!({"name": "a", "model": "b"}));
        assert_eq!(
            missing_fields(&body, &REQUIRED_FIELDS),
            vec!["color", "manufacturer", "year"]
        );
    }

    #[test]
    fn index_parsing_follows_leading_integer() {
        assert_eq!(parse_index(&json!(2)), Some(2));
        assert_eq!(parse_index(&json!(2.7)), Some(2));
        assert_eq!(parse_index(&json!("3")), Some(3));
        assert_eq!(parse_index(&json!(" 4th")), Some(4));
        assert_eq!(parse_index(&json!("abc")), None);
        assert_eq!(parse_index(&json!(-1)), None);
        assert_eq!(parse_index(&json!(null)), None);
    }

    #[test]
    fn id_parsing() {
        assert_eq!(parse_id(&obj(json!({"id": 5}))).unwrap(), 5);
        assert_eq!(parse_id(&obj(json!({"id": "6"}))).unwrap(), 6);
        assert!(matches!(parse_id(&obj(json!({}))), Err(ApiError::MissingId)));
        assert!(matches!(parse_id(&obj(json!({"id": -1}))), Err(ApiError::InvalidId)));
        assert!(matches!(parse_id(&obj(json!({"id": true}))), Err(ApiError::InvalidId)));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::MissingId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound(1).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(crate::Error::Io("disk full".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(matches!(ApiError::from(crate::Error::NotFound(9)), ApiError::NotFound(9)));
        assert_eq!(
            ApiError::from(crate::Error::IdsExhausted).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
