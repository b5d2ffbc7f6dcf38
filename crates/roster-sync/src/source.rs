//! The remote directory collaborator and its HTTP implementation.

use std::{future::Future, time::Duration};

use reqwest::{Client, header};
use serde_json::Value;

use crate::FetchError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Something that can produce the full, ordered list of remote directory
/// records in one call.
pub trait DirectorySource: Send + Sync {
  fn fetch_all(&self) -> impl Future<Output = Result<Vec<Value>, FetchError>> + Send + '_;
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// Connection settings for the remote directory API.
#[derive(Debug, Clone)]
pub struct SourceConfig {
  pub base_url:  String,
  /// Path of the unified-list endpoint, e.g. `/api/unified-list`.
  pub list_path: String,
  /// Sent as a bearer token when present.
  pub token:     Option<String>,
  pub timeout:   Duration,
}

/// Fetches the unified list with a single `GET`.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpDirectorySource {
  client: Client,
  config: SourceConfig,
}

impl HttpDirectorySource {
  pub fn new(config: SourceConfig) -> Result<Self, FetchError> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/{}",
      self.config.base_url.trim_end_matches('/'),
      self.config.list_path.trim_start_matches('/')
    )
  }
}

impl DirectorySource for HttpDirectorySource {
  async fn fetch_all(&self) -> Result<Vec<Value>, FetchError> {
    let url = self.url();
    tracing::debug!(%url, "fetching unified directory list");

    let mut req = self
      .client
      .get(&url)
      .header(header::ACCEPT, "application/json");
    if let Some(token) = &self.config.token {
      req = req.bearer_auth(token);
    }

    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      return Err(FetchError::Status(status.as_u16()));
    }

    let body = resp.bytes().await?;
    let value: Value = serde_json::from_slice(&body)
      .map_err(|e| FetchError::Malformed(format!("invalid json: {e}")))?;
    extract_records(value)
  }
}

/// Accept either a bare JSON array or an object wrapping the array in `data`.
pub fn extract_records(body: Value) -> Result<Vec<Value>, FetchError> {
  match body {
    Value::Array(records) => Ok(records),
    Value::Object(mut envelope) => match envelope.remove("data") {
      Some(Value::Array(records)) => Ok(records),
      Some(_) => Err(FetchError::Malformed("`data` is not an array".into())),
      None => Err(FetchError::Malformed("object response without `data`".into())),
    },
    other => Err(FetchError::Malformed(format!(
      "expected an array of records, got {}",
      json_kind(&other)
    ))),
  }
}

fn json_kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
  };
  use serde_json::json;
  use tokio::net::TcpListener;

  use super::*;

  async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
  }

  fn source(base_url: String, token: Option<&str>) -> HttpDirectorySource {
    HttpDirectorySource::new(SourceConfig {
      base_url,
      list_path: "/api/unified-list".into(),
      token: token.map(str::to_owned),
      timeout: Duration::from_secs(5),
    })
    .unwrap()
  }

  #[test]
  fn extract_accepts_array_and_data_envelope() {
    let records = extract_records(json!([{ "id": 1 }, { "id": 2 }])).unwrap();
    assert_eq!(records.len(), 2);

    let records = extract_records(json!({ "data": [{ "id": 1 }], "meta": {} })).unwrap();
    assert_eq!(records, vec![json!({ "id": 1 })]);
  }

  #[test]
  fn extract_rejects_other_shapes() {
    for body in [json!({ "data": {} }), json!({ "items": [] }), json!("nope"), json!(null)] {
      assert!(
        matches!(extract_records(body.clone()), Err(FetchError::Malformed(_))),
        "accepted {body}"
      );
    }
  }

  #[test]
  fn url_joins_base_and_path_once() {
    let s = source("http://dir.example/".into(), None);
    assert_eq!(s.url(), "http://dir.example/api/unified-list");
  }

  #[tokio::test]
  async fn fetches_array_body() {
    let app = Router::new().route(
      "/api/unified-list",
      get(|| async {
        Json(json!([
          { "student_number": "2021001", "first_name": "Ana", "last_name": "Cruz" },
          { "employee_id": "E9", "first_name": "Ben", "last_name": "Reyes" },
        ]))
      }),
    );
    let base = serve(app).await;

    let records = source(base, None).fetch_all().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["student_number"], "2021001");
  }

  #[tokio::test]
  async fn sends_bearer_token() {
    async fn guarded(headers: HeaderMap) -> Response {
      match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer s3cret") => Json(json!({ "data": [] })).into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
      }
    }
    let base = serve(Router::new().route("/api/unified-list", get(guarded))).await;

    let records = source(base.clone(), Some("s3cret")).fetch_all().await.unwrap();
    assert!(records.is_empty());

    let err = source(base, None).fetch_all().await.unwrap_err();
    assert!(matches!(err, FetchError::Status(401)), "unexpected: {err}");
  }

  #[tokio::test]
  async fn non_success_status_is_a_fetch_error() {
    let app = Router::new().route(
      "/api/unified-list",
      get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let base = serve(app).await;

    let err = source(base, None).fetch_all().await.unwrap_err();
    assert!(matches!(err, FetchError::Status(503)));
  }

  #[tokio::test]
  async fn invalid_json_is_malformed() {
    let app = Router::new().route("/api/unified-list", get(|| async { "<html>oops</html>" }));
    let base = serve(app).await;

    let err = source(base, None).fetch_all().await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
  }

  #[tokio::test]
  async fn unreachable_host_is_an_http_error() {
    // Bind then drop to obtain a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = source(format!("http://{addr}"), None).fetch_all().await.unwrap_err();
    assert!(matches!(err, FetchError::Http(_)));
  }
}
