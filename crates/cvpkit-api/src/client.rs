// Controller web API HTTP client
//
// Wraps `reqwest::Client` with controller URL construction and error
// envelope detection. Endpoint groups (configlets, inventory, topology,
// images, roles, tasks) are implemented as inherent methods in separate
// files to keep this module focused on transport mechanics.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the controller's `/web/*.do` API.
///
/// Every JSON response is inspected for the controller's
/// `{"errorCode": N, "errorMessage": "..."}` shape before being decoded, so
/// callers only ever see typed payloads or an [`Error::Api`].
pub struct CvpClient {
    http: reqwest::Client,
    base_url: Url,
    cookie_jar: Option<Arc<Jar>>,
}

impl CvpClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// A cookie jar is added when the config does not carry one: the login
    /// session lives in a cookie. `base_url` is the controller root, e.g.
    /// `https://cvp.example.net:443`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            cookie_jar,
        })
    }

    /// Build the controller base URL from host, port and scheme.
    pub fn base_url_for(host: &str, port: u16, ssl: bool) -> Result<Url, Error> {
        let scheme = if ssl { "https" } else { "http" };
        Ok(Url::parse(&format!("{scheme}://{host}:{port}"))?)
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the cookie jar holds a session for this controller.
    pub fn has_session(&self) -> bool {
        self.cookie_jar
            .as_ref()
            .and_then(|jar| jar.cookies(&self.base_url))
            .is_some()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/web/{path}`
    pub(crate) fn web_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/web/{path}"))?)
    }

    /// `{base}/web/{path}?k=v&...` with proper query encoding.
    pub(crate) fn web_url_with(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = self.web_url(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        parse_response(resp).await
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_response(resp).await
    }

    /// POST with a raw text body (the task cancel endpoint takes a bare id).
    pub(crate) async fn post_text<T: DeserializeOwned>(
        &self,
        url: Url,
        body: String,
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .body(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_response(resp).await
    }

    /// POST with no body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self.http.post(url).send().await.map_err(Error::Transport)?;

        parse_response(resp).await
    }

    /// POST a multipart form.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: Url,
        form: reqwest::multipart::Form,
    ) -> Result<T, Error> {
        debug!("POST (multipart) {}", url);

        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_response(resp).await
    }

    /// GET a raw binary payload.
    pub(crate) async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, Error> {
        debug!("GET (binary) {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(http_error(status, &body));
        }
        let bytes = resp.bytes().await.map_err(Error::Transport)?;
        Ok(bytes.to_vec())
    }
}

/// Decode a response, surfacing the controller error envelope.
///
/// The controller answers most failures with HTTP 200 and a body of the form
/// `{"errorCode": "132518", "errorMessage": "..."}`; the code may be a number
/// or a numeric string.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("session rejected (HTTP {status})"),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        return Err(http_error(status, &body));
    }

    let value: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("response is not JSON: {e}"),
            body: body.clone(),
        })?
    };

    if let Some(err) = envelope_error(&value) {
        trace!(body = %body, "controller returned error envelope");
        return Err(err);
    }

    serde_json::from_value(value).map_err(|e| {
        let preview = &body[..body.len().min(200)];
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

/// Extract `{errorCode, errorMessage}` from a decoded body, if present.
pub(crate) fn envelope_error(value: &Value) -> Option<Error> {
    let obj = value.as_object()?;
    let raw = obj.get("errorCode")?;
    let code = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(crate::codes::UNKNOWN_ERROR_CODE);
    let message = obj
        .get("errorMessage")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(Error::api(code, message))
}

fn http_error(status: reqwest::StatusCode, body: &str) -> Error {
    Error::Http {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    }
}
