// Session authentication
//
// Cookie-based login. The authenticate endpoint sets a session cookie in
// the client's jar; every later request carries it automatically.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{CvpClient, envelope_error};
use crate::error::Error;
use crate::models::CvpInfo;

impl CvpClient {
    /// Authenticate with username and password.
    ///
    /// Must succeed before any other call. Bad credentials come back as an
    /// error envelope with HTTP 200; both that and HTTP 401/403 map to
    /// [`Error::Authentication`].
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.web_url("login/authenticate.do")?;
        debug!("logging in at {}", url);

        let body = json!({
            "userId": username,
            "password": password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status})"),
            });
        }

        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            if let Some(err) = envelope_error(&value) {
                return Err(Error::Authentication {
                    message: err.to_string(),
                });
            }
        }

        debug!("login successful");
        Ok(())
    }

    /// End the current session.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.web_url("login/logout.do")?;
        let _: Value = self.post_empty(url).await?;
        debug!("logout complete");
        Ok(())
    }

    /// Controller software version, e.g. `2016.1.2`.
    pub async fn version(&self) -> Result<String, Error> {
        let url = self.web_url("cvpInfo/getCvpInfo.do")?;
        let info: CvpInfo = self.get(url).await?;
        Ok(info.version)
    }
}
