//! HTTP client for a running aguia-api, usable wherever a [`PreferenceBackend`] is expected.

use aguia_core::controller::PreferenceBackend;
use aguia_core::util::{compact_text, is_http_url, METHOD_PREFIX};
use aguia_core::{ClientPrefs, Error, Result, SaveOutcome};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct HttpBackend {
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let endpoint = service_endpoint(base_url)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidInput("token must not be empty".to_string()));
        }

        Ok(Self {
            endpoint,
            token: token.to_string(),
            client: reqwest::Client::builder().build().map_err(transport)?,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, args: Value) -> Result<T> {
        let body = json!([{ "methodname": format!("{METHOD_PREFIX}{method}"), "args": args }]);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!(
                "HTTP {} {}",
                status.as_u16(),
                compact_text(&body)
            )));
        }

        let results = response.json::<Vec<CallResult>>().await.map_err(transport)?;
        let result = results
            .into_iter()
            .next()
            .ok_or_else(|| Error::Remote("empty response".to_string()))?;
        tracing::debug!(method, error = result.error, "Remote call finished");
        decode_result(result)
    }
}

impl PreferenceBackend for HttpBackend {
    async fn load(&self) -> Result<ClientPrefs> {
        self.call("get_preferences", json!({})).await
    }

    async fn save(&self, prefs: &ClientPrefs) -> Result<SaveOutcome> {
        self.call("save_preferences", serde_json::to_value(prefs)?)
            .await
    }
}

#[derive(Debug, Deserialize)]
struct CallResult {
    error: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    exception: Option<CallException>,
}

#[derive(Debug, Deserialize)]
struct CallException {
    errorcode: String,
    message: String,
}

fn decode_result<T: DeserializeOwned>(result: CallResult) -> Result<T> {
    if result.error {
        return Err(match result.exception {
            Some(exception) if exception.errorcode == "nopermissions" => {
                Error::PermissionDenied(exception.message)
            }
            Some(exception) => {
                Error::Remote(format!("{}: {}", exception.errorcode, exception.message))
            }
            None => Error::Remote("call failed without details".to_string()),
        });
    }

    let data = result
        .data
        .ok_or_else(|| Error::Remote("response carried no data".to_string()))?;
    Ok(serde_json::from_value(data)?)
}

fn service_endpoint(base_url: &str) -> Result<String> {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Err(Error::InvalidInput("API URL must not be empty".to_string()));
    }
    if !is_http_url(base_url) {
        return Err(Error::InvalidInput(
            "API URL must include http:// or https://".to_string(),
        ));
    }
    Ok(format!("{}/v1/service", base_url.trim_end_matches('/')))
}

fn transport(error: reqwest::Error) -> Error {
    Error::Remote(error.to_string())
}
