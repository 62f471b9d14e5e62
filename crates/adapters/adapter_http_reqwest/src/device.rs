//! [`DeviceApi`] over the controller's HTTP endpoints.

use std::future::Future;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;

use sprinkler_app::ports::{DeviceApi, ProgressFn, RoutinesPayload};
use sprinkler_domain::error::SprinklerError;
use sprinkler_domain::firmware::{FirmwareTarget, UploadProgress};
use sprinkler_domain::relay::{RelayAction, RelayActionResponse, RelayId};
use sprinkler_domain::routine::Routine;
use sprinkler_domain::status::{ControlResponse, DeviceStatus, RoutineCommand};

use crate::config::DeviceConfig;
use crate::error::HttpError;

/// Controller client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpDevice {
    client: Client,
    base_url: String,
    config: DeviceConfig,
}

impl HttpDevice {
    /// Build a client for the controller described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidBaseUrl`] unless the base URL is `http(s)`,
    /// or a transport error if the client cannot be built.
    pub fn new(config: DeviceConfig) -> Result<Self, HttpError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(HttpError::InvalidBaseUrl(config.base_url));
        }
        // the controller sits on the local network, never behind a proxy
        let client = Client::builder()
            .timeout(config.timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Fail on non-2xx, keeping the body as the message.
async fn check(response: Response) -> Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let body = match text.trim() {
        "" => status.canonical_reason().unwrap_or("error").to_string(),
        trimmed => trimmed.to_string(),
    };
    Err(HttpError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T, HttpError> {
    let bytes = check(response).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decode the routines document; anything but an array counts as empty.
fn decode_routines(bytes: &[u8]) -> Result<Vec<Routine>, HttpError> {
    match serde_json::from_slice::<serde_json::Value>(bytes)? {
        value @ serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        other => {
            tracing::debug!(kind = ?other, "routines document is not an array");
            Ok(Vec::new())
        }
    }
}

/// Split `image` into chunks, reporting progress as each one is taken.
fn upload_body(image: Vec<u8>, chunk_size: usize, progress: ProgressFn) -> Body {
    let total = image.len() as u64;
    let chunks: Vec<Vec<u8>> = image.chunks(chunk_size.max(1)).map(<[u8]>::to_vec).collect();
    let mut sent = 0_u64;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        progress(UploadProgress { sent, total });
        Ok::<_, std::io::Error>(chunk)
    }));
    Body::wrap_stream(stream)
}

impl DeviceApi for HttpDevice {
    fn relay(
        &self,
        relay: RelayId,
        action: RelayAction,
    ) -> impl Future<Output = Result<RelayActionResponse, SprinklerError>> + Send {
        let mut query = vec![
            ("id", relay.to_string()),
            ("action", action.as_str().to_string()),
        ];
        if let Some(seconds) = action.duration_seconds() {
            query.push(("duration", seconds.to_string()));
        }
        let request = self.client.get(self.url("/api/relay")).query(&query);
        async move {
            tracing::debug!(%relay, %action, "GET /api/relay");
            let response = request.send().await.map_err(HttpError::from)?;
            Ok(json(response).await?)
        }
    }

    fn status(&self) -> impl Future<Output = Result<DeviceStatus, SprinklerError>> + Send {
        let request = self.client.get(self.url("/api/status"));
        async move {
            tracing::debug!("GET /api/status");
            let response = request.send().await.map_err(HttpError::from)?;
            Ok(json(response).await?)
        }
    }

    fn routines(&self) -> impl Future<Output = Result<Vec<Routine>, SprinklerError>> + Send {
        let request = self.client.get(self.url("/api/routines"));
        async move {
            tracing::debug!("GET /api/routines");
            let response = request.send().await.map_err(HttpError::from)?;
            let bytes = check(response)
                .await?
                .bytes()
                .await
                .map_err(HttpError::from)?;
            Ok(decode_routines(&bytes)?)
        }
    }

    fn save_routines(
        &self,
        payload: RoutinesPayload,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        let bytes = payload.len();
        let request = self
            .client
            .post(self.url("/api/routines"))
            .header(CONTENT_TYPE, "application/json")
            .body(payload.into_string());
        async move {
            tracing::debug!(bytes, "POST /api/routines");
            let response = request.send().await.map_err(HttpError::from)?;
            check(response).await?;
            Ok(())
        }
    }

    fn control_routine(
        &self,
        command: RoutineCommand,
    ) -> impl Future<Output = Result<ControlResponse, SprinklerError>> + Send {
        let mut query = vec![("action", command.as_str().to_string())];
        if let Some(index) = command.index() {
            query.push(("index", index.to_string()));
        }
        let request = self
            .client
            .get(self.url("/api/routine/control"))
            .query(&query);
        async move {
            tracing::debug!(action = command.as_str(), "GET /api/routine/control");
            let response = request.send().await.map_err(HttpError::from)?;
            let bytes = check(response)
                .await?
                .bytes()
                .await
                .map_err(HttpError::from)?;
            // stop and skip may answer with plain text; reaching here means 2xx
            Ok(serde_json::from_slice(&bytes).unwrap_or(ControlResponse { success: true }))
        }
    }

    fn upload_firmware(
        &self,
        target: FirmwareTarget,
        image: Vec<u8>,
        progress: ProgressFn,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        let size = image.len();
        let request = self
            .client
            .post(self.url("/api/ota"))
            .query(&[("type", target.as_str())])
            .timeout(self.config.upload_timeout)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, size)
            .body(upload_body(image, self.config.upload_chunk_size, progress));
        async move {
            tracing::debug!(%target, bytes = size, "POST /api/ota");
            let response = request.send().await.map_err(HttpError::from)?;
            check(response).await?;
            Ok(())
        }
    }
}
