//! Config client bound to one service on one gateway endpoint

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use reqwest::{Client, Method, Response, Url};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::oneshot;
use tracing::debug;
use vconf_common::{LATEST_VERSION, RequestData, SERVICE, VERSION};

use crate::error::{ClientError, Result};
use crate::refresh::{PayloadCache, RefreshCallback, RefreshState, spawn_refresh};

/// Transport timeout applied to every request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
struct Target {
    service: String,
    version: u64,
}

struct Inner {
    http: Client,
    endpoint: Url,
    target: RwLock<Target>,
    cache: PayloadCache,
}

impl Inner {
    fn target(&self) -> Target {
        self.target.read().clone()
    }

    async fn fetch(&self) -> Result<Bytes> {
        let target = self.target();
        let resp = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                (SERVICE, target.service),
                (VERSION, target.version.to_string()),
            ])
            .send()
            .await?;

        Ok(check_status(resp).await?.bytes().await?)
    }

    async fn send_envelope<T: Serialize + ?Sized>(&self, method: Method, data: &T) -> Result<()> {
        let raw = serde_json::value::to_raw_value(data)?;
        if raw.get() == "null" {
            return Err(ClientError::EmptyConfigData);
        }

        let envelope = RequestData {
            service: self.target().service,
            data: raw,
        };
        let resp = self
            .http
            .request(method, self.endpoint.clone())
            .json(&envelope)
            .send()
            .await?;

        check_status(resp).await?;
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        let target = self.target();
        let resp = self
            .http
            .delete(self.endpoint.clone())
            .query(&[
                (SERVICE, target.service),
                (VERSION, target.version.to_string()),
            ])
            .send()
            .await?;

        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

/// Whole milliseconds in `period`, saturating at `u64::MAX`
fn saturating_millis(period: Duration) -> u64 {
    u64::try_from(period.as_millis()).unwrap_or(u64::MAX)
}

/// Handle for one service's config on a vconf gateway.
///
/// Foreground calls return errors to the caller unchanged and never retry.
/// At most one refresh callback can be attached for the lifetime of the
/// handle; dropping the handle stops it.
pub struct ConfigClient {
    inner: Arc<Inner>,
    refresh: Mutex<RefreshState>,
}

impl ConfigClient {
    /// Create a client for `service` at the gateway `uri`, e.g.
    /// `http://localhost:8080/config`.
    ///
    /// `version` pins reads and deletes to one version; `None` or `0` targets
    /// the latest version (or the whole history, for deletes).
    pub fn connect(uri: &str, service: &str, version: Option<u64>) -> Result<Self> {
        if service.is_empty() {
            return Err(ClientError::EmptyServiceName);
        }

        let endpoint = Url::parse(uri).map_err(|e| ClientError::InvalidUri(format!("{}: {}", uri, e)))?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                endpoint,
                target: RwLock::new(Target {
                    service: service.to_string(),
                    version: version.unwrap_or(LATEST_VERSION),
                }),
                cache: PayloadCache::default(),
            }),
            refresh: Mutex::new(RefreshState::Unassigned),
        })
    }

    /// Rebind the handle to another service.
    ///
    /// A missing or zero `version` keeps the current pin.
    pub fn set_service_params(&self, service: &str, version: Option<u64>) -> Result<()> {
        if service.is_empty() {
            return Err(ClientError::EmptyServiceName);
        }

        let mut target = self.inner.target.write();
        target.service = service.to_string();
        if let Some(v) = version.filter(|v| *v > 0) {
            target.version = v;
        }
        Ok(())
    }

    pub fn service(&self) -> String {
        self.inner.target().service
    }

    pub fn version(&self) -> u64 {
        self.inner.target().version
    }

    /// Last payload fetched by a foreground read or the refresh loop
    pub fn cached_config(&self) -> Bytes {
        self.inner.cache.get()
    }

    /// Create version 1 of the bound service with `data` as payload
    pub async fn create_config<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        self.inner.send_envelope(Method::POST, data).await
    }

    /// Append a new version of the bound service
    pub async fn update_config<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        self.inner.send_envelope(Method::PUT, data).await
    }

    /// Read the pinned version and remember it as the last seen payload
    pub async fn read_config_bytes(&self) -> Result<Bytes> {
        let payload = self.inner.fetch().await?;
        self.inner.cache.store(payload.clone());
        Ok(payload)
    }

    pub async fn read_and_decode_config<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = self.read_config_bytes().await?;
        Ok(serde_json::from_slice(&payload)?)
    }

    /// Delete the pinned version, or the whole history when unpinned
    pub async fn delete_config(&self) -> Result<()> {
        self.inner.delete().await
    }

    /// Poll the latest payload every `period` and call `callback` whenever
    /// it changes.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn assign_refresh_callback<F>(&self, period: Duration, callback: F) -> Result<()>
    where
        F: Fn(Bytes) + Send + Sync + 'static,
    {
        if period.is_zero() {
            return Err(ClientError::InvalidRefreshPeriod);
        }

        let mut state = self.refresh.lock();
        if !matches!(*state, RefreshState::Unassigned) {
            return Err(ClientError::CallbackAlreadyAssigned);
        }

        let (tx, rx) = oneshot::channel();
        let inner = self.inner.clone();
        let fetch = move || {
            let inner = inner.clone();
            async move { inner.fetch().await }
        };
        let callback: RefreshCallback = Box::new(callback);

        spawn_refresh(period, self.inner.cache.clone(), fetch, callback, rx);
        *state = RefreshState::Running(tx);

        debug!(
            service = %self.service(),
            period_ms = saturating_millis(period),
            "config refresh started"
        );
        Ok(())
    }

    /// Stop the refresh loop; a no-op when none is running
    pub fn stop_refresh(&self) {
        self.refresh.lock().stop();
    }
}

impl Drop for ConfigClient {
    fn drop(&mut self) {
        self.refresh.get_mut().stop();
    }
}
