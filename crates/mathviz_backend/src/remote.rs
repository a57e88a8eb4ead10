use crate::error::BackendError;
use mathviz_core::fractal::{FractalRequest, IterationField};
use mathviz_core::spectrum::{SpectrumRequest, SpectrumResult};
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const BASE_URL_ENV: &str = "MATHVIZ_SERVICE_URL";
pub const TIMEOUT_ENV: &str = "MATHVIZ_SERVICE_TIMEOUT_MS";

/// Where the numeric service lives and how long one call may take.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by `MATHVIZ_SERVICE_URL` and
    /// `MATHVIZ_SERVICE_TIMEOUT_MS` where set; unparsable timeout values
    /// keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        if let Some(millis) = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        {
            config.timeout = Duration::from_millis(millis);
        }
        config
    }
}

/// Health descriptor the service answers its probe with.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceHealth {
    pub version: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Successful responses wrap their payload under a `data` key.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct MandelbrotData {
    iterations: Vec<Vec<u32>>,
}

/// Fourier wire body: the request plus the reserved analysis flag the
/// service accepts but the core never sets.
#[derive(Serialize)]
struct FourierBody<'a> {
    #[serde(flatten)]
    request: &'a SpectrumRequest,
    #[serde(rename = "advancedAnalysis")]
    advanced_analysis: bool,
}

/// Blocking JSON client for the remote numeric service.
///
/// One agent per client, one fixed deadline per call. All failures are
/// normalized into the [`BackendError`] taxonomy; nothing is retried.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    agent: ureq::Agent,
    config: ServiceConfig,
}

impl ServiceClient {
    pub fn new(config: ServiceConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    pub fn health(&self) -> Result<ServiceHealth, BackendError> {
        let response = self
            .agent
            .get(&self.url("health"))
            .call()
            .map_err(|err| self.normalize(err))?;
        self.decode(response)
    }

    /// Requests a remotely computed iteration field and checks that its
    /// shape matches the viewport before handing it over.
    pub fn mandelbrot(&self, request: &FractalRequest) -> Result<IterationField, BackendError> {
        let response = self
            .agent
            .post(&self.url("mandelbrot"))
            .set("Content-Type", "application/json")
            .send_json(request)
            .map_err(|err| self.normalize(err))?;
        let envelope: Envelope<MandelbrotData> = self.decode(response)?;
        let field = IterationField::from_rows(envelope.data.iterations)
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        if field.width() != request.width as usize || field.height() != request.height as usize {
            return Err(BackendError::Transport(format!(
                "service returned a {}x{} grid for a {}x{} viewport",
                field.width(),
                field.height(),
                request.width,
                request.height
            )));
        }
        Ok(field)
    }

    /// Requests a remotely computed spectrum and checks the series lengths
    /// against the request's sample count.
    pub fn fourier(&self, request: &SpectrumRequest) -> Result<SpectrumResult, BackendError> {
        let body = FourierBody {
            request,
            advanced_analysis: false,
        };
        let response = self
            .agent
            .post(&self.url("fourier"))
            .set("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|err| self.normalize(err))?;
        let envelope: Envelope<SpectrumResult> = self.decode(response)?;
        let result = envelope.data;
        let samples = request.sample_count();
        if result.time.len() != samples
            || result.signal.len() != samples
            || result.frequencies.len() != samples / 2
            || result.magnitude.len() != samples / 2
        {
            return Err(BackendError::Transport(format!(
                "service returned series of lengths {}/{}/{}/{} for {} samples",
                result.time.len(),
                result.signal.len(),
                result.frequencies.len(),
                result.magnitude.len(),
                samples
            )));
        }
        Ok(result)
    }

    fn normalize(&self, err: ureq::Error) -> BackendError {
        match err {
            ureq::Error::Status(code, response) => {
                let message = response
                    .into_json::<ErrorBody>()
                    .map(|body| body.error)
                    .unwrap_or_else(|_| format!("HTTP {code}"));
                BackendError::Service(message)
            }
            ureq::Error::Transport(transport) => {
                if is_timeout(&transport) {
                    BackendError::Timeout(self.config.timeout)
                } else {
                    BackendError::Transport(transport.to_string())
                }
            }
        }
    }

    // The deadline can expire after the headers arrive, while the body is
    // still streaming in; that read failure is a timeout, not a malformed
    // body.
    fn decode<T: serde::de::DeserializeOwned>(
        &self,
        response: ureq::Response,
    ) -> Result<T, BackendError> {
        response.into_json().map_err(|err| {
            if is_body_timeout(&err) {
                BackendError::Timeout(self.config.timeout)
            } else {
                BackendError::Transport(format!("invalid response body: {err}"))
            }
        })
    }
}

// Socket deadlines surface as I/O errors somewhere in the source chain;
// every other transport fault keeps its own classification.
fn is_timeout(transport: &ureq::Transport) -> bool {
    transport.kind() == ureq::ErrorKind::Io && source_deadline(transport)
}

// Body reads go through the JSON decoder, which may wrap the socket
// error instead of surfacing its kind directly.
fn is_body_timeout(err: &io::Error) -> bool {
    deadline_expired(err.kind()) || source_deadline(err)
}

fn deadline_expired(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn source_deadline(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            return deadline_expired(io_err.kind());
        }
        source = inner.source();
    }
    false
}
