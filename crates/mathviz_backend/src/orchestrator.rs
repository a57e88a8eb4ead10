use crate::error::{BackendError, RenderError};
use crate::remote::ServiceClient;
use mathviz_core::error::RequestError;
use mathviz_core::fractal::{self, FractalRequest, IterationField};
use mathviz_core::spectrum::{self, SpectrumRequest, SpectrumResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which engine a render call dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Remote,
    Local,
}

/// One visualization kind: its request and output types plus the two
/// dispatch paths that must produce the same output shape.
pub trait Visualization {
    type Request;
    type Output;

    const NAME: &'static str;

    fn validate(request: &Self::Request) -> Result<(), RequestError>;
    fn compute_local(request: &Self::Request) -> Self::Output;
    fn compute_remote(
        client: &ServiceClient,
        request: &Self::Request,
    ) -> Result<Self::Output, BackendError>;
}

/// Escape-time fractal visualization.
pub struct Mandelbrot;

impl Visualization for Mandelbrot {
    type Request = FractalRequest;
    type Output = IterationField;

    const NAME: &'static str = "mandelbrot";

    fn validate(request: &FractalRequest) -> Result<(), RequestError> {
        request.validate()
    }

    fn compute_local(request: &FractalRequest) -> IterationField {
        fractal::compute_field(request)
    }

    fn compute_remote(
        client: &ServiceClient,
        request: &FractalRequest,
    ) -> Result<IterationField, BackendError> {
        client.mandelbrot(request)
    }
}

/// Waveform synthesis + magnitude spectrum visualization.
pub struct Fourier;

impl Visualization for Fourier {
    type Request = SpectrumRequest;
    type Output = SpectrumResult;

    const NAME: &'static str = "fourier";

    fn validate(request: &SpectrumRequest) -> Result<(), RequestError> {
        request.validate()
    }

    fn compute_local(request: &SpectrumRequest) -> SpectrumResult {
        spectrum::analyze(request)
    }

    fn compute_remote(
        client: &ServiceClient,
        request: &SpectrumRequest,
    ) -> Result<SpectrumResult, BackendError> {
        client.fourier(request)
    }
}

/// Record of the last completed render: which backend ran it, how long it
/// took, and the error if it failed.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub backend: BackendMode,
    pub elapsed: Duration,
    pub error: Option<BackendError>,
}

impl RenderReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-visualization render controller.
///
/// Owns the backend mode, admits at most one computation at a time, and
/// keeps the latest result and completion report. Shareable across threads
/// behind an `Arc`; the in-flight rejection then also covers concurrent
/// callers.
pub struct Orchestrator<V: Visualization> {
    client: ServiceClient,
    mode: Mutex<BackendMode>,
    in_flight: AtomicBool,
    result: Mutex<Option<Arc<V::Output>>>,
    report: Mutex<Option<RenderReport>>,
}

pub type MandelbrotOrchestrator = Orchestrator<Mandelbrot>;
pub type FourierOrchestrator = Orchestrator<Fourier>;

impl<V: Visualization> Orchestrator<V> {
    pub fn new(client: ServiceClient, mode: BackendMode) -> Self {
        Self {
            client,
            mode: Mutex::new(mode),
            in_flight: AtomicBool::new(false),
            result: Mutex::new(None),
            report: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> BackendMode {
        *lock(&self.mode)
    }

    /// Takes effect on the next render; an in-flight computation keeps the
    /// mode it was dispatched with.
    pub fn set_backend(&self, mode: BackendMode) {
        *lock(&self.mode) = mode;
    }

    pub fn is_computing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_result(&self) -> Option<Arc<V::Output>> {
        lock(&self.result).clone()
    }

    pub fn last_report(&self) -> Option<RenderReport> {
        lock(&self.report).clone()
    }

    /// Runs one computation under the current mode and hands the result
    /// back to the caller.
    ///
    /// A call arriving while another render is in flight gets
    /// [`RenderError::Busy`] and observes no state change. Completed calls
    /// always leave a [`RenderReport`]; successful ones also replace the
    /// stored result wholesale.
    pub fn render(&self, request: &V::Request) -> Result<Arc<V::Output>, RenderError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("{} render rejected, computation already in flight", V::NAME);
            return Err(RenderError::Busy);
        }
        let _guard = FlightGuard(&self.in_flight);

        let backend = self.mode();
        debug!("{} render dispatching via {:?}", V::NAME, backend);
        let started = Instant::now();
        let outcome = match V::validate(request) {
            Err(err) => Err(BackendError::from(err)),
            Ok(()) => match backend {
                BackendMode::Remote => V::compute_remote(&self.client, request),
                BackendMode::Local => Ok(V::compute_local(request)),
            },
        };
        let elapsed = started.elapsed();

        match outcome {
            Ok(output) => {
                let output = Arc::new(output);
                *lock(&self.result) = Some(Arc::clone(&output));
                *lock(&self.report) = Some(RenderReport {
                    backend,
                    elapsed,
                    error: None,
                });
                info!("{} render completed via {:?} in {:?}", V::NAME, backend, elapsed);
                Ok(output)
            }
            Err(err) => {
                *lock(&self.report) = Some(RenderReport {
                    backend,
                    elapsed,
                    error: Some(err.clone()),
                });
                warn!(
                    "{} render failed via {:?} after {:?}: {err}",
                    V::NAME,
                    backend,
                    elapsed
                );
                Err(RenderError::Backend(err))
            }
        }
    }
}

// Clears the in-flight flag on drop, unwinding included.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// Recover from poisoning; the guarded values are plain state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One-shot startup probe: Remote when the service answers its health
/// endpoint, Local otherwise. This is the only automatic fallback; later
/// remote failures surface as errors without touching the mode.
pub fn initial_backend(client: &ServiceClient) -> BackendMode {
    match client.health() {
        Ok(health) => {
            info!(
                "numeric service {} reachable, starting in remote mode",
                health.version
            );
            BackendMode::Remote
        }
        Err(err) => {
            warn!("numeric service unavailable, starting in local mode: {err}");
            BackendMode::Local
        }
    }
}
