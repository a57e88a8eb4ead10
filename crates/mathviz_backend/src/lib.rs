//! Backend selection and render orchestration for the MathViz
//! visualizations.
//!
//! The crate wraps the pure engines from `mathviz_core` with everything they
//! need to run interactively: a blocking JSON client for the remote numeric
//! service, a per-visualization orchestrator that admits one computation at
//! a time, the startup health probe that picks the initial backend, and
//! tracing setup.

pub mod error;
pub mod orchestrator;
pub mod remote;
pub mod telemetry;

pub use error::{BackendError, RenderError};
pub use orchestrator::{
    initial_backend, BackendMode, Fourier, FourierOrchestrator, Mandelbrot,
    MandelbrotOrchestrator, Orchestrator, RenderReport, Visualization,
};
pub use remote::{ServiceClient, ServiceConfig, ServiceHealth};
