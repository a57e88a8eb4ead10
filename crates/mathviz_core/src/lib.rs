//! The `mathviz_core` crate holds the numeric engines behind the MathViz
//! visualizations: escape-time iteration over a complex-plane viewport and
//! periodic-waveform synthesis with a direct discrete Fourier magnitude
//! spectrum. Everything here is pure computation over validated requests;
//! transport and scheduling live in `mathviz_backend`.
//!
//! Key components:
//! - **Fractal**: `FractalRequest` viewport mapping and the `IterationField`
//!   grid it produces.
//! - **Spectrum**: `Waveform` synthesis and the one-sided magnitude spectrum
//!   (`SpectrumResult`).
//! - **Analysis**: summary statistics and spectral peak extraction over
//!   engine output.

pub mod analysis;
pub mod error;
pub mod fractal;
pub mod spectrum;
