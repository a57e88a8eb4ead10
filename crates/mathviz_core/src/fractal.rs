use crate::error::RequestError;
use anyhow::{bail, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Squared escape radius for the iteration loop; |z|^2 >= 4 means the orbit
/// has left the disk of radius 2 and diverges.
const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// Viewport over the complex plane, in canvas-pixel terms.
///
/// `zoom = 1` spans 4 units of the real axis across the canvas width;
/// doubling `zoom` halves the span. Wire form uses camelCase keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FractalRequest {
    pub width: u32,
    pub height: u32,
    pub max_iter: u32,
    pub zoom: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl FractalRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.width == 0 || self.height == 0 {
            return Err(RequestError::EmptyViewport {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_iter == 0 {
            return Err(RequestError::ZeroIterationBudget);
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(RequestError::InvalidZoom(self.zoom));
        }
        if !self.center_x.is_finite() || !self.center_y.is_finite() {
            return Err(RequestError::NonFiniteCenter {
                x: self.center_x,
                y: self.center_y,
            });
        }
        Ok(())
    }

    /// Maps a canvas pixel to its point in the complex plane.
    ///
    /// This is the single mapping the engine iterates over; it is public so
    /// a UI can translate click coordinates into a new viewport center with
    /// exactly the engine's geometry.
    pub fn pixel_to_plane(&self, x: u32, y: u32) -> (f64, f64) {
        let width = self.width as f64;
        let height = self.height as f64;
        let re = (x as f64 - width / 2.0) / (width / 4.0 * self.zoom) + self.center_x;
        let im = (y as f64 - height / 2.0) / (height / 4.0 * self.zoom) + self.center_y;
        (re, im)
    }

    /// Width of the viewport along the real axis, in plane units.
    pub fn span(&self) -> f64 {
        4.0 / self.zoom
    }
}

/// Row-major grid of per-pixel iteration counts.
///
/// A count equal to the request's `max_iter` marks a point that never
/// escaped (rendered as interior). Shape is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationField {
    width: usize,
    height: usize,
    counts: Vec<u32>,
}

impl IterationField {
    /// Builds a field from nested wire rows, checking that the grid is
    /// rectangular and non-empty.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self> {
        if rows.is_empty() {
            bail!("Iteration grid must have at least one row.");
        }
        let width = rows[0].len();
        if width == 0 {
            bail!("Iteration grid rows must not be empty.");
        }
        let height = rows.len();
        let mut counts = Vec::with_capacity(width * height);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                bail!(
                    "Iteration grid row {} has length {}, expected {}.",
                    index,
                    row.len(),
                    width
                );
            }
            counts.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height,
            counts,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.counts[y * self.width + x]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.counts.chunks_exact(self.width)
    }
}

/// Escape-time iteration count for a single point.
///
/// Iterates `z <- z^2 + c` from `z = 0` until `|z|^2 >= 4` or the budget is
/// exhausted; a return value of `max_iter` means the orbit stayed bounded.
pub fn escape_time(c: Complex64, max_iter: u32) -> u32 {
    let mut z = Complex64::new(0.0, 0.0);
    let mut count = 0;
    while count < max_iter && z.norm_sqr() < ESCAPE_RADIUS_SQ {
        z = z * z + c;
        count += 1;
    }
    count
}

/// Computes the full iteration field for a validated viewport.
///
/// Pure and deterministic; allocates nothing beyond the output grid. Callers
/// check parameters with [`FractalRequest::validate`] first, which rules out
/// the zero divisors in the pixel mapping.
pub fn compute_field(request: &FractalRequest) -> IterationField {
    let width = request.width as usize;
    let height = request.height as usize;
    let mut counts = Vec::with_capacity(width * height);
    for y in 0..request.height {
        for x in 0..request.width {
            let (re, im) = request.pixel_to_plane(x, y);
            counts.push(escape_time(Complex64::new(re, im), request.max_iter));
        }
    }
    IterationField {
        width,
        height,
        counts,
    }
}
