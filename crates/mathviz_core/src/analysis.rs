use crate::spectrum::SpectrumResult;
use anyhow::{bail, Result};
use serde::Serialize;
use std::cmp::Ordering;

/// Height floor below which a spectral bin is never reported as a peak.
pub const DEFAULT_PEAK_HEIGHT: f64 = 0.01;
/// Minimal bin separation between two reported peaks.
pub const DEFAULT_PEAK_DISTANCE: usize = 5;

/// Summary statistics of a time-domain signal. `std` is the population
/// standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub rms: f64,
}

pub fn signal_stats(samples: &[f64]) -> Result<SignalStats> {
    if samples.is_empty() {
        bail!("Signal must contain at least one sample.");
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut square_sum = 0.0;
    let mut variance_sum = 0.0;
    for &sample in samples {
        min = min.min(sample);
        max = max.max(sample);
        square_sum += sample * sample;
        let deviation = sample - mean;
        variance_sum += deviation * deviation;
    }
    Ok(SignalStats {
        mean,
        std: (variance_sum / n).sqrt(),
        min,
        max,
        rms: (square_sum / n).sqrt(),
    })
}

/// A dominant bin of a magnitude spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralPeak {
    pub bin: usize,
    pub frequency: f64,
    pub magnitude: f64,
}

/// Local maxima of `magnitude` at or above `min_height`, thinned so that no
/// two reported peaks lie closer than `min_distance` bins (weaker peaks are
/// discarded first). Returned in ascending bin order.
pub fn spectral_peaks(
    frequencies: &[f64],
    magnitude: &[f64],
    min_height: f64,
    min_distance: usize,
) -> Result<Vec<SpectralPeak>> {
    if frequencies.len() != magnitude.len() {
        bail!(
            "Frequency and magnitude series must have equal length (got {} and {}).",
            frequencies.len(),
            magnitude.len()
        );
    }
    if min_distance == 0 {
        bail!("Peak distance must be at least 1.");
    }

    let mut candidates: Vec<usize> = Vec::new();
    for bin in 1..magnitude.len().saturating_sub(1) {
        if magnitude[bin] >= min_height
            && magnitude[bin] > magnitude[bin - 1]
            && magnitude[bin] > magnitude[bin + 1]
        {
            candidates.push(bin);
        }
    }

    candidates.sort_by(|a, b| {
        magnitude[*b]
            .partial_cmp(&magnitude[*a])
            .unwrap_or(Ordering::Equal)
    });
    let mut kept: Vec<usize> = Vec::new();
    for bin in candidates {
        if kept.iter().all(|&other| bin.abs_diff(other) >= min_distance) {
            kept.push(bin);
        }
    }
    kept.sort_unstable();

    Ok(kept
        .into_iter()
        .map(|bin| SpectralPeak {
            bin,
            frequency: frequencies[bin],
            magnitude: magnitude[bin],
        })
        .collect())
}

/// Peaks of a spectrum under the default height and distance thresholds.
pub fn dominant_peaks(result: &SpectrumResult) -> Result<Vec<SpectralPeak>> {
    spectral_peaks(
        &result.frequencies,
        &result.magnitude,
        DEFAULT_PEAK_HEIGHT,
        DEFAULT_PEAK_DISTANCE,
    )
}
