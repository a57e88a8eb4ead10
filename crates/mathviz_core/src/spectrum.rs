use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const DEFAULT_SAMPLE_RATE: u32 = 1024;
pub const DEFAULT_DURATION: f64 = 1.0;

/// Periodic waveform shapes the synthesizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Unit-amplitude sample of this shape at time `t`.
    fn sample(self, frequency: f64, t: f64) -> f64 {
        let phase = 2.0 * PI * frequency * t;
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => zero_safe_sign(phase.sin()),
            Waveform::Triangle => (2.0 / PI) * phase.sin().asin(),
            Waveform::Sawtooth => {
                let cycles = frequency * t;
                2.0 * (cycles - (cycles + 0.5).floor())
            }
        }
    }
}

// f64::signum maps +0.0 to 1.0; the square wave needs sign(0) = 0.
fn zero_safe_sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Waveform synthesis parameters. Wire form uses camelCase keys; sample rate
/// and duration fall back to 1024 Hz / 1 s when the wire omits them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumRequest {
    #[serde(rename = "waveType")]
    pub waveform: Waveform,
    pub frequency: f64,
    pub amplitude: f64,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_duration")]
    pub duration: f64,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_duration() -> f64 {
    DEFAULT_DURATION
}

impl SpectrumRequest {
    pub fn new(waveform: Waveform, frequency: f64, amplitude: f64) -> Self {
        Self {
            waveform,
            frequency,
            amplitude,
            sample_rate: DEFAULT_SAMPLE_RATE,
            duration: DEFAULT_DURATION,
        }
    }

    /// Number of samples the synthesizer will produce.
    pub fn sample_count(&self) -> usize {
        (self.sample_rate as f64 * self.duration).round() as usize
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(RequestError::InvalidFrequency(self.frequency));
        }
        if !self.amplitude.is_finite() {
            return Err(RequestError::NonFiniteAmplitude(self.amplitude));
        }
        if self.sample_rate == 0 {
            return Err(RequestError::ZeroSampleRate);
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(RequestError::InvalidDuration(self.duration));
        }
        if self.sample_count() == 0 {
            return Err(RequestError::EmptySignal);
        }
        Ok(())
    }
}

/// Time series plus one-sided magnitude spectrum of a synthesized waveform.
///
/// `time` and `signal` hold `N` samples, `frequencies` and `magnitude` the
/// first `N/2` bins. Decoding tolerates extra fields a remote service may
/// attach alongside these four.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumResult {
    pub time: Vec<f64>,
    pub signal: Vec<f64>,
    pub frequencies: Vec<f64>,
    pub magnitude: Vec<f64>,
}

/// Synthesizes `N = round(sampleRate * duration)` samples over `[0, duration)`.
///
/// Returns `(time, signal)` with `time[i] = i * duration / N`. Pure and
/// deterministic; callers check parameters with
/// [`SpectrumRequest::validate`] first.
pub fn synthesize(request: &SpectrumRequest) -> (Vec<f64>, Vec<f64>) {
    let n = request.sample_count();
    let mut time = Vec::with_capacity(n);
    let mut signal = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64 * request.duration / n as f64;
        time.push(t);
        signal.push(request.amplitude * request.waveform.sample(request.frequency, t));
    }
    (time, signal)
}

/// One-sided magnitude spectrum by direct evaluation of the discrete Fourier
/// transform, without windowing or a fast-transform algorithm.
///
/// Returns `(frequencies, magnitude)` for bins `0..N/2`, with
/// `frequencies[k] = k * sampleRate / N` and
/// `magnitude[k] = 2/N * sqrt(re^2 + im^2)`. O(N^2), the cost that makes a
/// remote backend attractive for large `N`.
pub fn dft_magnitude(signal: &[f64], sample_rate: u32) -> (Vec<f64>, Vec<f64>) {
    let n = signal.len();
    let bins = n / 2;
    let mut frequencies = Vec::with_capacity(bins);
    let mut magnitude = Vec::with_capacity(bins);
    for k in 0..bins {
        let mut real = 0.0;
        let mut imag = 0.0;
        for (i, &sample) in signal.iter().enumerate() {
            let angle = -2.0 * PI * k as f64 * i as f64 / n as f64;
            real += sample * angle.cos();
            imag += sample * angle.sin();
        }
        frequencies.push(k as f64 * sample_rate as f64 / n as f64);
        magnitude.push(2.0 / n as f64 * (real * real + imag * imag).sqrt());
    }
    (frequencies, magnitude)
}

/// Full pipeline: synthesize the waveform, then take its magnitude spectrum.
pub fn analyze(request: &SpectrumRequest) -> SpectrumResult {
    let (time, signal) = synthesize(request);
    let (frequencies, magnitude) = dft_magnitude(&signal, request.sample_rate);
    SpectrumResult {
        time,
        signal,
        frequencies,
        magnitude,
    }
}
