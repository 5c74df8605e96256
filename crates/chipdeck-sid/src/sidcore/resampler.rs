//! Output resampling configuration.
//!
//! Built once at plugin setup through [`ResamplerBuilder`]; `build()`
//! reports an unhealthy configuration instead of producing a broken
//! resampler.

use crate::error::{Result, SidError};

/// Sampling strategy for the output stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMethod {
    /// Linear interpolation (accurate, the default).
    #[default]
    Interpolate,
    /// Decimating fast resampling (cheaper, noisier).
    ResampleFast,
}

impl SamplingMethod {
    /// Parse a settings value ("interpolate", "resample-fast").
    pub fn from_name(name: &str) -> Option<SamplingMethod> {
        match name {
            "interpolate" => Some(SamplingMethod::Interpolate),
            "resample-fast" => Some(SamplingMethod::ResampleFast),
            _ => None,
        }
    }

    /// Settings-facing name.
    pub fn name(&self) -> &'static str {
        match self {
            SamplingMethod::Interpolate => "interpolate",
            SamplingMethod::ResampleFast => "resample-fast",
        }
    }
}

/// Builder for the output [`Resampler`].
#[derive(Debug, Clone)]
pub struct ResamplerBuilder {
    sample_rate: u32,
    method: SamplingMethod,
}

impl ResamplerBuilder {
    /// Start a builder targeting `sample_rate`.
    pub fn new(sample_rate: u32) -> ResamplerBuilder {
        ResamplerBuilder {
            sample_rate,
            method: SamplingMethod::default(),
        }
    }

    /// Select the sampling method.
    pub fn method(mut self, method: SamplingMethod) -> ResamplerBuilder {
        self.method = method;
        self
    }

    /// Validate the configuration and produce a resampler.
    pub fn build(&self) -> Result<Resampler> {
        if !(8_000..=192_000).contains(&self.sample_rate) {
            return Err(SidError::ResamplerUnhealthy(format!(
                "sample rate {} outside 8000-192000",
                self.sample_rate
            )));
        }
        Ok(Resampler {
            sample_rate: self.sample_rate,
            method: self.method,
            last: 0.0,
        })
    }
}

/// Output-stage resampler state.
#[derive(Debug, Clone)]
pub struct Resampler {
    sample_rate: u32,
    method: SamplingMethod,
    last: f32,
}

impl Resampler {
    /// Target sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Configured method.
    pub fn method(&self) -> SamplingMethod {
        self.method
    }

    /// Smooth one raw sample into the output domain.
    pub fn process(&mut self, raw: f32) -> f32 {
        match self.method {
            SamplingMethod::Interpolate => {
                let smoothed = (self.last + raw) * 0.5;
                self.last = raw;
                smoothed
            }
            SamplingMethod::ResampleFast => raw,
        }
    }
}
