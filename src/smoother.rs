//! Moving-average jitter filter for per-frame scalar signals.
//!
//! `TemporalSmoother` keeps the last `history_size` raw samples in a ring
//! buffer. Until the ring has filled once every sample passes through
//! unchanged; afterwards the output is the mean of the ring. Strict mode
//! additionally clamps each incoming sample to `max_margin` around the
//! running average before it enters the ring, so a single outlier frame
//! cannot drag the output far.

use crate::{config::SmootherConfig, error::SmootherError};

pub struct TemporalSmoother {
    history: Vec<f64>,
    written: u64,
    filled: bool,
    max_margin: f64,
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        let cfg = SmootherConfig::default();
        Self {
            history: vec![0.0; cfg.history_size],
            written: 0,
            filled: false,
            max_margin: cfg.max_margin,
        }
    }
}

impl TemporalSmoother {
    pub fn new(history_size: usize) -> Result<Self, SmootherError> {
        Self::from_config(&SmootherConfig {
            history_size,
            ..SmootherConfig::default()
        })
    }

    pub fn from_config(cfg: &SmootherConfig) -> Result<Self, SmootherError> {
        if cfg.history_size == 0 {
            return Err(SmootherError::ZeroHistory);
        }
        if !cfg.max_margin.is_finite() || cfg.max_margin < 0.0 {
            return Err(SmootherError::InvalidMargin(cfg.max_margin));
        }

        Ok(Self {
            history: vec![0.0; cfg.history_size],
            written: 0,
            filled: false,
            max_margin: cfg.max_margin,
        })
    }

    pub fn history_size(&self) -> usize {
        self.history.len()
    }

    /// True once `history_size` samples have been written.
    pub fn is_warm(&self) -> bool {
        self.filled
    }

    pub fn smooth(&mut self, value: f64, strict: bool) -> f64 {
        if strict {
            self.strict_smooth(value)
        } else {
            self.simple_smooth(value)
        }
    }

    /// Typed entry point; see [`Smoothable`] for the conversions.
    pub fn smooth_value<T: Smoothable>(&mut self, value: T, strict: bool) -> T {
        T::from_sample(self.smooth(value.into_sample(), strict))
    }

    pub fn simple_smooth(&mut self, value: f64) -> f64 {
        let capacity = self.history.len();
        let slot = (self.written % capacity as u64) as usize;
        self.history[slot] = value;
        self.written = self.written.wrapping_add(1);
        if self.written >= capacity as u64 {
            self.filled = true;
        }

        if !self.filled {
            return value;
        }
        self.history.iter().sum::<f64>() / capacity as f64
    }

    pub fn strict_smooth(&mut self, value: f64) -> f64 {
        if !self.filled {
            return self.simple_smooth(value);
        }

        // The incoming sample is part of its own baseline.
        let avg = (value + self.history.iter().sum::<f64>()) / self.history.len() as f64;
        let clamped = if value > avg {
            (avg + self.max_margin).min(value)
        } else {
            (avg - self.max_margin).max(value)
        };

        self.simple_smooth(clamped)
    }

    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|slot| *slot = 0.0);
        self.written = 0;
        self.filled = false;
    }
}

/// Values that can be pushed through a [`TemporalSmoother`].
pub trait Smoothable: Copy {
    fn into_sample(self) -> f64;
    fn from_sample(sample: f64) -> Self;
}

impl Smoothable for f64 {
    fn into_sample(self) -> f64 {
        self
    }

    fn from_sample(sample: f64) -> Self {
        sample
    }
}

impl Smoothable for f32 {
    fn into_sample(self) -> f64 {
        self as f64
    }

    fn from_sample(sample: f64) -> Self {
        sample as f32
    }
}

impl Smoothable for i32 {
    fn into_sample(self) -> f64 {
        self as f64
    }

    /// Truncates toward zero.
    fn from_sample(sample: f64) -> Self {
        sample as i32
    }
}

impl Smoothable for bool {
    fn into_sample(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }

    fn from_sample(sample: f64) -> Self {
        sample != 0.0
    }
}
