//! Moving averages.

use serde::{Deserialize, Serialize};

/// Trait for batch indicators over a price series.
pub trait Indicator: Send + Sync {
    /// Calculate values for `data`, oldest first.
    ///
    /// Returns one value per full window; empty when `data` is shorter than
    /// the period.
    fn calculate(&self, data: &[f64]) -> Vec<f64>;

    /// Minimum data points required.
    fn period(&self) -> usize;

    fn name(&self) -> &str;
}

/// Simple Moving Average (SMA).
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        let period_f64 = self.period as f64;

        let mut sum: f64 = data[..self.period].iter().sum();
        result.push(sum / period_f64);

        // Sliding window
        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            result.push(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA), seeded with the SMA of the first window.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        let multiplier = 2.0 / (period as f64 + 1.0);
        Self { period, multiplier }
    }
}

impl Indicator for Ema {
    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);

        let initial_sma: f64 = data[..self.period].iter().sum::<f64>() / self.period as f64;
        result.push(initial_sma);

        let mut ema = initial_sma;
        let one_minus_mult = 1.0 - self.multiplier;
        for &price in &data[self.period..] {
            ema = price * self.multiplier + ema * one_minus_mult;
            result.push(ema);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

/// Averaging method selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaMethod {
    Sma,
    #[default]
    Ema,
}

impl MaMethod {
    /// Build the indicator for `period`.
    pub fn indicator(self, period: usize) -> Box<dyn Indicator> {
        match self {
            MaMethod::Sma => Box::new(Sma::new(period)),
            MaMethod::Ema => Box::new(Ema::new(period)),
        }
    }
}
