use crate::models::Baseline;

/// Deviation used when the measured one is zero or undefined.
pub const SENTINEL_STD_DEV: f64 = 1.0;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values
        .iter()
        .map(|value| {
            let diff = value - mu;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

impl Baseline {
    /// Baseline over a set of rates. Single-sample and uniform sets get the
    /// sentinel deviation so scoring never divides by zero.
    pub fn from_rates(rates: &[f64]) -> Option<Self> {
        let first = *rates.first()?;
        // Summing identical rates can drift a few ULPs off the true value.
        if rates.iter().all(|rate| *rate == first) {
            return Some(Self {
                mean_rate: first,
                std_dev_rate: SENTINEL_STD_DEV,
            });
        }

        let mean_rate = mean(rates)?;
        let std_dev_rate = match population_std_dev(rates) {
            Some(sigma) if rates.len() > 1 && sigma > 0.0 => sigma,
            _ => SENTINEL_STD_DEV,
        };
        Some(Self {
            mean_rate,
            std_dev_rate,
        })
    }
}
