use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IqError {
    #[error("period_hours must be a finite value greater than zero, got {0}")]
    InvalidPeriodHours(f64),
    #[error("min_category_samples must be at least 1")]
    InvalidMinSamples,
}
