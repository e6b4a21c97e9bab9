use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::IqError;
use crate::models::{
    Band, Baseline, Baselines, CategoryBaseline, FacilityScore, RatedRecord, ScoreRun,
    ScoredRecord, Trend, UtilizationRecord,
};

pub const DEFAULT_PERIOD_HOURS: f64 = 168.0;
pub const DEFAULT_MIN_CATEGORY_SAMPLES: usize = 5;
pub const MIN_IQ: i32 = 0;
pub const MAX_IQ: i32 = 200;
/// Facility score reported for an empty run.
pub const NEUTRAL_IQ: i32 = 100;
/// Period changes smaller than this many minutes count as stable.
pub const STABLE_CHANGE_THRESHOLD: u64 = 25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub period_hours: f64,
    pub min_category_samples: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            period_hours: DEFAULT_PERIOD_HOURS,
            min_category_samples: DEFAULT_MIN_CATEGORY_SAMPLES,
        }
    }
}

impl ScoringConfig {
    pub fn new(period_hours: f64, min_category_samples: usize) -> Result<Self, IqError> {
        let config = Self {
            period_hours,
            min_category_samples,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), IqError> {
        check_period_hours(self.period_hours)?;
        if self.min_category_samples == 0 {
            return Err(IqError::InvalidMinSamples);
        }
        Ok(())
    }
}

fn check_period_hours(period_hours: f64) -> Result<(), IqError> {
    if period_hours.is_finite() && period_hours > 0.0 {
        Ok(())
    } else {
        Err(IqError::InvalidPeriodHours(period_hours))
    }
}

/// Attach minutes-per-hour-open rates for the current and prior period.
pub fn compute_rates(
    records: &[UtilizationRecord],
    period_hours: f64,
) -> Result<Vec<RatedRecord>, IqError> {
    check_period_hours(period_hours)?;
    Ok(records
        .iter()
        .map(|record| RatedRecord {
            current_rate: f64::from(record.current_minutes) / period_hours,
            prior_rate: record.prior_minutes() as f64 / period_hours,
            record: record.clone(),
        })
        .collect())
}

/// Facility and per-category baselines over current-period rates.
///
/// Categories with fewer than `min_category_samples` members are mapped to
/// the facility baseline. Returns `None` for an empty collection, where no
/// baseline is defined.
pub fn compute_baselines(rated: &[RatedRecord], min_category_samples: usize) -> Option<Baselines> {
    let all_rates: Vec<f64> = rated.iter().map(|item| item.current_rate).collect();
    let facility = Baseline::from_rates(&all_rates)?;

    let mut by_category: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for item in rated {
        by_category
            .entry(item.record.category.as_str())
            .or_default()
            .push(item.current_rate);
    }

    let mut categories = BTreeMap::new();
    for (category, rates) in by_category {
        let own = if rates.len() >= min_category_samples {
            Baseline::from_rates(&rates)
        } else {
            None
        };
        let entry = match own {
            Some(baseline) => CategoryBaseline {
                members: rates.len(),
                baseline,
                uses_facility: false,
            },
            None => CategoryBaseline {
                members: rates.len(),
                baseline: facility,
                uses_facility: true,
            },
        };
        debug!(
            category,
            members = entry.members,
            mean_rate = entry.baseline.mean_rate,
            std_dev_rate = entry.baseline.std_dev_rate,
            uses_facility = entry.uses_facility,
            "category baseline"
        );
        categories.insert(category.to_string(), entry);
    }

    Some(Baselines {
        facility,
        categories,
    })
}

/// Rescale a rate to the 0..=200 IQ scale, ties rounding to even.
pub fn to_score(rate: f64, mean: f64, std_dev: f64) -> i32 {
    let z = (rate - mean) / std_dev;
    let raw = (100.0 + 15.0 * z).round_ties_even();
    raw.clamp(f64::from(MIN_IQ), f64::from(MAX_IQ)) as i32
}

pub fn classify(score: i32) -> Band {
    match score {
        s if s < 90 => Band::BelowAverage,
        90..=110 => Band::Average,
        _ => Band::AboveAverage,
    }
}

pub fn trend_for(period_change: i64) -> Trend {
    if period_change.unsigned_abs() < STABLE_CHANGE_THRESHOLD {
        Trend::Stable
    } else if period_change > 0 {
        Trend::Up
    } else {
        Trend::Down
    }
}

/// Score every record and the facility as a whole.
pub fn score_all(
    records: &[UtilizationRecord],
    config: &ScoringConfig,
) -> Result<ScoreRun, IqError> {
    config.validate()?;
    let rated = compute_rates(records, config.period_hours)?;

    let Some(baselines) = compute_baselines(&rated, config.min_category_samples) else {
        info!(records = 0, "no records to score");
        return Ok(ScoreRun {
            records: Vec::new(),
            facility: FacilityScore {
                score: NEUTRAL_IQ,
                band: classify(NEUTRAL_IQ),
            },
            baselines: None,
        });
    };

    let scored: Vec<ScoredRecord> = rated
        .into_iter()
        .map(|item| {
            let baseline = baselines.for_category(&item.record.category);
            let iq = to_score(item.current_rate, baseline.mean_rate, baseline.std_dev_rate);
            let iq_prev = to_score(item.prior_rate, baseline.mean_rate, baseline.std_dev_rate);
            let trend = trend_for(item.record.period_change);
            ScoredRecord {
                record: item.record,
                current_rate: item.current_rate,
                prior_rate: item.prior_rate,
                iq,
                iq_prev,
                delta_iq: iq - iq_prev,
                trend,
            }
        })
        .collect();

    let total: i64 = scored.iter().map(|item| i64::from(item.iq)).sum();
    let score = (total as f64 / scored.len() as f64).round_ties_even() as i32;
    let facility = FacilityScore {
        score,
        band: classify(score),
    };

    info!(
        records = scored.len(),
        categories = baselines.categories.len(),
        facility_iq = facility.score,
        band = %facility.band,
        "scored utilization records"
    );

    Ok(ScoreRun {
        records: scored,
        facility,
        baselines: Some(baselines),
    })
}
