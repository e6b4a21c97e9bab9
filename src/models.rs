use serde::{Deserialize, Serialize};

/// Raw utilization measurement for one piece of equipment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UtilizationRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub equipment_type: Option<String>,
    #[serde(default)]
    pub peak_hours: Option<String>,
    #[serde(default)]
    pub report_period: Option<String>,
    pub category: String,
    pub current_minutes: u32,
    pub period_change: i64,
}

impl UtilizationRecord {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        current_minutes: u32,
        period_change: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            equipment_type: None,
            peak_hours: None,
            report_period: None,
            category: category.into(),
            current_minutes,
            period_change,
        }
    }

    /// Minutes used in the prior period, floored at zero.
    pub fn prior_minutes(&self) -> u64 {
        i64::from(self.current_minutes)
            .saturating_sub(self.period_change)
            .max(0) as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Record with usage rates attached, before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedRecord {
    pub record: UtilizationRecord,
    pub current_rate: f64,
    pub prior_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: UtilizationRecord,
    pub current_rate: f64,
    pub prior_rate: f64,
    pub iq: i32,
    pub iq_prev: i32,
    pub delta_iq: i32,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baseline {
    pub mean_rate: f64,
    pub std_dev_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBaseline {
    pub members: usize,
    pub baseline: Baseline,
    pub uses_facility: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baselines {
    pub facility: Baseline,
    pub categories: std::collections::BTreeMap<String, CategoryBaseline>,
}

impl Baselines {
    /// Effective baseline for a category, falling back to the facility baseline.
    pub fn for_category(&self, category: &str) -> Baseline {
        self.categories
            .get(category)
            .map(|entry| entry.baseline)
            .unwrap_or(self.facility)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    BelowAverage,
    Average,
    AboveAverage,
}

impl Band {
    pub fn label(self) -> &'static str {
        match self {
            Band::BelowAverage => "Below Average",
            Band::Average => "Average",
            Band::AboveAverage => "Above Average",
        }
    }
}

impl Serialize for Band {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FacilityScore {
    pub score: i32,
    pub band: Band,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRun {
    pub records: Vec<ScoredRecord>,
    pub facility: FacilityScore,
    /// `None` when the run had no records.
    #[serde(skip)]
    pub baselines: Option<Baselines>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
    pub avg_iq: f64,
    pub mean_rate: f64,
    pub std_dev_rate: f64,
    pub uses_facility: bool,
}
