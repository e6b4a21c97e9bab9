use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use tracing::debug;

use crate::models::UtilizationRecord;

/// Load records from a `.csv` or `.json` file, picked by extension.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<UtilizationRecord>> {
    let records = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            read_json(file).with_context(|| format!("failed to parse {}", path.display()))?
        }
        _ => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            read_csv(file).with_context(|| format!("failed to parse {}", path.display()))?
        }
    };
    debug!(path = %path.display(), records = records.len(), "loaded utilization records");
    Ok(records)
}

/// Expected header: `id,category,current_minutes,period_change`, optionally with
/// `name`, `equipment_type`, `peak_hours` and `report_period`, which may also be
/// left empty.
pub fn read_csv<R: Read>(input: R) -> anyhow::Result<Vec<UtilizationRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<UtilizationRecord>().enumerate() {
        let record = result.with_context(|| format!("invalid row {}", index + 1))?;
        records.push(record);
    }

    ensure_unique_ids(&records)?;
    Ok(records)
}

pub fn read_json<R: Read>(input: R) -> anyhow::Result<Vec<UtilizationRecord>> {
    let records: Vec<UtilizationRecord> = serde_json::from_reader(input)?;
    ensure_unique_ids(&records)?;
    Ok(records)
}

fn ensure_unique_ids(records: &[UtilizationRecord]) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.id.as_str()) {
            bail!("duplicate equipment id {}", record.id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iq::{classify, score_all, ScoringConfig};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn reads_csv_with_optional_columns() {
        let input = "\
id,name,equipment_type,category,current_minutes,period_change
equipment_001,Treadmill 1,Treadmill,Cardio,420,35
equipment_002,,,Strength,180,-12
";
        let records = read_csv(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("Treadmill 1"));
        assert_eq!(records[0].equipment_type.as_deref(), Some("Treadmill"));
        assert_eq!(records[1].name, None);
        assert_eq!(records[1], UtilizationRecord::new("equipment_002", "Strength", 180, -12));
    }

    #[test]
    fn reads_csv_without_descriptive_columns() {
        let input = "id,category,current_minutes,period_change\na,Cardio,300,0\n";
        let records = read_csv(input.as_bytes()).unwrap();
        assert_eq!(records, vec![UtilizationRecord::new("a", "Cardio", 300, 0)]);
    }

    #[test]
    fn rejects_negative_minutes() {
        let input = "id,category,current_minutes,period_change\na,Cardio,-5,0\n";
        assert!(read_csv(input.as_bytes()).is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let input = "id,category,current_minutes,period_change\na,Cardio,1,0\na,Strength,2,0\n";
        let err = read_csv(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("duplicate equipment id a"));
    }

    #[test]
    fn reads_json_array() {
        let input = r#"[
            {"id": "a", "category": "Cardio", "current_minutes": 336, "period_change": 0},
            {"id": "b", "name": "Bench Press 2", "category": "Strength", "current_minutes": 250, "period_change": 30}
        ]"#;
        let records = read_json(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name.as_deref(), Some("Bench Press 2"));
    }

    #[test]
    fn scores_bundled_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/week.csv");
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 14);
        assert_eq!(records[0].peak_hours.as_deref(), Some("5-8pm"));
        assert_eq!(
            records[0].report_period.as_deref(),
            Some("Week ending Aug 18, 2025")
        );

        let run = score_all(&records, &ScoringConfig::default()).unwrap();
        let baselines = run.baselines.as_ref().unwrap();
        assert!(!baselines.categories["Cardio"].uses_facility);
        assert!(!baselines.categories["Strength"].uses_facility);
        assert!(baselines.categories["Mobility"].uses_facility);
        assert_eq!(baselines.for_category("Mobility"), baselines.facility);

        for item in &run.records {
            assert!((0..=200).contains(&item.iq));
            assert!((0..=200).contains(&item.iq_prev));
            assert_eq!(item.delta_iq, item.iq - item.iq_prev);
        }
        assert_eq!(run.facility.band, classify(run.facility.score));
    }

    #[test]
    fn load_records_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("week.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        writeln!(file, "id,category,current_minutes,period_change").unwrap();
        writeln!(file, "a,Cardio,336,0").unwrap();
        assert_eq!(load_records(&csv_path).unwrap().len(), 1);

        let json_path = dir.path().join("week.json");
        std::fs::write(
            &json_path,
            r#"[{"id": "a", "category": "Cardio", "current_minutes": 1, "period_change": 0}]"#,
        )
        .unwrap();
        assert_eq!(load_records(&json_path).unwrap().len(), 1);

        assert!(load_records(&dir.path().join("missing.csv")).is_err());
    }
}
