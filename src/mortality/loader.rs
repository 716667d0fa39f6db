//! CSV-based mortality table loader
//!
//! Each file holds one table with header `age,female,male` and one row per
//! age starting at 0. The file stem is the table id.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use super::registry::MortalityRegistry;
use super::table::{MortalityTable, MortalityTableId, SurvivalCurve};
use crate::error::{AnnuityError, Result};

/// Default directory searched for custom tables
pub const DEFAULT_TABLES_PATH: &str = "data/mortality";

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct RateRow {
    age: usize,
    female: f64,
    male: f64,
}

/// Load one table from any CSV reader
pub fn load_table_from_reader<R: Read>(id: MortalityTableId, reader: R) -> Result<MortalityTable> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut female = Vec::new();
    let mut male = Vec::new();

    for result in reader.deserialize() {
        let row: RateRow = result?;

        if row.age != male.len() {
            return Err(AnnuityError::invalid_table(
                id.as_str(),
                format!("expected age {} but found age {}", male.len(), row.age),
            ));
        }
        for (sex, rate) in [("female", row.female), ("male", row.male)] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(AnnuityError::invalid_table(
                    id.as_str(),
                    format!("{} rate {} at age {} is outside [0, 1]", sex, rate, row.age),
                ));
            }
        }

        female.push(row.female);
        male.push(row.male);
    }

    if male.is_empty() {
        return Err(AnnuityError::invalid_table(id.as_str(), "no rates found"));
    }

    let table = MortalityTable::new(id, SurvivalCurve::new(male), SurvivalCurve::new(female));
    if !table.male.is_non_decreasing() || !table.female.is_non_decreasing() {
        warn!("Mortality table {} has rates that decrease with age", table.id);
    }

    Ok(table)
}

/// Load one table from a CSV file; the id is taken from the file stem
pub fn load_table(path: &Path) -> Result<MortalityTable> {
    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(MortalityTableId::parse)
        .ok_or_else(|| {
            AnnuityError::invalid_table(path.display().to_string(), "file name is not a table id")
        })?;

    let file = File::open(path)?;
    load_table_from_reader(id, file)
}

/// Load every `*.csv` table in a directory, sorted by file name
pub fn load_tables(dir: &Path) -> Result<Vec<MortalityTable>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            paths.push(path);
        }
    }
    paths.sort();

    let tables = paths
        .iter()
        .map(|path| load_table(path))
        .collect::<Result<Vec<_>>>()?;

    info!("Loaded {} mortality tables from {}", tables.len(), dir.display());
    Ok(tables)
}

/// Registry of the built-in tables plus every CSV table found in `dir`
///
/// Without a directory, `DEFAULT_TABLES_PATH` is used when it exists and the
/// shared standard registry is returned otherwise.
pub fn load_registry(dir: Option<&Path>) -> Result<Arc<MortalityRegistry>> {
    let default_dir = Path::new(DEFAULT_TABLES_PATH);
    let dir = dir.or_else(|| default_dir.is_dir().then_some(default_dir));

    match dir {
        Some(dir) => {
            let tables = load_tables(dir)?;
            Ok(Arc::new(MortalityRegistry::builtin().with_tables(tables)))
        }
        None => Ok(MortalityRegistry::standard()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortality::Sex;

    fn table_id() -> MortalityTableId {
        MortalityTableId::parse("TEST")
    }

    #[test]
    fn test_load_from_reader() {
        let data = "age,female,male\n0,0.001,0.002\n1,0.002,0.003\n2,0.004,0.006\n";
        let table = load_table_from_reader(table_id(), data.as_bytes()).unwrap();

        assert_eq!(table.id, table_id());
        assert_eq!(table.male.len(), 3);
        assert_eq!(table.curve(Sex::Male).rate(2), Some(0.006));
        assert_eq!(table.curve(Sex::Female).rate(0), Some(0.001));
    }

    #[test]
    fn test_load_trims_whitespace() {
        let data = "age, female, male\n0, 0.1, 0.2\n";
        let table = load_table_from_reader(table_id(), data.as_bytes()).unwrap();
        assert_eq!(table.male.rate(0), Some(0.2));
    }

    #[test]
    fn test_rejects_gap_in_ages() {
        let data = "age,female,male\n0,0.001,0.002\n2,0.002,0.003\n";
        let err = load_table_from_reader(table_id(), data.as_bytes()).unwrap_err();
        assert!(matches!(err, AnnuityError::InvalidTable { .. }));
    }

    #[test]
    fn test_rejects_rate_out_of_range() {
        let data = "age,female,male\n0,0.001,1.5\n";
        let err = load_table_from_reader(table_id(), data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("outside [0, 1]"));
    }

    #[test]
    fn test_rejects_empty_table() {
        let data = "age,female,male\n";
        assert!(load_table_from_reader(table_id(), data.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_malformed_row() {
        let data = "age,female,male\n0,abc,0.1\n";
        let err = load_table_from_reader(table_id(), data.as_bytes()).unwrap_err();
        assert!(matches!(err, AnnuityError::Csv(_)));
    }

    #[test]
    fn test_load_tables_from_directory() {
        let dir = std::env::temp_dir().join(format!("annuity_tables_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("FLAT.csv"), "age,female,male\n0,0.1,0.1\n1,0.1,0.1\n").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let tables = load_tables(&dir).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].id, MortalityTableId::parse("FLAT"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_registry_with_directory() {
        let dir = std::env::temp_dir().join(format!("annuity_registry_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let rows: String = (0..100).map(|age| format!("{},0.3,0.3\n", age)).collect();
        std::fs::write(dir.join("HARSH.csv"), format!("age,female,male\n{}", rows)).unwrap();

        let registry = load_registry(Some(&dir)).unwrap();
        let id = MortalityTableId::parse("HARSH");
        assert!(registry.contains(&id));
        assert_eq!(registry.table_ids().len(), 6);
        // The custom table resolves to its own curve, not the fallback
        assert_eq!(registry.curve(&id, Sex::Male).rate(65), Some(0.3));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_registry_missing_directory() {
        let dir = std::env::temp_dir().join("annuity_registry_does_not_exist");
        assert!(matches!(load_registry(Some(&dir)), Err(AnnuityError::Io(_))));
    }
}
