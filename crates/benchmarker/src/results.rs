//! Durable storage for aggregated gas samples.

use {
    crate::error::Result,
    serde::{Deserialize, Serialize},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// One aggregated measurement, keyed by alias
/// (`<protocol>-<operation>-<n>`).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasRecord {
    pub alias: String,
    /// Decimal string to keep the record format independent of the
    /// producer's integer width.
    pub gas_usage: String,
}

/// Writes one JSON record per alias, each in its own file so a later
/// adapter's failure can never disturb records persisted earlier in the
/// same run. Writing an alias again overwrites the previous value.
#[derive(Clone, Debug)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn store(&self, alias: &str, gas_used: u64) -> Result<()> {
        let record = GasRecord {
            alias: alias.to_string(),
            gas_usage: gas_used.to_string(),
        };
        fs::create_dir_all(&self.dir)?;
        let path = self.path(alias);
        fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        tracing::info!(alias, gas_used, path = %path.display(), "persisted gas sample");
        Ok(())
    }

    fn path(&self, alias: &str) -> PathBuf {
        self.dir.join(format!("{alias}.json"))
    }
}

impl From<&Path> for ResultStore {
    fn from(dir: &Path) -> Self {
        Self::new(dir.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_one_record_per_alias() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::from(dir.path());

        store.store("gte-make-10", 123_456).unwrap();
        store.store("gte-take-10", 654_321).unwrap();

        let record: GasRecord = serde_json::from_str(
            &fs::read_to_string(dir.path().join("gte-make-10.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(record.alias, "gte-make-10");
        assert_eq!(record.gas_usage, "123456");
    }

    #[test]
    fn storing_the_same_alias_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::from(dir.path());

        store.store("crystal-take-10", 100).unwrap();
        store.store("crystal-take-10", 200).unwrap();

        let record: GasRecord = serde_json::from_str(
            &fs::read_to_string(dir.path().join("crystal-take-10.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(record.gas_usage, "200");
    }

    #[test]
    fn record_uses_camel_case_field_names() {
        let json = serde_json::to_string(&GasRecord {
            alias: "clober-make-10".into(),
            gas_usage: "42".into(),
        })
        .unwrap();
        assert!(json.contains("\"gasUsage\""));
    }

    #[test]
    fn creates_the_results_directory_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("results");
        let store = ResultStore::new(nested.clone());

        store.store("kuru-make-10", 1).unwrap();

        assert!(nested.join("kuru-make-10.json").exists());
    }
}
