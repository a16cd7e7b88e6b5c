use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{Polarity, SearchConfig};

/// Run configuration, loaded from a JSON case file. Key names follow the
/// historical case-file generator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CaseFile {
    pub dmsp_files: Vec<PathBuf>,
    pub omniweb_files: Vec<PathBuf>,
    pub event_output: PathBuf,
    pub plot_output: PathBuf,
    #[serde(default)]
    pub reverse_effect: bool,
    #[serde(default = "default_interval_length")]
    pub interval_length: f64,
    #[serde(default = "default_max_energy")]
    pub max_energy_analyzed: f64,
}

fn default_interval_length() -> f64 {
    SearchConfig::default().interval_length_s
}

fn default_max_energy() -> f64 {
    SearchConfig::default().max_energy_ev
}

impl CaseFile {
    pub fn load(path: &Path) -> Result<CaseFile, Box<dyn std::error::Error>> {
        let reader = BufReader::new(File::open(path)?);
        let case: CaseFile = serde_json::from_reader(reader)?;
        Ok(case)
    }

    pub fn polarity(&self) -> Polarity {
        Polarity::from_reverse_flag(self.reverse_effect)
    }

    /// The run's search configuration: case-file overrides on top of the
    /// built-in defaults.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            interval_length_s: self.interval_length,
            max_energy_ev: self.max_energy_analyzed,
            ..SearchConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_full_case_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.json");
        std::fs::write(
            &path,
            r#"{
                "DMSP_FILES": ["data/dmsp-f16_2014011.bin"],
                "OMNIWEB_FILES": ["data/omni_min2014.lst"],
                "EVENT_OUTPUT": "out/events.csv",
                "PLOT_OUTPUT": "out/plots",
                "REVERSE_EFFECT": true,
                "INTERVAL_LENGTH": 900.0,
                "MAX_ENERGY_ANALYZED": 25000.0
            }"#,
        )
        .unwrap();

        let case = CaseFile::load(&path).unwrap();
        assert_eq!(case.dmsp_files.len(), 1);
        assert_eq!(case.polarity(), Polarity::Reverse);
        let config = case.search_config();
        assert!((config.interval_length_s - 900.0).abs() < 1e-9);
        assert!((config.max_energy_ev - 25_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.json");
        std::fs::write(
            &path,
            r#"{
                "DMSP_FILES": [],
                "OMNIWEB_FILES": [],
                "EVENT_OUTPUT": "out/events.csv",
                "PLOT_OUTPUT": "out/plots"
            }"#,
        )
        .unwrap();

        let case = CaseFile::load(&path).unwrap();
        assert_eq!(case.polarity(), Polarity::Forward);
        let defaults = SearchConfig::default();
        let config = case.search_config();
        assert!((config.interval_length_s - defaults.interval_length_s).abs() < 1e-9);
        assert!((config.max_energy_ev - defaults.max_energy_ev).abs() < 1e-9);
    }

    #[test]
    fn test_load_rejects_missing_required_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.json");
        std::fs::write(&path, r#"{"DMSP_FILES": []}"#).unwrap();
        assert!(CaseFile::load(&path).is_err());
    }
}
