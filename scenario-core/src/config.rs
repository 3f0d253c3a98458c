use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Where the scenario document lives and how it was saved.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ScenarioFileConfig {
    pub path: String,
}

// Settings for the fate-sampling demo loop run by the engine binary.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FateRunConfig {
    pub steps: u32,
    pub record_interval_steps: u32,
    pub sample_seed: u64,
}

// Output settings, mirroring the snapshot/summary plumbing of the runner.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_snapshots: bool,
    #[serde(default = "default_save_summary")]
    pub save_summary_csv: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

fn default_save_summary() -> bool {
    true
}

// Main run configuration, loaded from scenario.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunConfig {
    pub scenario: ScenarioFileConfig,
    pub fate: FateRunConfig,
    pub output: OutputConfig,
}

impl RunConfig {
    /// Loads the run configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: RunConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        // --- Add Validation ---
        if config.scenario.path.is_empty() {
            anyhow::bail!("scenario.path must not be empty.");
        }
        if config.fate.steps == 0 {
            anyhow::bail!("fate.steps must be greater than 0.");
        }
        if config.fate.record_interval_steps == 0 {
            anyhow::bail!("fate.record_interval_steps must be greater than 0.");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
            [scenario]
            path = "wound_healing.scenario.json"

            [fate]
            steps = 100
            record_interval_steps = 10
            sample_seed = 42

            [output]
            base_filename = "run1"
            save_snapshots = true
            format = "messagepack"
        "#;
        let config: RunConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.fate.steps, 100);
        assert_eq!(config.output.format.as_deref(), Some("messagepack"));
        // Defaulted field.
        assert!(config.output.save_summary_csv);
    }
}
