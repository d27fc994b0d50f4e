//! Layered CLI configuration.
//!
//! Priority (highest to lowest):
//! 1. `INTAKE_*` environment variables
//! 2. Explicit `--config` file
//! 3. `./intake.toml`
//! 4. Defaults

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG: &str = "intake.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Delay applied by the simulated submission handler.
    pub completion_delay_ms: u64,
    /// When set, submissions are written here as JSON instead of simulated.
    pub submissions_dir: Option<PathBuf>,
    /// Registry document used when `--registry` is not given.
    pub registry: Option<PathBuf>,
    /// Client reference attached to every submission unless `--client-ref` is given.
    pub client_ref: Option<String>,
    /// Intake channel attached to every submission unless `--channel` is given.
    pub channel: Option<String>,
    /// Log filter used when neither `-v` nor `RUST_LOG` is given.
    pub log_level: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            completion_delay_ms: 1500,
            submissions_dir: None,
            registry: None,
            client_ref: None,
            channel: None,
            log_level: "warn".into(),
        }
    }
}

impl IntakeConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(Path::new(PROJECT_CONFIG), explicit)
            .extract()
            .map_err(Box::new)
    }

    fn figment(project: &Path, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(IntakeConfig::default()));
        if project.exists() {
            figment = figment.merge(Toml::file(project));
        }
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("INTAKE_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config: IntakeConfig = IntakeConfig::figment(&dir.path().join("missing.toml"), None)
            .extract()
            .expect("extract");
        assert_eq!(config.completion_delay_ms, 1500);
        assert!(config.submissions_dir.is_none());
    }

    #[test]
    fn explicit_file_overrides_project_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let project = dir.path().join("intake.toml");
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&project, "completion_delay_ms = 10\nlog_level = \"info\"\n")
            .expect("write project");
        std::fs::write(&explicit, "completion_delay_ms = 20\nchannel = \"phone\"\n")
            .expect("write explicit");

        let config: IntakeConfig = IntakeConfig::figment(&project, Some(&explicit))
            .extract()
            .expect("extract");
        assert_eq!(config.completion_delay_ms, 20);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.channel.as_deref(), Some("phone"));
    }
}
