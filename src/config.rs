//! Player settings file.
//!
//! ```toml
//! backend = "auto"      # auto | cpal | null
//! render = true
//! initial_bpm = 125
//! bpm_step = 1
//! refeed_interval_ms = 10
//! stereo_separation = 0.5   # omit for mono
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use pt_audio::Backend;
use pt_engine::EngineConfig;
use serde::Deserialize;

/// Output backend as named in the config file and on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    #[default]
    Auto,
    Cpal,
    Null,
}

impl From<BackendChoice> for Backend {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Auto => Backend::Auto,
            BackendChoice::Cpal => Backend::Cpal,
            BackendChoice::Null => Backend::Null,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    pub backend: BackendChoice,
    /// Print rows as they play
    pub render: bool,
    pub initial_bpm: u16,
    pub bpm_step: u16,
    pub refeed_interval_ms: u64,
    pub stereo_separation: Option<f32>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            backend: BackendChoice::default(),
            render: true,
            initial_bpm: engine.initial_bpm,
            bpm_step: engine.bpm_step,
            refeed_interval_ms: engine.refeed_interval.as_millis() as u64,
            stereo_separation: engine.stereo_separation,
        }
    }
}

impl PlayerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_bpm: self.initial_bpm,
            bpm_step: self.bpm_step.max(1),
            refeed_interval: Duration::from_millis(self.refeed_interval_ms.max(1)),
            stereo_separation: self.stereo_separation,
        }
    }
}
