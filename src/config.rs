//! Command line and config file handling
//!
//! Settings are resolved in three layers: built-in defaults, then the TOML
//! config file, then command line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;
use crate::controller::TransportSteps;
use crate::model::{PreviousFallback, DEFAULT_VOLUME};

const DEFAULT_CONFIG_FILE: &str = "mixtape.toml";
const DEFAULT_LOG_DIR: &str = ".logs";
const MIN_TICK_MS: u64 = 20;

#[derive(Parser, Debug, Default)]
#[command(name = "mixtape")]
#[command(about = "Terminal music player for curated playlists")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ./mixtape.toml when present)
    #[arg(short, long, env = "MIXTAPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog TOML file; the built-in catalog is used when omitted
    #[arg(long, env = "MIXTAPE_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Initial volume between 0 and 1
    #[arg(long)]
    pub volume: Option<f32>,

    /// Directory for daily log files
    #[arg(long, env = "MIXTAPE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Position report interval in milliseconds
    #[arg(long)]
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub catalog: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub playback: PlaybackSection,
    pub audio: AudioSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSection {
    pub volume: Option<f32>,
    /// Percent of the track per seek key press
    pub seek_step: Option<f64>,
    pub volume_step: Option<f32>,
    pub previous_outside_playlist: Option<PreviousFallback>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    pub tick_ms: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML from {:?}", path))
    }
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub volume: f32,
    pub steps: TransportSteps,
    pub previous_fallback: PreviousFallback,
    pub audio: AudioConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: None,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            volume: DEFAULT_VOLUME,
            steps: TransportSteps::default(),
            previous_fallback: PreviousFallback::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Settings {
    /// Read the config file named on the command line, or `mixtape.toml` if
    /// it exists, and layer the command line on top
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                FileConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => FileConfig::default(),
        };
        Ok(Self::resolve(cli, &file))
    }

    pub fn resolve(cli: &Cli, file: &FileConfig) -> Self {
        let defaults = Self::default();

        let volume = cli.volume.or(file.playback.volume).unwrap_or(defaults.volume);
        let seek_step = file.playback.seek_step.unwrap_or(defaults.steps.seek);
        let volume_step = file.playback.volume_step.unwrap_or(defaults.steps.volume);
        let tick_ms = cli.tick_ms.or(file.audio.tick_ms);

        Self {
            catalog: cli.catalog.clone().or_else(|| file.catalog.clone()),
            log_dir: cli
                .log_dir
                .clone()
                .or_else(|| file.log_dir.clone())
                .unwrap_or(defaults.log_dir),
            volume: if volume.is_finite() {
                volume.clamp(0.0, 1.0)
            } else {
                defaults.volume
            },
            steps: TransportSteps {
                seek: if seek_step.is_finite() && seek_step > 0.0 {
                    seek_step.min(100.0)
                } else {
                    defaults.steps.seek
                },
                volume: if volume_step.is_finite() && volume_step > 0.0 {
                    volume_step.min(1.0)
                } else {
                    defaults.steps.volume
                },
            },
            previous_fallback: file
                .playback
                .previous_outside_playlist
                .unwrap_or(defaults.previous_fallback),
            audio: AudioConfig {
                tick: tick_ms
                    .map(|ms| Duration::from_millis(ms.max(MIN_TICK_MS)))
                    .unwrap_or(defaults.audio.tick),
                connect_timeout: file
                    .audio
                    .connect_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.audio.connect_timeout),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_file_or_flags() {
        let settings = Settings::resolve(&Cli::default(), &FileConfig::default());
        assert_eq!(settings.volume, DEFAULT_VOLUME);
        assert_eq!(settings.log_dir, PathBuf::from(".logs"));
        assert_eq!(settings.previous_fallback, PreviousFallback::Ignore);
        assert_eq!(settings.audio.tick, Duration::from_millis(250));
        assert!(settings.catalog.is_none());
    }

    #[test]
    fn loads_file_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
catalog = "music/catalog.toml"

[playback]
volume = 0.8
seek_step = 10.0
previous_outside_playlist = "restart"

[audio]
tick_ms = 100
connect_timeout_secs = 3
"#
        )
        .unwrap();

        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            ..Cli::default()
        };
        let settings = Settings::load(&cli).unwrap();
        assert_eq!(settings.catalog, Some(PathBuf::from("music/catalog.toml")));
        assert_eq!(settings.volume, 0.8);
        assert_eq!(settings.steps.seek, 10.0);
        assert_eq!(settings.previous_fallback, PreviousFallback::Restart);
        assert_eq!(settings.audio.tick, Duration::from_millis(100));
        assert_eq!(settings.audio.connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn flags_override_file() {
        let file: FileConfig = toml::from_str(
            r#"
log_dir = "/var/log/mixtape"
[playback]
volume = 0.2
"#,
        )
        .unwrap();
        let cli = Cli {
            volume: Some(0.9),
            log_dir: Some(PathBuf::from("logs")),
            ..Cli::default()
        };

        let settings = Settings::resolve(&cli, &file);
        assert_eq!(settings.volume, 0.9);
        assert_eq!(settings.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let file: FileConfig = toml::from_str(
            r#"
[playback]
seek_step = -4.0
volume_step = 5.0
"#,
        )
        .unwrap();
        let cli = Cli {
            volume: Some(3.0),
            tick_ms: Some(1),
            ..Cli::default()
        };

        let settings = Settings::resolve(&cli, &file);
        assert_eq!(settings.volume, 1.0);
        assert_eq!(settings.steps.seek, 5.0);
        assert_eq!(settings.steps.volume, 1.0);
        assert_eq!(settings.audio.tick, Duration::from_millis(20));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/no/such/mixtape.toml")),
            ..Cli::default()
        };
        let err = Settings::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn unknown_fallback_is_rejected() {
        let parsed: Result<FileConfig, _> = toml::from_str(
            r#"
[playback]
previous_outside_playlist = "shuffle"
"#,
        );
        assert!(parsed.is_err());
    }
}
