use snafu::ResultExt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{Bitrate, FFMPEG_EXE};
use crate::probe::FFPROBE_EXE;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Could not open config {}: {}", path.display(), source))]
    OpenConfig {
        path: PathBuf,
        source: io::Error,
    },
    #[snafu(display("Could not parse config {}: {}", path.display(), source))]
    ParseConfig {
        path: PathBuf,
        source: json::Error,
    },
    #[snafu(display("poll_interval_ms must be greater than zero"))]
    ZeroPollInterval {},
}

/// Tool locations and tuning knobs, optionally read from a JSON file.
/// Fields missing from the file keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// How often the encoder is checked when it prints nothing.
    pub poll_interval_ms: u64,
    pub timeout_secs: Option<u64>,
    pub bitrate: Bitrate,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ffmpeg: PathBuf::from(FFMPEG_EXE),
            ffprobe: PathBuf::from(FFPROBE_EXE),
            poll_interval_ms: 1000,
            timeout_secs: None,
            bitrate: Bitrate::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, Error> {
        let file = File::open(path).context(OpenConfig { path })?;
        let config = json::from_reader::<_, Config>(BufReader::new(file))
            .context(ParseConfig { path })?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        ensure!(self.poll_interval_ms > 0, ZeroPollInterval);
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
