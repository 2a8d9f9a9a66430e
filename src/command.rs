use std::ffi::{OsStr, OsString};
use std::fmt;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use snafu::{OptionExt, ResultExt};

#[cfg(target_os = "windows")]
pub const FFMPEG_EXE: &str = "ffmpeg.exe";
#[cfg(not(target_os = "windows"))]
pub const FFMPEG_EXE: &str = "ffmpeg";

pub const OUTPUT_EXTENSION: &str = "mp4";
pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "aac";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Bitrate must be between {} and {} kbps, got {}", Bitrate::MIN, Bitrate::MAX, kbps))]
    BitrateOutOfRange {
        kbps: u32,
    },
    #[snafu(display("Invalid bitrate '{}': {}", input, source))]
    ParseBitrate {
        input: String,
        source: ParseIntError,
    },
    #[snafu(display("Invalid resolution '{}', expected WIDTH:HEIGHT", input))]
    MalformedResolution {
        input: String,
    },
    #[snafu(display("Invalid resolution '{}': {}", input, source))]
    ParseResolution {
        input: String,
        source: ParseIntError,
    },
    #[snafu(display("Resolution must be non-zero, got {}", input))]
    EmptyResolution {
        input: String,
    },
    #[snafu(display("Input '{}' has no file name", input.display()))]
    NoFileName {
        input: PathBuf,
    },
}

/// Target video bitrate in kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "u32")]
pub struct Bitrate(u32);

impl Bitrate {
    pub const MIN: u32 = 500;
    pub const MAX: u32 = 5000;

    pub fn new(kbps: u32) -> Result<Self, Error> {
        ensure!(kbps >= Self::MIN && kbps <= Self::MAX, BitrateOutOfRange { kbps });
        Ok(Bitrate(kbps))
    }

    pub fn kbps(self) -> u32 {
        self.0
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        Bitrate(Self::MIN)
    }
}

impl FromStr for Bitrate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        let kbps = s.trim_end_matches('k')
            .parse::<u32>()
            .context(ParseBitrate { input: s })?;

        Bitrate::new(kbps)
    }
}

impl std::convert::TryFrom<u32> for Bitrate {
    type Error = Error;

    fn try_from(kbps: u32) -> Result<Self, Error> {
        Bitrate::new(kbps)
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}k", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const PRESETS: [Resolution; 4] = [
        Resolution { width: 1920, height: 1080 },
        Resolution { width: 1280, height: 720 },
        Resolution { width: 640, height: 480 },
        Resolution { width: 320, height: 240 },
    ];

    pub fn scale_filter(&self) -> String {
        format!("scale={}", self)
    }
}

/// Accepts both `1280:720` and `1280x720`.
impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        let mut parts = s.splitn(2, |c: char| c == ':' || c == 'x' || c == 'X');
        let (width, height) = match (parts.next(), parts.next()) {
            (Some(width), Some(height)) => (width, height),
            _ => return MalformedResolution { input: s }.fail(),
        };

        let width = width.parse::<u32>().context(ParseResolution { input: s })?;
        let height = height.parse::<u32>().context(ParseResolution { input: s })?;
        ensure!(width > 0 && height > 0, EmptyResolution { input: s });

        Ok(Resolution { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Everything the user picked for one conversion.
#[derive(Debug, Clone)]
pub struct Job {
    pub input: PathBuf,
    pub bitrate: Bitrate,
    pub resolution: Option<Resolution>,
    pub overwrite: bool,
}

impl Job {
    pub fn output(&self) -> Result<PathBuf, Error> {
        output_path(&self.input)
    }

    pub fn args(&self) -> Result<Vec<OsString>, Error> {
        let output = self.output()?;
        let mut args = Vec::<OsString>::new();

        if self.overwrite {
            args.push("-y".into());
        }

        args.push("-i".into());
        args.push(self.input.clone().into_os_string());

        if let Some(resolution) = self.resolution {
            args.push("-vf".into());
            args.push(resolution.scale_filter().into());
        }

        args.push("-b:v".into());
        args.push(self.bitrate.to_string().into());
        args.extend(["-c:v", VIDEO_CODEC, "-c:a", AUDIO_CODEC].iter().map(OsString::from));
        args.push(output.into_os_string());

        Ok(args)
    }
}

/// The input's file stem with the output extension appended, relative to the
/// working directory. Only the last extension is stripped, so unlike a
/// cut at the first dot `holiday.2019.avi` becomes `holiday.2019.mp4`.
pub fn output_path(input: &Path) -> Result<PathBuf, Error> {
    let stem = input.file_stem()
        .filter(|stem| !stem.is_empty())
        .context(NoFileName { input })?;

    let mut name = stem.to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);

    Ok(PathBuf::from(name))
}

/// Renders an argument list the way a shell user would type it, for logs.
pub fn display_command(program: &Path, args: &[OsString]) -> String {
    let mut line = quote(program.as_os_str());
    for arg in args {
        line.push(' ');
        line.push_str(&quote(arg));
    }
    line
}

fn quote(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        format!("{:?}", arg)
    } else {
        arg.into_owned()
    }
}
