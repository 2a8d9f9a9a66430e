use snafu::ResultExt;
use std::path::{Path, PathBuf};
use std::io;
use std::process::{Command, ExitStatus, Stdio};

#[cfg(target_os = "windows")]
pub const FFPROBE_EXE: &str = "ffprobe.exe";
#[cfg(not(target_os = "windows"))]
pub const FFPROBE_EXE: &str = "ffprobe";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Could not run '{}': {}", prober.display(), source))]
    ProcessError {
        prober: PathBuf,
        source: io::Error,
    },
    #[snafu(display("'{}' exited unsuccessfully ({}): {}", prober.display(), status, stderr.trim()))]
    ProberFailed {
        prober: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[snafu(display("Could not determine the duration of '{}' (got {:?})", path.display(), output))]
    InvalidDuration {
        path: PathBuf,
        output: String,
    },
}

/// Container duration of `path` in seconds. Blocks until the prober exits.
pub fn duration(prober: &Path, path: &Path) -> Result<f64, Error> {
    let output = Command::new(prober)
        .args(&[
            "-v", "error",
            "-show_entries", "format=duration",
            "-of", "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .context(ProcessError { prober })?;

    ensure!(output.status.success(), ProberFailed {
        prober,
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr),
    });

    let stdout = String::from_utf8_lossy(&output.stdout);
    let seconds = parse_duration(&stdout);
    debug!("{} reports {:?} -> {} secs", prober.display(), stdout.trim(), seconds);

    ensure!(seconds > 0., InvalidDuration {
        path,
        output: stdout.trim(),
    });

    Ok(seconds)
}

/// Parses prober output into seconds. Anything that isn't a finite number
/// yields `0.`, which callers must treat as a failure.
pub fn parse_duration(output: &str) -> f64 {
    match output.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() => seconds,
        _ => 0.,
    }
}
