#[macro_use] extern crate serde_derive;
#[macro_use] extern crate snafu;
#[macro_use] extern crate log;
extern crate serde_json as json;
use std::path::{Path, PathBuf};
use std::fs::{self, File};
use std::io;
use snafu::ResultExt;

pub mod command;
pub mod config;
pub mod probe;
pub mod progress;
pub mod watch;

pub use command::{Bitrate, Job, Resolution};
pub use config::Config;
pub use watch::{Failure, Reporter, Runner, SystemRunner, Watcher};

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Could not open input {}: {}", input.display(), source))]
    OpenInput {
        input: PathBuf,
        source: io::Error,
    },
    #[snafu(display("Could not probe '{}': {}", input.display(), source))]
    ProbeInput {
        input: PathBuf,
        source: probe::Error,
    },
    #[snafu(display("Could not build the encoder command: {}", source))]
    BuildCommand {
        source: command::Error,
    },
    #[snafu(display("Output {} already exists (pass -y to overwrite)", output.display()))]
    OutputExists {
        output: PathBuf,
    },
    #[snafu(display("Output {} would overwrite the input", output.display()))]
    OutputIsInput {
        output: PathBuf,
    },
    #[snafu(display("Could not convert: {}", source))]
    Convert {
        source: watch::Error,
    },
}

/// Converts `job.input` into the working directory, blocking until the
/// encoder exits. Returns the path of the written file.
pub fn convert<R: Runner>(
    config: &Config,
    job: &Job,
    watcher: &mut Watcher<R>,
    reporter: &mut dyn Reporter,
) -> Result<PathBuf> {
    let input = job.input.as_path();

    // Check the input file can be opened successfully
    File::open(input)
        .context(OpenInput { input })?;

    let output = job.output().context(BuildCommand)?;
    check_output(input, &output, job.overwrite)?;

    let total_seconds = probe::duration(&config.ffprobe, input)
        .context(ProbeInput { input })?;

    let args = job.args().context(BuildCommand)?;
    debug!("{}", command::display_command(&config.ffmpeg, &args));

    eprintln!("Converting {} ({:.1} secs) to {} at {}",
        input.display(),
        total_seconds,
        output.display(),
        job.bitrate,
    );

    watcher.start(&config.ffmpeg, &args, total_seconds, reporter).context(Convert)?;
    watcher.wait(config.poll_interval(), reporter).context(Convert)?;

    Ok(output)
}

fn check_output(input: &Path, output: &Path, overwrite: bool) -> Result {
    if !output.exists() {
        return Ok(());
    }

    ensure!(!same_file(input, output), OutputIsInput { output });
    ensure!(overwrite, OutputExists { output });

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
