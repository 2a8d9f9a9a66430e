use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;
use vidconv::{Bitrate, Config, Failure, Job, Reporter, Resolution, SystemRunner, Watcher};

#[derive(Debug, StructOpt)]
#[structopt(name = "vidconv")]
struct Opt {
    /// The input video filename
    #[structopt(short, long, required_unless = "list-resolutions")]
    input: Option<PathBuf>,
    /// The video bitrate in kbps (500-5000)
    #[structopt(short, long)]
    bitrate: Option<Bitrate>,
    /// Scale the video to WIDTH:HEIGHT, e.g. 1280:720
    #[structopt(short, long)]
    resolution: Option<Resolution>,
    /// Overwrite the output file if it exists
    #[structopt(short = "y", long)]
    overwrite: bool,
    /// Read settings from a JSON file
    #[structopt(long)]
    config: Option<PathBuf>,
    /// Path to the ffmpeg executable
    #[structopt(long)]
    ffmpeg: Option<PathBuf>,
    /// Path to the ffprobe executable
    #[structopt(long)]
    ffprobe: Option<PathBuf>,
    /// Give up when the conversion takes longer than this many seconds
    #[structopt(long)]
    timeout: Option<u64>,
    /// Print the resolution presets and exit
    #[structopt(long)]
    list_resolutions: bool,
}

/// Draws progress as a single updating line on stderr.
#[derive(Default)]
struct Console {
    last: Option<u8>,
}

impl Reporter for Console {
    fn progress(&mut self, percent: u8) {
        if self.last == Some(percent) {
            return;
        }

        self.last = Some(percent);
        eprint!("\rEncoding progress: {:>3}%", percent);
        io::stderr().flush().ok();
    }

    fn failure(&mut self, failure: Failure) {
        self.last = None;
        eprintln!();
        eprintln!("Conversion error: {}", failure);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();

    let opt = Opt::from_args();

    if opt.list_resolutions {
        for resolution in &Resolution::PRESETS {
            println!("{}", resolution);
        }
        return;
    }

    let config = match load_config(&opt) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(-1);
        }
    };

    let input = match opt.input {
        Some(input) => input,
        None => {
            eprintln!("Error: no input file given");
            process::exit(-1);
        }
    };

    let job = Job {
        input,
        bitrate: opt.bitrate.unwrap_or(config.bitrate),
        resolution: opt.resolution,
        overwrite: opt.overwrite,
    };

    let mut watcher = Watcher::new(SystemRunner).with_timeout(config.timeout());
    let mut console = Console::default();

    match vidconv::convert(&config, &job, &mut watcher, &mut console) {
        Ok(output) => {
            eprintln!();
            eprintln!("Done! You can open the output file '{}' to see the result", output.display());
        }
        // already shown by the console
        Err(vidconv::Error::Convert { .. }) => process::exit(-1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(-1);
        }
    }
}

fn load_config(opt: &Opt) -> Result<Config, vidconv::config::Error> {
    let mut config = match &opt.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(ffmpeg) = &opt.ffmpeg {
        config.ffmpeg = ffmpeg.clone();
    }
    if let Some(ffprobe) = &opt.ffprobe {
        config.ffprobe = ffprobe.clone();
    }
    if opt.timeout.is_some() {
        config.timeout_secs = opt.timeout;
    }

    Ok(config)
}
