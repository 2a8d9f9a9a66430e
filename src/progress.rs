use regex::Regex;

/// Matches ffmpeg's `time=HH:MM:SS.ff` (or `time=MM:SS.ff`) status token.
const TIME_PATTERN: &str = r"time=(\d+(?::\d+){1,2}(?:\.\d+)?)";

// Unterminated output beyond this is dropped, keeping only the tail that may
// hold the start of a status token.
const MAX_PENDING: usize = 16 * 1024;
const PENDING_TAIL: usize = 256;

/// Turns the encoder's stderr into a completion percentage.
///
/// Text is fed in as it arrives. Only segments terminated by `\r` or `\n` are
/// scanned, and each byte is scanned once, so a timestamp split across two
/// reads is never mistaken for an earlier one.
pub struct Scraper {
    total_seconds: f64,
    pending: String,
    elapsed: Option<f64>,
    time: Regex,
}

impl Scraper {
    pub fn new(total_seconds: f64) -> Self {
        Scraper {
            total_seconds,
            pending: String::new(),
            elapsed: None,
            time: Regex::new(TIME_PATTERN).expect("valid time pattern"),
        }
    }

    /// Feeds a chunk of diagnostic text. Returns the new percentage if the
    /// chunk completed at least one status line carrying a timestamp.
    pub fn feed(&mut self, text: &str) -> Option<u8> {
        self.pending.push_str(text);

        let end = match self.pending.rfind(|c: char| c == '\r' || c == '\n') {
            Some(end) => end,
            None => {
                self.trim_pending();
                return None;
            }
        };

        let latest = self.time.captures_iter(&self.pending[..end])
            .filter_map(|caps| caps.get(1))
            .last()
            .and_then(|time| parse_timestamp(time.as_str()));

        self.pending.drain(..=end);

        let elapsed = latest?;
        self.elapsed = Some(elapsed);
        Some(percent(elapsed, self.total_seconds))
    }

    fn trim_pending(&mut self) {
        if self.pending.len() <= MAX_PENDING {
            return;
        }

        let mut cut = self.pending.len() - PENDING_TAIL;
        while !self.pending.is_char_boundary(cut) {
            cut += 1;
        }
        self.pending.drain(..cut);
    }

    pub fn elapsed(&self) -> Option<f64> {
        self.elapsed
    }

    pub fn current(&self) -> u8 {
        self.elapsed.map_or(0, |elapsed| percent(elapsed, self.total_seconds))
    }
}

pub fn parse_timestamp(time: &str) -> Option<f64> {
    let parts = time.split(':')
        .map(|part| part.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [hours, minutes, seconds] => Some(hours * 3600. + minutes * 60. + seconds),
        [minutes, seconds] => Some(minutes * 60. + seconds),
        _ => None,
    }
}

/// `elapsed / total * 100`, truncated and clamped to 0..=100.
pub fn percent(elapsed: f64, total: f64) -> u8 {
    if !(total > 0.) {
        return 0;
    }

    let percent = (elapsed / total * 100.).trunc();
    if percent >= 100. {
        100
    } else if percent > 0. {
        percent as u8
    } else {
        0
    }
}
