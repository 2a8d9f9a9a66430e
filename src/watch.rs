use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::progress::Scraper;

/// How long a process asked to stop gets to finish its output before it is
/// killed.
pub const STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("A conversion is already in progress"))]
    Busy {},
    #[snafu(display("{}", kind))]
    Failed {
        kind: Failure,
    },
}

/// Why a watched process did not finish successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    FailedToStart,
    Crashed,
    TimedOut,
    WriteError,
    ReadError,
    /// The process exited on its own with a non-zero code. Reported as a
    /// failure with progress reset to 0 rather than completed at 100.
    Exited(i32),
    Unknown,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Failure::FailedToStart => write!(f, "Failed to start the conversion process."),
            Failure::Crashed => write!(f, "The conversion process crashed."),
            Failure::TimedOut => write!(f, "The conversion process timed out."),
            Failure::WriteError => write!(f, "Write error occurred during conversion."),
            Failure::ReadError => write!(f, "Read error occurred during conversion."),
            Failure::Exited(code) => write!(f, "The conversion process exited with code {}.", code),
            Failure::Unknown => write!(f, "An unknown error occurred."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Starting,
    Running,
    Terminated(Result<(), Failure>),
}

impl State {
    pub fn is_active(self) -> bool {
        match self {
            State::Starting | State::Running => true,
            State::Idle | State::Terminated(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Code(i32),
    Signal,
}

impl Exit {
    pub fn success(self) -> bool {
        self == Exit::Code(0)
    }
}

impl From<std::process::ExitStatus> for Exit {
    fn from(status: std::process::ExitStatus) -> Self {
        match status.code() {
            Some(code) => Exit::Code(code),
            None => Exit::Signal,
        }
    }
}

pub trait Runner {
    type Process: Process;

    fn start(&mut self, program: &Path, args: &[OsString]) -> io::Result<Self::Process>;
}

pub trait Process {
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>>;
    fn try_wait(&mut self) -> io::Result<Option<Exit>>;
    /// Asks the program to wrap up on its own.
    fn request_stop(&mut self) -> io::Result<()>;
    fn kill(&mut self) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    type Process = SystemProcess;

    fn start(&mut self, program: &Path, args: &[OsString]) -> io::Result<SystemProcess> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take();

        Ok(SystemProcess { child, stdin })
    }
}

#[derive(Debug)]
pub struct SystemProcess {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl Process for SystemProcess {
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child.stderr.take().map(|stderr| Box::new(stderr) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> io::Result<Option<Exit>> {
        Ok(self.child.try_wait()?.map(Exit::from))
    }

    // ffmpeg finishes the file and quits when it reads `q` on stdin
    fn request_stop(&mut self) -> io::Result<()> {
        let mut stdin = self.stdin.take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin already closed"))?;
        stdin.write_all(b"q")?;
        stdin.flush()
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.kill()?;
        self.child.wait().map(drop)
    }
}

pub trait Reporter {
    fn progress(&mut self, percent: u8);
    fn failure(&mut self, failure: Failure);
}

enum Event {
    Output(String),
    ReadFailed(io::Error),
    Closed,
}

struct Active<P> {
    process: P,
    events: Option<Receiver<Event>>,
    scraper: Scraper,
    started: Instant,
}

/// Watches a single external process at a time.
///
/// `start` launches the process; the caller then drives `poll` from its own
/// loop until the state is `Terminated`. Output is read on a helper thread
/// and handed over through a channel, so `poll` never blocks longer than the
/// interval it is given.
pub struct Watcher<R: Runner> {
    runner: R,
    state: State,
    timeout: Option<Duration>,
    stop_grace: Duration,
    active: Option<Active<R::Process>>,
}

impl<R: Runner> Watcher<R> {
    pub fn new(runner: R) -> Self {
        Watcher {
            runner,
            state: State::Idle,
            timeout: None,
            stop_grace: STOP_GRACE,
            active: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Starts `program`, reporting progress against `total_seconds`.
    ///
    /// Rejected while a previous process is still being watched. A process
    /// that cannot be launched is reported as `Failure::FailedToStart`.
    pub fn start(
        &mut self,
        program: &Path,
        args: &[OsString],
        total_seconds: f64,
        reporter: &mut dyn Reporter,
    ) -> Result<(), Error> {
        ensure!(!self.state.is_active(), Busy);

        self.state = State::Starting;
        reporter.progress(0);

        let mut process = match self.runner.start(program, args) {
            Ok(process) => process,
            Err(e) => {
                warn!("Could not start {}: {}", program.display(), e);
                return self.fail(Failure::FailedToStart, reporter);
            }
        };

        let events = process.take_stderr().map(spawn_reader);
        info!("Started {}", program.display());

        self.active = Some(Active {
            process,
            events,
            scraper: Scraper::new(total_seconds),
            started: Instant::now(),
        });
        self.state = State::Running;

        Ok(())
    }

    /// Processes output that arrived within `interval` and checks whether the
    /// process is still alive.
    pub fn poll(&mut self, interval: Duration, reporter: &mut dyn Reporter) -> Result<State, Error> {
        let mut active = match self.active.take() {
            Some(active) => active,
            None => return Ok(self.state),
        };

        match active.next_event(interval) {
            Some(Event::Output(text)) => {
                if let Some(percent) = active.scraper.feed(&text) {
                    reporter.progress(percent);
                }
            }
            Some(Event::ReadFailed(e)) => {
                warn!("Could not read encoder output: {}", e);
                active.process.kill().ok();
                return self.fail(Failure::ReadError, reporter);
            }
            Some(Event::Closed) => active.events = None,
            None => {}
        }

        match active.process.try_wait() {
            Ok(Some(exit)) => {
                active.drain(reporter);
                self.finish(exit, reporter)
            }
            Ok(None) => {
                if let Some(timeout) = self.timeout {
                    if active.started.elapsed() >= timeout {
                        return self.time_out(active, timeout, reporter);
                    }
                }

                self.active = Some(active);
                Ok(self.state)
            }
            Err(e) => {
                warn!("Could not query process state: {}", e);
                active.process.kill().ok();
                self.fail(Failure::Unknown, reporter)
            }
        }
    }

    pub fn wait(&mut self, interval: Duration, reporter: &mut dyn Reporter) -> Result<(), Error> {
        loop {
            if let State::Terminated(_) = self.poll(interval, reporter)? {
                return Ok(());
            }
        }
    }

    fn finish(&mut self, exit: Exit, reporter: &mut dyn Reporter) -> Result<State, Error> {
        match exit {
            exit if exit.success() => {
                info!("Process finished");
                reporter.progress(100);
                self.state = State::Terminated(Ok(()));
                Ok(self.state)
            }
            Exit::Code(code) => self.fail(Failure::Exited(code), reporter),
            Exit::Signal => self.fail(Failure::Crashed, reporter),
        }
    }

    fn time_out(
        &mut self,
        mut active: Active<R::Process>,
        timeout: Duration,
        reporter: &mut dyn Reporter,
    ) -> Result<State, Error> {
        warn!("Process still running after {:?}, stopping it", timeout);

        let (failure, exited) = match active.process.request_stop() {
            Ok(()) => (Failure::TimedOut, active.exits_within(self.stop_grace)),
            // the pipe is gone if the process exited since the last check
            Err(e) => match active.process.try_wait() {
                Ok(Some(_)) => (Failure::TimedOut, true),
                _ => {
                    warn!("Could not ask the process to stop: {}", e);
                    (Failure::WriteError, false)
                }
            },
        };

        if !exited {
            warn!("Killing process");
            active.process.kill().ok();
        }
        self.fail(failure, reporter)
    }

    fn fail<T>(&mut self, failure: Failure, reporter: &mut dyn Reporter) -> Result<T, Error> {
        self.active = None;
        self.state = State::Terminated(Err(failure));
        reporter.progress(0);
        reporter.failure(failure);
        Failed { kind: failure }.fail()
    }
}

impl<P: Process> Active<P> {
    fn next_event(&mut self, interval: Duration) -> Option<Event> {
        let events = match &self.events {
            Some(events) => events,
            None => {
                thread::sleep(interval);
                return None;
            }
        };

        match events.recv_timeout(interval) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Event::Closed),
        }
    }

    fn exits_within(&mut self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        loop {
            match self.process.try_wait() {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(_) => return false,
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(10)));
        }
    }

    /// Feeds whatever output is already queued once the process has exited.
    fn drain(&mut self, reporter: &mut dyn Reporter) {
        let events = match self.events.take() {
            Some(events) => events,
            None => return,
        };

        loop {
            match events.try_recv() {
                Ok(Event::Output(text)) => {
                    if let Some(percent) = self.scraper.feed(&text) {
                        reporter.progress(percent);
                    }
                }
                Ok(Event::ReadFailed(_)) | Ok(Event::Closed) => break,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}

fn spawn_reader(mut stderr: Box<dyn Read + Send>) -> Receiver<Event> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut buf = [0; 4096];
        let mut carry = Vec::new();
        loop {
            let event = match stderr.read(&mut buf) {
                Ok(0) if carry.is_empty() => Event::Closed,
                Ok(0) => Event::Output(String::from_utf8_lossy(&carry.split_off(0)).into_owned()),
                Ok(n) => {
                    carry.extend_from_slice(&buf[..n]);
                    let complete = carry.len() - incomplete_tail(&carry);
                    if complete == 0 {
                        continue;
                    }
                    let rest = carry.split_off(complete);
                    let text = String::from_utf8_lossy(&carry).into_owned();
                    carry = rest;
                    Event::Output(text)
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => Event::ReadFailed(e),
            };
            let last = match event {
                Event::Output(_) => false,
                _ => true,
            };

            if tx.send(event).is_err() || last {
                break;
            }
        }
    });

    rx
}

/// Length of a UTF-8 sequence cut off at the end of `bytes`, to be completed
/// by the next read.
fn incomplete_tail(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(3);
    (start..bytes.len())
        .find(|&i| match std::str::from_utf8(&bytes[i..]) {
            Ok(_) => false,
            Err(e) => e.valid_up_to() == 0 && e.error_len().is_none(),
        })
        .map_or(0, |i| bytes.len() - i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        progress: Vec<u8>,
        failures: Vec<Failure>,
    }

    impl Reporter for Recorder {
        fn progress(&mut self, percent: u8) {
            self.progress.push(percent);
        }

        fn failure(&mut self, failure: Failure) {
            self.failures.push(failure);
        }
    }

    #[derive(Clone, Copy)]
    enum Stop {
        Ignored,
        Exits,
        Fails,
        AlreadyExited,
    }

    #[derive(Clone)]
    struct Script {
        stderr: Option<&'static str>,
        broken_stderr: bool,
        exit: Option<Exit>,
        spawn_fails: bool,
        stop: Stop,
        wait_fails: bool,
    }

    impl Default for Script {
        fn default() -> Self {
            Script {
                stderr: Some(""),
                broken_stderr: false,
                exit: None,
                spawn_fails: false,
                stop: Stop::Ignored,
                wait_fails: false,
            }
        }
    }

    struct Scripted {
        script: Script,
        killed: Rc<Cell<bool>>,
    }

    struct FakeProcess {
        script: Script,
        killed: Rc<Cell<bool>>,
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    impl Runner for Scripted {
        type Process = FakeProcess;

        fn start(&mut self, _program: &Path, _args: &[OsString]) -> io::Result<FakeProcess> {
            if self.script.spawn_fails {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
            }
            Ok(FakeProcess { script: self.script.clone(), killed: self.killed.clone() })
        }
    }

    impl Process for FakeProcess {
        fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
            if self.script.broken_stderr {
                return Some(Box::new(BrokenPipe));
            }
            self.script.stderr.take().map(|text| Box::new(Cursor::new(text)) as Box<dyn Read + Send>)
        }

        fn try_wait(&mut self) -> io::Result<Option<Exit>> {
            if self.script.wait_fails {
                return Err(io::Error::new(io::ErrorKind::Other, "no such process"));
            }
            Ok(if self.killed.get() { Some(Exit::Signal) } else { self.script.exit })
        }

        fn request_stop(&mut self) -> io::Result<()> {
            let broken = io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed");
            match self.script.stop {
                Stop::Ignored => Ok(()),
                Stop::Exits => {
                    self.script.exit = Some(Exit::Code(0));
                    Ok(())
                }
                Stop::Fails => Err(broken),
                Stop::AlreadyExited => {
                    self.script.exit = Some(Exit::Code(0));
                    Err(broken)
                }
            }
        }

        fn kill(&mut self) -> io::Result<()> {
            self.killed.set(true);
            Ok(())
        }
    }

    const TICK: Duration = Duration::from_millis(20);
    const SHORT: Duration = Duration::from_millis(50);

    fn watcher(script: Script) -> (Watcher<Scripted>, Rc<Cell<bool>>) {
        let killed = Rc::new(Cell::new(false));
        let watcher = Watcher::new(Scripted { script, killed: killed.clone() })
            .with_stop_grace(SHORT);
        (watcher, killed)
    }

    fn scripted(stderr: &'static str, exit: Option<Exit>) -> Watcher<Scripted> {
        watcher(Script { stderr: Some(stderr), exit, ..Script::default() }).0
    }

    fn fails_once_with(script: Script, timeout: Option<Duration>, expected: Failure) -> bool {
        let (watcher, killed) = watcher(script);
        let mut watcher = watcher.with_timeout(timeout);
        let mut recorder = Recorder::default();

        watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder).unwrap();
        match watcher.wait(TICK, &mut recorder) {
            Err(Error::Failed { kind }) => assert_eq!(kind, expected),
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(recorder.failures, vec![expected]);
        assert_eq!(recorder.progress.last(), Some(&0));
        assert_eq!(watcher.state(), State::Terminated(Err(expected)));
        killed.get()
    }

    #[test]
    fn start_failure_is_reported_once() {
        let (mut watcher, _) = watcher(Script { spawn_fails: true, ..Script::default() });
        let mut recorder = Recorder::default();

        let err = watcher.start(Path::new("ffmpeg"), &[], 10., &mut recorder).unwrap_err();
        match err {
            Error::Failed { kind } => assert_eq!(kind, Failure::FailedToStart),
            other => panic!("unexpected error: {}", other),
        }

        assert_eq!(recorder.failures, vec![Failure::FailedToStart]);
        assert_eq!(recorder.progress.last(), Some(&0));
        assert_eq!(watcher.state(), State::Terminated(Err(Failure::FailedToStart)));

        // nothing left to watch
        assert!(watcher.poll(TICK, &mut recorder).is_ok());
        assert_eq!(recorder.failures.len(), 1);
    }

    #[test]
    fn completion_forces_full_progress() {
        let mut watcher = scripted("time=00:00:05.00 x\r", Some(Exit::Code(0)));
        let mut recorder = Recorder::default();

        watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder).unwrap();
        watcher.wait(TICK, &mut recorder).unwrap();

        assert_eq!(watcher.state(), State::Terminated(Ok(())));
        assert_eq!(recorder.progress.first(), Some(&0));
        assert_eq!(recorder.progress.last(), Some(&100));
        assert!(recorder.failures.is_empty());
    }

    #[test]
    fn reports_intermediate_progress() {
        let mut watcher = scripted("time=00:00:05.00 x\rtime=00:00:10.00 x\r", None);
        let mut recorder = Recorder::default();

        watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder).unwrap();
        for _ in 0..5 {
            watcher.poll(TICK, &mut recorder).unwrap();
        }

        assert_eq!(watcher.state(), State::Running);
        assert_eq!(recorder.progress.last(), Some(&50));
    }

    #[test]
    fn rejects_second_start() {
        let mut watcher = scripted("", None);
        let mut recorder = Recorder::default();

        watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder).unwrap();
        match watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder) {
            Err(Error::Busy { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(watcher.state(), State::Running);
    }

    #[test]
    fn nonzero_exit_resets_progress() {
        let mut watcher = scripted("time=00:00:05.00 x\r", Some(Exit::Code(1)));
        let mut recorder = Recorder::default();

        watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder).unwrap();
        assert!(watcher.wait(TICK, &mut recorder).is_err());

        assert_eq!(recorder.failures, vec![Failure::Exited(1)]);
        assert_eq!(recorder.progress.last(), Some(&0));
    }

    #[test]
    fn signal_is_a_crash() {
        let mut watcher = scripted("", Some(Exit::Signal));
        let mut recorder = Recorder::default();

        watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder).unwrap();
        assert!(watcher.wait(TICK, &mut recorder).is_err());
        assert_eq!(recorder.failures, vec![Failure::Crashed]);
    }

    #[test]
    fn timeout_stops_the_process() {
        let mut watcher = scripted("", None).with_timeout(Some(Duration::from_millis(50)));
        let mut recorder = Recorder::default();

        watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder).unwrap();
        assert!(watcher.wait(TICK, &mut recorder).is_err());

        assert_eq!(recorder.failures, vec![Failure::TimedOut]);
        assert_eq!(watcher.state(), State::Terminated(Err(Failure::TimedOut)));
    }

    #[test]
    fn stop_request_lets_the_process_finish() {
        let script = Script { stop: Stop::Exits, ..Script::default() };
        let killed = fails_once_with(script, Some(SHORT), Failure::TimedOut);
        assert!(!killed);
    }

    #[test]
    fn ignored_stop_request_kills_after_grace() {
        let killed = fails_once_with(Script::default(), Some(SHORT), Failure::TimedOut);
        assert!(killed);
    }

    #[test]
    fn stop_after_exit_is_still_a_timeout() {
        let script = Script { stop: Stop::AlreadyExited, ..Script::default() };
        let killed = fails_once_with(script, Some(SHORT), Failure::TimedOut);
        assert!(!killed);
    }

    #[test]
    fn failed_stop_request_is_a_write_error() {
        let script = Script { stop: Stop::Fails, ..Script::default() };
        let killed = fails_once_with(script, Some(SHORT), Failure::WriteError);
        assert!(killed);
    }

    #[test]
    fn broken_stderr_is_a_read_error() {
        let script = Script { broken_stderr: true, ..Script::default() };
        let killed = fails_once_with(script, None, Failure::ReadError);
        assert!(killed);
    }

    #[test]
    fn unqueryable_process_is_unknown() {
        let script = Script { wait_fails: true, ..Script::default() };
        let killed = fails_once_with(script, None, Failure::Unknown);
        assert!(killed);
    }

    #[test]
    fn keeps_characters_split_across_reads() {
        struct Chunks(Vec<&'static [u8]>);

        impl Read for Chunks {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() {
                    return Ok(0);
                }
                let chunk = self.0.remove(0);
                buf[..chunk.len()].copy_from_slice(chunk);
                Ok(chunk.len())
            }
        }

        // "café" with the two bytes of 'é' in separate reads
        let events = spawn_reader(Box::new(Chunks(vec![&b"caf\xc3"[..], &b"\xa9 time=00:00:01.00\r"[..]])));
        let mut text = String::new();
        for event in events {
            match event {
                Event::Output(chunk) => text.push_str(&chunk),
                Event::ReadFailed(e) => panic!("read failed: {}", e),
                Event::Closed => break,
            }
        }

        assert_eq!(text, "café time=00:00:01.00\r");
    }

    #[test]
    fn finds_incomplete_sequences() {
        assert_eq!(incomplete_tail(b"abc"), 0);
        assert_eq!(incomplete_tail(b"ab\xc3"), 1);
        assert_eq!(incomplete_tail(b"ab\xe2\x82"), 2);
        assert_eq!(incomplete_tail("ab€".as_bytes()), 0);
        assert_eq!(incomplete_tail(b"ab\x82"), 0);
        assert_eq!(incomplete_tail(b""), 0);
    }

    #[test]
    fn can_start_again_after_termination() {
        let mut watcher = scripted("", Some(Exit::Code(0)));
        let mut recorder = Recorder::default();

        watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder).unwrap();
        watcher.wait(TICK, &mut recorder).unwrap();
        watcher.start(Path::new("ffmpeg"), &[], 20., &mut recorder).unwrap();
        assert_eq!(watcher.state(), State::Running);
    }

    #[cfg(unix)]
    mod system {
        use super::*;

        fn sh(script: &str) -> Vec<OsString> {
            vec!["-c".into(), script.into()]
        }

        #[test]
        fn real_process_progress() {
            let mut watcher = Watcher::new(SystemRunner);
            let mut recorder = Recorder::default();
            let args = sh(r"printf 'frame=1 time=00:00:30.00 x\r' >&2; exit 0");

            watcher.start(Path::new("sh"), &args, 60., &mut recorder).unwrap();
            watcher.wait(TICK, &mut recorder).unwrap();

            assert_eq!(recorder.progress.last(), Some(&100));
            assert!(recorder.failures.is_empty());
        }

        #[test]
        fn missing_program_fails_to_start() {
            let mut watcher = Watcher::new(SystemRunner);
            let mut recorder = Recorder::default();

            assert!(watcher.start(Path::new("/nonexistent/ffmpeg"), &[], 60., &mut recorder).is_err());
            assert_eq!(recorder.failures, vec![Failure::FailedToStart]);
        }

        #[test]
        fn killed_process_crashed() {
            let mut watcher = Watcher::new(SystemRunner);
            let mut recorder = Recorder::default();

            watcher.start(Path::new("sh"), &sh("kill -9 $$"), 60., &mut recorder).unwrap();
            assert!(watcher.wait(TICK, &mut recorder).is_err());
            assert_eq!(recorder.failures, vec![Failure::Crashed]);
        }

        #[test]
        fn exit_code_is_kept() {
            let mut watcher = Watcher::new(SystemRunner);
            let mut recorder = Recorder::default();

            watcher.start(Path::new("sh"), &sh("exit 3"), 60., &mut recorder).unwrap();
            assert!(watcher.wait(TICK, &mut recorder).is_err());
            assert_eq!(recorder.failures, vec![Failure::Exited(3)]);
        }

        #[test]
        fn slow_process_times_out() {
            let mut watcher = Watcher::new(SystemRunner)
                .with_timeout(Some(Duration::from_millis(100)))
                .with_stop_grace(Duration::from_millis(100));
            let mut recorder = Recorder::default();

            watcher.start(Path::new("sh"), &sh("sleep 5"), 60., &mut recorder).unwrap();
            assert!(watcher.wait(TICK, &mut recorder).is_err());
            assert_eq!(recorder.failures, vec![Failure::TimedOut]);
        }
    }
}
