//! Help-text probing.
//!
//! A [`HelpSource`] returns the raw help text for one command path. The
//! production source, [`ProcessHelpFetcher`], runs the target binary with
//! help flags under a per-invocation timeout and a pager-suppressing
//! environment.
//!
//! # Fallback order
//!
//! 1. `<prefix> --help`, then `<prefix> -h` if that printed nothing.
//! 2. If the text says it is abbreviated (e.g. "use --help all"), one retry
//!    with `<prefix> --help all`, preferred when non-empty.
//! 3. If both flag forms printed nothing, `<prefix> help`, unless that only
//!    prints "how to get help" boilerplate.

use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tracing::debug;
use wait_timeout::ChildExt;

use crate::cancel::CancelToken;

/// Default per-invocation timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// How often a waiting probe re-checks cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

const READ_CHUNK_SIZE: usize = 8192;

/// Phrases that mark an abbreviated help page with a fuller form available.
const TRUNCATED_HELP_SIGNATURES: &[&str] = &[
    "--help all",
    "--help-all",
    "not the full help",
    "for the full help",
    "for full help",
];

/// Why no help text could be obtained.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("executable not found: {0}")]
    NotFound(String),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("cancelled")]
    Cancelled,
    #[error("no help output")]
    Empty,
    #[error("failed to run {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can produce raw help text for a command path.
///
/// `args` is the argument prefix below the root binary, e.g. `["remote",
/// "add"]` for `git remote add`. Implementations must be safe to call from
/// many threads at once.
pub trait HelpSource: Send + Sync {
    fn fetch_help(&self, args: &[String], cancel: &CancelToken) -> Result<String, FetchError>;
}

/// Runs the fallback sequence using `run` for each individual invocation.
///
/// `run` receives the full argument list and returns trimmed combined
/// output, which may be empty. Any error it returns aborts the sequence,
/// except a failed `--help all` retry, which keeps the abbreviated text.
pub fn fetch_with_fallbacks<F>(prefix: &[String], mut run: F) -> Result<String, FetchError>
where
    F: FnMut(&[String]) -> Result<String, FetchError>,
{
    let argv = |suffix: &[&str]| -> Vec<String> {
        prefix
            .iter()
            .cloned()
            .chain(suffix.iter().map(|s| s.to_string()))
            .collect()
    };

    let mut text = run(&argv(&["--help"]))?;
    if text.is_empty() {
        text = run(&argv(&["-h"]))?;
    }

    if is_truncated_help(&text) {
        match run(&argv(&["--help", "all"])) {
            Ok(full) if !full.is_empty() => text = full,
            Ok(_) => {}
            Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
            Err(e) => debug!(args = ?prefix, error = %e, "Full help retry failed"),
        }
    }

    if text.is_empty() {
        let via_subcommand = run(&argv(&["help"]))?;
        if !is_help_boilerplate(&via_subcommand) {
            text = via_subcommand;
        }
    }

    if text.is_empty() {
        Err(FetchError::Empty)
    } else {
        Ok(text)
    }
}

/// Returns `true` if `text` says a fuller help form exists.
pub fn is_truncated_help(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    TRUNCATED_HELP_SIGNATURES.iter().any(|sig| lower.contains(sig))
}

/// Returns `true` for short "how to get help" hints, which carry no
/// command structure.
pub fn is_help_boilerplate(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return true;
    }
    if lines.len() > 3 {
        return false;
    }
    let lower = text.to_ascii_lowercase();
    lower.contains("help")
        && ["try", "use", "run", "see", "for more information"]
            .iter()
            .any(|hint| lower.contains(hint))
}

/// Environment applied to every probe so help goes straight to the pipe.
pub fn default_probe_env() -> Vec<(&'static str, &'static str)> {
    vec![
        // Prevent graphical helpers from opening windows during probes.
        ("DISPLAY", ""),
        ("WAYLAND_DISPLAY", ""),
        ("BROWSER", "true"),
        ("DEBIAN_FRONTEND", "noninteractive"),
        ("TERM", "dumb"),
        ("NO_COLOR", "1"),
        ("PAGER", "cat"),
        ("MANPAGER", "cat"),
        ("SYSTEMD_PAGER", "cat"),
        ("GIT_PAGER", "cat"),
        ("GH_PAGER", "cat"),
        ("AWS_PAGER", ""),
    ]
}

/// Probes a real executable.
#[derive(Debug, Clone)]
pub struct ProcessHelpFetcher {
    binary: PathBuf,
    timeout: Duration,
    env: Vec<(String, String)>,
}

impl ProcessHelpFetcher {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_PROBE_TIMEOUT,
            env: default_probe_env()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds or overrides one probe environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.env.retain(|(k, _)| *k != key);
        self.env.push((key, value.into()));
        self
    }

    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    /// Runs the binary once with `args`, returning trimmed stdout followed
    /// by stderr.
    pub fn run_once(&self, args: &[String], cancel: &CancelToken) -> Result<String, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                FetchError::NotFound(self.binary.display().to_string())
            } else {
                FetchError::Io {
                    command: self.describe(args),
                    source: e,
                }
            }
        })?;

        // Drain stdout and stderr in background threads to prevent deadlock
        // when the child's pipe buffer fills before it exits.
        let mut output = PipeOutput::drain(&mut child);
        let started = Instant::now();

        let outcome = wait_for_child(&mut child, started, self.timeout, cancel).map_err(|e| {
            FetchError::Io {
                command: self.describe(args),
                source: e,
            }
        });
        match outcome {
            Ok(WaitOutcome::Exited(status)) => {
                // A background descendant may still hold the pipes open.
                if !output.collect(started, self.timeout, cancel) {
                    if cancel.is_cancelled() {
                        return Err(FetchError::Cancelled);
                    }
                    debug!(
                        command = %self.describe(args),
                        "Probe output still open after exit, using what was read"
                    );
                }
                let (stdout, stderr) = output.into_strings();
                debug!(
                    command = %self.describe(args),
                    exit_code = ?status.code(),
                    stdout_len = stdout.len(),
                    stderr_len = stderr.len(),
                    "Help probe finished"
                );
                Ok(combine_output(&stdout, &stderr))
            }
            Ok(WaitOutcome::TimedOut) => {
                debug!(
                    command = %self.describe(args),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Help command timed out, killing process"
                );
                kill(&mut child);
                Err(FetchError::TimedOut(self.timeout))
            }
            Ok(WaitOutcome::Cancelled) => {
                kill(&mut child);
                Err(FetchError::Cancelled)
            }
            Err(e) => {
                kill(&mut child);
                Err(e)
            }
        }
    }

    fn describe(&self, args: &[String]) -> String {
        let mut parts = vec![self.binary.display().to_string()];
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }
}

impl HelpSource for ProcessHelpFetcher {
    fn fetch_help(&self, args: &[String], cancel: &CancelToken) -> Result<String, FetchError> {
        fetch_with_fallbacks(args, |argv| self.run_once(argv, cancel))
    }
}

enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

fn wait_for_child(
    child: &mut Child,
    started: Instant,
    timeout: Duration,
    cancel: &CancelToken,
) -> std::io::Result<WaitOutcome> {
    loop {
        if cancel.is_cancelled() {
            return Ok(WaitOutcome::Cancelled);
        }
        let remaining = timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Ok(WaitOutcome::TimedOut);
        }
        if let Some(status) = child.wait_timeout(remaining.min(CANCEL_POLL_INTERVAL))? {
            return Ok(WaitOutcome::Exited(status));
        }
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

enum PipeEvent {
    Data(Stream, Vec<u8>),
    Closed,
}

/// Output gathered from a probe's stdout and stderr reader threads.
struct PipeOutput {
    events: Receiver<PipeEvent>,
    open: usize,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl PipeOutput {
    fn drain(child: &mut Child) -> Self {
        let (tx, events) = mpsc::channel();
        let mut open = 0;
        if let Some(pipe) = child.stdout.take() {
            spawn_reader(pipe, Stream::Stdout, tx.clone());
            open += 1;
        }
        if let Some(pipe) = child.stderr.take() {
            spawn_reader(pipe, Stream::Stderr, tx);
            open += 1;
        }
        Self {
            events,
            open,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }

    /// Reads until both pipes close. Returns `false` when the probe budget
    /// ran out or `cancel` fired first.
    fn collect(&mut self, started: Instant, timeout: Duration, cancel: &CancelToken) -> bool {
        while self.open > 0 {
            let remaining = timeout.saturating_sub(started.elapsed());
            if cancel.is_cancelled() || remaining.is_zero() {
                // Keep whatever already arrived.
                while let Ok(event) = self.events.try_recv() {
                    self.absorb(event);
                }
                return false;
            }
            match self.events.recv_timeout(remaining.min(CANCEL_POLL_INTERVAL)) {
                Ok(event) => self.absorb(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        true
    }

    fn absorb(&mut self, event: PipeEvent) {
        match event {
            PipeEvent::Data(Stream::Stdout, bytes) => self.stdout.extend(bytes),
            PipeEvent::Data(Stream::Stderr, bytes) => self.stderr.extend(bytes),
            PipeEvent::Closed => self.open = self.open.saturating_sub(1),
        }
    }

    fn into_strings(self) -> (String, String) {
        (
            String::from_utf8_lossy(&self.stdout).into_owned(),
            String::from_utf8_lossy(&self.stderr).into_owned(),
        )
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<PipeEvent>) {
    std::thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(PipeEvent::Data(stream, buf[..n].to_vec())).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!(error = %e, ?stream, "Failed to read probe output");
                    break;
                }
            }
        }
        let _ = tx.send(PipeEvent::Closed);
    });
}

fn combine_output(stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim();
    let stderr = stderr.trim();
    match (stdout.is_empty(), stderr.is_empty()) {
        (false, false) => format!("{stdout}\n{stderr}"),
        (false, true) => stdout.to_string(),
        _ => stderr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Replays canned outputs keyed by the space-joined argument list.
    fn scripted(
        outputs: &[(&str, Result<&str, ()>)],
    ) -> (
        impl FnMut(&[String]) -> Result<String, FetchError>,
        std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    ) {
        let table: HashMap<String, Result<String, ()>> = outputs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect();
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = calls.clone();
        let run = move |argv: &[String]| {
            let key = argv.join(" ");
            log.borrow_mut().push(key.clone());
            match table.get(&key) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(())) => Err(FetchError::TimedOut(Duration::from_millis(1))),
                None => Ok(String::new()),
            }
        };
        (run, calls)
    }

    #[test]
    fn test_help_flag_wins() {
        let (run, calls) = scripted(&[("--help", Ok("Usage: tool"))]);
        assert_eq!(fetch_with_fallbacks(&[], run).unwrap(), "Usage: tool");
        assert_eq!(*calls.borrow(), vec!["--help"]);
    }

    #[test]
    fn test_falls_back_to_short_flag() {
        let (run, calls) = scripted(&[("sub -h", Ok("usage: tool sub"))]);
        let prefix = vec!["sub".to_string()];
        assert_eq!(fetch_with_fallbacks(&prefix, run).unwrap(), "usage: tool sub");
        assert_eq!(*calls.borrow(), vec!["sub --help", "sub -h"]);
    }

    #[test]
    fn test_truncated_help_retries_with_all() {
        let (run, calls) = scripted(&[
            ("--help", Ok("Usage: ps\nThis is not the full help; use --help all")),
            ("--help all", Ok("Usage: ps\nfull listing")),
        ]);
        assert_eq!(fetch_with_fallbacks(&[], run).unwrap(), "Usage: ps\nfull listing");
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_truncated_help_keeps_short_text_when_retry_empty() {
        let (run, _) = scripted(&[("--help", Ok("brief. use --help all"))]);
        assert_eq!(fetch_with_fallbacks(&[], run).unwrap(), "brief. use --help all");
    }

    #[test]
    fn test_help_subcommand_fallback() {
        let (run, calls) = scripted(&[("help", Ok("Commands:\n  a  A\n  b  B\n  c  C\n  d  D"))]);
        assert!(fetch_with_fallbacks(&[], run).unwrap().starts_with("Commands:"));
        assert_eq!(*calls.borrow(), vec!["--help", "-h", "help"]);
    }

    #[test]
    fn test_help_subcommand_boilerplate_is_discarded() {
        let (run, _) = scripted(&[("help", Ok("Run 'tool --help' for more information."))]);
        assert!(matches!(fetch_with_fallbacks(&[], run), Err(FetchError::Empty)));
    }

    #[test]
    fn test_timeout_aborts_sequence() {
        let (run, calls) = scripted(&[("--help", Err(()))]);
        assert!(matches!(fetch_with_fallbacks(&[], run), Err(FetchError::TimedOut(_))));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_boilerplate_detection() {
        assert!(is_help_boilerplate(""));
        assert!(is_help_boilerplate("See 'git help <command>'"));
        assert!(!is_help_boilerplate("usage: x\n\n  a\n  b\n  c\n"));
        assert!(!is_help_boilerplate("Manage widgets"));
    }

    #[test]
    fn test_combine_output() {
        assert_eq!(combine_output(" out \n", ""), "out");
        assert_eq!(combine_output("", "err\n"), "err");
        assert_eq!(combine_output("out", "err"), "out\nerr");
    }
}
