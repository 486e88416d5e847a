#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use treemand_discovery::{
    CancelToken, Crawler, DiscoveryError, DiscoveryOptions, FetchError, HelpSource,
    ProcessHelpFetcher,
};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn fetch(binary: &Path, args: &[&str]) -> Result<String, FetchError> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    ProcessHelpFetcher::new(binary)
        .with_timeout(Duration::from_secs(5))
        .fetch_help(&args, &CancelToken::new())
}

#[test]
fn test_help_flag_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(
        dir.path(),
        "tool",
        r#"if [ "$1" = "--help" ]; then
  printf 'Usage: tool [options]\n\n  -v, --verbose   Verbose\n'
fi
"#,
    );
    let text = fetch(&tool, &[]).unwrap();
    assert!(text.starts_with("Usage: tool"));
}

#[test]
fn test_help_on_stderr_with_failing_exit() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(
        dir.path(),
        "tool",
        "echo 'usage: tool <file>' >&2\nexit 2\n",
    );
    assert_eq!(fetch(&tool, &[]).unwrap(), "usage: tool <file>");
}

#[test]
fn test_short_flag_fallback_for_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(
        dir.path(),
        "tool",
        r#"if [ "$1" = "sub" ] && [ "$2" = "-h" ]; then
  echo 'usage: tool sub'
fi
"#,
    );
    assert_eq!(fetch(&tool, &["sub"]).unwrap(), "usage: tool sub");
}

#[test]
fn test_truncated_help_is_retried_with_all() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(
        dir.path(),
        "tool",
        r#"if [ "$1" = "--help" ] && [ "$2" = "all" ]; then
  echo 'Usage: tool'
  echo 'full listing'
elif [ "$1" = "--help" ]; then
  echo "Usage: tool. Use 'tool --help all' for the full help."
fi
"#,
    );
    assert_eq!(fetch(&tool, &[]).unwrap(), "Usage: tool\nfull listing");
}

#[test]
fn test_silent_tool_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(dir.path(), "tool", "exit 0\n");
    assert!(matches!(fetch(&tool, &[]), Err(FetchError::Empty)));
}

#[test]
fn test_pager_is_suppressed() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(dir.path(), "tool", "echo \"pager=$PAGER git=$GIT_PAGER\"\n");
    assert_eq!(fetch(&tool, &[]).unwrap(), "pager=cat git=cat");
}

#[test]
fn test_hanging_probe_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(dir.path(), "tool", "exec sleep 30\n");
    let start = Instant::now();
    let result = ProcessHelpFetcher::new(&tool)
        .with_timeout(Duration::from_millis(200))
        .fetch_help(&[], &CancelToken::new());
    assert!(matches!(result, Err(FetchError::TimedOut(_))));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_cancelled_probe_stops_early() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(dir.path(), "tool", "exec sleep 30\n");
    let cancel = CancelToken::with_timeout(Duration::from_millis(100));
    let start = Instant::now();
    let result = ProcessHelpFetcher::new(&tool)
        .with_timeout(Duration::from_secs(20))
        .fetch_help(&[], &cancel);
    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_background_helper_holding_pipes_is_bounded_by_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(
        dir.path(),
        "tool",
        "echo 'Usage: tool'\nsleep 10 &\nexit 0\n",
    );
    let start = Instant::now();
    let result = ProcessHelpFetcher::new(&tool)
        .with_timeout(Duration::from_millis(500))
        .fetch_help(&[], &CancelToken::new());
    assert_eq!(result.unwrap(), "Usage: tool");
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_background_helper_holding_pipes_honors_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(
        dir.path(),
        "tool",
        "echo 'Usage: tool'\nsleep 10 &\nexit 0\n",
    );
    let cancel = CancelToken::with_timeout(Duration::from_millis(300));
    let start = Instant::now();
    let result = ProcessHelpFetcher::new(&tool)
        .with_timeout(Duration::from_secs(20))
        .fetch_help(&[], &cancel);
    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_missing_executable() {
    let result = fetch(Path::new("/nonexistent/treemand-test-tool"), &[]);
    assert!(matches!(result, Err(FetchError::NotFound(_))));

    let crawler = Crawler::new(
        ProcessHelpFetcher::new("/nonexistent/treemand-test-tool"),
        DiscoveryOptions::default(),
    );
    let err = crawler
        .discover("treemand-test-tool", &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::BinaryNotFound(_)));
}

#[test]
fn test_crawl_real_script() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_script(
        dir.path(),
        "tool",
        r#"case "$1" in
  --help)
    printf 'Usage: tool <command>\n\nCommands:\n  build   Build it\n  hang    Never returns\n'
    ;;
  build)
    printf 'Build it\n\nUsage: tool build [TARGET]\n\nFlags:\n  --release   Optimized build\n'
    ;;
  hang)
    exec sleep 30
    ;;
esac
"#,
    );
    let options = DiscoveryOptions::default().with_timeout(Duration::from_millis(300));
    let fetcher = ProcessHelpFetcher::new(&tool).with_timeout(options.timeout);
    let tree = Crawler::new(fetcher, options)
        .discover("tool", &CancelToken::new())
        .unwrap();

    let build = tree.find("build").unwrap();
    assert!(build.discovered);
    assert_eq!(build.flags[0].name, "--release");
    assert_eq!(build.positionals[0].name, "TARGET");
    let hang = tree.find("hang").unwrap();
    assert!(!hang.discovered);
}
