//! Bounded subprocess execution for extractor tools.
//!
//! Tools like `yt-dlp`, `pandoc`, and `pdftoppm` are opportunistic: used
//! when present, never allowed to hang the pipeline. Every run gets a
//! deadline, an output cap, and cancellation; on timeout or cancel the
//! child receives a kill and a short grace period to exit.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{ExtractError, ExtractResult};

const KILL_GRACE: Duration = Duration::from_secs(2);

/// Locate a binary on PATH. Shellouts are opportunistic; a missing tool
/// is an ordinary strategy failure, not a crash.
pub fn which(bin: &str) -> Option<std::path::PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        let candidate = dir.join(bin);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Run a command to completion and return its stdout, bounded in time
/// and size.
pub async fn run_stdout_bounded(
    tool: &'static str,
    mut cmd: Command,
    timeout: Duration,
    max_stdout_bytes: usize,
    cancel: &CancellationToken,
) -> ExtractResult<Vec<u8>> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        let reason = if e.kind() == std::io::ErrorKind::NotFound {
            "not installed".to_string()
        } else {
            format!("spawn failed: {e}")
        };
        ExtractError::Subprocess { tool, reason }
    })?;

    let mut stdout = child.stdout.take().expect("stdout was piped");
    let mut out = Vec::new();

    let read_and_wait = async {
        let mut limited = (&mut stdout).take(max_stdout_bytes as u64);
        limited.read_to_end(&mut out).await.map_err(|e| {
            ExtractError::Subprocess {
                tool,
                reason: format!("read failed: {e}"),
            }
        })?;
        let status = child.wait().await.map_err(|e| ExtractError::Subprocess {
            tool,
            reason: format!("wait failed: {e}"),
        })?;
        if !status.success() {
            return Err(ExtractError::Subprocess {
                tool,
                reason: format!("exit status {status}"),
            });
        }
        Ok(())
    };

    tokio::select! {
        result = read_and_wait => {
            result?;
            Ok(out)
        }
        _ = tokio::time::sleep(timeout) => {
            terminate(tool, &mut child).await;
            Err(ExtractError::Subprocess { tool, reason: "timed out".to_string() })
        }
        _ = cancel.cancelled() => {
            terminate(tool, &mut child).await;
            Err(ExtractError::Cancelled)
        }
    }
}

/// Kill the child and give it a moment to exit; `kill_on_drop` is the
/// backstop if even that hangs.
async fn terminate(tool: &'static str, child: &mut tokio::process::Child) {
    if let Err(e) = child.start_kill() {
        warn!(tool, error = %e, "failed to signal subprocess");
        return;
    }
    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
        warn!(tool, "subprocess ignored kill within grace period");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");
        let out = run_stdout_bounded(
            "echo",
            cmd,
            Duration::from_secs(5),
            1024,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "hello");
    }

    #[tokio::test]
    async fn missing_tool_reports_not_installed() {
        let cmd = Command::new("definitely-not-a-real-tool-9f2a");
        let err = run_stdout_bounded(
            "missing",
            cmd,
            Duration::from_secs(1),
            1024,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        match err {
            ExtractError::Subprocess { reason, .. } => assert!(reason.contains("not installed")),
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn timeout_kills_the_child() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let start = std::time::Instant::now();
        let err = run_stdout_bounded(
            "sleep",
            cmd,
            Duration::from_millis(100),
            1024,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(10));
        match err {
            ExtractError::Subprocess { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn cancellation_kills_the_child() {
        let cancel = CancellationToken::new();
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let cancel2 = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel2.cancel();
        });
        let err = run_stdout_bounded("sleep", cmd, Duration::from_secs(30), 1024, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Cancelled));
    }
}
