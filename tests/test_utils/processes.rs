//! Helpers for observing the processes a delegated program leaves behind

use std::path::Path;
use std::time::Duration;

use rli::process::SignalOps;

/// Shell snippet that starts a background `sleep`, records its pid in `$1`,
/// then waits for it. `prelude` runs first (e.g. a `trap`).
pub fn script_with_grandchild(prelude: &str) -> String {
    format!("{} sleep 30 & echo $! > \"$1\"; wait", prelude)
}

/// Pid a shell script wrote to `path`
pub async fn read_pid(path: &Path) -> u32 {
    for _ in 0..250 {
        let written = std::fs::read_to_string(path).ok();
        if let Some(pid) = written.and_then(|s| s.trim().parse().ok()) {
            return pid;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("no pid written to {}", path.display());
}

/// Whether `pid` is still running. Zombies count as gone; they only wait
/// for their new parent to reap them.
pub fn is_alive(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .is_some_and(|rest| !rest.trim_start().starts_with('Z')),
        Err(_) if cfg!(target_os = "linux") => false,
        Err(_) => rli::process::platform_signals().is_process_running(pid),
    }
}

/// Poll until `pid` is gone, for up to five seconds
pub async fn wait_until_gone(pid: u32) -> bool {
    for _ in 0..250 {
        if !is_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
