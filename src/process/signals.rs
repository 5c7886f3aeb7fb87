//! Process Signal Handling
//!
//! Delivers interrupt and kill signals to delegated processes and their
//! process groups, and listens for the interrupt the terminal sends to the
//! session itself.

use crate::error::{Error, Result};

/// Signals that can be sent to a delegated process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Interrupt signal (Ctrl+C)
    Interrupt,
    /// Kill signal (forceful termination)
    Kill,
}

impl Signal {
    pub fn name(self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Kill => "SIGKILL",
        }
    }

    #[cfg(unix)]
    fn to_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal as NixSignal;

        match self {
            Signal::Interrupt => NixSignal::SIGINT,
            Signal::Kill => NixSignal::SIGKILL,
        }
    }
}

/// Platform-specific signal operations.
///
/// Delivery is a single non-blocking system call, so these are safe to use
/// from `Drop` and other synchronous paths.
pub trait SignalOps: Send + Sync {
    /// Send a signal to a single process
    fn send(&self, pid: u32, signal: Signal) -> Result<()>;

    /// Send a signal to every process in a process group
    fn send_group(&self, pgid: u32, signal: Signal) -> Result<()>;

    /// Send an interrupt signal (Ctrl+C equivalent) to a process group
    fn send_interrupt(&self, pgid: u32) -> Result<()> {
        self.send_group(pgid, Signal::Interrupt)
    }

    /// Check if a process is still running
    fn is_process_running(&self, pid: u32) -> bool;
}

/// Signal delivery through `kill(2)` and `killpg(3)`
#[cfg(unix)]
#[derive(Debug, Default)]
pub struct UnixSignals;

#[cfg(unix)]
impl SignalOps for UnixSignals {
    fn send(&self, pid: u32, signal: Signal) -> Result<()> {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        kill(Pid::from_raw(pid as i32), signal.to_nix()).map_err(|e| send_failed(signal, e))
    }

    fn send_group(&self, pgid: u32, signal: Signal) -> Result<()> {
        use nix::sys::signal::killpg;
        use nix::unistd::Pid;

        killpg(Pid::from_raw(pgid as i32), signal.to_nix()).map_err(|e| send_failed(signal, e))
    }

    fn is_process_running(&self, pid: u32) -> bool {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        // Signal 0 performs the permission/existence check only
        kill(Pid::from_raw(pid as i32), None).is_ok()
    }
}

#[cfg(unix)]
fn send_failed(signal: Signal, e: nix::Error) -> Error {
    Error::SignalSendFailed {
        signal: signal.name().to_string(),
        reason: e.to_string(),
    }
}

/// Platforms without POSIX signals; the delegate falls back to killing the child
#[cfg(not(unix))]
#[derive(Debug, Default)]
pub struct UnsupportedSignals;

#[cfg(not(unix))]
impl UnsupportedSignals {
    fn unsupported(signal: Signal) -> Error {
        Error::SignalNotSupported {
            signal: signal.name().to_string(),
            platform: std::env::consts::OS.to_string(),
        }
    }
}

#[cfg(not(unix))]
impl SignalOps for UnsupportedSignals {
    fn send(&self, _pid: u32, signal: Signal) -> Result<()> {
        Err(Self::unsupported(signal))
    }

    fn send_group(&self, _pgid: u32, signal: Signal) -> Result<()> {
        Err(Self::unsupported(signal))
    }

    fn is_process_running(&self, _pid: u32) -> bool {
        false
    }
}

/// Signal operations for the current platform
pub fn platform_signals() -> Box<dyn SignalOps> {
    #[cfg(unix)]
    {
        Box::new(UnixSignals)
    }

    #[cfg(not(unix))]
    {
        Box::new(UnsupportedSignals)
    }
}

/// Receives the interrupts delivered to the session process.
///
/// Delegated processes run in their own process group, so a `^C` typed while
/// the session holds the terminal, or a `kill -INT` aimed at the session,
/// lands here instead of terminating the session. The session decides
/// whether to forward it or to start an exit confirmation.
pub struct InterruptListener {
    #[cfg(unix)]
    inner: tokio::signal::unix::Signal,
}

impl InterruptListener {
    pub fn new() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                inner: signal(SignalKind::interrupt())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the next interrupt
    pub async fn recv(&mut self) -> Option<()> {
        #[cfg(unix)]
        {
            self.inner.recv().await
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.ok()
        }
    }
}
