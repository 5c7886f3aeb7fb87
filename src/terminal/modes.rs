//! Terminal mode snapshot
//!
//! A line editor puts the terminal in raw mode while it reads and restores it
//! when the read returns. A read that is still blocked when the session
//! closes never returns, so the session restores the modes it saw at start.

/// Terminal attributes of stdin captured at session start
#[derive(Default)]
pub struct TerminalModes {
    #[cfg(unix)]
    saved: Option<nix::sys::termios::Termios>,
}

impl TerminalModes {
    /// Capture the current modes; a no-op when stdin is not a terminal
    #[cfg(unix)]
    pub fn capture() -> Self {
        use nix::sys::termios::tcgetattr;
        use std::io::IsTerminal;
        use std::os::fd::AsFd;

        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return Self::default();
        }

        match tcgetattr(stdin.as_fd()) {
            Ok(saved) => Self { saved: Some(saved) },
            Err(e) => {
                debug!("Could not read terminal modes: {}", e);
                Self::default()
            }
        }
    }

    #[cfg(not(unix))]
    pub fn capture() -> Self {
        Self::default()
    }

    pub fn is_captured(&self) -> bool {
        #[cfg(unix)]
        {
            self.saved.is_some()
        }

        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Put the captured modes back
    pub fn restore(&self) {
        #[cfg(unix)]
        {
            use nix::sys::termios::{tcsetattr, SetArg};
            use std::os::fd::AsFd;

            let Some(saved) = &self.saved else {
                return;
            };
            match tcsetattr(std::io::stdin().as_fd(), SetArg::TCSANOW, saved) {
                Ok(()) => debug!("Terminal modes restored"),
                Err(e) => warn!("Could not restore terminal modes: {}", e),
            }
        }
    }
}

impl std::fmt::Debug for TerminalModes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalModes")
            .field("captured", &self.is_captured())
            .finish()
    }
}
