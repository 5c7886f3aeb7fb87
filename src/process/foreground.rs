//! Terminal foreground handoff
//!
//! A delegated process runs in its own process group. When the session is
//! the terminal's foreground group, the terminal is handed to the child's
//! group for as long as it runs, so `^C` and terminal reads go to the child
//! alone. The session takes the terminal back before it prompts again.

/// Tracks whether the terminal was handed to a delegated process group
#[derive(Debug, Default)]
pub struct TerminalOwner {
    /// Process group to give the terminal back to
    #[cfg(unix)]
    session_group: Option<nix::unistd::Pid>,
}

#[cfg(unix)]
impl TerminalOwner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give the terminal to `pgid` if this process currently holds it.
    ///
    /// Returns `true` when the handoff happened.
    pub fn hand_to(&mut self, pgid: u32) -> bool {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::{getpgrp, tcgetpgrp, tcsetpgrp, Pid};
        use std::io::IsTerminal;
        use std::os::fd::AsFd;

        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return false;
        }

        let session_group = getpgrp();
        match tcgetpgrp(stdin.as_fd()) {
            Ok(foreground) if foreground == session_group => {}
            _ => return false,
        }

        let child_group = Pid::from_raw(pgid as i32);
        if let Err(e) = tcsetpgrp(stdin.as_fd(), child_group) {
            debug!("Could not hand terminal to group {}: {}", pgid, e);
            return false;
        }
        // A read attempted before the handoff stops the child with SIGTTIN
        let _ = killpg(child_group, Signal::SIGCONT);

        debug!("Terminal handed to process group {}", pgid);
        self.session_group = Some(session_group);
        true
    }

    /// Take the terminal back after the delegated process group is done
    pub fn reclaim(&mut self) {
        use nix::sys::signal::{SigSet, SigmaskHow, Signal};
        use nix::unistd::tcsetpgrp;
        use std::os::fd::AsFd;

        let Some(session_group) = self.session_group.take() else {
            return;
        };

        // A background group calling tcsetpgrp is stopped by SIGTTOU unless
        // the signal is blocked
        let mut ttou = SigSet::empty();
        ttou.add(Signal::SIGTTOU);
        let previous = match ttou.thread_swap_mask(SigmaskHow::SIG_BLOCK) {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Could not block SIGTTOU to reclaim the terminal: {}", e);
                return;
            }
        };

        match tcsetpgrp(std::io::stdin().as_fd(), session_group) {
            Ok(()) => debug!("Terminal reclaimed by process group {}", session_group),
            Err(e) => warn!("Could not reclaim the terminal: {}", e),
        }

        if let Err(e) = previous.thread_set_mask() {
            warn!("Could not restore the signal mask: {}", e);
        }
    }

    pub fn is_handed_off(&self) -> bool {
        self.session_group.is_some()
    }
}

#[cfg(not(unix))]
impl TerminalOwner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Children share the console; there is nothing to hand over
    pub fn hand_to(&mut self, _pgid: u32) -> bool {
        false
    }

    pub fn reclaim(&mut self) {}

    pub fn is_handed_off(&self) -> bool {
        false
    }
}

impl Drop for TerminalOwner {
    fn drop(&mut self) {
        self.reclaim();
    }
}
