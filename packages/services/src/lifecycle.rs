use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Created,
    Running,
    Stopped,
}

impl State {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Running => 1,
            Self::Stopped => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// `Created -> Running -> Stopped`. Stopping cancels the root token handed out
/// to long running operations.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
    cancel: CancellationToken,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(State::Created.to_u8()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Starting an already running lifecycle is a no-op. A stopped one can not
    /// be restarted.
    pub fn start(&self) -> Result<()> {
        match self.transition(State::Created, State::Running) {
            Ok(()) => {
                info!("dispatcher started");
                Ok(())
            }
            Err(State::Running) => Ok(()),
            Err(_) => Err(Error::AlreadyStopped),
        }
    }

    pub fn stop(&self) -> Result<()> {
        let previous = self.state.swap(State::Stopped.to_u8(), Ordering::AcqRel);
        if State::from_u8(previous) == State::Stopped {
            return Err(Error::AlreadyStopped);
        }

        self.cancel.cancel();
        info!("dispatcher stopped");

        Ok(())
    }

    pub fn ensure_running(&self) -> Result<()> {
        match self.state() {
            State::Running => Ok(()),
            _ => Err(Error::NotRunning),
        }
    }

    /// Child token cancelled once the lifecycle stops.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    fn transition(&self, from: State, to: State) -> std::result::Result<(), State> {
        self.state
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(State::from_u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_need_a_started_lifecycle() {
        // given
        let lifecycle = Lifecycle::new();

        // then
        assert!(matches!(lifecycle.ensure_running(), Err(Error::NotRunning)));

        lifecycle.start().unwrap();
        assert_eq!(lifecycle.state(), State::Running);
        lifecycle.ensure_running().unwrap();
    }

    #[test]
    fn stopping_twice_is_reported() {
        // given
        let lifecycle = Lifecycle::new();
        lifecycle.start().unwrap();

        // when
        lifecycle.stop().unwrap();
        let second = lifecycle.stop();

        // then
        assert!(matches!(second, Err(Error::AlreadyStopped)));
        assert!(matches!(lifecycle.ensure_running(), Err(Error::NotRunning)));
    }

    #[test]
    fn stopped_lifecycle_can_not_restart() {
        let lifecycle = Lifecycle::new();
        lifecycle.stop().unwrap();

        assert!(matches!(lifecycle.start(), Err(Error::AlreadyStopped)));
        assert_eq!(lifecycle.state(), State::Stopped);
    }

    #[test]
    fn stop_cancels_handed_out_tokens() {
        // given
        let lifecycle = Lifecycle::new();
        lifecycle.start().unwrap();
        let token = lifecycle.child_token();

        // when
        lifecycle.stop().unwrap();

        // then
        assert!(token.is_cancelled());
    }
}
