use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use tokio::sync::watch;

use crate::boot::BootState;
use crate::error::BootError;

pub enum AppEvent {
    Input(Event),
    Boot(BootState),
    /// The terminal stopped delivering input.
    InputClosed,
    Tick,
}

/// Terminal input merged with bootstrap progress.
pub struct Events {
    input: EventStream,
    boot: watch::Receiver<BootState>,
    boot_settled: bool,
    tick: Duration,
}

impl Events {
    pub fn new(boot: watch::Receiver<BootState>, tick: Duration) -> Self {
        Self {
            input: EventStream::new(),
            boot,
            boot_settled: false,
            tick,
        }
    }

    pub async fn next(&mut self) -> Result<AppEvent> {
        tokio::select! {
            changed = self.boot.changed(), if !self.boot_settled => {
                let state = settle(self.boot.borrow_and_update().clone(), changed.is_err());
                self.boot_settled = state.is_settled();
                Ok(AppEvent::Boot(state))
            }
            input = self.input.next() => match input {
                Some(event) => Ok(AppEvent::Input(event?)),
                None => Ok(AppEvent::InputClosed),
            },
            _ = tokio::time::sleep(self.tick) => Ok(AppEvent::Tick),
        }
    }
}

/// A closed channel that never settled means the boot task died.
fn settle(state: BootState, closed: bool) -> BootState {
    if closed && !state.is_settled() {
        BootState::Failed(Arc::new(BootError::Interrupted))
    } else {
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_channel_while_loading_becomes_failed() {
        let (tx, mut rx) = watch::channel(BootState::Idle);
        tx.send_replace(BootState::Loading);
        assert!(rx.changed().await.is_ok());
        drop(tx);

        let closed = rx.changed().await.is_err();
        assert!(closed);
        let state = settle(rx.borrow_and_update().clone(), closed);
        assert!(matches!(&state, BootState::Failed(e) if matches!(**e, BootError::Interrupted)));
    }

    #[test]
    fn settled_state_passes_through_a_closed_channel() {
        let failed = BootState::Failed(Arc::new(BootError::InvalidSnapshot(0)));
        let state = settle(failed, true);
        assert!(matches!(&state, BootState::Failed(e) if matches!(**e, BootError::InvalidSnapshot(0))));

        assert!(matches!(settle(BootState::Loading, false), BootState::Loading));
    }
}
