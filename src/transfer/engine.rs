use statig::blocking::IntoStateMachineExt as _;

use super::hsm::{DispatchContext, TransferHsm};
use super::{Direction, MediumCounters, TransferAction, TransferEvent, TransferPhase};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferProgress {
    pub phase: TransferPhase,
    pub done: usize,
    /// Read side: the chip still had data when the transfer stopped.
    pub more: bool,
    /// Write side: the transfer stopped because no free sector was left.
    pub disk_full: bool,
    pub finished: bool,
}

/// One read or write call. Created fresh per call; never reused.
pub struct TransferEngine {
    machine: statig::blocking::StateMachine<TransferHsm>,
}

impl TransferEngine {
    pub fn new(direction: Direction, total: usize) -> Self {
        Self {
            machine: TransferHsm::new(direction, total).state_machine(),
        }
    }

    /// Asks for the next chip operation. `None` means the machine moved on
    /// without bus work; poll again unless [`TransferProgress::finished`].
    /// A finished transfer never asks for more.
    pub fn poll(&mut self, counters: &mut MediumCounters) -> Option<TransferAction> {
        if self.machine.inner().finished {
            return None;
        }
        self.dispatch(TransferEvent::Poll, counters)
    }

    /// Feeds the status answered by a `Request`, `Continue` or `Flush`.
    pub fn answered(&mut self, status: crate::protocol::Status, counters: &mut MediumCounters) {
        let _ = self.dispatch(TransferEvent::Answered(status), counters);
    }

    /// Feeds the byte count moved by a `Move`.
    pub fn moved(&mut self, count: usize, counters: &mut MediumCounters) {
        let _ = self.dispatch(TransferEvent::Moved(count), counters);
    }

    pub fn progress(&self) -> TransferProgress {
        let hsm = self.machine.inner();
        TransferProgress {
            phase: hsm.phase,
            done: hsm.done,
            more: hsm.more,
            disk_full: hsm.disk_full,
            finished: hsm.finished,
        }
    }

    fn dispatch(
        &mut self,
        event: TransferEvent,
        counters: &mut MediumCounters,
    ) -> Option<TransferAction> {
        let mut context = DispatchContext {
            counters: *counters,
            action: None,
        };
        self.machine.handle_with_context(&event, &mut context);
        *counters = context.counters;
        context.action
    }
}
