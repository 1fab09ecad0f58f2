use statig::prelude::*;

use crate::protocol::{Status, SECTOR_SIZE};

use super::{Direction, MediumCounters, TransferAction, TransferEvent, TransferPhase};

#[derive(Clone, Copy, Debug)]
pub(super) struct DispatchContext {
    pub(super) counters: MediumCounters,
    pub(super) action: Option<TransferAction>,
}

pub(super) struct TransferHsm {
    pub(super) direction: Direction,
    pub(super) total: usize,
    pub(super) done: usize,
    pub(super) requested: usize,
    pub(super) more: bool,
    pub(super) disk_full: bool,
    pub(super) finished: bool,
    pub(super) phase: TransferPhase,
}

impl TransferHsm {
    pub(super) fn new(direction: Direction, total: usize) -> Self {
        Self {
            direction,
            total,
            done: 0,
            requested: 0,
            more: false,
            disk_full: false,
            finished: false,
            phase: TransferPhase::Request,
        }
    }

    fn remaining(&self) -> usize {
        self.total.saturating_sub(self.done)
    }

    fn enter(&mut self, phase: TransferPhase) -> Outcome<State> {
        self.phase = phase;
        match phase {
            TransferPhase::Request => Transition(State::request()),
            TransferPhase::ReadWrite => Transition(State::read_write()),
            TransferPhase::Advance => Transition(State::advance()),
            TransferPhase::Done => Transition(State::done()),
        }
    }
}

#[state_machine(initial = "State::request()")]
impl TransferHsm {
    #[state]
    fn request(&mut self, context: &mut DispatchContext, event: &TransferEvent) -> Outcome<State> {
        match (self.direction, event) {
            (_, TransferEvent::Poll) if self.remaining() == 0 => self.enter(TransferPhase::Done),
            (Direction::Read, TransferEvent::Poll) => {
                let sector_offset = context.counters.sector_offset as usize;
                if sector_offset >= SECTOR_SIZE {
                    // A drained sector must be continued before the next request.
                    context.counters.sector_offset = 0;
                    return self.enter(TransferPhase::Advance);
                }
                let count = self.remaining().min(SECTOR_SIZE - sector_offset);
                self.requested = count;
                context.action = Some(TransferAction::Request(count as u16));
                Handled
            }
            (Direction::Write, TransferEvent::Poll) => {
                let count = self.remaining().min(u16::MAX as usize);
                self.requested = count;
                context.action = Some(TransferAction::Request(count as u16));
                Handled
            }
            (Direction::Read, TransferEvent::Answered(status)) => match *status {
                Status::USB_INT_DISK_READ => {
                    self.more = true;
                    self.enter(TransferPhase::ReadWrite)
                }
                Status::USB_INT_SUCCESS => {
                    self.more = false;
                    self.enter(TransferPhase::Done)
                }
                _ => Handled,
            },
            (Direction::Write, TransferEvent::Answered(status)) => match *status {
                Status::USB_INT_SUCCESS => self.enter(TransferPhase::Advance),
                Status::USB_INT_DISK_WRITE => self.enter(TransferPhase::ReadWrite),
                _ => Handled,
            },
            (_, TransferEvent::Moved(_)) => Handled,
        }
    }

    #[state]
    fn read_write(&mut self, context: &mut DispatchContext, event: &TransferEvent) -> Outcome<State> {
        match event {
            TransferEvent::Poll => {
                let capacity = match self.direction {
                    Direction::Read => self.requested,
                    Direction::Write => self.remaining(),
                };
                context.action = Some(TransferAction::Move(capacity));
                Handled
            }
            TransferEvent::Moved(count) => {
                self.done += *count;
                if matches!(self.direction, Direction::Read) {
                    context.counters.sector_offset =
                        context.counters.sector_offset.saturating_add(*count as u16);
                }
                if self.done != self.total {
                    match self.direction {
                        Direction::Read => self.enter(TransferPhase::Request),
                        Direction::Write => self.enter(TransferPhase::Advance),
                    }
                } else {
                    self.enter(TransferPhase::Done)
                }
            }
            TransferEvent::Answered(_) => Handled,
        }
    }

    #[state]
    fn advance(&mut self, context: &mut DispatchContext, event: &TransferEvent) -> Outcome<State> {
        match (self.direction, event) {
            (Direction::Read, TransferEvent::Poll) => {
                context.action = Some(TransferAction::Continue);
                Handled
            }
            (Direction::Read, TransferEvent::Answered(_)) => self.enter(TransferPhase::Request),
            (Direction::Write, TransferEvent::Poll) => {
                if context.counters.free_sectors == 0 {
                    self.disk_full = true;
                    return self.enter(TransferPhase::Done);
                }
                context.counters.free_sectors -= 1;
                context.action = Some(TransferAction::Continue);
                Handled
            }
            (Direction::Write, TransferEvent::Answered(status)) => match *status {
                Status::USB_INT_SUCCESS => self.enter(TransferPhase::Request),
                _ if self.done < self.total => self.enter(TransferPhase::ReadWrite),
                _ => self.enter(TransferPhase::Done),
            },
            (_, TransferEvent::Moved(_)) => Handled,
        }
    }

    #[state]
    fn done(&mut self, context: &mut DispatchContext, event: &TransferEvent) -> Outcome<State> {
        match (self.direction, event) {
            (Direction::Read, TransferEvent::Poll) => {
                self.finished = true;
                self.enter(TransferPhase::Request)
            }
            (Direction::Write, TransferEvent::Poll) => {
                context.action = Some(TransferAction::Flush);
                Handled
            }
            (Direction::Write, TransferEvent::Answered(_)) => {
                self.finished = true;
                self.enter(TransferPhase::Request)
            }
            _ => Handled,
        }
    }
}
