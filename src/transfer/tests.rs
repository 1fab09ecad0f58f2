use super::*;
use crate::protocol::Status;

const PACKET: usize = 64;

/// Drives a read against a chip that hands out `PACKET`-sized chunks and has
/// `available` bytes left in the file.
fn run_read(
    total: usize,
    counters: &mut MediumCounters,
    mut available: usize,
) -> (TransferEngine, [usize; 2]) {
    let mut engine = TransferEngine::new(Direction::Read, total);
    let mut requests = 0;
    let mut continues = 0;
    let mut granted = 0;
    for _ in 0..64 {
        match engine.poll(counters) {
            Some(TransferAction::Request(count)) => {
                requests += 1;
                granted = (count as usize).min(available).min(PACKET);
                let status = if granted == 0 {
                    Status::USB_INT_SUCCESS
                } else {
                    Status::USB_INT_DISK_READ
                };
                engine.answered(status, counters);
            }
            Some(TransferAction::Move(capacity)) => {
                assert!(granted <= capacity);
                available -= granted;
                engine.moved(granted, counters);
            }
            Some(TransferAction::Continue) => {
                continues += 1;
                engine.answered(Status::USB_INT_SUCCESS, counters);
            }
            Some(TransferAction::Flush) => panic!("reads never flush"),
            None if engine.progress().finished => break,
            None => {}
        }
    }
    (engine, [requests, continues])
}

#[test]
fn read_inside_one_sector_issues_one_request_per_packet() {
    let mut counters = MediumCounters::default();
    let (engine, [requests, continues]) = run_read(200, &mut counters, 1000);

    let progress = engine.progress();
    assert!(progress.finished);
    assert!(progress.more);
    assert_eq!(progress.done, 200);
    assert_eq!(requests, 4);
    assert_eq!(continues, 0);
    assert_eq!(counters.sector_offset, 200);
}

#[test]
fn drained_sector_is_continued_before_next_request() {
    let mut counters = MediumCounters {
        sector_offset: 448,
        free_sectors: 0,
    };
    let (engine, [requests, continues]) = run_read(128, &mut counters, 1000);

    assert_eq!(engine.progress().done, 128);
    assert_eq!(requests, 2);
    assert_eq!(continues, 1);
    assert_eq!(counters.sector_offset, 64);
}

#[test]
fn read_at_end_of_file_reports_no_more_data() {
    let mut counters = MediumCounters::default();
    let (engine, [requests, _]) = run_read(10, &mut counters, 0);

    let progress = engine.progress();
    assert!(progress.finished);
    assert!(!progress.more);
    assert_eq!(progress.done, 0);
    assert_eq!(requests, 1);
}

#[test]
fn short_file_stops_with_partial_count() {
    let mut counters = MediumCounters::default();
    let (engine, _) = run_read(100, &mut counters, 30);

    let progress = engine.progress();
    assert_eq!(progress.done, 30);
    assert!(!progress.more);
}

#[test]
fn write_moves_chunks_and_flushes_once() {
    let mut counters = MediumCounters {
        sector_offset: 0,
        free_sectors: 3,
    };
    let mut engine = TransferEngine::new(Direction::Write, 100);

    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Request(100)));
    engine.answered(Status::USB_INT_DISK_WRITE, &mut counters);
    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Move(100)));
    engine.moved(64, &mut counters);
    assert_eq!(engine.progress().phase, TransferPhase::Advance);

    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Continue));
    assert_eq!(counters.free_sectors, 2);
    engine.answered(Status::USB_INT_DISK_WRITE, &mut counters);
    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Move(36)));
    engine.moved(36, &mut counters);
    assert_eq!(engine.progress().phase, TransferPhase::Done);

    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Flush));
    engine.answered(Status::USB_INT_SUCCESS, &mut counters);
    let progress = engine.progress();
    assert!(progress.finished);
    assert!(!progress.disk_full);
    assert_eq!(progress.done, 100);
}

#[test]
fn write_without_free_sectors_ends_disk_full() {
    let mut counters = MediumCounters::default();
    let mut engine = TransferEngine::new(Direction::Write, 10);

    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Request(10)));
    engine.answered(Status::USB_INT_SUCCESS, &mut counters);
    assert_eq!(engine.poll(&mut counters), None);
    assert!(engine.progress().disk_full);
    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Flush));
    engine.answered(Status::USB_INT_SUCCESS, &mut counters);
    assert!(engine.progress().finished);
    assert_eq!(engine.progress().done, 0);
}

#[test]
fn write_running_out_of_sectors_flushes_once_and_stops() {
    let mut counters = MediumCounters {
        sector_offset: 0,
        free_sectors: 1,
    };
    let mut engine = TransferEngine::new(Direction::Write, 200);

    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Request(200)));
    engine.answered(Status::USB_INT_DISK_WRITE, &mut counters);
    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Move(200)));
    engine.moved(64, &mut counters);
    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Continue));
    engine.answered(Status::USB_INT_DISK_WRITE, &mut counters);
    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Move(136)));
    engine.moved(64, &mut counters);

    assert_eq!(engine.poll(&mut counters), None);
    assert!(engine.progress().disk_full);
    assert_eq!(engine.poll(&mut counters), Some(TransferAction::Flush));
    engine.answered(Status::USB_INT_DISK_WRITE, &mut counters);

    let progress = engine.progress();
    assert!(progress.finished);
    assert_eq!(progress.done, 128);
    assert_eq!(engine.poll(&mut counters), None);
    assert_eq!(engine.poll(&mut counters), None);
    assert_eq!(counters.free_sectors, 0);
}

#[test]
fn empty_transfer_finishes_without_requests() {
    let mut counters = MediumCounters::default();
    let mut engine = TransferEngine::new(Direction::Read, 0);
    assert_eq!(engine.poll(&mut counters), None);
    assert_eq!(engine.poll(&mut counters), None);
    assert!(engine.progress().finished);
}
