mod common;

use std::time::Duration;

use common::{Rig, INC};
use patchstep_core::midi::SimOp;

#[test]
fn test_indicator_follows_presence_without_recovering() {
    let mut rig = Rig::start(0);
    rig.run_ms(1000);
    assert_eq!(rig.indicator.last(), Some(true));

    rig.bus.set_present(false);
    rig.run_ms(3000);
    assert_eq!(rig.indicator.last(), Some(false));

    rig.bus.set_present(true);
    rig.run_ms(3000);
    assert_eq!(rig.indicator.last(), Some(true));

    assert_eq!(rig.bus.opens(), 1);
    assert_eq!(rig.controller.recoveries(), 0);
}

#[test]
fn test_press_after_replug_recovers_and_steps() {
    let mut rig = Rig::start(7);
    rig.bus.set_present(false);
    rig.bus.set_present(true);

    rig.tap(INC);
    assert_eq!(rig.bus.program_changes(), vec![8]);
    assert_eq!(rig.controller.recoveries(), 1);
    assert_eq!(rig.bus.opens(), 2);
    assert!(rig.bus.editing_enabled());

    rig.tap(INC);
    assert_eq!(rig.bus.program_changes(), vec![8, 9]);
}

#[test]
fn test_press_while_unplugged_waits_for_pedal_then_steps() {
    let mut rig = Rig::start(3);
    rig.bus.reappear_after_scans(5);

    let before = rig.clock.elapsed();
    rig.pins.press(INC);
    rig.controller.tick();

    // Five empty scans with a backoff after each, the settle pause, one poll.
    assert_eq!(
        rig.clock.elapsed() - before,
        Duration::from_millis(5 * 300 + 100 + 25)
    );
    assert_eq!(rig.bus.program_changes(), vec![4]);
    assert_eq!(rig.controller.recoveries(), 1);

    rig.pins.release(INC);
    rig.controller.tick();
    rig.tap(INC);
    assert_eq!(rig.bus.program_changes(), vec![4, 5]);
}

#[test]
fn test_timed_out_read_is_retried_after_recovery() {
    let mut rig = Rig::start(10);
    rig.bus.drop_replies(1);

    rig.tap(INC);
    rig.run_ms(1000);

    assert_eq!(rig.bus.program_changes(), vec![11]);
    assert_eq!(rig.controller.recoveries(), 1);

    // The unanswered query wrote nothing; the write followed an answered
    // query on the reopened link.
    let ops: Vec<SimOp> = rig
        .bus
        .ops()
        .into_iter()
        .filter(|op| !matches!(op, SimOp::Scan { .. }))
        .collect();
    assert_eq!(
        ops[ops.len() - 5..],
        [
            SimOp::Query { generation: 1, answered: false },
            SimOp::Open { generation: 2 },
            SimOp::EnableEditing { generation: 2 },
            SimOp::Query { generation: 2, answered: true },
            SimOp::ProgramChange { generation: 2, patch: 11 },
        ]
    );
}

#[test]
fn test_hold_keeps_scrolling_after_garbled_reply() {
    let mut rig = Rig::start(0);
    rig.bus.garble_replies(1);

    rig.hold(INC, 900);

    // The garbled press is retried on the new link, then repeats at 500 and 800 ms.
    assert_eq!(rig.bus.program_changes(), vec![1, 2, 3]);
    assert_eq!(rig.controller.recoveries(), 1);
}

#[test]
fn test_no_frame_lands_on_a_dead_link() {
    let mut rig = Rig::start(0);
    rig.pins.press(INC);
    rig.run_ms(600);
    rig.bus.reappear_after_scans(3);
    rig.run_ms(1500);
    rig.pins.release(INC);
    rig.controller.tick();

    let rejected = rig.bus.count(|op| matches!(op, SimOp::Rejected { .. }));
    let writes = rig.bus.count(|op| matches!(op, SimOp::ProgramChange { .. }));
    assert_eq!(rejected, 1, "only the read that discovered the loss");
    assert!(writes >= 4);
    assert_eq!(rig.controller.recoveries(), 1);
}
