//! Assertion helpers for run events.

use conduit_protocol::Event;
use tokio::sync::mpsc;

/// Drain every event currently buffered in `rx`.
#[allow(dead_code)]
pub fn drain_events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Completed runs of `runner_id`, split into (succeeded, failed).
#[allow(dead_code)]
pub fn completed_runs(events: &[Event], runner_id: &str) -> (usize, usize) {
    events
        .iter()
        .filter_map(|event| match event {
            Event::RunCompleted {
                runner_id: id,
                result,
                ..
            } if id == runner_id => Some(result.has_failed()),
            _ => None,
        })
        .fold((0, 0), |(ok, failed), has_failed| {
            if has_failed {
                (ok, failed + 1)
            } else {
                (ok + 1, failed)
            }
        })
}

/// Number of fatal `RunFailed` events for `runner_id`.
#[allow(dead_code)]
pub fn fatal_failures(events: &[Event], runner_id: &str) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(event, Event::RunFailed { runner_id: id, fatal: true, .. } if id == runner_id)
        })
        .count()
}
