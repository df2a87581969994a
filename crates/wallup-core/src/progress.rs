//! Display-progress smoothing (purely cosmetic).
//!
//! The orchestrator publishes coarse milestones (5/10/15/40/70/100); the UI
//! renders a value that ticks toward the latest milestone at a range-dependent
//! rate. This runs as an independent task fed by progress events so the state
//! machine never depends on timer behavior.

use std::time::Duration;

use tokio::sync::watch;

/// One smoothing step: move `display` toward `target`, never past it.
/// Increments are slower below 15, medium between 15 and 70, fast above.
pub fn step_toward(display: f32, target: f32) -> f32 {
    if display >= target {
        return display;
    }
    let increment = if display < 15.0 {
        0.5
    } else if display < 70.0 {
        1.5
    } else {
        3.0
    };
    (display + increment).min(target)
}

/// Ticks a displayed value toward the latest coarse progress.
///
/// `target_rx` carries the orchestrator's raw percentage; the smoothed value
/// is published on the returned receiver. The task ends when the sender side
/// of `target_rx` is dropped and the display has caught up.
pub fn spawn_smoother(
    mut target_rx: watch::Receiver<u8>,
    tick: Duration,
) -> watch::Receiver<f32> {
    let (tx, rx) = watch::channel(0.0f32);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        let mut display = 0.0f32;
        loop {
            interval.tick().await;
            let target = *target_rx.borrow_and_update() as f32;
            let next = step_toward(display, target);
            if (next - display).abs() > f32::EPSILON {
                display = next;
                if tx.send(display).is_err() {
                    return;
                }
            }
            if target_rx.has_changed().is_err() && display >= target {
                return;
            }
        }
    });
    rx
}
