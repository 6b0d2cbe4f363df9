//! Fixed-timestep animation driver.
//!
//! Turns the variable-rate repaint clock into a stream of fixed-size ticks.
//! Leftover time carries over between frames; a single long frame is clamped
//! to one tick's worth of time so a stall never turns into a burst of catch-up
//! steps.

use tracing::debug;

/// Fixed tick size in seconds
pub const TICK_RATE: f64 = 1.0 / 3.0;

/// What a frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Ticks delivered to the step function
    pub ticks: usize,
    /// Whether another frame should be requested
    pub reschedule: bool,
}

impl FrameOutcome {
    const IDLE: Self = Self { ticks: 0, reschedule: false };
}

/// State of one animation run. A fresh run starts on every `start`.
#[derive(Debug, Clone, Default)]
struct Run {
    accumulator: f64,
    last: Option<f64>,
}

/// Fixed-timestep animator
#[derive(Debug, Clone, Default)]
pub struct Animator {
    run: Option<Run>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new run with an empty accumulator. Restarts a running animator.
    pub fn start(&mut self) {
        debug!("animator started");
        self.run = Some(Run::default());
    }

    /// Cancel the current run. No tick fires after this returns.
    pub fn stop(&mut self) {
        if self.run.take().is_some() {
            debug!("animator stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Handle one rendering frame at wall-clock time `now` (seconds).
    ///
    /// Delivers zero or more `TICK_RATE` ticks to `step`. If `step` fails the
    /// animator stops and the error is returned.
    pub fn frame<E>(
        &mut self,
        now: f64,
        mut step: impl FnMut(f64) -> Result<(), E>,
    ) -> Result<FrameOutcome, E> {
        let Some(run) = self.run.as_mut() else {
            return Ok(FrameOutcome::IDLE);
        };

        // The first frame of a run only fixes the time origin.
        let dt = match run.last {
            Some(last) => (now - last).clamp(0.0, TICK_RATE),
            None => 0.0,
        };
        run.last = Some(now);
        run.accumulator += dt;

        let mut ticks = 0;
        while run.accumulator >= TICK_RATE {
            if let Err(e) = step(TICK_RATE) {
                self.stop();
                return Err(e);
            }
            run.accumulator -= TICK_RATE;
            ticks += 1;
        }

        Ok(FrameOutcome { ticks, reschedule: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn count_ticks(animator: &mut Animator, times_ms: &[f64]) -> usize {
        let mut ticks = 0;
        for &t in times_ms {
            animator
                .frame(t / 1000.0, |dt| {
                    assert_eq!(dt, TICK_RATE);
                    ticks += 1;
                    Ok::<_, Infallible>(())
                })
                .unwrap();
        }
        ticks
    }

    #[test]
    fn idle_animator_does_nothing() {
        let mut animator = Animator::new();
        let outcome = animator
            .frame(1.0, |_| -> Result<(), Infallible> { panic!("should not tick") })
            .unwrap();
        assert_eq!(outcome, FrameOutcome::IDLE);
    }

    #[test]
    fn accumulates_short_frames() {
        let mut animator = Animator::new();
        animator.start();
        // 300 ms accumulated, short of one tick
        assert_eq!(count_ticks(&mut animator, &[0.0, 100.0, 200.0, 300.0]), 0);
        // 400 ms accumulated
        assert_eq!(count_ticks(&mut animator, &[400.0]), 1);
        // 1100 ms accumulated in total
        let later = [500.0, 600.0, 700.0, 800.0, 900.0, 1000.0, 1100.0];
        assert_eq!(count_ticks(&mut animator, &later), 2);
    }

    #[test]
    fn long_stall_is_clamped_to_one_tick() {
        let mut animator = Animator::new();
        animator.start();
        assert_eq!(count_ticks(&mut animator, &[0.0, 10_000.0]), 1);
        // leftover is below one tick, so an immediate frame adds nothing
        assert_eq!(count_ticks(&mut animator, &[10_000.0]), 0);
    }

    #[test]
    fn stop_cancels_pending_ticks() {
        let mut animator = Animator::new();
        animator.start();
        count_ticks(&mut animator, &[0.0, 300.0]);
        animator.stop();
        assert!(!animator.is_running());
        assert_eq!(count_ticks(&mut animator, &[10_000.0, 20_000.0]), 0);
    }

    #[test]
    fn restart_uses_fresh_state() {
        let mut animator = Animator::new();
        animator.start();
        count_ticks(&mut animator, &[0.0, 300.0]);
        animator.stop();
        animator.start();
        // 300 ms from the previous run are gone, the new origin is 5000 ms
        assert_eq!(count_ticks(&mut animator, &[5_000.0, 5_100.0]), 0);
        assert_eq!(count_ticks(&mut animator, &[5_340.0]), 1);
    }

    #[test]
    fn step_error_stops_the_animation() {
        let mut animator = Animator::new();
        animator.start();
        animator.frame(0.0, |_| Ok::<_, &str>(())).unwrap();
        let err = animator.frame(0.5, |_| Err("boom")).unwrap_err();
        assert_eq!(err, "boom");
        assert!(!animator.is_running());
    }

    #[test]
    fn clock_going_backwards_adds_no_time() {
        let mut animator = Animator::new();
        animator.start();
        assert_eq!(count_ticks(&mut animator, &[1000.0, 500.0, 700.0]), 0);
    }
}
