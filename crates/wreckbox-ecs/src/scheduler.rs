//! The fixed-priority system scheduler.
//!
//! One tick runs every registered system exactly once, in ascending priority
//! order (registration order breaks ties), synchronously on the single
//! simulation thread. The order is load-bearing — destruction must see
//! post-step velocities, repair must see the post-destruction body set — so
//! the scheduler offers no reordering freedom at all.

use thiserror::Error;

/// Ceiling applied to the frame delta before any system sees it. A stalled
/// frame (debugger, tab switch) must not destabilize integration-based
/// systems with a giant step.
pub const MAX_DELTA_MS: f32 = 100.0;

/// Error surfaced by a system's `update`. The scheduler logs it and treats
/// that system's frame as a no-op; nothing propagates further.
#[derive(Debug, Error)]
pub enum SystemError {
    /// A referenced entity disappeared mid-frame.
    #[error("entity {0} no longer exists")]
    MissingEntity(u64),
    /// Any other internal failure, described for the log.
    #[error("{0}")]
    Failed(String),
}

/// Per-frame timing handed to every system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Frame delta in milliseconds, clamped to [`MAX_DELTA_MS`].
    pub delta_ms: f32,
    /// Frame delta in seconds, derived from `delta_ms`.
    pub delta_secs: f32,
    /// Total simulation time in seconds since the scheduler was created.
    pub elapsed_secs: f64,
    /// Monotonic frame counter.
    pub frame: u64,
}

/// One unit of per-tick logic.
///
/// `C` is the engine's tick context (world, physics, render boundary). A
/// system must not panic: fallible internals return `Err` and the scheduler
/// degrades that system to a no-op for the frame.
pub trait System<C> {
    /// Display name for logs.
    fn name(&self) -> &'static str;

    /// Execution priority; lower runs earlier. Fixed for the lifetime of
    /// the system.
    fn priority(&self) -> i32;

    /// Runs one frame of this system's logic.
    fn update(&mut self, ctx: &mut C, tick: &Tick) -> Result<(), SystemError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    Idle,
    Ticking,
}

/// Owns the ordered system list and drives it once per frame.
pub struct Scheduler<C> {
    systems: Vec<Box<dyn System<C>>>,
    sorted: bool,
    state: SchedulerState,
    elapsed_secs: f64,
    frame: u64,
}

impl<C> Scheduler<C> {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            sorted: true,
            state: SchedulerState::Idle,
            elapsed_secs: 0.0,
            frame: 0,
        }
    }

    /// Registers a system. Systems sharing a priority run in registration
    /// order.
    pub fn register(&mut self, system: Box<dyn System<C>>) {
        self.systems.push(system);
        self.sorted = false;
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Total simulation time advanced so far, in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Runs one frame: clamps `delta_ms`, then invokes every system in
    /// priority order. A system returning `Err` is logged and skipped for
    /// this frame only.
    ///
    /// Re-entry (a system ticking the scheduler that is ticking it) is a
    /// programming error; the nested call is refused and logged.
    pub fn tick(&mut self, ctx: &mut C, delta_ms: f32) {
        if self.state == SchedulerState::Ticking {
            debug_assert!(false, "scheduler tick re-entered");
            tracing::error!("scheduler tick re-entered; ignoring nested tick");
            return;
        }

        if !self.sorted {
            // Stable: registration order breaks priority ties.
            self.systems.sort_by_key(|s| s.priority());
            self.sorted = true;
        }

        let delta_ms = if delta_ms.is_finite() {
            delta_ms.clamp(0.0, MAX_DELTA_MS)
        } else {
            0.0
        };
        let delta_secs = delta_ms / 1000.0;
        self.elapsed_secs += f64::from(delta_secs);
        self.frame += 1;

        let tick = Tick {
            delta_ms,
            delta_secs,
            elapsed_secs: self.elapsed_secs,
            frame: self.frame,
        };

        self.state = SchedulerState::Ticking;
        for system in &mut self.systems {
            if let Err(err) = system.update(ctx, &tick) {
                tracing::warn!(
                    system = system.name(),
                    error = %err,
                    "system update failed; degraded to no-op this frame"
                );
            }
        }
        self.state = SchedulerState::Idle;
    }
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        name: &'static str,
        priority: i32,
        fail: bool,
    }

    impl System<Vec<&'static str>> for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn update(&mut self, log: &mut Vec<&'static str>, _tick: &Tick) -> Result<(), SystemError> {
            if self.fail {
                return Err(SystemError::Failed("boom".into()));
            }
            log.push(self.name);
            Ok(())
        }
    }

    fn recorder(name: &'static str, priority: i32) -> Box<Recorder> {
        Box::new(Recorder {
            name,
            priority,
            fail: false,
        })
    }

    #[test]
    fn test_systems_run_in_priority_order_regardless_of_registration() {
        let mut scheduler: Scheduler<Vec<&'static str>> = Scheduler::new();
        scheduler.register(recorder("repair", 900));
        scheduler.register(recorder("input", 0));
        scheduler.register(recorder("physics", 200));
        scheduler.register(recorder("combat", 120));

        let mut log = Vec::new();
        scheduler.tick(&mut log, 16.0);
        assert_eq!(log, vec!["input", "combat", "physics", "repair"]);

        log.clear();
        scheduler.tick(&mut log, 16.0);
        assert_eq!(
            log,
            vec!["input", "combat", "physics", "repair"],
            "order must hold on every tick"
        );
    }

    #[test]
    fn test_equal_priority_ties_break_by_registration_order() {
        let mut scheduler: Scheduler<Vec<&'static str>> = Scheduler::new();
        scheduler.register(recorder("first", 500));
        scheduler.register(recorder("second", 500));
        scheduler.register(recorder("third", 500));

        let mut log = Vec::new();
        scheduler.tick(&mut log, 16.0);
        assert_eq!(log, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_delta_is_clamped_to_maximum() {
        struct DtProbe;
        impl System<Vec<f32>> for DtProbe {
            fn name(&self) -> &'static str {
                "dt_probe"
            }
            fn priority(&self) -> i32 {
                0
            }
            fn update(&mut self, out: &mut Vec<f32>, tick: &Tick) -> Result<(), SystemError> {
                out.push(tick.delta_ms);
                Ok(())
            }
        }

        let mut scheduler: Scheduler<Vec<f32>> = Scheduler::new();
        scheduler.register(Box::new(DtProbe));

        let mut seen = Vec::new();
        scheduler.tick(&mut seen, 16.0);
        scheduler.tick(&mut seen, 5000.0);
        scheduler.tick(&mut seen, f32::NAN);
        assert_eq!(seen, vec![16.0, MAX_DELTA_MS, 0.0]);
    }

    #[test]
    fn test_failing_system_does_not_stop_later_systems() {
        let mut scheduler: Scheduler<Vec<&'static str>> = Scheduler::new();
        scheduler.register(recorder("before", 10));
        scheduler.register(Box::new(Recorder {
            name: "broken",
            priority: 20,
            fail: true,
        }));
        scheduler.register(recorder("after", 30));

        let mut log = Vec::new();
        scheduler.tick(&mut log, 16.0);
        assert_eq!(log, vec!["before", "after"]);
    }

    #[test]
    fn test_elapsed_time_accumulates_clamped_deltas() {
        let mut scheduler: Scheduler<Vec<&'static str>> = Scheduler::new();
        let mut log = Vec::new();
        scheduler.tick(&mut log, 1000.0); // clamps to 100ms
        scheduler.tick(&mut log, 50.0);
        assert!((scheduler.elapsed_secs() - 0.15).abs() < 1e-6);
        assert_eq!(scheduler.frame(), 2);
    }
}
