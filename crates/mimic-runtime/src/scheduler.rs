//! [`ControlLoop`] – fixed-rate scheduler driving the teleoperation cycle.
//!
//! Owns the controller and its four seams, and runs read → step → publish on
//! a dedicated thread at the configured period.  Each cycle:
//!
//! 1. **Drain** – read the freshest master pose, slave pose, and clutch
//!    boolean from the latest-value sources; no new data simply reuses the
//!    previous value.
//! 2. **Step** – invoke
//!    [`TeleopController::step`][mimic_control::TeleopController::step]
//!    exactly once.
//! 3. **Publish** – hand the resulting command to the
//!    [`CommandSink`][mimic_hal::CommandSink].  A rejected command is logged
//!    and counted, never fatal.
//! 4. **Pace** – sleep until the next absolute deadline.  A cycle whose body
//!    exceeds the period increments the overrun counter and re-bases the
//!    deadline from the current instant; missed ticks are never replayed.
//!
//! Shutdown happens between cycles: [`LoopHandle::stop`] raises a shared flag
//! that the loop checks at the top of each cycle, then joins the thread.
//! Dropping the handle stops the loop the same way.
//!
//! # Example
//!
//! ```rust,no_run
//! use mimic_control::TeleopConfig;
//! use mimic_hal::LatestCell;
//! use mimic_runtime::scheduler::ControlLoop;
//! use mimic_types::{MimicError, Pose};
//!
//! # struct NullSink;
//! # impl mimic_hal::CommandSink for NullSink {
//! #     fn id(&self) -> &str { "null" }
//! #     fn send(&mut self, _command: Pose) -> Result<(), MimicError> { Ok(()) }
//! # }
//! let master: LatestCell<Pose> = LatestCell::new();
//! let slave: LatestCell<Pose> = LatestCell::new();
//! let clutch: LatestCell<bool> = LatestCell::new();
//!
//! let control_loop = ControlLoop::new(
//!     TeleopConfig::default(),
//!     Box::new(master.clone()),
//!     Box::new(slave.clone()),
//!     Box::new(clutch.clone()),
//!     Box::new(NullSink),
//! )?;
//! let mut handle = control_loop.start()?;
//! // Transport threads publish into the cells while the loop runs.
//! handle.stop();
//! # Ok::<(), MimicError>(())
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mimic_control::teleop::{CycleInput, TeleopConfig, TeleopController};
use mimic_hal::{ClutchSource, CommandSink, PoseSource};
use mimic_types::MimicError;
use tracing::{debug, info, warn};

use crate::stats::{LoopStats, SharedStats};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Heartbeat debug log interval, in cycles (the reference system logs every
/// 10th cycle at 50 Hz).
const HEARTBEAT_LOG_INTERVAL: u64 = 10;

/// Overrun warnings repeat only every this many overruns after the first.
const OVERRUN_LOG_INTERVAL: u64 = 50;

const STATE_CREATED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPED: u8 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of a [`ControlLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not yet started.
    Created,
    /// The scheduler thread is executing cycles.
    Running,
    /// Stopped by request (or thread exit); no further commands are emitted.
    Stopped,
}

fn state_from_u8(raw: u8) -> LoopState {
    match raw {
        STATE_RUNNING => LoopState::Running,
        STATE_STOPPED => LoopState::Stopped,
        _ => LoopState::Created,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ControlLoop
// ─────────────────────────────────────────────────────────────────────────────

/// The fixed-rate teleoperation scheduler.
///
/// Built with explicit collaborators: three input sources and one command
/// sink, all trait objects supplied by the embedding process.  There is no
/// global registry to configure.  [`ControlLoop::start`] consumes the loop
/// and moves it onto its own thread, returning a [`LoopHandle`].
pub struct ControlLoop {
    controller: TeleopController,
    master: Box<dyn PoseSource>,
    slave: Box<dyn PoseSource>,
    clutch: Box<dyn ClutchSource>,
    sink: Box<dyn CommandSink>,
    period: Duration,
    stats: Arc<SharedStats>,
    state: Arc<AtomicU8>,
    shutdown: Arc<AtomicBool>,
}

impl ControlLoop {
    /// Build a control loop from a configuration and its four seams.
    ///
    /// # Errors
    ///
    /// Returns [`MimicError::InvalidConfig`] if the configuration fails
    /// [`TeleopConfig::validate`].
    pub fn new(
        config: TeleopConfig,
        master: Box<dyn PoseSource>,
        slave: Box<dyn PoseSource>,
        clutch: Box<dyn ClutchSource>,
        sink: Box<dyn CommandSink>,
    ) -> Result<Self, MimicError> {
        let period = config.period();
        let controller = TeleopController::new(config)?;

        Ok(Self {
            controller,
            master,
            slave,
            clutch,
            sink,
            period,
            stats: Arc::new(SharedStats::new()),
            state: Arc::new(AtomicU8::new(STATE_CREATED)),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The current lifecycle state.
    pub fn state(&self) -> LoopState {
        state_from_u8(self.state.load(Ordering::Acquire))
    }

    /// Snapshot of the cycle statistics (all zero before [`start`][Self::start]).
    pub fn stats(&self) -> LoopStats {
        self.stats.snapshot()
    }

    /// Start the scheduler thread and hand back the controlling handle.
    ///
    /// # Errors
    ///
    /// Returns [`MimicError::Scheduler`] if the OS refuses to spawn the
    /// thread.
    pub fn start(self) -> Result<LoopHandle, MimicError> {
        let state = Arc::clone(&self.state);
        let shutdown = Arc::clone(&self.shutdown);
        let stats = Arc::clone(&self.stats);

        info!(
            period_ms = self.period.as_millis() as u64,
            "starting control loop"
        );
        state.store(STATE_RUNNING, Ordering::Release);

        let thread = thread::Builder::new()
            .name("mimic-control-loop".to_string())
            .spawn(move || self.run());
        let thread = match thread {
            Ok(handle) => handle,
            Err(e) => {
                state.store(STATE_STOPPED, Ordering::Release);
                return Err(MimicError::Scheduler(format!(
                    "failed to spawn control loop thread: {e}"
                )));
            }
        };

        Ok(LoopHandle {
            thread: Some(thread),
            state,
            shutdown,
            stats,
        })
    }

    fn run(mut self) {
        let mut cycle: u64 = 0;
        let mut next_deadline = Instant::now() + self.period;

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            let cycle_start = Instant::now();

            // Drain: the freshest sample from every input, without blocking.
            let input = CycleInput {
                master: self.master.latest(),
                slave: self.slave.latest(),
                clutch: self.clutch.latest(),
            };

            let command = self.controller.step(input);

            if let Err(e) = self.sink.send(command) {
                self.stats.record_sink_error();
                warn!(
                    sink = self.sink.id(),
                    error = %e,
                    "command sink rejected cycle output"
                );
            }

            let elapsed = cycle_start.elapsed();
            self.stats.record_cycle(elapsed.as_nanos() as u64);
            cycle += 1;
            if cycle % HEARTBEAT_LOG_INTERVAL == 0 {
                debug!(
                    cycle,
                    clutch = ?self.controller.clutch_state(),
                    last_cycle_us = elapsed.as_micros() as u64,
                    "control cycle heartbeat"
                );
            }

            // Absolute-deadline pacing: a late cycle re-bases the deadline
            // from now instead of bursting to replay missed ticks.
            let now = Instant::now();
            if now < next_deadline {
                thread::sleep(next_deadline - now);
                next_deadline += self.period;
            } else {
                if elapsed > self.period {
                    let overruns = self.stats.record_overrun();
                    if overruns == 1 || overruns % OVERRUN_LOG_INTERVAL == 0 {
                        warn!(
                            overruns,
                            cycle_us = elapsed.as_micros() as u64,
                            period_ms = self.period.as_millis() as u64,
                            "control cycle overran its period"
                        );
                    }
                }
                next_deadline = now + self.period;
            }
        }

        self.state.store(STATE_STOPPED, Ordering::Release);
        info!(cycles = cycle, "control loop stopped");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LoopHandle
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to a running [`ControlLoop`].
///
/// [`stop`][LoopHandle::stop] requests shutdown between cycles and joins the
/// scheduler thread; dropping the handle does the same.  State and statistics
/// remain readable after the loop has stopped.
pub struct LoopHandle {
    thread: Option<JoinHandle<()>>,
    state: Arc<AtomicU8>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<SharedStats>,
}

impl LoopHandle {
    /// The current lifecycle state.
    pub fn state(&self) -> LoopState {
        state_from_u8(self.state.load(Ordering::Acquire))
    }

    /// Snapshot of the cycle statistics.
    pub fn stats(&self) -> LoopStats {
        self.stats.snapshot()
    }

    /// Request shutdown and wait for the scheduler thread to finish.
    ///
    /// The in-flight cycle completes first; no command is cut off half-way.
    /// Calling `stop` more than once is a no-op.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            debug!("waiting for control loop thread to finish");
            if thread.join().is_err() {
                warn!("control loop thread panicked");
                self.state.store(STATE_STOPPED, Ordering::Release);
            }
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_control::FrameTransform;
    use mimic_hal::LatestCell;
    use mimic_types::Pose;
    use nalgebra::{UnitQuaternion, Vector3};
    use std::sync::Mutex;

    /// Sink that records every command it receives.
    struct RecordingSink {
        commands: Arc<Mutex<Vec<Pose>>>,
    }

    impl RecordingSink {
        fn new() -> (Self, Arc<Mutex<Vec<Pose>>>) {
            let commands = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    commands: Arc::clone(&commands),
                },
                commands,
            )
        }
    }

    impl CommandSink for RecordingSink {
        fn id(&self) -> &str {
            "recording_sink"
        }

        fn send(&mut self, command: Pose) -> Result<(), MimicError> {
            self.commands.lock().unwrap().push(command);
            Ok(())
        }
    }

    /// Sink that rejects every command.
    struct FailingSink;

    impl CommandSink for FailingSink {
        fn id(&self) -> &str {
            "failing_sink"
        }

        fn send(&mut self, _command: Pose) -> Result<(), MimicError> {
            Err(MimicError::Sink {
                component: "failing_sink".to_string(),
                details: "transport closed".to_string(),
            })
        }
    }

    /// Sink slow enough to force every cycle over its period.
    struct SlowSink {
        delay: Duration,
    }

    impl CommandSink for SlowSink {
        fn id(&self) -> &str {
            "slow_sink"
        }

        fn send(&mut self, _command: Pose) -> Result<(), MimicError> {
            thread::sleep(self.delay);
            Ok(())
        }
    }

    fn fast_config() -> TeleopConfig {
        TeleopConfig {
            period_ms: 1,
            frame: FrameTransform::identity(),
            ..TeleopConfig::default()
        }
    }

    fn build_loop(
        config: TeleopConfig,
        sink: Box<dyn CommandSink>,
    ) -> (
        ControlLoop,
        LatestCell<Pose>,
        LatestCell<Pose>,
        LatestCell<bool>,
    ) {
        let master: LatestCell<Pose> = LatestCell::new();
        let slave: LatestCell<Pose> = LatestCell::new();
        let clutch: LatestCell<bool> = LatestCell::new();
        let control_loop = ControlLoop::new(
            config,
            Box::new(master.clone()),
            Box::new(slave.clone()),
            Box::new(clutch.clone()),
            sink,
        )
        .expect("test config should be valid");
        (control_loop, master, slave, clutch)
    }

    #[test]
    fn new_loop_reports_created_state() {
        let (sink, _) = RecordingSink::new();
        let (control_loop, _, _, _) = build_loop(fast_config(), Box::new(sink));
        assert_eq!(control_loop.state(), LoopState::Created);
        assert_eq!(control_loop.stats().cycles, 0);
    }

    #[test]
    fn zero_period_config_is_rejected() {
        let config = TeleopConfig {
            period_ms: 0,
            ..TeleopConfig::default()
        };
        let (sink, _) = RecordingSink::new();
        let result = ControlLoop::new(
            config,
            Box::new(LatestCell::<Pose>::new()),
            Box::new(LatestCell::<Pose>::new()),
            Box::new(LatestCell::<bool>::new()),
            Box::new(sink),
        );
        assert!(matches!(result, Err(MimicError::InvalidConfig(_))));
    }

    #[test]
    fn loop_emits_one_command_per_cycle() {
        let (sink, commands) = RecordingSink::new();
        let (control_loop, _, _, _) = build_loop(fast_config(), Box::new(sink));

        let mut handle = control_loop.start().unwrap();
        assert_eq!(handle.state(), LoopState::Running);
        thread::sleep(Duration::from_millis(50));
        handle.stop();

        assert_eq!(handle.state(), LoopState::Stopped);
        let stats = handle.stats();
        assert!(stats.cycles > 0);
        assert_eq!(commands.lock().unwrap().len() as u64, stats.cycles);
    }

    #[test]
    fn hold_commands_track_live_slave_pose() {
        let (sink, commands) = RecordingSink::new();
        let (control_loop, _master, slave, clutch) = build_loop(fast_config(), Box::new(sink));

        let slave_pose = Pose::new(
            Vector3::new(0.3, -0.2, 0.9),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3),
        );
        slave.publish(slave_pose);
        // Pedal held for the whole run.
        clutch.publish(true);

        let mut handle = control_loop.start().unwrap();
        thread::sleep(Duration::from_millis(30));
        handle.stop();

        let recorded = commands.lock().unwrap();
        assert!(!recorded.is_empty());
        for command in recorded.iter() {
            assert_eq!(*command, slave_pose);
        }
    }

    #[test]
    fn coupled_motion_reaches_sink() {
        let (sink, commands) = RecordingSink::new();
        let (control_loop, master, slave, clutch) = build_loop(fast_config(), Box::new(sink));

        master.publish(Pose::identity());
        slave.publish(Pose::identity());
        clutch.publish(false);

        let mut handle = control_loop.start().unwrap();
        thread::sleep(Duration::from_millis(20));
        // One master displacement mid-run; it must be applied exactly once.
        master.publish(Pose::new(
            Vector3::new(0.25, 0.0, 0.0),
            UnitQuaternion::identity(),
        ));
        thread::sleep(Duration::from_millis(30));
        handle.stop();

        let recorded = commands.lock().unwrap();
        let last = recorded.last().expect("loop should have emitted commands");
        assert!((last.translation.x - 0.25).abs() < 1e-9);
    }

    #[test]
    fn stop_is_idempotent() {
        let (sink, _) = RecordingSink::new();
        let (control_loop, _, _, _) = build_loop(fast_config(), Box::new(sink));

        let mut handle = control_loop.start().unwrap();
        thread::sleep(Duration::from_millis(10));
        handle.stop();
        handle.stop();
        assert_eq!(handle.state(), LoopState::Stopped);
    }

    #[test]
    fn dropping_handle_stops_loop() {
        let (sink, commands) = RecordingSink::new();
        let (control_loop, _, _, _) = build_loop(fast_config(), Box::new(sink));

        let handle = control_loop.start().unwrap();
        thread::sleep(Duration::from_millis(20));
        drop(handle);

        let after_drop = commands.lock().unwrap().len();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(commands.lock().unwrap().len(), after_drop);
    }

    #[test]
    fn failing_sink_does_not_stop_loop() {
        let (control_loop, _, _, _) = build_loop(fast_config(), Box::new(FailingSink));

        let mut handle = control_loop.start().unwrap();
        thread::sleep(Duration::from_millis(30));
        handle.stop();

        assert_eq!(handle.state(), LoopState::Stopped);
        let stats = handle.stats();
        assert!(stats.cycles > 0);
        // Every cycle failed to deliver, and every cycle still completed.
        assert_eq!(stats.sink_errors, stats.cycles);
    }

    #[test]
    fn slow_cycles_count_overruns() {
        let sink = SlowSink {
            delay: Duration::from_millis(5),
        };
        let (control_loop, _, _, _) = build_loop(fast_config(), Box::new(sink));

        let mut handle = control_loop.start().unwrap();
        thread::sleep(Duration::from_millis(60));
        handle.stop();

        let stats = handle.stats();
        assert!(stats.cycles > 0);
        assert!(stats.overruns > 0);
        assert!(stats.max_cycle_ns >= 5_000_000);
    }

    #[test]
    fn stats_track_cycle_durations() {
        let (sink, _) = RecordingSink::new();
        let (control_loop, _, _, _) = build_loop(fast_config(), Box::new(sink));

        let mut handle = control_loop.start().unwrap();
        thread::sleep(Duration::from_millis(30));
        handle.stop();

        let stats = handle.stats();
        assert!(stats.cycles > 0);
        assert!(stats.max_cycle_ns >= stats.last_cycle_ns);
    }
}
