//! Repeated curve acquisitions paced against a cooperating capture thread.
//!
//! [`LockIn7270::run`] keeps triggering and draining curve acquisitions while a shared
//! voltage reading stays above a stop threshold. A second thread (typically driving an
//! oscilloscope or consuming the decoded data) synchronizes with the loop through
//! [`RunSync`]: `cycle_start` is set before each trigger, `data_ready` is pulsed after each
//! drain, and both threads meet at the cycle barrier before the next iteration.

use std::sync::{Arc, Barrier, Condvar, Mutex};
use std::thread;

use benchlink::{InstrumentError, InstrumentInterface};

use crate::curve::CurveConfig;
use crate::LockIn7270;

/// The shared voltage window the run loop polls between cycles.
///
/// `current_mv` is updated by whoever monitors the sample (e.g. a diode temperature
/// monitor); the run loop keeps acquiring while it stays above `stop_mv`. Always accessed
/// under the surrounding mutex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoltageWindow {
    /// Most recent voltage reading in millivolts.
    pub current_mv: f64,
    /// Reading at which to stop acquiring, in millivolts.
    pub stop_mv: f64,
}

struct EventState {
    set: bool,
    generation: u64,
}

/// A manually resettable event for thread synchronization.
///
/// `set`/`clear`/`is_set`/`wait` give level-triggered semantics. `pulse` and `wait_pulse`
/// give edge semantics backed by a generation counter: a waiter blocked in `wait_pulse`
/// before the pulse is guaranteed to wake, even though the event is immediately cleared
/// again. Waiters that arrive after the pulse wait for the next one.
pub struct SyncEvent {
    state: Mutex<EventState>,
    condvar: Condvar,
}

impl SyncEvent {
    /// Create a new event in the cleared state.
    pub fn new() -> Self {
        SyncEvent {
            state: Mutex::new(EventState {
                set: false,
                generation: 0,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Set the event and wake all waiters.
    pub fn set(&self) {
        let mut state = self.state.lock().expect("Mutex should not be poisoned");
        state.set = true;
        state.generation += 1;
        self.condvar.notify_all();
    }

    /// Clear the event.
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("Mutex should not be poisoned");
        state.set = false;
    }

    /// Whether the event is currently set.
    pub fn is_set(&self) -> bool {
        self.state.lock().expect("Mutex should not be poisoned").set
    }

    /// Block until the event is set. Returns immediately if it already is.
    pub fn wait(&self) {
        let mut state = self.state.lock().expect("Mutex should not be poisoned");
        while !state.set {
            state = self
                .condvar
                .wait(state)
                .expect("Mutex should not be poisoned");
        }
    }

    /// Set and immediately clear the event, waking all current waiters.
    pub fn pulse(&self) {
        let mut state = self.state.lock().expect("Mutex should not be poisoned");
        state.set = false;
        state.generation += 1;
        self.condvar.notify_all();
    }

    /// Block until the next `set` or `pulse`. The caller must already be waiting when the
    /// pulse fires; a pulse that happened earlier is not observed.
    pub fn wait_pulse(&self) {
        let mut state = self.state.lock().expect("Mutex should not be poisoned");
        let seen = state.generation;
        while state.generation == seen {
            state = self
                .condvar
                .wait(state)
                .expect("Mutex should not be poisoned");
        }
    }
}

impl Default for SyncEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// Synchronization handles shared between the run loop and its capture thread.
pub struct RunSync {
    /// Set by the run loop just before each `TD` trigger.
    pub cycle_start: Arc<SyncEvent>,
    /// Pulsed by the run loop once a cycle's data has been drained and decoded.
    pub data_ready: Arc<SyncEvent>,
    /// Owned by the capture thread; the run loop never touches it.
    pub consumer_done: Arc<SyncEvent>,
    /// Meeting point at the end of each cycle.
    pub cycle_barrier: Arc<Barrier>,
}

impl RunSync {
    /// Create the synchronization set for `parties` threads meeting at the cycle barrier.
    pub fn new(parties: usize) -> Self {
        RunSync {
            cycle_start: Arc::new(SyncEvent::new()),
            data_ready: Arc::new(SyncEvent::new()),
            consumer_done: Arc::new(SyncEvent::new()),
            cycle_barrier: Arc::new(Barrier::new(parties)),
        }
    }
}

impl<T: InstrumentInterface> LockIn7270<T> {
    /// Acquire curves in a loop until the shared voltage reading drops to the stop value.
    ///
    /// Each cycle reconfigures the curve buffer, signals `cycle_start`, triggers the
    /// acquisition, sleeps out [`CurveConfig::acquisition_time`], drains all channels into
    /// the data store, pulses `data_ready`, and meets the other threads at the cycle
    /// barrier. The window is re-read under its lock after every cycle; if the stop
    /// condition already holds on entry, no cycle runs.
    ///
    /// Drain faults abort the loop with an error. The sleep is not cancellable, so a cycle
    /// that has been triggered always completes.
    pub fn run(
        &mut self,
        window: &Arc<Mutex<VoltageWindow>>,
        sync: &RunSync,
        config: &CurveConfig,
    ) -> Result<(), InstrumentError> {
        config.validate()?;
        log::info!("lock-in run loop started");
        let (mut current, stop) = {
            let win = window.lock().expect("Mutex should not be poisoned");
            (win.current_mv, win.stop_mv)
        };
        while current > stop {
            self.curve_setup(config)?;
            sync.cycle_start.set();
            self.start_acquisition();
            thread::sleep(config.acquisition_time());
            self.read_all_curves()?;
            sync.data_ready.pulse();
            sync.cycle_barrier.wait();
            current = window
                .lock()
                .expect("Mutex should not be poisoned")
                .current_mv;
            log::debug!("cycle complete, sample at {current} mV (stop at {stop} mV)");
        }
        log::info!("lock-in run loop finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn event_level_semantics() {
        let event = SyncEvent::new();
        assert!(!event.is_set());
        event.set();
        assert!(event.is_set());
        // wait returns immediately on a set event
        event.wait();
        event.clear();
        assert!(!event.is_set());
    }

    #[test]
    fn pulse_wakes_blocked_waiter() {
        let event = Arc::new(SyncEvent::new());
        let waiter = {
            let event = Arc::clone(&event);
            thread::spawn(move || event.wait_pulse())
        };
        // give the waiter time to block
        thread::sleep(Duration::from_millis(50));
        event.pulse();
        waiter.join().unwrap();
        // a pulse leaves the event cleared
        assert!(!event.is_set());
    }

    #[test]
    fn set_wakes_pulse_waiter() {
        let event = Arc::new(SyncEvent::new());
        let waiter = {
            let event = Arc::clone(&event);
            thread::spawn(move || event.wait_pulse())
        };
        thread::sleep(Duration::from_millis(50));
        event.set();
        waiter.join().unwrap();
        assert!(event.is_set());
    }
}
