//! Ownership of every task a cycle spawns.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::CycleEvent;

/// All timer, interval and reader tasks belonging to the active cycle.
///
/// Every task the cycle spawns is registered here, so a single
/// [`CycleHandle::cancel_all`] tears the whole cycle down. The simulator's
/// intervals are kept apart so a device taking over can stop just those.
#[derive(Debug, Default)]
pub struct CycleHandle {
    timers: Vec<JoinHandle<()>>,
    simulation: Vec<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl CycleHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `event` once after `delay`.
    pub fn after(
        &mut self,
        delay: Duration,
        event: CycleEvent,
        events: &mpsc::UnboundedSender<CycleEvent>,
    ) {
        let events = events.clone();
        self.timers.push(tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = events.send(event);
        }));
    }

    /// Send an event every `period`, first one `period` from now.
    ///
    /// `make_event` receives the instant the timer fired.
    pub fn every<F>(
        &mut self,
        period: Duration,
        events: &mpsc::UnboundedSender<CycleEvent>,
        make_event: F,
    ) where
        F: Fn(Instant) -> CycleEvent + Send + 'static,
    {
        self.timers.push(spawn_interval(period, events, make_event));
    }

    /// Like [`CycleHandle::every`], for an interval driving the simulator.
    pub fn simulate_every<F>(
        &mut self,
        period: Duration,
        events: &mpsc::UnboundedSender<CycleEvent>,
        make_event: F,
    ) where
        F: Fn(Instant) -> CycleEvent + Send + 'static,
    {
        self.simulation.push(spawn_interval(period, events, make_event));
    }

    /// Abort the simulator's intervals only.
    ///
    /// Returns how many were cancelled.
    pub fn stop_simulation(&mut self) -> usize {
        let mut cancelled = 0;
        for task in self.simulation.drain(..) {
            task.abort();
            cancelled += 1;
        }
        cancelled
    }

    /// Track the external source's read loop, replacing any previous one.
    pub fn set_reader(&mut self, reader: JoinHandle<()>) {
        if let Some(previous) = self.reader.replace(reader) {
            previous.abort();
        }
    }

    /// Abort the read loop only, leaving timers running.
    pub fn release_reader(&mut self) -> bool {
        match self.reader.take() {
            Some(reader) => {
                reader.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every tracked task. Safe to call any number of times.
    ///
    /// Returns how many handles were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for timer in self.timers.drain(..) {
            timer.abort();
            cancelled += 1;
        }
        cancelled += self.stop_simulation();
        if self.release_reader() {
            cancelled += 1;
        }
        cancelled
    }

    /// Number of tracked handles, finished or not.
    pub fn tracked(&self) -> usize {
        self.timers.len() + self.simulation.len() + usize::from(self.reader.is_some())
    }
}

fn spawn_interval<F>(
    period: Duration,
    events: &mpsc::UnboundedSender<CycleEvent>,
    make_event: F,
) -> JoinHandle<()>
where
    F: Fn(Instant) -> CycleEvent + Send + 'static,
{
    let events = events.clone();
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let at = interval.tick().await;
            if events.send(make_event(at)).is_err() {
                // Cycle dropped
                break;
            }
        }
    })
}

impl Drop for CycleHandle {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_after_fires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = CycleHandle::new();
        handle.after(Duration::from_secs(1), CycleEvent::Complete { generation: 1 }, &tx);

        time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(rx.try_recv().unwrap(), CycleEvent::Complete { generation: 1 });
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_skips_immediate_tick() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = CycleHandle::new();
        handle.every(Duration::from_millis(500), &tx, |_| CycleEvent::SimulationSample {
            generation: 1,
        });

        time::sleep(Duration::from_millis(250)).await;
        assert!(rx.try_recv().is_err());

        time::sleep(Duration::from_millis(1_000)).await;
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = CycleHandle::new();
        handle.after(Duration::from_secs(1), CycleEvent::Complete { generation: 1 }, &tx);
        handle.every(Duration::from_millis(100), &tx, |at| CycleEvent::Tick { generation: 1, at });
        handle.set_reader(tokio::spawn(std::future::pending()));
        assert_eq!(handle.tracked(), 3);

        assert_eq!(handle.cancel_all(), 3);
        assert_eq!(handle.cancel_all(), 0);
        assert_eq!(handle.tracked(), 0);

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_reader_keeps_timers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = CycleHandle::new();
        handle.after(Duration::from_secs(1), CycleEvent::Complete { generation: 2 }, &tx);
        handle.set_reader(tokio::spawn(std::future::pending()));

        assert!(handle.release_reader());
        assert!(!handle.release_reader());
        assert_eq!(handle.tracked(), 1);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.try_recv().unwrap(), CycleEvent::Complete { generation: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_simulation_keeps_cycle_timers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = CycleHandle::new();
        handle.after(Duration::from_secs(2), CycleEvent::Complete { generation: 1 }, &tx);
        handle.simulate_every(Duration::from_millis(500), &tx, |_| {
            CycleEvent::SimulationSample { generation: 1 }
        });
        handle.simulate_every(Duration::from_secs(1), &tx, |_| CycleEvent::TestPick {
            generation: 1,
        });
        assert_eq!(handle.tracked(), 3);

        assert_eq!(handle.stop_simulation(), 2);
        assert_eq!(handle.stop_simulation(), 0);
        assert_eq!(handle.tracked(), 1);

        time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(rx.try_recv().unwrap(), CycleEvent::Complete { generation: 1 });
        assert!(rx.try_recv().is_err());
    }
}
