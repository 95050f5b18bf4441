//! Actuator state and commit handling
//!
//! Every piece of state touched by both the bus thread and the timer task
//! lives in [`Shared`] behind a single mutex, GPIO sink included.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::debounce;
use crate::config::DebounceStrategy;
use crate::error::RumbleError;
use crate::events::RumbleEvent;
use crate::gpio::{values, GpioSink, Pin};
use crate::lifecycle::StopHandle;
use crate::recognizer::{Intent, PendingIntent};

/// Capacity of the event channel; slow subscribers see `Lagged`
const EVENT_CAPACITY: usize = 64;

/// Mutable actuator state
struct Shared {
    gpio: Box<dyn GpioSink>,
    /// Last committed intent
    intent: PendingIntent,
    /// Time of the most recent Off commit still awaiting release
    last_release: Option<Instant>,
    /// When the motor line was asserted; `None` while released
    engaged_at: Option<Instant>,
    /// Bumped on every commit; a one-shot release only fires for its own
    generation: u64,
    release_task: Option<JoinHandle<()>>,
}

impl Shared {
    fn write(&mut self, pin: Pin, value: u16) {
        trace!(%pin, value, "gpio write");
        self.gpio.write(pin, value);
    }
}

/// State shared with the timer tasks
pub(super) struct Inner {
    state: Mutex<Shared>,
    events: broadcast::Sender<RumbleEvent>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("actuator lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn emit(&self, event: RumbleEvent) {
        debug!(%event, "emitting rumble event");
        let _ = self.events.send(event);
    }

    /// Deassert the motor line and clear the recorded release
    ///
    /// The write is repeated even if the motor was never engaged; the event
    /// is only emitted for an actual on-to-off transition.
    fn release(&self, shared: &mut Shared) {
        shared.last_release = None;
        shared.write(Pin::Data, values::MOTOR_OFF);

        if let Some(since) = shared.engaged_at.take() {
            let held_ms = since.elapsed().as_millis() as u64;
            debug!(held_ms, "motor released");
            self.emit(RumbleEvent::MotorReleased { held_ms });
        }
    }

    /// One-shot expiry: release only if no commit happened since scheduling
    pub(super) fn release_if_current(&self, generation: u64) {
        let mut shared = self.lock();
        if shared.generation != generation || shared.intent != PendingIntent::Off {
            debug!(generation, current = shared.generation, "stale release ignored");
            return;
        }
        shared.release_task = None;
        self.release(&mut shared);
    }

    /// Poller tick: release once the latest Off commit is old enough
    pub(super) fn release_if_expired(&self, release_after: std::time::Duration) {
        let mut shared = self.lock();
        let expired = shared.intent == PendingIntent::Off
            && shared
                .last_release
                .is_some_and(|at| at.elapsed() > release_after);
        if expired {
            self.release(&mut shared);
        }
    }
}

/// Drives the motor line in response to handshake commits
pub struct Actuator {
    inner: Arc<Inner>,
    strategy: DebounceStrategy,
    runtime: Handle,
    stop: StopHandle,
    poller: Option<JoinHandle<()>>,
}

impl Actuator {
    /// Latch the GPIO port and start the debounce timer
    ///
    /// Timer tasks are spawned onto `runtime`, so `commit` may be called from
    /// any thread, including ones outside the runtime. Fails if `runtime` was
    /// built without its time driver.
    pub fn start(
        gpio: Box<dyn GpioSink>,
        strategy: DebounceStrategy,
        runtime: Handle,
    ) -> Result<Self, RumbleError> {
        if !debounce::timer_available(&runtime) {
            warn!("runtime has no time driver, refusing to start");
            return Err(RumbleError::TimerUnavailable);
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let inner = Arc::new(Inner {
            state: Mutex::new(Shared {
                gpio,
                intent: PendingIntent::Unset,
                last_release: None,
                engaged_at: None,
                generation: 0,
                release_task: None,
            }),
            events,
        });

        {
            let mut shared = inner.lock();
            for (pin, value) in Pin::latches() {
                shared.write(pin, value);
            }
        }

        let (stop, signal) = StopHandle::channel();
        let poller = match strategy {
            DebounceStrategy::Poller {
                interval,
                release_after,
            } => Some(runtime.spawn(debounce::poll_releases(
                Arc::clone(&inner),
                interval,
                release_after,
                signal,
            ))),
            DebounceStrategy::OneShot { .. } => None,
        };

        info!(?strategy, "actuator started");

        Ok(Self {
            inner,
            strategy,
            runtime,
            stop,
            poller,
        })
    }

    /// Apply a committed intent
    ///
    /// Never blocks beyond the actuator lock.
    pub fn commit(&self, intent: Intent) {
        let mut shared = self.inner.lock();
        shared.intent = intent.into();
        shared.generation = shared.generation.wrapping_add(1);

        match intent {
            Intent::On => self.engage(&mut shared),
            Intent::Off => self.schedule_release(&mut shared),
        }
    }

    fn engage(&self, shared: &mut Shared) {
        if let Some(task) = shared.release_task.take() {
            task.abort();
        }
        if shared.last_release.take().is_some() {
            debug!("pending release superseded");
            self.inner.emit(RumbleEvent::ReleaseSuperseded);
        }

        for (pin, value) in Pin::latches() {
            shared.write(pin, value);
        }
        shared.write(Pin::Data, values::MOTOR_ON);

        if shared.engaged_at.is_none() {
            shared.engaged_at = Some(Instant::now());
            debug!("motor engaged");
            self.inner.emit(RumbleEvent::MotorEngaged);
        }
    }

    fn schedule_release(&self, shared: &mut Shared) {
        shared.last_release = Some(Instant::now());

        if let DebounceStrategy::OneShot { delay } = self.strategy {
            if let Some(task) = shared.release_task.take() {
                task.abort();
            }
            shared.release_task = Some(self.runtime.spawn(debounce::release_after(
                Arc::clone(&self.inner),
                shared.generation,
                delay,
            )));
        }

        let delay_ms = self.strategy.release_delay().as_millis() as u64;
        debug!(delay_ms, "release scheduled");
        self.inner.emit(RumbleEvent::ReleaseScheduled { delay_ms });
    }

    /// Whether the motor line is currently asserted
    pub fn motor_engaged(&self) -> bool {
        self.inner.lock().engaged_at.is_some()
    }

    /// Last committed intent
    pub fn intent(&self) -> PendingIntent {
        self.inner.lock().intent
    }

    /// Whether an Off commit is waiting for its debounce delay
    pub fn release_pending(&self) -> bool {
        self.inner.lock().last_release.is_some()
    }

    /// Subscribe to motor events
    pub fn subscribe(&self) -> broadcast::Receiver<RumbleEvent> {
        self.inner.events.subscribe()
    }

    /// Stop the timer, wait for it, and leave the motor released
    pub async fn shutdown(mut self) -> Result<(), RumbleError> {
        self.stop.stop();

        let release_task = {
            let mut shared = self.inner.lock();
            // Invalidate a one-shot that is already past its sleep
            shared.generation = shared.generation.wrapping_add(1);
            shared.release_task.take()
        };
        if let Some(task) = release_task {
            task.abort();
            join(task).await?;
        }
        if let Some(poller) = self.poller.take() {
            join(poller).await?;
        }

        let mut shared = self.inner.lock();
        if shared.engaged_at.is_some() {
            info!("releasing motor on shutdown");
            self.inner.release(&mut shared);
        }
        shared.intent = PendingIntent::Unset;
        shared.last_release = None;

        info!("actuator stopped");
        Ok(())
    }
}

impl Drop for Actuator {
    fn drop(&mut self) {
        self.stop.stop();
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        if let Some(task) = self.inner.lock().release_task.take() {
            task.abort();
        }
    }
}

/// Await a timer task, treating cancellation as a clean exit
async fn join(task: JoinHandle<()>) -> Result<(), RumbleError> {
    match task.await {
        Ok(()) => Ok(()),
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => {
            warn!(?e, "debounce task failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::gpio::testing::RecordingGpio;

    const POLLER: DebounceStrategy = DebounceStrategy::Poller {
        interval: Duration::from_millis(20),
        release_after: Duration::from_millis(400),
    };

    fn start(strategy: DebounceStrategy) -> (Actuator, RecordingGpio) {
        let gpio = RecordingGpio::new();
        let actuator =
            Actuator::start(Box::new(gpio.clone()), strategy, Handle::current()).unwrap();
        (actuator, gpio)
    }

    fn drain(rx: &mut broadcast::Receiver<RumbleEvent>) -> Vec<RumbleEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return events,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_latches_port() {
        let (actuator, gpio) = start(DebounceStrategy::default());
        assert_eq!(gpio.writes(), vec![(Pin::Control, 1), (Pin::Direction, 8)]);
        assert!(!actuator.motor_engaged());
        assert_eq!(actuator.intent(), PendingIntent::Unset);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_engages_immediately() {
        let (actuator, gpio) = start(DebounceStrategy::default());
        let mut events = actuator.subscribe();

        actuator.commit(Intent::On);

        assert!(actuator.motor_engaged());
        assert_eq!(gpio.motor_level(), Some(values::MOTOR_ON));
        assert_eq!(drain(&mut events), vec![RumbleEvent::MotorEngaged]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_release_waits_for_delay() {
        let (actuator, gpio) = start(DebounceStrategy::default());
        actuator.commit(Intent::On);
        actuator.commit(Intent::Off);
        assert!(actuator.release_pending());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(actuator.motor_engaged());
        assert_eq!(gpio.motor_off_writes(), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!actuator.motor_engaged());
        assert!(!actuator.release_pending());
        assert_eq!(gpio.motor_off_writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_off_restarts_delay() {
        let (actuator, gpio) = start(DebounceStrategy::default());
        actuator.commit(Intent::On);
        actuator.commit(Intent::Off);

        tokio::time::sleep(Duration::from_millis(150)).await;
        actuator.commit(Intent::Off);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(actuator.motor_engaged());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(gpio.motor_off_writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_supersedes_pending_release() {
        let (actuator, gpio) = start(DebounceStrategy::default());
        let mut events = actuator.subscribe();

        actuator.commit(Intent::On);
        actuator.commit(Intent::Off);
        tokio::time::sleep(Duration::from_millis(100)).await;
        actuator.commit(Intent::On);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(actuator.motor_engaged());
        assert_eq!(gpio.motor_off_writes(), 0);
        assert_eq!(
            drain(&mut events),
            vec![
                RumbleEvent::MotorEngaged,
                RumbleEvent::ReleaseScheduled { delay_ms: 200 },
                RumbleEvent::ReleaseSuperseded,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_reports_time_held() {
        let (actuator, _gpio) = start(DebounceStrategy::default());
        let mut events = actuator.subscribe();

        actuator.commit(Intent::On);
        tokio::time::sleep(Duration::from_millis(100)).await;
        actuator.commit(Intent::Off);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(
            drain(&mut events),
            vec![
                RumbleEvent::MotorEngaged,
                RumbleEvent::ReleaseScheduled { delay_ms: 200 },
                RumbleEvent::MotorReleased { held_ms: 300 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_without_engage_is_silent() {
        let (actuator, gpio) = start(DebounceStrategy::default());
        let mut events = actuator.subscribe();

        actuator.commit(Intent::Off);
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Line is still driven low, but nothing was released
        assert_eq!(gpio.motor_off_writes(), 1);
        assert_eq!(
            drain(&mut events),
            vec![RumbleEvent::ReleaseScheduled { delay_ms: 200 }]
        );
    }

    #[test]
    fn test_start_requires_time_driver() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let gpio = RecordingGpio::new();

        let result = Actuator::start(
            Box::new(gpio.clone()),
            DebounceStrategy::default(),
            runtime.handle().clone(),
        );

        assert!(matches!(result, Err(RumbleError::TimerUnavailable)));
        assert!(gpio.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_release_is_ignored() {
        let (actuator, gpio) = start(DebounceStrategy::default());
        actuator.commit(Intent::Off);
        let stale = actuator.inner.lock().generation;
        actuator.commit(Intent::On);

        actuator.inner.release_if_current(stale);
        assert!(actuator.motor_engaged());
        assert_eq!(gpio.motor_off_writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_releases_after_threshold() {
        let (actuator, gpio) = start(POLLER);
        actuator.commit(Intent::On);
        actuator.commit(Intent::Off);

        tokio::time::sleep(Duration::from_millis(390)).await;
        assert!(actuator.motor_engaged());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!actuator.motor_engaged());

        // Later ticks see no pending release
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(gpio.motor_off_writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_on_supersedes_pending_release() {
        let (actuator, gpio) = start(POLLER);
        actuator.commit(Intent::On);
        actuator.commit(Intent::Off);
        tokio::time::sleep(Duration::from_millis(300)).await;
        actuator.commit(Intent::On);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(actuator.motor_engaged());
        assert_eq!(gpio.motor_off_writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_engaged_motor() {
        let (actuator, gpio) = start(DebounceStrategy::default());
        actuator.commit(Intent::On);
        actuator.commit(Intent::Off);

        tokio_test::assert_ok!(actuator.shutdown().await);
        assert_eq!(gpio.motor_level(), Some(values::MOTOR_OFF));
        assert_eq!(gpio.motor_off_writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_joins_poller() {
        let (actuator, gpio) = start(POLLER);
        let shutdown = tokio::time::timeout(Duration::from_millis(100), actuator.shutdown());
        tokio_test::assert_ok!(tokio_test::assert_ok!(shutdown.await));
        assert_eq!(gpio.motor_off_writes(), 0);
    }

    #[test]
    fn test_commit_from_foreign_thread() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let gpio = RecordingGpio::new();
        let actuator = Actuator::start(
            Box::new(gpio.clone()),
            DebounceStrategy::OneShot {
                delay: Duration::from_millis(10),
            },
            runtime.handle().clone(),
        )
        .unwrap();

        let actuator = std::thread::spawn(move || {
            actuator.commit(Intent::On);
            actuator.commit(Intent::Off);
            actuator
        })
        .join()
        .unwrap();

        std::thread::sleep(Duration::from_millis(200));
        assert!(!actuator.motor_engaged());
        assert_eq!(gpio.motor_off_writes(), 1);

        runtime.block_on(actuator.shutdown()).unwrap();
    }
}
