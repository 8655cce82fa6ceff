//! Fire-and-forget delivery of capture events.
//!
//! Interceptors hand events to a [`TelemetrySender`], which only ever does a non-blocking
//! `try_send` into a bounded queue. A fixed pool of workers drains the queue and pushes each
//! event through a [`Delivery`] once, bounded by the delivery timeout. When the queue is full
//! the new event is dropped: losing telemetry is preferred over slowing down a handshake.
//!
//! ```text
//! ┌──────────────┐ try_send ┌───────────────┐  recv   ┌──────────┐  POST  ┌────────────┐
//! │ Interceptors │────────▶│ bounded queue │───────▶│ workers  │──────▶│ controller │
//! └──────────────┘         └───────────────┘        └──────────┘       └────────────┘
//! ```

use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::delivery::Delivery;
use crate::configuration::types::{
    DEFAULT_DELIVERY_TIMEOUT_SECS, DEFAULT_DELIVERY_WORKERS, DEFAULT_QUEUE_CAPACITY,
};
use crate::configuration::Config;
use crate::data_capture::CaptureEvent;
use crate::error_handling::types::DeliveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    pub queue_capacity: usize,
    pub workers: usize,
    pub delivery_timeout: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            workers: DEFAULT_DELIVERY_WORKERS,
            delivery_timeout: Duration::from_secs(DEFAULT_DELIVERY_TIMEOUT_SECS),
        }
    }
}

impl From<&Config> for DispatcherSettings {
    fn from(config: &Config) -> Self {
        Self {
            queue_capacity: config.logging.queue_capacity,
            workers: config.logging.workers,
            delivery_timeout: config.delivery_timeout(),
        }
    }
}

/// Cheap, cloneable handle used to submit events. Never waits.
#[derive(Clone, Debug)]
pub struct TelemetrySender {
    tx: mpsc::Sender<CaptureEvent>,
}

impl TelemetrySender {
    /// Queues `event` for delivery.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::QueueFull`] if every slot is taken; the event is dropped
    /// - [`DeliveryError::QueueClosed`] if the dispatcher has shut down
    pub fn dispatch(&self, event: CaptureEvent) -> Result<(), DeliveryError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::QueueClosed,
        })
    }
}

/// Owns the delivery queue and its worker pool.
pub struct TelemetryDispatcher {
    sender: TelemetrySender,
    workers: Vec<JoinHandle<()>>,
}

impl TelemetryDispatcher {
    /// Creates the queue and spawns the workers on the current runtime.
    pub fn start<D: Delivery>(delivery: D, settings: DispatcherSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        let queue = Arc::new(Mutex::new(rx));
        let delivery = Arc::new(delivery);

        let workers = (0..settings.workers.max(1))
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&queue),
                    Arc::clone(&delivery),
                    settings.delivery_timeout,
                ))
            })
            .collect::<Vec<_>>();

        info!(
            "Telemetry dispatcher started: {} worker(s), queue capacity {}, timeout {:?}",
            workers.len(),
            settings.queue_capacity,
            settings.delivery_timeout
        );

        Self {
            sender: TelemetrySender { tx },
            workers,
        }
    }

    pub fn sender(&self) -> TelemetrySender {
        self.sender.clone()
    }

    /// Closes the dispatcher's own handle and waits for the workers to drain the queue.
    ///
    /// Workers stop once every [`TelemetrySender`] clone is gone, so outstanding clones keep
    /// this pending.
    pub async fn shutdown(self) {
        let Self { sender, workers } = self;
        drop(sender);
        for worker in workers {
            if let Err(e) = worker.await {
                error!("Telemetry worker ended abnormally: {}", e);
            }
        }
        info!("Telemetry dispatcher stopped");
    }
}

async fn run_worker<D: Delivery>(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<CaptureEvent>>>,
    delivery: Arc<D>,
    limit: Duration,
) {
    debug!("Telemetry worker {} started", worker_id);

    loop {
        // The lock is only held while waiting for the next event, never during delivery
        let next = { queue.lock().await.recv().await };
        let event = match next {
            Some(event) => event,
            None => break,
        };

        let outcome = match tokio::time::timeout(limit, delivery.deliver(&event)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout),
        };

        match outcome {
            Ok(()) => debug!(
                "[worker {}] Delivered {}@{} to controller",
                worker_id,
                event.username(),
                event.source_ip()
            ),
            Err(e) => error!("Failed to send log to controller: {}", e),
        }
    }

    debug!("Telemetry worker {} stopped", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::RecordingDelivery;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::sync::Notify;

    fn event(username: &str) -> CaptureEvent {
        CaptureEvent::ssh_login(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7)), username, "123456")
    }

    fn settings(queue_capacity: usize, workers: usize) -> DispatcherSettings {
        DispatcherSettings {
            queue_capacity,
            workers,
            ..DispatcherSettings::default()
        }
    }

    /// Delivery that reports when it starts and then waits to be released.
    struct GatedDelivery {
        started: mpsc::UnboundedSender<String>,
        release: Arc<Notify>,
    }

    impl Delivery for GatedDelivery {
        async fn deliver(&self, event: &CaptureEvent) -> Result<(), DeliveryError> {
            let _ = self.started.send(event.username().to_string());
            self.release.notified().await;
            Ok(())
        }
    }

    /// Delivery that hangs forever on the user `slow` and records everything else.
    struct SlowForSome {
        inner: RecordingDelivery,
    }

    impl Delivery for SlowForSome {
        async fn deliver(&self, event: &CaptureEvent) -> Result<(), DeliveryError> {
            if event.username() == "slow" {
                std::future::pending::<()>().await;
            }
            self.inner.deliver(event).await
        }
    }

    #[tokio::test]
    async fn delivers_every_event_once() {
        let (delivery, mut delivered) = RecordingDelivery::new();
        let dispatcher = TelemetryDispatcher::start(delivery, settings(16, 3));
        let sender = dispatcher.sender();

        for name in ["root", "admin", "ubuntu"] {
            sender.dispatch(event(name)).unwrap();
        }

        let mut names = Vec::new();
        for _ in 0..3 {
            names.push(delivered.recv().await.unwrap().username().to_string());
        }
        names.sort();
        assert_eq!(names, vec!["admin", "root", "ubuntu"]);

        drop(sender);
        dispatcher.shutdown().await;
        assert!(delivered.try_recv().is_err());
    }

    #[tokio::test]
    async fn drops_events_when_the_queue_is_full() {
        let (started_tx, mut started) = mpsc::unbounded_channel();
        let release = Arc::new(Notify::new());
        let delivery = GatedDelivery {
            started: started_tx,
            release: Arc::clone(&release),
        };
        let dispatcher = TelemetryDispatcher::start(delivery, settings(1, 1));
        let sender = dispatcher.sender();

        sender.dispatch(event("first")).unwrap();
        // The only worker is now busy with `first`
        assert_eq!(started.recv().await.unwrap(), "first");

        sender.dispatch(event("second")).unwrap();
        let err = sender.dispatch(event("third")).unwrap_err();
        assert!(matches!(err, DeliveryError::QueueFull));

        release.notify_one();
        assert_eq!(started.recv().await.unwrap(), "second");
        release.notify_one();
    }

    #[tokio::test(start_paused = true)]
    async fn a_hung_delivery_is_abandoned_after_the_timeout() {
        let (inner, mut delivered) = RecordingDelivery::new();
        let dispatcher = TelemetryDispatcher::start(SlowForSome { inner }, settings(4, 1));
        let sender = dispatcher.sender();

        let started = tokio::time::Instant::now();
        sender.dispatch(event("slow")).unwrap();
        sender.dispatch(event("fast")).unwrap();

        let next = delivered.recv().await.unwrap();
        assert_eq!(next.username(), "fast");
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(5), "waited {:?}", waited);
        assert!(waited < Duration::from_secs(6), "waited {:?}", waited);
    }

    #[tokio::test]
    async fn dispatch_after_shutdown_reports_a_closed_queue() {
        let (delivery, _delivered) = RecordingDelivery::new();
        let dispatcher = TelemetryDispatcher::start(delivery, settings(4, 2));
        let sender = dispatcher.sender();

        // Close the receiving side by stopping the workers
        for worker in &dispatcher.workers {
            worker.abort();
        }
        let TelemetryDispatcher { sender: own, workers } = dispatcher;
        drop(own);
        for worker in workers {
            let _ = worker.await;
        }

        let err = sender.dispatch(event("late")).unwrap_err();
        assert!(matches!(err, DeliveryError::QueueClosed));
    }

    #[test]
    fn settings_follow_the_configuration() {
        let mut config = Config::default();
        config.logging.workers = 8;
        config.logging.queue_capacity = 1024;
        config.logging.delivery_timeout_secs = 2;

        assert_eq!(
            DispatcherSettings::from(&config),
            DispatcherSettings {
                queue_capacity: 1024,
                workers: 8,
                delivery_timeout: Duration::from_secs(2),
            }
        );
    }
}
