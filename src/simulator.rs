use crate::generator::{Clock, EventGenerator, RandomSource};
use crate::publishers::{PublishError, Publisher};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const TOPIC: &str = "aws-iot-location";
pub const PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub topic: String,
    pub interval: Duration,
    /// Print every payload line to stdout.
    pub echo: bool,
    /// Stop after this many successful publishes.
    pub max_events: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            topic: TOPIC.to_string(),
            interval: PUBLISH_INTERVAL,
            echo: true,
            max_events: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("failed to serialize location event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("publish failed after {published} events: {source}")]
    Publish {
        published: u64,
        #[source]
        source: PublishError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub published: u64,
}

pub struct Simulator<P, R, C> {
    config: SimulatorConfig,
    publisher: P,
    generator: EventGenerator<R, C>,
}

impl<P, R, C> Simulator<P, R, C>
where
    P: Publisher,
    R: RandomSource,
    C: Clock,
{
    pub fn new(config: SimulatorConfig, publisher: P, generator: EventGenerator<R, C>) -> Self {
        Self {
            config,
            publisher,
            generator,
        }
    }

    #[cfg(test)]
    fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Runs until `max_events` is reached, `shutdown` turns true, or a publish fails.
    ///
    /// Each iteration sleeps first, so the first event goes out one interval
    /// after start. A shutdown also abandons an in-flight publish.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary, SimulatorError> {
        let mut published = 0u64;

        info!(
            topic = %self.config.topic,
            interval_ms = self.config.interval.as_millis() as u64,
            max_events = ?self.config.max_events,
            users = self.generator.roster().len(),
            "Starting location simulator"
        );

        loop {
            if self.config.max_events.is_some_and(|max| published >= max) {
                info!(published, "Reached event limit");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = stop_requested(&mut shutdown) => {
                    info!(published, "Shutdown requested");
                    break;
                }
            }

            let event = self.generator.generate();
            let payload = event.to_payload()?;
            if self.config.echo {
                println!("{payload}");
            }

            let outcome = tokio::select! {
                result = self.publisher.publish(&self.config.topic, payload.as_bytes()) => {
                    Some(result)
                }
                _ = stop_requested(&mut shutdown) => None,
            };
            let Some(result) = outcome else {
                warn!(published, "Shutdown requested, abandoning in-flight publish");
                break;
            };
            result.map_err(|source| SimulatorError::Publish { published, source })?;
            published += 1;

            debug!(user_id = %event.user_id, published, "Published location event");
        }

        Ok(RunSummary { published })
    }
}

/// Resolves once `true` is sent. Pends forever if the sender is gone.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let stopped = shutdown.wait_for(|stop| *stop).await.is_ok();
    if !stopped {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{FixedClock, Roster, RngSource};
    use crate::location::{LocationEvent, LATITUDE_RANGE, LONGITUDE_RANGE};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct Published {
        topic: String,
        payload: String,
        at: Instant,
    }

    /// Records every publish; fails on call number `fail_on` (1-indexed) if set.
    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<Published>>,
        calls: Mutex<u64>,
        fail_on: Option<u64>,
    }

    impl RecordingPublisher {
        fn failing_on(call: u64) -> Self {
            Self {
                fail_on: Some(call),
                ..Default::default()
            }
        }

        fn calls(&self) -> u64 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if self.fail_on == Some(call) {
                return Err(PublishError::Connection("endpoint unreachable".into()));
            }
            self.published.lock().unwrap().push(Published {
                topic: topic.to_string(),
                payload: String::from_utf8(payload.to_vec()).unwrap(),
                at: Instant::now(),
            });
            Ok(())
        }
    }

    /// Never completes a publish.
    struct HangingPublisher;

    #[async_trait]
    impl Publisher for HangingPublisher {
        async fn publish(&self, _topic: &str, _payload: &[u8]) -> Result<(), PublishError> {
            std::future::pending().await
        }
    }

    fn generator() -> EventGenerator<RngSource<rand::rngs::StdRng>, FixedClock> {
        let clock = FixedClock(
            NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap(),
        );
        EventGenerator::new(Roster::default(), RngSource::seeded(42), clock)
    }

    fn simulator<P: Publisher>(
        publisher: P,
        max_events: Option<u64>,
    ) -> Simulator<P, RngSource<rand::rngs::StdRng>, FixedClock> {
        let config = SimulatorConfig {
            echo: false,
            max_events,
            ..Default::default()
        };
        Simulator::new(config, publisher, generator())
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_exactly_max_events_to_fixed_topic() {
        let (_tx, rx) = watch::channel(false);
        let mut sim = simulator(RecordingPublisher::default(), Some(3));

        let summary = sim.run(rx).await.unwrap();
        assert_eq!(summary.published, 3);

        let published = sim.publisher().published.lock().unwrap();
        assert_eq!(published.len(), 3);

        let mut expected = generator();
        let mut distinct = HashSet::new();
        for record in published.iter() {
            assert_eq!(record.topic, "aws-iot-location");
            let event = LocationEvent::from_payload(&record.payload).unwrap();
            assert_eq!(event, expected.generate());
            assert!(LATITUDE_RANGE.contains(&event.latitude));
            assert!(LONGITUDE_RANGE.contains(&event.longitude));
            distinct.insert(record.payload.clone());
        }
        assert_eq!(distinct.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_before_each_publish() {
        let (_tx, rx) = watch::channel(false);
        let start = Instant::now();
        let mut sim = simulator(RecordingPublisher::default(), Some(2));

        sim.run(rx).await.unwrap();

        let published = sim.publisher().published.lock().unwrap();
        assert!(published[0].at - start >= PUBLISH_INTERVAL);
        assert!(published[1].at - published[0].at >= PUBLISH_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_error_stops_loop_and_propagates() {
        let (_tx, rx) = watch::channel(false);
        let mut sim = simulator(RecordingPublisher::failing_on(3), None);

        let err = sim.run(rx).await.unwrap_err();
        match err {
            SimulatorError::Publish { published, source } => {
                assert_eq!(published, 2);
                assert!(matches!(source, PublishError::Connection(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sim.publisher().published.lock().unwrap().len(), 2);
        assert_eq!(sim.publisher().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_on_second_call_leaves_one_success() {
        let (_tx, rx) = watch::channel(false);
        let mut sim = simulator(RecordingPublisher::failing_on(2), None);

        let err = sim.run(rx).await.unwrap_err();
        assert!(matches!(err, SimulatorError::Publish { published: 1, .. }));
        assert_eq!(sim.publisher().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_start_publishes_nothing() {
        let (_tx, rx) = watch::channel(true);
        let mut sim = simulator(RecordingPublisher::default(), None);

        let summary = sim.run(rx).await.unwrap();
        assert_eq!(summary.published, 0);
        assert_eq!(sim.publisher().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_signal_ends_unbounded_run() {
        let (tx, rx) = watch::channel(false);
        let mut sim = simulator(RecordingPublisher::default(), None);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            let _ = tx.send(true);
        });

        let summary = sim.run(rx).await.unwrap();
        assert_eq!(summary.published, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_stuck_publish() {
        let (tx, rx) = watch::channel(false);
        let mut sim = simulator(HangingPublisher, None);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1_500)).await;
            let _ = tx.send(true);
        });

        let summary = tokio::time::timeout(Duration::from_secs(3_600), sim.run(rx))
            .await
            .expect("run should end once shutdown is signalled")
            .unwrap();
        assert_eq!(summary.published, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_shutdown_sender_does_not_stop_run() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let mut sim = simulator(RecordingPublisher::default(), Some(2));

        let summary = sim.run(rx).await.unwrap();
        assert_eq!(summary.published, 2);
    }
}
