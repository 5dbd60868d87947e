//! Ingestion loop
//!
//! The single consumer loop pulling records off the durable log, decoding
//! them, and handing them to the dispatcher. Consumption position advances
//! record by record: decode and dispatch complete (in-process hand-off, not
//! delivery) before the next record is requested, which preserves
//! per-partition order through the relay.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::dispatch::Dispatch;
use crate::event::decode;
use crate::stats::RelayStats;

use super::log::{LogConsumer, LogError, LogRecord};

/// Lifecycle phase of the ingestion loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPhase {
    /// Created, subscription not yet registered
    Starting,
    /// Topic interest registered with the log client
    Subscribed,
    /// Pulling records
    Running,
    /// Log closed cleanly
    Stopped,
    /// Log client failed fatally
    Crashed,
}

/// The relay's consumer loop
///
/// Generic over the log client and the dispatcher so both can be replaced
/// by test doubles. Exactly one ingestion loop owns the subscription.
pub struct IngestLoop<C, D> {
    consumer: C,
    dispatcher: D,
    topics: Vec<String>,
    phase: IngestPhase,
    stats: Arc<RelayStats>,
}

impl<C: LogConsumer, D: Dispatch> IngestLoop<C, D> {
    /// Create a loop over the given consumer and dispatcher
    pub fn new(consumer: C, dispatcher: D, topics: Vec<String>, stats: Arc<RelayStats>) -> Self {
        Self {
            consumer,
            dispatcher,
            topics,
            phase: IngestPhase::Starting,
            stats,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> IngestPhase {
        self.phase
    }

    /// Run until the log closes or fails
    ///
    /// Decode failures are logged and skipped; they never end the loop. A
    /// fatal log client error is returned to the caller, which is expected
    /// to surface it to the process supervisor.
    pub async fn run(&mut self) -> Result<(), LogError> {
        if let Err(e) = self.consumer.subscribe(&self.topics).await {
            self.phase = IngestPhase::Crashed;
            tracing::error!(error = %e, "Log subscription failed");
            return Err(e);
        }
        self.phase = IngestPhase::Subscribed;

        tracing::info!(topics = ?self.topics, "Ingestion loop running");
        self.phase = IngestPhase::Running;

        loop {
            match self.consumer.next_record().await {
                Ok(Some(record)) => self.handle_record(record).await,
                Ok(None) => {
                    self.phase = IngestPhase::Stopped;
                    tracing::info!("Log closed, ingestion loop stopping");
                    return Ok(());
                }
                Err(e) => {
                    self.phase = IngestPhase::Crashed;
                    tracing::error!(error = %e, "Log client failed");
                    return Err(e);
                }
            }
        }
    }

    async fn handle_record(&self, record: LogRecord) {
        self.stats.records_consumed.fetch_add(1, Ordering::Relaxed);

        match decode(&record.topic, &record.value) {
            Ok(event) => {
                self.dispatcher.dispatch(event).await;
            }
            Err(e) => {
                self.stats.decode_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    topic = %record.topic,
                    key = record.key.as_deref(),
                    error = %e,
                    "Skipping malformed record"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::event::DomainEvent;
    use crate::ingest::InMemoryLog;

    /// Dispatcher double that records every event it receives
    #[derive(Default)]
    struct RecordingDispatch {
        events: Mutex<Vec<DomainEvent>>,
    }

    impl Dispatch for Arc<RecordingDispatch> {
        async fn dispatch(&self, event: DomainEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn topics() -> Vec<String> {
        vec!["flight-events".to_string(), "baggage-events".to_string()]
    }

    #[tokio::test]
    async fn test_malformed_record_does_not_stop_the_loop() {
        let (log, consumer) = InMemoryLog::channel();
        let dispatched = Arc::new(RecordingDispatch::default());
        let mut ingest = IngestLoop::new(
            consumer,
            Arc::clone(&dispatched),
            topics(),
            Arc::new(RelayStats::new()),
        );

        log.append(
            "flight-events",
            Some("UA1".into()),
            r#"{"type":"flight","subtype":"created","flightNo":"UA1"}"#,
        )
        .unwrap();
        log.append("flight-events", None, "{garbage").unwrap();
        log.append(
            "flight-events",
            Some("UA2".into()),
            r#"{"type":"flight","subtype":"delayed","flightNo":"UA2"}"#,
        )
        .unwrap();
        drop(log);

        ingest.run().await.unwrap();
        assert_eq!(ingest.phase(), IngestPhase::Stopped);

        let events = dispatched.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].routing_key(), "UA1");
        assert_eq!(events[1].routing_key(), "UA2");
    }

    #[tokio::test]
    async fn test_decode_failures_are_counted_not_fatal() {
        let (log, consumer) = InMemoryLog::channel();
        let stats = Arc::new(RelayStats::new());
        let mut ingest = IngestLoop::new(
            consumer,
            Arc::new(RecordingDispatch::default()),
            topics(),
            Arc::clone(&stats),
        );

        log.append("flight-events", None, "not json at all").unwrap();
        drop(log);

        ingest.run().await.unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.records_consumed, 1);
        assert_eq!(snapshot.decode_failures, 1);
    }

    #[tokio::test]
    async fn test_fatal_subscribe_error_crashes_the_loop() {
        /// Consumer whose subscription always fails
        struct BrokenConsumer;

        impl LogConsumer for BrokenConsumer {
            async fn subscribe(&mut self, _topics: &[String]) -> Result<(), LogError> {
                Err(LogError::Subscribe("broker unreachable".to_string()))
            }

            async fn next_record(&mut self) -> Result<Option<LogRecord>, LogError> {
                Ok(None)
            }
        }

        let mut ingest = IngestLoop::new(
            BrokenConsumer,
            Arc::new(RecordingDispatch::default()),
            topics(),
            Arc::new(RelayStats::new()),
        );

        assert!(ingest.run().await.is_err());
        assert_eq!(ingest.phase(), IngestPhase::Crashed);
    }

    #[tokio::test]
    async fn test_cross_topic_records_all_dispatch() {
        let (log, consumer) = InMemoryLog::channel();
        let dispatched = Arc::new(RecordingDispatch::default());
        let mut ingest = IngestLoop::new(
            consumer,
            Arc::clone(&dispatched),
            topics(),
            Arc::new(RelayStats::new()),
        );

        log.append(
            "baggage-events",
            Some("BG100".into()),
            r#"{"type":"baggage","subtype":"updated","tagId":"BG100"}"#,
        )
        .unwrap();
        log.append(
            "flight-events",
            Some("UA1".into()),
            r#"{"type":"flight","subtype":"updated","flightNo":"UA1"}"#,
        )
        .unwrap();
        drop(log);

        ingest.run().await.unwrap();

        let events = dispatched.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].room(), "baggage:BG100");
        assert_eq!(events[1].room(), "flight:UA1");
    }
}
