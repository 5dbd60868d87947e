//! Durable log client boundary
//!
//! The relay consumes the external log/broker through [`LogConsumer`] only:
//! subscribe to a topic set, then pull records in per-partition order. Any
//! durable, ordered, at-least-once log service satisfies the contract;
//! offset management, partitioning, and retention belong to the client
//! implementation. [`InMemoryLog`] is the channel-backed implementation used
//! by tests and demos.

use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;

/// A single record pulled from the durable log
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Topic the record was appended to
    pub topic: String,
    /// Producer partition key, when present
    pub key: Option<String>,
    /// Raw record value (cheap to clone)
    pub value: Bytes,
}

impl LogRecord {
    /// Create a record
    pub fn new(topic: impl Into<String>, key: Option<String>, value: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            key,
            value: value.into(),
        }
    }
}

/// Fatal error from the log client
///
/// Errors of this type end the ingestion loop and surface to the process
/// supervisor; the loop itself never retries past what the client provides.
#[derive(Debug)]
pub enum LogError {
    /// Subscription could not be established
    Subscribe(String),
    /// The connection to the log service failed
    Connection(String),
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::Subscribe(reason) => write!(f, "subscription failed: {}", reason),
            LogError::Connection(reason) => write!(f, "log connection failed: {}", reason),
        }
    }
}

impl std::error::Error for LogError {}

/// Client for a durable, ordered event log
///
/// Implementations must yield records for any subscribed topic in
/// per-partition order. `next_record` suspends until a record is available
/// and returns `Ok(None)` once the log is closed.
pub trait LogConsumer: Send + 'static {
    /// Register interest in the given topics; must precede `next_record`
    fn subscribe(&mut self, topics: &[String]) -> impl Future<Output = Result<(), LogError>> + Send;

    /// Wait for the next record on any subscribed topic
    fn next_record(&mut self) -> impl Future<Output = Result<Option<LogRecord>, LogError>> + Send;
}

/// Producer handle for an in-memory log
///
/// Backed by an unbounded channel; records flow to the paired
/// [`InMemoryConsumer`] in append order. Stands in for the external broker
/// in tests and demos.
#[derive(Debug, Clone)]
pub struct InMemoryLog {
    tx: mpsc::UnboundedSender<LogRecord>,
}

impl InMemoryLog {
    /// Create a log and its consumer half
    pub fn channel() -> (InMemoryLog, InMemoryConsumer) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            InMemoryLog { tx },
            InMemoryConsumer {
                topics: Vec::new(),
                rx,
            },
        )
    }

    /// Append a record
    ///
    /// Fails only when the consumer half has been dropped.
    pub fn append(
        &self,
        topic: impl Into<String>,
        key: Option<String>,
        value: impl Into<Bytes>,
    ) -> Result<(), LogError> {
        self.tx
            .send(LogRecord::new(topic, key, value))
            .map_err(|_| LogError::Connection("in-memory log closed".to_string()))
    }
}

/// Consumer half of [`InMemoryLog`]
#[derive(Debug)]
pub struct InMemoryConsumer {
    topics: Vec<String>,
    rx: mpsc::UnboundedReceiver<LogRecord>,
}

impl LogConsumer for InMemoryConsumer {
    async fn subscribe(&mut self, topics: &[String]) -> Result<(), LogError> {
        self.topics = topics.to_vec();
        Ok(())
    }

    async fn next_record(&mut self) -> Result<Option<LogRecord>, LogError> {
        loop {
            match self.rx.recv().await {
                // Records on unsubscribed topics are skipped, matching a
                // broker that only delivers subscribed topics.
                Some(record) if self.topics.contains(&record.topic) => {
                    return Ok(Some(record));
                }
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_arrive_in_append_order() {
        let (log, mut consumer) = InMemoryLog::channel();
        consumer
            .subscribe(&["flight-events".to_string()])
            .await
            .unwrap();

        log.append("flight-events", Some("UA1".into()), "a").unwrap();
        log.append("flight-events", Some("UA2".into()), "b").unwrap();

        let first = consumer.next_record().await.unwrap().unwrap();
        let second = consumer.next_record().await.unwrap().unwrap();
        assert_eq!(first.value, Bytes::from_static(b"a"));
        assert_eq!(second.value, Bytes::from_static(b"b"));
    }

    #[tokio::test]
    async fn test_unsubscribed_topics_are_skipped() {
        let (log, mut consumer) = InMemoryLog::channel();
        consumer
            .subscribe(&["baggage-events".to_string()])
            .await
            .unwrap();

        log.append("flight-events", None, "flight").unwrap();
        log.append("baggage-events", None, "bag").unwrap();

        let record = consumer.next_record().await.unwrap().unwrap();
        assert_eq!(record.topic, "baggage-events");
    }

    #[tokio::test]
    async fn test_closed_log_yields_none() {
        let (log, mut consumer) = InMemoryLog::channel();
        consumer
            .subscribe(&["flight-events".to_string()])
            .await
            .unwrap();

        drop(log);
        assert!(consumer.next_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_after_consumer_drop_fails() {
        let (log, consumer) = InMemoryLog::channel();
        drop(consumer);

        assert!(matches!(
            log.append("flight-events", None, "x"),
            Err(LogError::Connection(_))
        ));
    }
}
