//! Relay server assembly
//!
//! Wires one [`RoomRegistry`] into both halves of the relay (the live
//! transport's connection lifecycle and the ingestion loop's fan-out) by
//! explicit injection, and runs them concurrently. There is no hidden
//! global: every collaborator is constructed here and handed its
//! dependencies.

pub mod config;

use std::sync::Arc;

use crate::dispatch::FanoutDispatcher;
use crate::error::{RelayError, Result};
use crate::ingest::{IngestLoop, LogConsumer};
use crate::registry::RoomRegistry;
use crate::stats::RelayStats;
use crate::transport::WsTransport;

pub use config::RelayConfig;

/// The event relay
///
/// Owns the log consumer, the shared registry, and the live transport.
/// `run` drives the transport's accept loop and the ingestion loop until
/// either fails fatally or the log closes.
pub struct RelayServer<C> {
    config: RelayConfig,
    registry: Arc<RoomRegistry>,
    transport: Arc<WsTransport>,
    stats: Arc<RelayStats>,
    consumer: C,
}

impl<C: LogConsumer> RelayServer<C> {
    /// Create a relay over the given log consumer
    pub fn new(config: RelayConfig, consumer: C) -> Self {
        let stats = Arc::new(RelayStats::new());
        let registry = Arc::new(RoomRegistry::new());
        let transport = Arc::new(WsTransport::new(
            Arc::clone(&registry),
            Arc::clone(&stats),
            config.max_connections,
        ));

        Self {
            config,
            registry,
            transport,
            stats,
            consumer,
        }
    }

    /// Get the shared subscription registry
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Get the relay counters
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Run the relay
    ///
    /// Returns when the log closes cleanly, or with an error when the
    /// transport cannot bind or the log client fails fatally. Restart and
    /// backoff policy belong to the process supervisor.
    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            registry,
            transport,
            stats,
            consumer,
        } = self;

        let dispatcher = FanoutDispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&transport),
            Arc::clone(&stats),
        );
        let mut ingest = IngestLoop::new(consumer, dispatcher, config.topics.clone(), stats);

        tokio::select! {
            result = transport.serve(config.bind_addr) => result,
            result = ingest.run() => result.map_err(RelayError::from),
        }
    }

    /// Run the relay with graceful shutdown
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let transport = Arc::clone(&self.transport);

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                transport.shutdown();
                Ok(())
            }
            result = self.run() => result,
        }
    }
}
