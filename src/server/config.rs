//! Relay configuration

use std::net::SocketAddr;

use crate::event::EntityKind;

/// Relay configuration options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the live transport binds to
    pub bind_addr: SocketAddr,

    /// Log topics to consume
    pub topics: Vec<String>,

    /// Maximum concurrent live connections (0 = unlimited)
    pub max_connections: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:4001".parse().unwrap(),
            topics: EntityKind::all()
                .iter()
                .map(|kind| kind.topic().to_string())
                .collect(),
            max_connections: 0, // Unlimited
        }
    }
}

impl RelayConfig {
    /// Create a new config with a custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the topic set to consume
    pub fn topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Set maximum concurrent connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();

        assert_eq!(config.bind_addr.port(), 4001);
        assert_eq!(config.max_connections, 0);
        assert_eq!(
            config.topics,
            vec!["flight-events".to_string(), "baggage-events".to_string()]
        );
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:4002".parse().unwrap();
        let config = RelayConfig::with_addr(addr);

        assert_eq!(config.bind_addr, addr);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:4010".parse().unwrap();
        let config = RelayConfig::default()
            .bind(addr)
            .topics(vec!["flight-events".to_string()])
            .max_connections(50);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.topics, vec!["flight-events".to_string()]);
        assert_eq!(config.max_connections, 50);
    }
}
