//! Relay demo with a scripted event producer
//!
//! Run with: cargo run --example simple_relay [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_relay                 # binds to 127.0.0.1:4001
//!   cargo run --example simple_relay 127.0.0.1:4010  # binds to 127.0.0.1:4010
//!
//! An in-memory log stands in for the external broker; a producer task
//! appends a flight and a baggage event every few seconds.
//!
//! ## Watching events
//!
//! Connect a WebSocket client and join a room:
//!
//!   websocat ws://127.0.0.1:4001
//!   {"join":"dash:ops"}
//!
//! The ops room sees every event; `{"join":"flight:UA123"}` narrows to one
//! flight, `{"join":"baggage:BG100"}` to one bag.

use std::net::SocketAddr;
use std::time::Duration;

use airside_relay::{InMemoryLog, RelayConfig, RelayServer};

/// Parse bind address from command line argument.
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 4001;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

/// Append one flight and one baggage event per tick
async fn produce_events(log: InMemoryLog) {
    let mut ticker = tokio::time::interval(Duration::from_secs(3));
    let mut round = 0u32;

    loop {
        ticker.tick().await;
        round += 1;

        let gate = format!("B{}", round % 20);
        let flight = format!(
            r#"{{"type":"flight","subtype":"updated","flightId":"demo-f1","flightNo":"UA123","payload":{{"gate":"{}","status":"boarding"}},"timestamp":"2024-03-01T10:00:00Z"}}"#,
            gate
        );
        if log.append("flight-events", Some("UA123".into()), flight).is_err() {
            return;
        }

        let baggage = format!(
            r#"{{"type":"baggage","subtype":"updated","baggageId":"demo-b1","tagId":"BG100","status":"loaded","location":"belt-{}","timestamp":"2024-03-01T10:00:01Z"}}"#,
            round % 5
        );
        if log.append("baggage-events", Some("BG100".into()), baggage).is_err() {
            return;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => "127.0.0.1:4001".parse().unwrap(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("airside_relay=debug".parse()?)
                .add_directive("simple_relay=debug".parse()?),
        )
        .init();

    let (log, consumer) = InMemoryLog::channel();
    let config = RelayConfig::with_addr(bind_addr);
    let relay = RelayServer::new(config, consumer);

    println!("Relay listening on ws://{}", bind_addr);
    println!();
    println!("Join a room:");
    println!("  websocat ws://{}", bind_addr);
    println!("  {{\"join\":\"dash:ops\"}}");
    println!();

    tokio::spawn(produce_events(log));

    relay
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
