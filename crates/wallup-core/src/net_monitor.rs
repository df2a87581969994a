//! Network condition monitoring via a timed HEAD probe.
//!
//! Classifies the connection as fast/slow/offline and publishes the latest
//! state on a watch channel. Runs as an independent periodic task that never
//! blocks the orchestrator; the orchestrator only reads the latest state at
//! job entry.

use std::time::{Duration, Instant};

use tokio::sync::watch;

/// Connection speed class derived from the probe round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Fast,
    Slow,
    Offline,
}

/// Latest observed connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    pub online: bool,
    pub speed: Speed,
}

impl ConnectionState {
    pub fn offline() -> Self {
        Self {
            online: false,
            speed: Speed::Offline,
        }
    }
}

/// Probes a stable endpoint and publishes `ConnectionState`.
pub struct NetMonitor {
    client: reqwest::Client,
    probe_url: String,
    probe_timeout: Duration,
    slow_threshold: Duration,
    tx: watch::Sender<ConnectionState>,
}

impl NetMonitor {
    /// Create a monitor with an initial optimistic state. The first probe
    /// corrects it shortly after `spawn`.
    pub fn new(
        client: reqwest::Client,
        probe_url: &str,
        probe_timeout: Duration,
        slow_threshold: Duration,
    ) -> (Self, watch::Receiver<ConnectionState>) {
        let (tx, rx) = watch::channel(ConnectionState {
            online: true,
            speed: Speed::Fast,
        });
        (
            Self {
                client,
                probe_url: probe_url.to_string(),
                probe_timeout,
                slow_threshold,
                tx,
            },
            rx,
        )
    }

    /// Immediate external offline notification (e.g. from a platform event);
    /// published without probing.
    pub fn set_offline(&self) {
        let _ = self.tx.send(ConnectionState::offline());
    }

    /// Issue one timed probe and classify the result.
    ///
    /// Connect-level failures mean the host is unreachable: offline. Timeouts
    /// and other errors mean the link exists but is degraded: slow.
    pub async fn probe_once(&self) -> ConnectionState {
        let start = Instant::now();
        let result = self
            .client
            .head(&self.probe_url)
            .timeout(self.probe_timeout)
            .send()
            .await;
        let elapsed = start.elapsed();

        let state = match result {
            Ok(_) if elapsed > self.slow_threshold => ConnectionState {
                online: true,
                speed: Speed::Slow,
            },
            Ok(_) => ConnectionState {
                online: true,
                speed: Speed::Fast,
            },
            Err(e) if e.is_connect() => {
                tracing::debug!("probe connect failed: {}", e);
                ConnectionState::offline()
            }
            Err(e) => {
                tracing::debug!("probe degraded ({}), classifying slow", e);
                ConnectionState {
                    online: true,
                    speed: Speed::Slow,
                }
            }
        };
        tracing::debug!(?state, rtt_ms = elapsed.as_millis() as u64, "probe");
        state
    }

    /// Run the periodic probe loop until all receivers are dropped.
    pub fn spawn(self, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let state = self.probe_once().await;
                if self.tx.send(state).is_err() {
                    return;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Minimal responder: answers every request with 200 after `delay`.
    fn start_probe_server(delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                std::thread::spawn(move || {
                    let mut stream = stream;
                    let mut buf = [0u8; 4096];
                    let _ = stream.read(&mut buf);
                    std::thread::sleep(delay);
                    let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
                });
            }
        });
        format!("http://127.0.0.1:{}/", port)
    }

    #[tokio::test]
    async fn quick_probe_is_fast() {
        let url = start_probe_server(Duration::ZERO);
        let (monitor, _rx) = NetMonitor::new(
            reqwest::Client::new(),
            &url,
            Duration::from_secs(5),
            Duration::from_secs(2),
        );
        let state = monitor.probe_once().await;
        assert!(state.online);
        assert_eq!(state.speed, Speed::Fast);
    }

    #[tokio::test]
    async fn delayed_probe_is_slow() {
        let url = start_probe_server(Duration::from_millis(150));
        let (monitor, _rx) = NetMonitor::new(
            reqwest::Client::new(),
            &url,
            Duration::from_secs(5),
            Duration::from_millis(50),
        );
        let state = monitor.probe_once().await;
        assert!(state.online);
        assert_eq!(state.speed, Speed::Slow);
    }

    #[tokio::test]
    async fn unreachable_host_is_offline() {
        // Bind then drop so the port is very likely refused.
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}/", port);
        let (monitor, _rx) = NetMonitor::new(
            reqwest::Client::new(),
            &url,
            Duration::from_secs(2),
            Duration::from_secs(1),
        );
        let state = monitor.probe_once().await;
        assert!(!state.online);
        assert_eq!(state.speed, Speed::Offline);
    }

    #[tokio::test]
    async fn set_offline_publishes_immediately() {
        let (monitor, rx) = NetMonitor::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/",
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        monitor.set_offline();
        let state = *rx.borrow();
        assert!(!state.online);
        assert_eq!(state.speed, Speed::Offline);
    }
}
