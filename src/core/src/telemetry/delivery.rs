use log::debug;
use reqwest::Url;
use std::future::Future;
use std::time::Duration;

use crate::data_capture::CaptureEvent;
use crate::error_handling::types::DeliveryError;

/// One best-effort push of a capture event to wherever events are collected.
///
/// Implementations make a single attempt and report the outcome; retrying, queueing and
/// timeouts are the dispatcher's business.
pub trait Delivery: Send + Sync + 'static {
    fn deliver(
        &self,
        event: &CaptureEvent,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Posts events as JSON to the controller ingestion endpoint.
pub struct HttpDelivery {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpDelivery {
    /// `timeout` bounds the whole request, connection included.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("bytebrew/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }
}

impl Delivery for HttpDelivery {
    async fn deliver(&self, event: &CaptureEvent) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected(status.as_u16()));
        }

        debug!(
            "Controller accepted event from {} with HTTP {}",
            event.source_ip(),
            status.as_u16()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc;

    /// A request as seen by the fake controller.
    struct Received {
        head: String,
        body: String,
    }

    async fn read_request(stream: &mut TcpStream) -> Option<Received> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let head_end = loop {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < head_end + content_length {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let body = String::from_utf8_lossy(&buf[head_end..]).to_string();
        Some(Received { head, body })
    }

    /// Minimal HTTP endpoint answering every request with `status_line`.
    async fn fake_controller(
        status_line: &'static str,
    ) -> (SocketAddr, mpsc::UnboundedReceiver<Received>) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(request) = read_request(&mut stream).await {
                        let _ = tx.send(request);
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            status_line
                        );
                        let _ = stream.write_all(response.as_bytes()).await;
                    }
                });
            }
        });

        (addr, rx)
    }

    fn endpoint(addr: SocketAddr) -> Url {
        Url::parse(&format!("http://{}/api/logs", addr)).unwrap()
    }

    fn scenario_event() -> CaptureEvent {
        CaptureEvent::ssh_login(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)), "admin", "toor")
    }

    #[tokio::test]
    async fn posts_the_event_as_json() {
        let (addr, mut requests) = fake_controller("201 Created").await;
        let delivery = HttpDelivery::new(endpoint(addr), Duration::from_secs(5)).unwrap();

        delivery.deliver(&scenario_event()).await.unwrap();

        let request = requests.recv().await.unwrap();
        assert!(request.head.starts_with("POST /api/logs HTTP/1.1\r\n"));
        assert!(request
            .head
            .to_ascii_lowercase()
            .contains("content-type: application/json"));

        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["type"], "ssh_login");
        assert_eq!(body["source_ip"], "203.0.113.5");
        assert_eq!(body["username"], "admin");
        assert_eq!(body["password"], "toor");
        assert!(body["timestamp"].is_f64());

        // Exactly one request for one event
        assert!(requests.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_success_status_is_a_rejection() {
        let (addr, _requests) = fake_controller("500 Internal Server Error").await;
        let delivery = HttpDelivery::new(endpoint(addr), Duration::from_secs(5)).unwrap();

        let err = delivery.deliver(&scenario_event()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected(500)));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let delivery = HttpDelivery::new(endpoint(addr), Duration::from_secs(5)).unwrap();
        let err = delivery.deliver(&scenario_event()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }

    #[tokio::test]
    async fn silent_controller_times_out() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let delivery = HttpDelivery::new(endpoint(addr), Duration::from_millis(200)).unwrap();
        let started = std::time::Instant::now();
        let err = delivery.deliver(&scenario_event()).await.unwrap_err();

        assert!(matches!(err, DeliveryError::Timeout));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
