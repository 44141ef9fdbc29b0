#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uridiag::transport::{ControlTransport, DiagError};

/// Channel-backed transport: records every report the client sends and
/// replays responses queued by the test, so tests can assert exact wire
/// bytes.
pub struct TestTransport {
    sent: UnboundedSender<Bytes>,
    responses: Mutex<UnboundedReceiver<Bytes>>,
}

pub struct TestHarness {
    pub sent: UnboundedReceiver<Bytes>,
    pub responses: UnboundedSender<Bytes>,
}

pub fn test_transport() -> (Arc<TestTransport>, TestHarness) {
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let (resp_tx, resp_rx) = mpsc::unbounded_channel();

    (
        Arc::new(TestTransport {
            sent: sent_tx,
            responses: Mutex::new(resp_rx),
        }),
        TestHarness {
            sent: sent_rx,
            responses: resp_tx,
        },
    )
}

#[async_trait]
impl ControlTransport for TestTransport {
    async fn send_report(&self, report: Bytes) -> Result<(), DiagError> {
        self.sent
            .send(report)
            .map_err(|_| DiagError::TransportClosed)
    }

    async fn recv_report(&self) -> Result<Bytes, DiagError> {
        self.responses
            .lock()
            .unwrap()
            .try_recv()
            .map_err(|_| DiagError::TransportClosed)
    }
}

/// Asserts the next report the client sent, as hex
#[allow(unused_macros)]
macro_rules! assert_sent {
    ($harness:expr, $expect:expr) => {
        let sent = $harness
            .sent
            .try_recv()
            .expect("expected a report to have been sent");
        assert_eq!(hex::encode(&sent), $expect);
    };
}
