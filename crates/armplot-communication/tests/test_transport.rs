use armplot_communication::{
    CancelToken, FlowControl, SerialLink, SerialTransport, StreamOutcome, TransportConfig,
    TransportState,
};
use armplot_core::{Command, ConnectionError, Error};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct LinkLog {
    written: Vec<String>,
    closed: bool,
}

// Mock controller: releases one scripted chunk each time its inbound
// buffer runs empty.
struct MockLink {
    chunks: VecDeque<Vec<u8>>,
    inbound: VecDeque<u8>,
    log: Arc<Mutex<LinkLog>>,
    cancel_after: Option<(usize, CancelToken)>,
    panic_at_write: Option<usize>,
}

impl MockLink {
    fn new(chunks: &[&str]) -> (Self, Arc<Mutex<LinkLog>>) {
        let log = Arc::new(Mutex::new(LinkLog::default()));
        let link = Self {
            chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
            inbound: VecDeque::new(),
            log: log.clone(),
            cancel_after: None,
            panic_at_write: None,
        };
        (link, log)
    }
}

impl SerialLink for MockLink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if let Some(limit) = self.panic_at_write {
            if self.log.lock().unwrap().written.len() >= limit {
                panic!("link failure");
            }
        }
        let mut log = self.log.lock().unwrap();
        assert!(!log.closed, "write after close");
        log.written.push(String::from_utf8_lossy(data).to_string());
        if let Some((limit, token)) = &self.cancel_after {
            if log.written.len() >= *limit {
                token.cancel();
            }
        }
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.inbound.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.inbound.pop_front().unwrap();
        }
        Ok(n)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        if self.inbound.is_empty() {
            if let Some(chunk) = self.chunks.pop_front() {
                self.inbound.extend(chunk);
            }
        }
        Ok(self.inbound.len())
    }

    fn name(&self) -> String {
        "mock".to_string()
    }

    fn close(&mut self) -> io::Result<()> {
        self.log.lock().unwrap().closed = true;
        Ok(())
    }
}

fn config() -> TransportConfig {
    TransportConfig {
        buffer_capacity: 10,
        low_water_mark: 3,
        flow_control: FlowControl::RequestBatch,
        settle_delay: Duration::ZERO,
        send_delay: Duration::ZERO,
        poll_interval: Duration::from_millis(1),
        idle_timeout: Duration::from_millis(50),
        response_timeout: Duration::from_millis(50),
        drain_requests: 2,
    }
}

// A framed stream of exactly `n` commands; `n >= 4`
fn commands(n: usize) -> Vec<Command> {
    let mut out = vec![Command::Start, Command::PenDown];
    while out.len() < n - 2 {
        out.push(Command::Move {
            theta1: out.len() as f64,
            theta2: 90.0,
        });
    }
    out.push(Command::PenUp);
    out.push(Command::End);
    out
}

fn boxed(link: MockLink) -> armplot_core::Result<Box<dyn SerialLink>> {
    Ok(Box::new(link))
}

#[test]
fn test_batches_follow_requests_and_drain() {
    let (link, log) = MockLink::new(&[
        "Ready for commands...\n",
        "REQUEST\n",
        "REQUEST\n",
        "REQUEST\n",
        "REQUEST\n",
        "REQUEST\n",
    ]);
    let cmds = commands(20);
    let mut transport = SerialTransport::new(config(), CancelToken::new()).unwrap();

    let report = transport.stream(&cmds, || boxed(link)).unwrap();

    assert_eq!(report.outcome, StreamOutcome::Completed);
    assert_eq!(report.sent, 20);
    assert_eq!(report.batches, vec![7, 7, 6]);
    assert_eq!(report.requests, 5);
    assert_eq!(transport.state(), TransportState::Closed);

    let log = log.lock().unwrap();
    assert!(log.closed);
    assert_eq!(log.written.len(), 20);
    assert_eq!(log.written[0], "START\n");
    assert_eq!(log.written[1], "PEN DOWN\n");
    assert_eq!(log.written[2], "(2.0000, 90.0000)\n");
    assert_eq!(log.written[19], "END\n");
}

#[test]
fn test_nothing_sent_before_first_request() {
    let (link, log) = MockLink::new(&["Ready for commands...\n\nOK\nstray\n"]);
    let mut transport = SerialTransport::new(config(), CancelToken::new()).unwrap();

    let err = transport.stream(&commands(5), || boxed(link)).unwrap_err();

    assert!(err.is_timeout());
    let log = log.lock().unwrap();
    assert!(log.written.is_empty());
    assert!(log.closed);
}

#[test]
fn test_split_lines_are_reassembled() {
    let (link, _log) = MockLink::new(&["REQ", "UEST\r", "\n", "RE", "QUEST\nREQUEST\n"]);
    let mut transport = SerialTransport::new(config(), CancelToken::new()).unwrap();

    let report = transport.stream(&commands(4), || boxed(link)).unwrap();

    assert_eq!(report.batches, vec![4]);
    assert_eq!(report.requests, 3);
}

#[test]
fn test_controller_error_stops_stream() {
    let (link, log) = MockLink::new(&["REQUEST\n", "ERROR: joint limit\n", "REQUEST\n"]);
    let mut transport = SerialTransport::new(config(), CancelToken::new()).unwrap();

    let err = transport.stream(&commands(20), || boxed(link)).unwrap_err();

    assert!(err.is_controller_error());
    assert!(err.to_string().contains("after 7 commands"));
    assert_eq!(transport.state(), TransportState::Closed);
    let log = log.lock().unwrap();
    assert_eq!(log.written.len(), 7);
    assert!(log.closed);
}

#[test]
fn test_idle_link_completes_drain() {
    let (link, log) = MockLink::new(&["REQUEST\n"]);
    let mut transport = SerialTransport::new(config(), CancelToken::new()).unwrap();

    let report = transport.stream(&commands(6), || boxed(link)).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.batches, vec![6]);
    assert_eq!(report.requests, 1);
    assert!(log.lock().unwrap().closed);
}

#[test]
fn test_error_while_draining_is_fatal() {
    let (link, _log) = MockLink::new(&["REQUEST\n", "servo error\n"]);
    let mut transport = SerialTransport::new(config(), CancelToken::new()).unwrap();

    let err = transport.stream(&commands(4), || boxed(link)).unwrap_err();
    assert!(err.is_controller_error());
}

#[test]
fn test_cancel_between_batches() {
    let token = CancelToken::new();
    let (mut link, log) = MockLink::new(&["REQUEST\n", "REQUEST\n", "REQUEST\n"]);
    link.cancel_after = Some((7, token.clone()));
    let mut transport = SerialTransport::new(config(), token).unwrap();

    let report = transport.stream(&commands(20), || boxed(link)).unwrap();

    assert_eq!(report.outcome, StreamOutcome::Cancelled);
    assert_eq!(report.sent, 7);
    let log = log.lock().unwrap();
    assert_eq!(log.written.len(), 7);
    assert!(log.closed);
}

#[test]
fn test_cancel_before_connect_sends_nothing() {
    let token = CancelToken::new();
    token.cancel();
    let (link, log) = MockLink::new(&["REQUEST\n"]);
    let mut transport = SerialTransport::new(config(), token).unwrap();

    let report = transport.stream(&commands(4), || boxed(link)).unwrap();

    assert_eq!(report.outcome, StreamOutcome::Cancelled);
    assert_eq!(report.sent, 0);
    assert!(log.lock().unwrap().closed);
}

#[test]
fn test_line_ack_sends_one_per_ack() {
    let (link, log) = MockLink::new(&["REQUEST\n", "OK\n", "REQUEST\nDONE\n", "NEXT\n"]);
    let mut transport = SerialTransport::new(
        TransportConfig {
            flow_control: FlowControl::LineAck,
            ..config()
        },
        CancelToken::new(),
    )
    .unwrap();

    let report = transport.stream(&commands(4), || boxed(link)).unwrap();

    assert_eq!(report.batches, vec![1, 1, 1, 1]);
    assert_eq!(report.sent, 4);
    assert_eq!(report.requests, 2);
    assert_eq!(log.lock().unwrap().written.len(), 4);
}

#[test]
fn test_open_failure_is_reported() {
    let mut transport = SerialTransport::new(config(), CancelToken::new()).unwrap();
    let err = transport
        .stream(&commands(4), || {
            Err(Error::from(ConnectionError::PortNotFound {
                port: "/dev/ttyACM7".to_string(),
            }))
        })
        .unwrap_err();

    assert!(err.is_connection_error());
    assert!(err.to_string().contains("/dev/ttyACM7"));
    assert_eq!(transport.state(), TransportState::Closed);
}

#[test]
fn test_silence_between_batches_times_out() {
    let (link, log) = MockLink::new(&["REQUEST\n"]);
    let cmds = commands(20);
    let mut transport = SerialTransport::new(config(), CancelToken::new()).unwrap();

    let err = transport.stream(&cmds, || boxed(link)).unwrap_err();

    assert!(err.is_timeout());
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::ConnectionTimeout { timeout_ms: 50 })
    ));
    assert_eq!(transport.state(), TransportState::Closed);

    let log = log.lock().unwrap();
    assert_eq!(log.written.len(), 7);
    assert!(log.closed);
}

#[test]
fn test_link_released_when_transport_unwinds() {
    let (mut link, log) = MockLink::new(&["REQUEST\n", "REQUEST\n"]);
    link.panic_at_write = Some(3);
    let cmds = commands(20);

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        let mut transport = SerialTransport::new(config(), CancelToken::new()).unwrap();
        transport.stream(&cmds, || boxed(link))
    }));

    assert!(outcome.is_err());
    let log = log.lock().unwrap();
    assert_eq!(log.written.len(), 3);
    assert!(log.closed);
}
