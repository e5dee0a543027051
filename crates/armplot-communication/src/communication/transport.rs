//! Request-driven command streaming
//!
//! Streams a command list to the controller without overrunning its
//! receive buffer. The controller announces free space with `REQUEST`; each
//! announcement releases one batch of at most
//! `buffer_capacity - low_water_mark` commands. After the last batch the
//! transport keeps listening until the controller has asked twice more (its
//! queue ran dry) or the link has gone quiet.
//!
//! ```text
//! Connecting -> AwaitingInitialRequest -> Streaming -> Draining -> Closed
//! ```
//!
//! Any controller line mentioning an error stops the run. The link is
//! closed on every exit path.

use super::serial::{LineBuffer, SerialLink};
use crate::firmware::response_parser::ControllerResponse;
use armplot_core::{Command, ConnectionError, Result, TransportError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const READ_CHUNK: usize = 256;

/// How the controller releases further commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    /// One batch per `REQUEST`
    #[default]
    RequestBatch,
    /// One command per `OK`/`DONE`/`NEXT`
    LineAck,
}

/// Transport tuning
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// Commands the controller can hold
    pub buffer_capacity: usize,
    /// Slots kept free when sizing a batch
    pub low_water_mark: usize,
    pub flow_control: FlowControl,
    /// Wait after opening (boards reset on connect)
    pub settle_delay: Duration,
    /// Pause after every write
    pub send_delay: Duration,
    /// Sleep between polls of an idle link
    pub poll_interval: Duration,
    /// Silence that ends the drain
    pub idle_timeout: Duration,
    /// Silence that aborts the run before the last command is sent
    pub response_timeout: Duration,
    /// `REQUEST`s after the last batch that mean the queue is empty
    pub drain_requests: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 10,
            low_water_mark: 3,
            flow_control: FlowControl::RequestBatch,
            settle_delay: Duration::from_millis(2000),
            send_delay: Duration::from_millis(20),
            poll_interval: Duration::from_millis(5),
            idle_timeout: Duration::from_millis(3000),
            response_timeout: Duration::from_millis(30_000),
            drain_requests: 2,
        }
    }
}

impl TransportConfig {
    pub fn batch_size(&self) -> usize {
        self.buffer_capacity.saturating_sub(self.low_water_mark)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 || self.low_water_mark >= self.buffer_capacity {
            return Err(TransportError::InvalidBatch {
                capacity: self.buffer_capacity,
                low_water_mark: self.low_water_mark,
            }
            .into());
        }
        Ok(())
    }
}

/// Shared flag for stopping a stream from another thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    AwaitingInitialRequest,
    Streaming,
    Draining,
    Closed,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::AwaitingInitialRequest => "awaiting initial request",
            Self::Streaming => "streaming",
            Self::Draining => "draining",
            Self::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled,
}

/// Summary of one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub outcome: StreamOutcome,
    /// Commands written to the link
    pub sent: usize,
    /// Size of every batch, in order
    pub batches: Vec<usize>,
    /// `REQUEST` lines received, drain included
    pub requests: usize,
}

impl StreamReport {
    fn new() -> Self {
        Self {
            outcome: StreamOutcome::Completed,
            sent: 0,
            batches: Vec::new(),
            requests: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.outcome == StreamOutcome::Completed
    }
}

/// What the next wait produced
enum Event {
    Response(ControllerResponse),
    Idle,
    Cancelled,
}

/// Streams commands over one serial link
pub struct SerialTransport {
    config: TransportConfig,
    cancel: CancelToken,
    state: TransportState,
    link: Option<Box<dyn SerialLink>>,
    framer: LineBuffer,
    lines: VecDeque<String>,
}

impl SerialTransport {
    pub fn new(config: TransportConfig, cancel: CancelToken) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel,
            state: TransportState::Closed,
            link: None,
            framer: LineBuffer::new(),
            lines: VecDeque::new(),
        })
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Open a link with `open` and stream `commands` through it
    ///
    /// Returns a report on completion or cancellation. The link is closed
    /// before this returns, whatever the outcome.
    pub fn stream<F>(&mut self, commands: &[Command], open: F) -> Result<StreamReport>
    where
        F: FnOnce() -> Result<Box<dyn SerialLink>>,
    {
        if commands.is_empty() {
            return Err(TransportError::NothingToSend.into());
        }

        self.framer.clear();
        self.lines.clear();
        self.state = TransportState::Connecting;
        let link = match open() {
            Ok(link) => link,
            Err(e) => {
                self.state = TransportState::Closed;
                return Err(e);
            }
        };
        tracing::info!("Streaming {} commands to {}", commands.len(), link.name());
        self.link = Some(link);

        let mut report = StreamReport::new();
        let result = self.run(commands, &mut report);
        self.close();

        match result {
            Ok(outcome) => {
                report.outcome = outcome;
                match outcome {
                    StreamOutcome::Completed => tracing::info!(
                        "Sent {} commands in {} batches",
                        report.sent,
                        report.batches.len()
                    ),
                    StreamOutcome::Cancelled => {
                        tracing::warn!("Cancelled after {} commands", report.sent)
                    }
                }
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Streaming stopped after {} commands: {}", report.sent, e);
                Err(e)
            }
        }
    }

    fn run(&mut self, commands: &[Command], report: &mut StreamReport) -> Result<StreamOutcome> {
        if !self.pause(self.config.settle_delay) {
            return Ok(StreamOutcome::Cancelled);
        }

        self.state = TransportState::AwaitingInitialRequest;
        loop {
            match self.next_event(self.config.response_timeout, report.sent)? {
                Event::Cancelled => return Ok(StreamOutcome::Cancelled),
                Event::Idle => return Err(self.timed_out()),
                Event::Response(ControllerResponse::Request) => {
                    report.requests += 1;
                    break;
                }
                Event::Response(other) => {
                    tracing::debug!("Ignoring controller line before first request: {}", other)
                }
            }
        }

        self.state = TransportState::Streaming;
        let batch_size = match self.config.flow_control {
            FlowControl::RequestBatch => self.config.batch_size(),
            FlowControl::LineAck => 1,
        };
        let mut pending = commands;
        loop {
            let (batch, rest) = pending.split_at(batch_size.min(pending.len()));
            for command in batch {
                self.send(command)?;
                report.sent += 1;
            }
            report.batches.push(batch.len());
            tracing::debug!("Batch of {} sent, {} remaining", batch.len(), rest.len());
            pending = rest;

            if pending.is_empty() {
                break;
            }

            loop {
                match self.next_event(self.config.response_timeout, report.sent)? {
                    Event::Cancelled => return Ok(StreamOutcome::Cancelled),
                    Event::Idle => return Err(self.timed_out()),
                    Event::Response(ControllerResponse::Request) => {
                        report.requests += 1;
                        if self.config.flow_control == FlowControl::RequestBatch {
                            break;
                        }
                    }
                    Event::Response(ControllerResponse::Ack(_))
                        if self.config.flow_control == FlowControl::LineAck =>
                    {
                        break
                    }
                    Event::Response(other) => tracing::debug!("Controller: {}", other),
                }
            }
        }

        self.state = TransportState::Draining;
        let mut drain_requests = 0;
        loop {
            match self.next_event(self.config.idle_timeout, report.sent)? {
                Event::Cancelled => return Ok(StreamOutcome::Cancelled),
                Event::Idle => {
                    tracing::debug!("Link idle, drain complete");
                    break;
                }
                Event::Response(ControllerResponse::Request) => {
                    report.requests += 1;
                    drain_requests += 1;
                    if drain_requests >= self.config.drain_requests {
                        tracing::debug!("Controller queue empty");
                        break;
                    }
                }
                Event::Response(ControllerResponse::Ack(_))
                    if self.config.flow_control == FlowControl::LineAck =>
                {
                    break
                }
                Event::Response(other) => tracing::debug!("Controller: {}", other),
            }
        }

        Ok(StreamOutcome::Completed)
    }

    fn link(&mut self) -> Result<&mut Box<dyn SerialLink>> {
        self.link.as_mut().ok_or_else(|| {
            ConnectionError::ConnectionLost {
                reason: "link is not open".to_string(),
            }
            .into()
        })
    }

    fn send(&mut self, command: &Command) -> Result<()> {
        let line = format!("{}\n", command);
        let link = self.link()?;
        let name = link.name();

        let mut data = line.as_bytes();
        while !data.is_empty() {
            let n = link.write(data).map_err(|e| ConnectionError::IoError {
                port: name.clone(),
                reason: e.to_string(),
            })?;
            if n == 0 {
                return Err(ConnectionError::ConnectionLost {
                    reason: format!("{} accepted no bytes", name),
                }
                .into());
            }
            data = &data[n..];
        }
        tracing::debug!("-> {}", command);

        if !self.config.send_delay.is_zero() {
            thread::sleep(self.config.send_delay);
        }
        Ok(())
    }

    /// Wait for the next meaningful line
    ///
    /// `Idle` means no bytes arrived for `timeout`. A controller error line
    /// is returned as `Err` straight away.
    fn next_event(&mut self, timeout: Duration, sent: usize) -> Result<Event> {
        let mut last_bytes = Instant::now();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            while let Some(line) = self.lines.pop_front() {
                match ControllerResponse::parse(&line) {
                    None => continue,
                    Some(ControllerResponse::Error(line)) => {
                        return Err(TransportError::ControllerError { line, sent }.into())
                    }
                    Some(response) => {
                        tracing::debug!("<- {}", line);
                        return Ok(Event::Response(response));
                    }
                }
            }

            if self.cancel.is_cancelled() {
                return Ok(Event::Cancelled);
            }

            let link = self.link()?;
            let name = link.name();
            let io_error = |e: std::io::Error| ConnectionError::IoError {
                port: name.clone(),
                reason: e.to_string(),
            };

            let available = link.bytes_available().map_err(io_error)?;
            if available > 0 {
                let want = available.min(READ_CHUNK);
                let n = link.read(&mut buf[..want]).map_err(io_error)?;
                if n > 0 {
                    last_bytes = Instant::now();
                    let lines = self.framer.push(&buf[..n]);
                    self.lines.extend(lines);
                    continue;
                }
            }

            if last_bytes.elapsed() >= timeout {
                return Ok(Event::Idle);
            }
            if !self.config.poll_interval.is_zero() {
                thread::sleep(self.config.poll_interval);
            }
        }
    }

    /// Sleep in poll-sized steps; false if cancelled meanwhile
    fn pause(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let step = if self.config.poll_interval.is_zero() {
                deadline - now
            } else {
                self.config.poll_interval.min(deadline - now)
            };
            thread::sleep(step);
        }
    }

    fn timed_out(&self) -> armplot_core::Error {
        ConnectionError::ConnectionTimeout {
            timeout_ms: self.config.response_timeout.as_millis() as u64,
        }
        .into()
    }

    fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.close() {
                tracing::warn!("Failed to close {}: {}", link.name(), e);
            }
        }
        self.state = TransportState::Closed;
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}
