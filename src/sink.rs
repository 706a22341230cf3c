//! Destinations for telemetry records.
//!
//! A sink receives one record at a time, synchronously, on the thread that
//! called the instrumented method.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Result};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub trait Sink<R>: Send + Sync {
    fn send(&self, record: R) -> Result<()>;
}

impl<R, F> Sink<R> for F
where
    F: Fn(R) -> Result<()> + Send + Sync,
{
    fn send(&self, record: R) -> Result<()> {
        self(record)
    }
}

/// Keeps every record in memory. Clones share the same buffer.
#[derive(Debug)]
pub struct RecordingSink<R> {
    records: Arc<Mutex<Vec<R>>>,
}

impl<R> RecordingSink<R> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<R> {
        std::mem::take(&mut *self.records.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<R: Clone> RecordingSink<R> {
    pub fn records(&self) -> Vec<R> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl<R> Default for RecordingSink<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for RecordingSink<R> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<R: Send> Sink<R> for RecordingSink<R> {
    fn send(&self, record: R) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow!("recording sink poisoned"))?
            .push(record);
        Ok(())
    }
}

/// Writes each record as a structured `tracing` event.
#[derive(Debug, Clone)]
pub struct TracingSink {
    source: String,
}

impl TracingSink {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }
}

impl<R: Serialize> Sink<R> for TracingSink {
    fn send(&self, record: R) -> Result<()> {
        let json = serde_json::to_string(&record)?;
        tracing::info!(source = %self.source, record = %json, "telemetry");
        Ok(())
    }
}

/// Hands records to an async consumer over a bounded channel.
/// Never blocks: a full or closed channel is reported as a send failure.
#[derive(Debug, Clone)]
pub struct ChannelSink<R> {
    tx: mpsc::Sender<R>,
}

impl<R> ChannelSink<R> {
    pub fn new(tx: mpsc::Sender<R>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<R>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl<R: Send> Sink<R> for ChannelSink<R> {
    fn send(&self, record: R) -> Result<()> {
        self.tx.try_send(record).map_err(|e| match e {
            TrySendError::Full(_) => anyhow!("telemetry channel full"),
            TrySendError::Closed(_) => anyhow!("telemetry channel closed"),
        })
    }
}
