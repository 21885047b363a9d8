use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use wire::Record;

/// Handles complete records of one registered type.
#[async_trait]
pub trait RecordHandler: Send + Sync {
    async fn handle(&self, record: Record);
}

/// Sees the bytes salvaged from interrupted bursts. Most consumers drop
/// them; attaching an observer keeps them visible.
#[async_trait]
pub trait PartialObserver: Send + Sync {
    async fn on_partial(&self, bytes: Bytes);
}

/// Routes decoded records to a handler by type name.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Box<dyn RecordHandler>>,
    partial_observer: Option<Box<dyn PartialObserver>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher::default()
    }

    pub fn on(mut self, type_name: &str, handler: Box<dyn RecordHandler>) -> Self {
        self.handlers.insert(type_name.to_owned(), handler);
        self
    }

    pub fn with_partial_observer(mut self, observer: Box<dyn PartialObserver>) -> Self {
        self.partial_observer = Some(observer);
        self
    }

    pub(crate) async fn dispatch(&self, record: Record) {
        match self.handlers.get(record.name()) {
            Some(handler) => handler.handle(record).await,
            None => log::warn!("unknown record type {}", record.name()),
        }
    }

    pub(crate) async fn partial(&self, bytes: Bytes) {
        match &self.partial_observer {
            Some(observer) => observer.on_partial(bytes).await,
            None => log::debug!("discarding {}-byte partial message", bytes.len()),
        }
    }
}
