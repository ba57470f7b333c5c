//! Shared test doubles.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stellar_tales::domain::error::CacheError;
use stellar_tales::domain::traits::{RawResponse, Transport};
use tokio::sync::Notify;

type Handler = Box<dyn Fn(&str, usize) -> Result<RawResponse, CacheError> + Send + Sync>;

/// In-memory transport counting every request it sees.
pub struct MockTransport {
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
    handler: Handler,
    gate: Option<(Arc<Notify>, Vec<usize>)>,
}

impl MockTransport {
    /// `handler` gets the url and the zero-based call index
    pub fn new(
        handler: impl Fn(&str, usize) -> Result<RawResponse, CacheError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
            gate: None,
        }
    }

    pub fn json(body: Value) -> Arc<Self> {
        Arc::new(Self::new(move |_, _| Ok(RawResponse::ok(body.to_string()))))
    }

    pub fn failing(error: CacheError) -> Arc<Self> {
        Arc::new(Self::new(move |_, _| Err(error.clone())))
    }

    /// Hold the listed calls until `gate` is notified
    pub fn gated(mut self, gate: Arc<Notify>, calls: Vec<usize>) -> Self {
        self.gate = Some((gate, calls));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        url: &str,
        _headers: &BTreeMap<String, String>,
    ) -> Result<RawResponse, CacheError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        if let Some((gate, gated)) = &self.gate {
            if gated.contains(&index) {
                gate.notified().await;
            }
        }
        (self.handler)(url, index)
    }
}

pub fn json_response(body: &Value) -> Result<RawResponse, CacheError> {
    Ok(RawResponse::ok(body.to_string()))
}

/// Let spawned tasks run until `done` holds
pub async fn settle(done: impl Fn() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never held");
}
