//! Scripted renderer for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{RenderSession, Renderer};
use crate::error::ScraperError;

pub(crate) type EvalFn = dyn Fn(&str) -> Result<Value, ScraperError> + Send + Sync;

/// Serves a fixed sequence of documents (the last one repeats) and answers
/// script evaluation through an optional handler.
pub(crate) struct FakeRenderer {
    contents: Arc<Vec<String>>,
    eval: Option<Arc<EvalFn>>,
    fail_open: bool,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl FakeRenderer {
    pub fn with_content<I, S>(contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            contents: Arc::new(contents.into_iter().map(Into::into).collect()),
            eval: None,
            fail_open: false,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::with_content(Vec::<String>::new())
        }
    }

    pub fn on_evaluate<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) -> Result<Value, ScraperError> + Send + Sync + 'static,
    {
        self.eval = Some(Arc::new(handler));
        self
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn open(&self, url: &str) -> Result<Box<dyn RenderSession>, ScraperError> {
        if self.fail_open {
            return Err(ScraperError::Browser(format!("cannot open {url}")));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            contents: Arc::clone(&self.contents),
            served: Mutex::new(0),
            eval: self.eval.clone(),
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct FakeSession {
    contents: Arc<Vec<String>>,
    served: Mutex<usize>,
    eval: Option<Arc<EvalFn>>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn content(&self) -> Result<String, ScraperError> {
        let mut served = self.served.lock().unwrap();
        let index = (*served).min(self.contents.len().saturating_sub(1));
        *served += 1;
        self.contents
            .get(index)
            .cloned()
            .ok_or_else(|| ScraperError::Browser("no content scripted".to_string()))
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScraperError> {
        match &self.eval {
            Some(handler) => handler(script),
            None => Ok(Value::Null),
        }
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
