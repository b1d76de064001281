//! hangqing-mock
//!
//! Scriptable in-memory `DataSource` for integration tests. Behavior is
//! tailored per test via builder closures or a scripted step queue; every
//! fetch is counted so tests can assert which sources were (not) consulted.
#![warn(missing_docs)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use hangqing_core::{
    DataSource, DateRange, HangqingError, MacroKind, MacroSource, RawFrame, StockCode,
};

type FetchFn =
    Arc<dyn Fn(&StockCode, &DateRange) -> Result<RawFrame, HangqingError> + Send + Sync>;
type MacroFn = Arc<dyn Fn(MacroKind) -> Result<RawFrame, HangqingError> + Send + Sync>;

/// Simple in-memory source used by integration tests.
pub struct MockSource {
    name: &'static str,
    available: bool,
    delay: Duration,
    calls: AtomicUsize,
    macro_calls: AtomicUsize,
    // Scripted responses consumed one per call, ahead of `fetch_fn`.
    steps: Mutex<Vec<Result<RawFrame, HangqingError>>>,
    fetch_fn: Option<FetchFn>,
    macro_fn: Option<MacroFn>,
}

impl MockSource {
    /// Start building a mock source.
    #[must_use]
    pub fn builder(name: &'static str) -> MockSourceBuilder {
        MockSourceBuilder::new(name)
    }

    /// How many times `fetch_daily` was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// How many times `fetch_macro` was invoked.
    pub fn macro_calls(&self) -> usize {
        self.macro_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for MockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn fetch_daily(
        &self,
        code: &StockCode,
        range: &DateRange,
    ) -> Result<RawFrame, HangqingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = {
            let mut steps = self.steps.lock().expect("steps lock");
            if steps.is_empty() { None } else { Some(steps.remove(0)) }
        };
        if let Some(step) = scripted {
            return step;
        }
        if let Some(f) = &self.fetch_fn {
            return f(code, range);
        }
        Err(HangqingError::transient(self.name, "no scripted response"))
    }

    fn as_macro_source(&self) -> Option<&dyn MacroSource> {
        if self.macro_fn.is_some() {
            Some(self as &dyn MacroSource)
        } else {
            None
        }
    }
}

#[async_trait]
impl MacroSource for MockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_macro(&self, kind: MacroKind) -> Result<RawFrame, HangqingError> {
        self.macro_calls.fetch_add(1, Ordering::SeqCst);
        match &self.macro_fn {
            Some(f) => f(kind),
            None => Err(HangqingError::unsupported("macro")),
        }
    }
}

/// Builder used by tests to tailor a [`MockSource`].
pub struct MockSourceBuilder {
    name: &'static str,
    available: bool,
    delay: Duration,
    steps: Vec<Result<RawFrame, HangqingError>>,
    fetch_fn: Option<FetchFn>,
    macro_fn: Option<MacroFn>,
}

impl MockSourceBuilder {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            available: true,
            delay: Duration::ZERO,
            steps: Vec::new(),
            fetch_fn: None,
            macro_fn: None,
        }
    }

    /// Mark the source unavailable (missing credential/dependency).
    #[must_use]
    pub const fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Sleep this long inside every fetch.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue scripted responses, consumed one per call before `fetch_fn`.
    #[must_use]
    pub fn with_steps(mut self, steps: Vec<Result<RawFrame, HangqingError>>) -> Self {
        self.steps = steps;
        self
    }

    /// Custom fetch behavior once any scripted steps are consumed.
    #[must_use]
    pub fn with_fetch_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&StockCode, &DateRange) -> Result<RawFrame, HangqingError> + Send + Sync + 'static,
    {
        self.fetch_fn = Some(Arc::new(f));
        self
    }

    /// Always return this frame.
    #[must_use]
    pub fn returns_frame(self, frame: RawFrame) -> Self {
        self.with_fetch_fn(move |_, _| Ok(frame.clone()))
    }

    /// Always fail with a transient error.
    #[must_use]
    pub fn fails(self) -> Self {
        let name = self.name;
        self.with_fetch_fn(move |_, _| Err(HangqingError::transient(name, "mock failure")))
    }

    /// Custom macro behavior; also advertises the macro capability.
    #[must_use]
    pub fn with_macro_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(MacroKind) -> Result<RawFrame, HangqingError> + Send + Sync + 'static,
    {
        self.macro_fn = Some(Arc::new(f));
        self
    }

    /// Always return this macro frame.
    #[must_use]
    pub fn returns_macro_frame(self, frame: RawFrame) -> Self {
        self.with_macro_fn(move |_| Ok(frame.clone()))
    }

    /// Finish the build.
    #[must_use]
    pub fn build(self) -> Arc<MockSource> {
        Arc::new(MockSource {
            name: self.name,
            available: self.available,
            delay: self.delay,
            calls: AtomicUsize::new(0),
            macro_calls: AtomicUsize::new(0),
            steps: Mutex::new(self.steps),
            fetch_fn: self.fetch_fn,
            macro_fn: self.macro_fn,
        })
    }
}
