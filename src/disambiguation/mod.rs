//! Confusable-character disambiguation
//!
//! Second recognition pass over tokens containing visually confusable
//! characters. For each ambiguous token the region is cropped, the engine is
//! asked again with an allowlist restricted to the plausible characters, and
//! the result is reconciled with the first-pass reading.
//!
//! The stage is best-effort: engine failures, empty results and timeouts all
//! leave the original token in place.

pub mod confusables;
pub mod reconcile;
pub mod region;
pub mod scoring;

pub use confusables::{build_allowlist, is_ambiguous, Allowlist, ConfusableGroup, ConfusableTable};
pub use reconcile::{reconcile, Candidate, ReconcilePolicy, DEFAULT_MARGIN};
pub use region::{crop, crop_bounds, CropBounds};
pub use scoring::score;

use crossbeam_channel::RecvTimeoutError;
use image::RgbImage;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::DisambiguationConfig;
use crate::vision::{EngineError, RecognitionEngine, RecognizeOptions, Token};

/// Drives the second pass over a first-pass token list
pub struct Disambiguator {
    engine: Arc<dyn RecognitionEngine>,
    table: Arc<ConfusableTable>,
    margin: f64,
    policy: ReconcilePolicy,
    workers: usize,
    timeout: Option<Duration>,
}

impl Disambiguator {
    /// Create a disambiguator with the built-in groups and default policy
    pub fn new(engine: Arc<dyn RecognitionEngine>) -> Self {
        Self {
            engine,
            table: Arc::new(ConfusableTable::builtin().clone()),
            margin: DEFAULT_MARGIN,
            policy: ReconcilePolicy::default(),
            workers: 1,
            timeout: None,
        }
    }

    /// Create a disambiguator from configuration
    pub fn from_config(engine: Arc<dyn RecognitionEngine>, config: &DisambiguationConfig) -> Self {
        let mut disambiguator = Self::new(engine)
            .with_table(config.confusable_table())
            .with_margin(config.margin)
            .with_policy(config.policy)
            .with_workers(config.workers);
        disambiguator.timeout = config.timeout();
        disambiguator
    }

    /// Use a custom confusable table
    pub fn with_table(mut self, table: ConfusableTable) -> Self {
        if table.groups().is_empty() {
            warn!("Confusable table has no groups; no token will be re-recognized");
        }
        self.table = Arc::new(table);
        self
    }

    /// Set the near-tie margin
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Set the reconciliation policy
    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the number of concurrent second-pass calls (at least 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Bound each second-pass call; a timeout leaves the token unchanged
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Revise `tokens`; the result has the same length and order
    pub fn disambiguate(&self, image: &RgbImage, tokens: &[Token]) -> Vec<Token> {
        let start = Instant::now();
        let mut revised = tokens.to_vec();

        let pending: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| self.needs_second_pass(token))
            .map(|(index, _)| index)
            .collect();

        if pending.is_empty() {
            debug!("No ambiguous tokens among {}", tokens.len());
            return revised;
        }

        if self.workers > 1 && pending.len() > 1 {
            self.resolve_parallel(image, tokens, &pending, &mut revised);
        } else {
            for &index in &pending {
                revised[index] = self.resolve_token(image, &tokens[index]);
            }
        }

        let changed = tokens.iter().zip(&revised).filter(|(a, b)| a != b).count();
        info!(
            "Disambiguation re-recognized {} of {} tokens, revised {} in {:?}",
            pending.len(),
            tokens.len(),
            changed,
            start.elapsed()
        );

        revised
    }

    fn needs_second_pass(&self, token: &Token) -> bool {
        !token.text.is_empty() && self.table.is_ambiguous(&token.text)
    }

    /// Bounded worker pool; results are written back by index
    fn resolve_parallel(&self, image: &RgbImage, tokens: &[Token], pending: &[usize], revised: &mut [Token]) {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<usize>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, Token)>();

        for &index in pending {
            // Receiver is alive until the scope below ends
            let _ = job_tx.send(index);
        }
        drop(job_tx);

        let workers = self.workers.min(pending.len());
        debug!("Resolving {} tokens on {} workers", pending.len(), workers);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                scope.spawn(move || {
                    for index in job_rx.iter() {
                        let token = self.resolve_token(image, &tokens[index]);
                        let _ = done_tx.send((index, token));
                    }
                });
            }
        });
        drop(done_tx);

        for (index, token) in done_rx.iter() {
            revised[index] = token;
        }
    }

    /// Crop, re-recognize with an allowlist and reconcile one token
    fn resolve_token(&self, image: &RgbImage, token: &Token) -> Token {
        let allowlist = self.table.build_allowlist(&token.text);
        let region = crop(image, &token.region);
        let options = RecognizeOptions::constrained(allowlist.to_string());

        let candidates = match self.recognize_region(region, options) {
            Ok(candidates) if candidates.is_empty() => {
                debug!("No candidates for {:?}; keeping first-pass reading", token.text);
                return token.clone();
            }
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Second pass for {:?} failed: {}", token.text, e);
                return token.clone();
            }
        };

        let best = reconcile(
            Candidate::from(token),
            candidates.into_iter().map(Candidate::from),
            self.margin,
            self.policy,
        );

        if best.text != token.text {
            debug!(
                "Revised {:?} ({:.3}) -> {:?} ({:.3}) using allowlist {:?}",
                token.text, token.confidence, best.text, best.confidence, allowlist.to_string()
            );
        }

        token.with_reading(best.text, best.confidence)
    }

    fn recognize_region(&self, region: RgbImage, options: RecognizeOptions) -> Result<Vec<Token>, EngineError> {
        let Some(timeout) = self.timeout else {
            return call_engine(self.engine.as_ref(), &region, &options);
        };

        // The helper thread is detached on timeout and finishes on its own
        let (tx, rx) = crossbeam_channel::bounded(1);
        let engine = Arc::clone(&self.engine);
        std::thread::Builder::new()
            .name("second-pass".to_string())
            .spawn(move || {
                let _ = tx.send(call_engine(engine.as_ref(), &region, &options));
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(EngineError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Backend(format!(
                "{} exited without a result",
                self.engine.name()
            ))),
        }
    }
}

/// Run the second pass with the built-in groups and default policy
pub fn disambiguate(engine: Arc<dyn RecognitionEngine>, image: &RgbImage, tokens: &[Token]) -> Vec<Token> {
    Disambiguator::new(engine).disambiguate(image, tokens)
}

/// Invoke the engine, turning a panic into a backend error
fn call_engine(
    engine: &dyn RecognitionEngine,
    region: &RgbImage,
    options: &RecognizeOptions,
) -> Result<Vec<Token>, EngineError> {
    panic::catch_unwind(AssertUnwindSafe(|| engine.recognize(region, options))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(EngineError::Backend(format!("{} panicked: {}", engine.name(), message)))
    })
}
