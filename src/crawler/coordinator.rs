//! Analysis engine and batch orchestration
//!
//! This module composes the fetcher and the analyzer:
//! - [`Engine::analyze`] runs one target end to end
//! - [`Engine::run_batch`] resolves a batch of identifiers, reports the
//!   unresolvable ones, and dispatches one task per resolvable target
//!
//! The orchestrator never analyzes and the analyzer never fetches; they only
//! meet through the page body.
//!
//! # Task lifecycle
//!
//! For each resolvable identifier the registry is told the target is
//! `running` before its task is spawned; a target the registry refuses to
//! mark is reported unresolvable instead. A dispatcher task then waits for a
//! free [`TaskSlot`](crate::crawler::TaskSlot) and spawns the worker. The
//! worker is the only writer of the terminal outcome for its identifier,
//! unless it dies first, in which case the dispatcher reports for it.

use crate::config::{Config, EngineConfig, UserAgentConfig};
use crate::crawler::analyzer::{parse_page, probe_page, AnalysisResult, ParsedPage};
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::scheduler::TaskSlots;
use crate::state::CrawlStatus;
use crate::url::validate_target;
use crate::{AnalysisError, BatchError, FailureReason, InsightError, ResolutionError};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Terminal outcome of one target
pub type CrawlOutcome = Result<AnalysisResult, AnalysisError>;

/// The seams between a batch and the store that owns the target records
///
/// Callbacks run on the engine's worker tasks and must be safe to call
/// concurrently for different identifiers.
pub trait TargetRegistry: Send + Sync + 'static {
    /// Opaque identifier of a stored target
    type Id: Clone + fmt::Display + Send + Sync + 'static;

    /// Looks up the URL of a target
    fn resolve(&self, id: &Self::Id) -> Result<String, ResolutionError>;

    /// Called with `running` for each resolved target, before its task starts
    ///
    /// An error keeps the target out of the batch; it is reported as
    /// unresolvable and no outcome is ever delivered for it.
    fn status_changed(&self, id: &Self::Id, status: CrawlStatus) -> Result<(), ResolutionError>;

    /// Called exactly once per dispatched target with its terminal outcome
    ///
    /// `Ok` means the target is `done`, `Err` means it is `error`
    /// (see [`terminal_status`]).
    fn completed(&self, id: &Self::Id, outcome: CrawlOutcome);
}

/// Maps an outcome onto the terminal status it drives
pub fn terminal_status(outcome: &CrawlOutcome) -> CrawlStatus {
    match outcome {
        Ok(_) => CrawlStatus::Done,
        Err(_) => CrawlStatus::Error,
    }
}

/// Result of the dispatch phase of a batch
#[derive(Debug)]
pub struct BatchDispatch<Id> {
    /// Number of tasks dispatched
    pub dispatched: usize,

    /// Identifiers that could not be resolved, in input order
    pub unresolvable: Vec<Id>,

    /// Handle on the in-flight tasks
    pub handle: BatchHandle,
}

/// Tally of terminal outcomes for a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub done: usize,
    pub fetch_errors: usize,
    pub parse_errors: usize,
    pub cancelled: usize,
}

impl BatchReport {
    fn record(&mut self, reason: Option<FailureReason>) {
        match reason {
            None => self.done += 1,
            Some(FailureReason::FetchError) => self.fetch_errors += 1,
            Some(FailureReason::ParseError) => self.parse_errors += 1,
            Some(FailureReason::Cancelled) => self.cancelled += 1,
        }
    }

    /// Number of targets that ended in `error`
    pub fn failed(&self) -> usize {
        self.fetch_errors + self.parse_errors + self.cancelled
    }

    pub fn total(&self) -> usize {
        self.done + self.failed()
    }
}

/// Handle on a dispatched batch
///
/// Dropping the handle leaves the batch running to completion.
#[derive(Debug)]
pub struct BatchHandle {
    dispatcher: JoinHandle<BatchReport>,
    cancel: CancellationToken,
    report: Option<BatchReport>,
}

impl BatchHandle {
    /// Stops the batch
    ///
    /// Targets not yet finished are reported as cancelled, so no target is
    /// left `running`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for every task of the batch to report its outcome
    ///
    /// Cancel safe; may be called again after the batch finished.
    pub async fn wait(&mut self) -> BatchReport {
        if let Some(report) = self.report {
            return report;
        }

        let report = match (&mut self.dispatcher).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Batch dispatcher failed: {}", e);
                BatchReport::default()
            }
        };
        self.report = Some(report);
        report
    }

    pub fn is_finished(&self) -> bool {
        self.report.is_some() || self.dispatcher.is_finished()
    }
}

/// Page analysis engine
///
/// Cloning is cheap; clones share the HTTP client and the task slot pool.
#[derive(Debug, Clone)]
pub struct Engine {
    client: Client,
    config: Arc<EngineConfig>,
    slots: TaskSlots,
}

impl Engine {
    /// Creates an engine
    ///
    /// # Arguments
    ///
    /// * `config` - Pool sizes and timeouts
    /// * `user_agent` - Identification sent with every request
    pub fn new(config: EngineConfig, user_agent: &UserAgentConfig) -> Result<Self, InsightError> {
        let client = build_http_client(user_agent)?;
        let slots = TaskSlots::new(config.max_concurrent_tasks as usize);

        Ok(Self {
            client,
            config: Arc::new(config),
            slots,
        })
    }

    /// Creates an engine from a loaded configuration file
    pub fn from_config(config: &Config) -> Result<Self, InsightError> {
        Self::new(config.engine.clone(), &config.user_agent)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn slots(&self) -> &TaskSlots {
        &self.slots
    }

    /// Analyzes a single target
    ///
    /// Fetches the page and runs every extraction pass on it. A fetch or
    /// parse failure abandons the analysis; there is no partial result.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use page_insight::config::{EngineConfig, UserAgentConfig};
    /// use page_insight::Engine;
    ///
    /// # async fn example(user_agent: UserAgentConfig) -> Result<(), Box<dyn std::error::Error>> {
    /// let engine = Engine::new(EngineConfig::default(), &user_agent)?;
    /// let result = engine.analyze("https://example.com/").await?;
    /// println!("{}: {} internal links", result.title, result.internal_link_count);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn analyze(&self, target: &str) -> Result<AnalysisResult, AnalysisError> {
        let (url, parsed) = self.fetch_and_parse(target).await?;
        Ok(probe_page(&self.client, parsed, &url, &self.config).await)
    }

    /// Validates, fetches and parses a target; everything but link probing
    async fn fetch_and_parse(&self, target: &str) -> Result<(Url, ParsedPage), AnalysisError> {
        let url = validate_target(target).map_err(|source| AnalysisError::InvalidTarget {
            url: target.to_string(),
            source,
        })?;

        let body = fetch_page(&self.client, &url, self.config.fetch_timeout()).await?;
        let parsed = parse_page(&body, &url)?;
        Ok((url, parsed))
    }

    /// Analyzes a target with fetch and parse bounded by the per-task deadline
    ///
    /// Link probing runs after the deadline, each probe under its own timeout,
    /// so slow links only ever raise the broken count.
    async fn analyze_with_deadline(&self, target: &str) -> CrawlOutcome {
        let fetched =
            tokio::time::timeout(self.config.task_timeout(), self.fetch_and_parse(target)).await;

        let (url, parsed) = match fetched {
            Ok(fetched) => fetched?,
            Err(_) => {
                return Err(AnalysisError::Timeout {
                    url: target.to_string(),
                })
            }
        };

        Ok(probe_page(&self.client, parsed, &url, &self.config).await)
    }

    /// Runs a batch of stored targets
    ///
    /// Resolution and the `running` notifications happen before this
    /// returns; analysis does not. Unresolvable identifiers are collected and
    /// never stop the remaining identifiers from being dispatched.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchDispatch)` - Dispatch summary and a handle on the tasks
    /// * `Err(BatchError::EmptyBatch)` - No identifiers were given; the
    ///   registry was not touched
    pub fn run_batch<R: TargetRegistry>(
        &self,
        ids: Vec<R::Id>,
        registry: Arc<R>,
    ) -> Result<BatchDispatch<R::Id>, BatchError> {
        if ids.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let mut unresolvable = Vec::new();
        let mut targets = Vec::with_capacity(ids.len());

        for id in ids {
            let claimed = registry.resolve(&id).and_then(|url| {
                registry.status_changed(&id, CrawlStatus::Running)?;
                Ok(url)
            });

            match claimed {
                Ok(url) => targets.push((id, url)),
                Err(e) => {
                    tracing::warn!("{}", e);
                    unresolvable.push(id);
                }
            }
        }

        let dispatched = targets.len();
        tracing::info!(
            "Batch dispatched: {} targets, {} unresolvable",
            dispatched,
            unresolvable.len()
        );

        let cancel = CancellationToken::new();
        let dispatcher = tokio::spawn(self.clone().dispatch(targets, registry, cancel.clone()));

        Ok(BatchDispatch {
            dispatched,
            unresolvable,
            handle: BatchHandle {
                dispatcher,
                cancel,
                report: None,
            },
        })
    }

    /// Spawns one worker per target as task slots free up, then waits for all
    async fn dispatch<R: TargetRegistry>(
        self,
        targets: Vec<(R::Id, String)>,
        registry: Arc<R>,
        cancel: CancellationToken,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut workers = Vec::with_capacity(targets.len());
        let mut pending = targets.into_iter();

        while let Some((id, url)) = pending.next() {
            let slot = tokio::select! {
                slot = self.slots.acquire() => slot,
                _ = cancel.cancelled() => None,
            };

            let Some(slot) = slot else {
                // Cancelled before these targets got a slot
                for (id, url) in std::iter::once((id, url)).chain(pending.by_ref()) {
                    let outcome = Err(AnalysisError::Cancelled { url });
                    report.record(report_outcome(registry.as_ref(), &id, outcome));
                }
                break;
            };

            let engine = self.clone();
            let worker_registry = Arc::clone(&registry);
            let cancel = cancel.clone();
            let worker_id = id.clone();
            let worker_url = url.clone();

            let worker = tokio::spawn(async move {
                let _slot = slot;
                tracing::debug!("Analyzing target {} ({})", worker_id, worker_url);

                let outcome = tokio::select! {
                    outcome = engine.analyze_with_deadline(&worker_url) => outcome,
                    _ = cancel.cancelled() => Err(AnalysisError::Cancelled {
                        url: worker_url.clone(),
                    }),
                };

                report_outcome(worker_registry.as_ref(), &worker_id, outcome)
            });
            workers.push((id, url, worker));
        }

        for (id, url, worker) in workers {
            match worker.await {
                Ok(reason) => report.record(reason),
                Err(e) => {
                    // The worker died before reporting; report for it
                    tracing::error!("Analysis task for target {} failed: {}", id, e);
                    let outcome = Err(AnalysisError::TaskFailed {
                        url,
                        message: e.to_string(),
                    });
                    report.record(report_outcome(registry.as_ref(), &id, outcome));
                }
            }
        }

        tracing::info!(
            "Batch finished: {} done, {} failed",
            report.done,
            report.failed()
        );

        report
    }
}

/// Hands an outcome to the registry and returns its failure reason
fn report_outcome<R: TargetRegistry>(
    registry: &R,
    id: &R::Id,
    outcome: CrawlOutcome,
) -> Option<FailureReason> {
    let reason = match &outcome {
        Ok(result) => {
            tracing::info!("Target {} done: {:?}", id, result.title);
            None
        }
        Err(e) => {
            tracing::warn!("Target {} failed ({}): {}", id, e.reason(), e);
            Some(e.reason())
        }
    };

    registry.completed(id, outcome);
    reason
}
