use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::constants::DEFAULT_BATCH_CONCURRENCY;
use crate::content::{ContentId, EquivalenceContent};

use super::updater::EquivalenceUpdater;

/// How one subject of a batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Combined candidates were found.
    Updated,
    /// The update ran but found nothing.
    Unchanged,
    Failed { error: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectOutcome {
    pub subject: ContentId,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl SubjectOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self.status,
            OutcomeStatus::Failed { .. } | OutcomeStatus::TimedOut
        )
    }
}

/// Outcomes in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<SubjectOutcome>,
}

impl BatchReport {
    pub fn updated(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Updated))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Unchanged))
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    fn count(&self, predicate: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// Drives many subjects through one updater with a bounded number in flight.
///
/// Each subject runs on its own task. A failure, panic or timeout is recorded for that
/// subject only; the rest of the batch carries on.
pub struct BatchRunner<T: EquivalenceContent> {
    updater: Arc<dyn EquivalenceUpdater<T>>,
    concurrency: usize,
    timeout: Option<Duration>,
}

impl<T: EquivalenceContent> BatchRunner<T> {
    pub fn new(updater: Arc<dyn EquivalenceUpdater<T>>) -> Self {
        Self {
            updater,
            concurrency: DEFAULT_BATCH_CONCURRENCY,
            timeout: None,
        }
    }

    /// Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[instrument(skip(self, subjects), fields(subjects = subjects.len(), concurrency = self.concurrency))]
    pub async fn run(&self, subjects: Vec<T>) -> BatchReport {
        let tasks = subjects.into_iter().map(|subject| {
            let id = subject.id().clone();
            let updater = Arc::clone(&self.updater);
            let timeout = self.timeout;
            let handle = tokio::spawn(async move {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, updater.update(&subject))
                        .await
                        .map_err(|_| ()),
                    None => Ok(updater.update(&subject).await),
                }
            });
            async move { (id, handle.await) }
        });

        let outcomes: Vec<SubjectOutcome> = stream::iter(tasks)
            .buffered(self.concurrency)
            .map(|(subject, joined)| {
                let status = match joined {
                    Ok(Ok(Ok(true))) => OutcomeStatus::Updated,
                    Ok(Ok(Ok(false))) => OutcomeStatus::Unchanged,
                    Ok(Ok(Err(e))) => {
                        warn!(subject = %subject, error = %e, "Subject update failed");
                        OutcomeStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                    Ok(Err(())) => {
                        warn!(subject = %subject, "Subject update timed out");
                        OutcomeStatus::TimedOut
                    }
                    Err(e) => {
                        warn!(subject = %subject, error = %e, "Subject update task aborted");
                        OutcomeStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                SubjectOutcome { subject, status }
            })
            .collect()
            .await;

        let report = BatchReport { outcomes };
        info!(
            updated = report.updated(),
            unchanged = report.unchanged(),
            failed = report.failed(),
            "Batch complete"
        );
        report
    }
}

impl<T: EquivalenceContent> fmt::Debug for BatchRunner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRunner")
            .field("concurrency", &self.concurrency)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
