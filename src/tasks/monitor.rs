use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::sleep;

use crate::{
    ai::{ChangeClassifier, ClassificationError},
    config::MonitorConfig,
    diff::{compute_diff, render_side_by_side},
    domain::Target,
    infrastructure::shutdown::ShutdownListener,
    report::{ReportGenerator, ReportWriter},
    tasks::store::StateStore,
    web_content::PageSource,
};

pub type CycleObserver = Arc<dyn Fn(&CycleSummary) + Send + Sync>;

/// Condition that ends a monitoring session.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("change classification failed for {target}: {source}")]
    Classification {
        target: Target,
        #[source]
        source: ClassificationError,
    },
}

/// Collaborators the loop drives. Shared so a session can be restarted with
/// the same clients.
#[derive(Clone)]
pub struct MonitorDeps {
    pub source: Arc<dyn PageSource>,
    pub classifier: Arc<dyn ChangeClassifier>,
    pub generator: ReportGenerator,
    pub writer: ReportWriter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Baseline,
    Unchanged,
    FetchFailed,
    Suppressed,
    Reported(PathBuf),
    ReportLost,
}

#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub outcomes: Vec<(Target, TargetOutcome)>,
    pub cancelled: bool,
    pub finished_at: DateTime<Utc>,
}

impl CycleSummary {
    pub fn reports_written(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Reported(_)))
    }

    fn count(&self, pred: impl Fn(&TargetOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub struct Monitor {
    config: MonitorConfig,
    deps: MonitorDeps,
    store: StateStore,
}

impl Monitor {
    pub fn new(config: MonitorConfig, deps: MonitorDeps, store: StateStore) -> Self {
        Self {
            config,
            deps,
            store,
        }
    }

    /// Runs cycles until the shutdown signal fires or a cycle fails fatally.
    pub async fn run(
        &self,
        shutdown: &mut ShutdownListener,
        observer: CycleObserver,
    ) -> Result<(), MonitorError> {
        tracing::info!(
            target: "monitor",
            targets = self.config.targets.len(),
            interval_secs = self.config.interval.as_secs(),
            noise_filter = self.config.noise_filter,
            "monitor started"
        );
        loop {
            if shutdown.is_triggered() {
                break;
            }

            let summary = self.run_cycle(shutdown).await?;
            observer(&summary);
            if summary.cancelled {
                break;
            }

            tokio::select! {
                _ = sleep(self.config.interval) => {}
                _ = shutdown.notified() => break,
            }
        }
        match shutdown.cause() {
            Some(cause) => tracing::info!(target: "monitor", %cause, "monitor stopped"),
            None => tracing::info!(target: "monitor", "monitor stopped"),
        }
        Ok(())
    }

    /// Visits every target once, in configured order.
    pub async fn run_cycle(
        &self,
        shutdown: &mut ShutdownListener,
    ) -> Result<CycleSummary, MonitorError> {
        let mut outcomes = Vec::with_capacity(self.config.targets.len());
        let mut cancelled = false;

        for target in &self.config.targets {
            if shutdown.is_triggered() {
                cancelled = true;
                break;
            }
            tracing::info!(target: "monitor", url = %target, "checking target");
            match self.check_target(target, shutdown).await? {
                Some(outcome) => outcomes.push((target.clone(), outcome)),
                None => {
                    tracing::info!(
                        target: "monitor",
                        url = %target,
                        "shutdown requested mid-check; abandoning cycle"
                    );
                    cancelled = true;
                    break;
                }
            }
        }

        let summary = CycleSummary {
            outcomes,
            cancelled,
            finished_at: Utc::now(),
        };
        tracing::info!(
            target: "monitor",
            checked = summary.outcomes.len(),
            reports = summary.reports_written(),
            fetch_failures = summary.count(|o| *o == TargetOutcome::FetchFailed),
            suppressed = summary.count(|o| *o == TargetOutcome::Suppressed),
            cancelled,
            "cycle finished"
        );
        Ok(summary)
    }

    /// `Ok(None)` means the shutdown signal interrupted the check.
    async fn check_target(
        &self,
        target: &Target,
        shutdown: &mut ShutdownListener,
    ) -> Result<Option<TargetOutcome>, MonitorError> {
        let fetched = tokio::select! {
            res = self.deps.source.fetch(target) => res,
            _ = shutdown.notified() => return Ok(None),
        };
        let page = match fetched {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(target: "fetch", url = %target, error = %err, "fetch failed; will retry next cycle");
                return Ok(Some(TargetOutcome::FetchFailed));
            }
        };

        let Some(previous) = self.store.get(target) else {
            self.store.upsert(target, page.fingerprint, page.content);
            tracing::info!(target: "monitor", url = %target, "baseline established");
            return Ok(Some(TargetOutcome::Baseline));
        };

        if previous.fingerprint == page.fingerprint {
            return Ok(Some(TargetOutcome::Unchanged));
        }

        let outcome = tokio::select! {
            res = self.evaluate_change(target, &previous.content, &page.content) => res?,
            _ = shutdown.notified() => return Ok(None),
        };

        // Recorded whether or not a report was produced, so the same change
        // is not classified again next cycle.
        self.store.upsert(target, page.fingerprint, page.content);
        Ok(Some(outcome))
    }

    async fn evaluate_change(
        &self,
        target: &Target,
        old_content: &str,
        new_content: &str,
    ) -> Result<TargetOutcome, MonitorError> {
        if !self.config.noise_filter {
            tracing::info!(target: "monitor", url = %target, "change detected (noise filter disabled)");
            return self.report(target, old_content, new_content).await;
        }

        let important = self
            .deps
            .classifier
            .is_important(target, old_content, new_content, &self.config.preferences)
            .await
            .map_err(|source| MonitorError::Classification {
                target: target.clone(),
                source,
            })?;

        if important {
            tracing::info!(target: "monitor", url = %target, "significant change detected");
            self.report(target, old_content, new_content).await
        } else {
            tracing::info!(target: "monitor", url = %target, "change deemed insignificant; skipping report");
            Ok(TargetOutcome::Suppressed)
        }
    }

    async fn report(
        &self,
        target: &Target,
        old_content: &str,
        new_content: &str,
    ) -> Result<TargetOutcome, MonitorError> {
        let rows = render_side_by_side(&compute_diff(old_content, new_content));
        let summary = self
            .deps
            .classifier
            .summarize(target, old_content, new_content, &self.config.preferences)
            .await
            .map_err(|source| MonitorError::Classification {
                target: target.clone(),
                source,
            })?;

        let report = self.deps.generator.generate(target, &summary, &rows);
        match self.deps.writer.write(&report).await {
            Ok(path) => Ok(TargetOutcome::Reported(path)),
            Err(err) => {
                tracing::error!(target: "report", url = %target, error = %err, "report lost");
                Ok(TargetOutcome::ReportLost)
            }
        }
    }
}
