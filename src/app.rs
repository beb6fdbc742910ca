use std::sync::Arc;

use anyhow::{anyhow, Result};
use reqwest::Client;

use crate::{
    ai::OpenAiClient,
    config::AppConfig,
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    report::{list_reports, ReportGenerator, ReportWriter},
    tasks::{MonitorDeps, MonitorSession, SessionState},
    web_content::WebContentFetcher,
};

pub struct WatchApp {
    paths: ResolvedPaths,
    config: AppConfig,
    deps: MonitorDeps,
    shutdown: Shutdown,
}

impl WatchApp {
    pub fn initialize(config: AppConfig, paths: ResolvedPaths, shutdown: Shutdown) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(config.fetch.user_agent.clone())
            .build()?;

        let deps = MonitorDeps {
            source: Arc::new(WebContentFetcher::new(
                http_client.clone(),
                config.fetch.clone(),
            )),
            classifier: Arc::new(OpenAiClient::new(http_client, config.openai.clone())),
            generator: ReportGenerator::new(config.timezone),
            writer: ReportWriter::new(paths.reports_dir.clone()),
        };

        Ok(Self {
            paths,
            config,
            deps,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let WatchApp {
            paths,
            config,
            deps,
            shutdown,
        } = self;

        match list_reports(&paths.reports_dir) {
            Ok(reports) => tracing::info!(
                target: "report",
                existing = reports.len(),
                latest = ?reports.first().map(|r| r.path.display().to_string()),
                "report directory scanned"
            ),
            Err(err) => tracing::warn!(target: "report", error = %err, "failed to scan report directory"),
        }

        for (index, target) in config.monitor.targets.iter().enumerate() {
            tracing::info!(target: "session", position = index + 1, url = %target, "monitoring target");
        }

        let mut session = MonitorSession::new();
        session.start(config.monitor.clone(), deps)?;

        let mut shutdown_listener = shutdown.subscribe();
        tokio::select! {
            cause = shutdown_listener.notified() => {
                tracing::info!(target: "session", %cause, "shutdown requested");
            }
            _ = session.finished() => {
                tracing::warn!(target: "session", "monitoring session ended on its own");
            }
        }

        let status = session.stop().await;
        tracing::info!(
            target: "session",
            state = ?status.state,
            cycles = status.cycles_completed,
            reports = status.reports_written,
            tracked = status.tracked_targets,
            "monitor shut down"
        );

        if status.state == SessionState::Failed {
            let message = status
                .last_error
                .unwrap_or_else(|| "monitoring session failed".to_string());
            return Err(anyhow!(message));
        }
        Ok(())
    }
}
