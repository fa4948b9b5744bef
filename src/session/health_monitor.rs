use crate::core::ResearchClient;
use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online,
    Offline,
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendStatus::Checking => write!(f, "Checking..."),
            BackendStatus::Online => write!(f, "Connected"),
            BackendStatus::Offline => write!(f, "Disconnected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: BackendStatus,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Default for HealthReport {
    fn default() -> Self {
        Self {
            status: BackendStatus::Checking,
            last_checked: None,
        }
    }
}

/// Single health probe against `GET /`
pub async fn probe(client: &ResearchClient) -> BackendStatus {
    match client.check_health().await {
        Ok(()) => BackendStatus::Online,
        Err(e) => {
            tracing::error!("Backend connection error: {}", e);
            BackendStatus::Offline
        }
    }
}

/// Polls the backend on an interval and publishes the latest report
pub struct HealthMonitor {
    client: ResearchClient,
    interval: Duration,
}

pub struct HealthMonitorHandle {
    reports: watch::Receiver<HealthReport>,
    shutdown: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl HealthMonitor {
    pub fn new(client: ResearchClient, interval: Duration) -> Self {
        Self { client, interval }
    }

    pub fn spawn(self) -> HealthMonitorHandle {
        let (report_tx, report_rx) = watch::channel(HealthReport::default());
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(self.run(report_tx, shutdown_rx));

        HealthMonitorHandle {
            reports: report_rx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self, reports: watch::Sender<HealthReport>, mut shutdown: mpsc::Receiver<()>) {
        tracing::info!("Health monitor started (interval {:?})", self.interval);

        loop {
            reports.send_modify(|r| r.status = BackendStatus::Checking);
            let status = probe(&self.client).await;
            let report = HealthReport {
                status,
                last_checked: Some(Utc::now()),
            };
            tracing::debug!("Backend status: {:?}", report.status);

            if reports.send(report).is_err() {
                tracing::info!("Health monitor has no subscribers left");
                break;
            }

            match timeout(self.interval, shutdown.recv()).await {
                Ok(Some(())) => {
                    tracing::info!("Health monitor received shutdown signal");
                    break;
                }
                Ok(None) => {
                    tracing::info!("Health monitor channel closed");
                    break;
                }
                Err(_) => continue,
            }
        }
    }
}

impl HealthMonitorHandle {
    pub fn latest(&self) -> HealthReport {
        self.reports.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HealthReport> {
        self.reports.clone()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!("Health monitor task failed: {}", e);
        }
    }
}
