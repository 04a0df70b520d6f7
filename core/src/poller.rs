//! Periodic log polling
//!
//! Reads the game log on an interval and hands each [`LogStatus`] to a sink.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::{ConfigContext, Settings};
use crate::error::Result;
use crate::game::LogStatus;
use crate::log::LogParser;

pub struct GamePoller {
    ctx: Arc<ConfigContext>,
    settings: Settings,
    parser: Arc<dyn LogParser>,
}

impl GamePoller {
    pub fn new(ctx: Arc<ConfigContext>, settings: Settings, parser: Arc<dyn LogParser>) -> Self {
        Self {
            ctx,
            settings,
            parser,
        }
    }

    /// Read the log once.
    ///
    /// A missing log path or an unreadable log is `NotFound`; only settings
    /// errors are returned.
    pub async fn poll(&self) -> Result<LogStatus> {
        let Some(path) = self.settings.log_file_path.get(&self.ctx).await? else {
            debug!("No log file path configured");
            return Ok(LogStatus::NotFound);
        };

        let parser = Arc::clone(&self.parser);
        let parsed = tokio::task::spawn_blocking(move || parser.parse(&path)).await;

        match parsed {
            Ok(Ok(snapshot)) => Ok(LogStatus::Found(snapshot)),
            Ok(Err(e)) => {
                debug!(error = %e, "Log file not readable");
                Ok(LogStatus::NotFound)
            }
            Err(e) => {
                debug!(error = %e, "Log parse task failed");
                Ok(LogStatus::NotFound)
            }
        }
    }

    /// Poll every `interval` until the receiving side of `sink` is dropped.
    ///
    /// Ticks that fall behind are skipped rather than bunched up.
    pub async fn run(&self, interval: Duration, sink: mpsc::Sender<LogStatus>) -> Result<()> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_ms = interval.as_millis() as u64, "Log poller started");
        loop {
            ticker.tick().await;
            let status = self.poll().await?;
            if sink.send(status).await.is_err() {
                info!("Log poller stopped");
                return Ok(());
            }
        }
    }
}
