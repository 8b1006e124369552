//! CLI runner - executes commands

use crate::catalog::HttpCatalogClient;
use crate::cli::commands::{Cli, Commands, CursorCommand, OutputFormat};
use crate::config::SyncConfig;
use crate::cursor::{Cursor, FileCursor, InMemoryCursor};
use crate::engine::{BatchCatalogProcessor, BatchSummary, CancellationToken};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::processor::{LeafProcessor, OperationFormat, OperationWriter};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    ///
    /// Returns `Ok(false)` when the command ran but did not succeed.
    pub async fn run(&self) -> Result<bool> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Dump { since } => self.dump(&config, *since).await,
            Commands::Run => self.run_loop(&config).await,
            Commands::Once => self.once(&config).await,
            Commands::Cursor { action } => match action {
                CursorCommand::Show => self.cursor_show(&config).await,
                CursorCommand::Set { value } => self.cursor_set(&config, *value).await,
            },
        }
    }

    /// Load the config file, or defaults when none was given
    fn load_config(&self) -> Result<SyncConfig> {
        match &self.cli.config {
            Some(path) => SyncConfig::from_file(path),
            None => Ok(SyncConfig::default()),
        }
    }

    /// Cursor file from the command line, else from the config file
    fn cursor_path(&self, config: &SyncConfig) -> Option<PathBuf> {
        self.cli.cursor.clone().or_else(|| config.cursor.clone())
    }

    fn require_cursor_file(&self, config: &SyncConfig) -> Result<FileCursor> {
        self.cursor_path(config)
            .map(FileCursor::new)
            .ok_or_else(|| Error::config("Cursor file not specified (use --cursor or the config file)"))
    }

    fn build_cursor(&self, config: &SyncConfig) -> Arc<dyn Cursor> {
        match self.cursor_path(config) {
            Some(path) => {
                info!("Using cursor file {}", path.display());
                Arc::new(FileCursor::new(path))
            }
            None => {
                warn!("No cursor file configured, progress will not survive a restart");
                Arc::new(InMemoryCursor::default())
            }
        }
    }

    fn build_processor(&self, config: &SyncConfig) -> Arc<dyn LeafProcessor> {
        let format = match self.cli.format {
            OutputFormat::Json => OperationFormat::Json,
            OutputFormat::Pretty => OperationFormat::Pretty,
        };

        let writer = OperationWriter::new(std::io::stdout(), format);
        match &config.package_url_template {
            Some(template) => Arc::new(writer.with_url_template(template.clone())),
            None => Arc::new(writer),
        }
    }

    fn build_engine(
        &self,
        config: &SyncConfig,
        cursor: Arc<dyn Cursor>,
    ) -> Result<BatchCatalogProcessor> {
        let http = HttpClient::with_config(config.http.client_config())?;
        let client = Arc::new(HttpCatalogClient::new(http));
        let settings = config.effective_settings(Utc::now());

        BatchCatalogProcessor::new(cursor, client, self.build_processor(config), &settings)
    }

    /// Process batches until the backlog is drained, a batch fails or the
    /// token is cancelled
    ///
    /// Returns the last summary.
    async fn drain(
        engine: &BatchCatalogProcessor,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary> {
        loop {
            let summary = engine.process_with_summary(cancel).await?;
            let backlog = summary.pages_in_bounds > summary.pages_selected;

            if !summary.success || !backlog || summary.committed_checkpoint.is_none() {
                return Ok(summary);
            }
            info!(
                "{} more pages in bounds, continuing",
                summary.pages_in_bounds - summary.pages_selected
            );
        }
    }

    /// Cancel the token on Ctrl-C
    fn watch_ctrl_c(cancel: &CancellationToken) -> tokio::task::JoinHandle<()> {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling");
                cancel.cancel();
            }
        })
    }

    /// Dump command
    async fn dump(&self, config: &SyncConfig, since: Option<DateTime<Utc>>) -> Result<bool> {
        let cursor = Arc::new(InMemoryCursor::new(since));
        let engine = self.build_engine(config, cursor)?;
        let cancel = CancellationToken::new();
        let watcher = Self::watch_ctrl_c(&cancel);

        let result = Self::drain(&engine, &cancel).await;
        watcher.abort();

        let summary = result?;
        Self::report(&summary);
        Ok(summary.success)
    }

    /// Run command
    async fn run_loop(&self, config: &SyncConfig) -> Result<bool> {
        let engine = self.build_engine(config, self.build_cursor(config))?;
        let cancel = CancellationToken::new();
        let watcher = Self::watch_ctrl_c(&cancel);
        let interval = config.poll_interval();

        info!(
            "Polling every {}s, press Ctrl-C to stop",
            interval.as_secs()
        );

        loop {
            match Self::drain(&engine, &cancel).await {
                Ok(summary) => Self::report(&summary),
                // Discovery failures are usually transient on a long-running host
                Err(e) => error!("Batch aborted: {e}"),
            }

            if cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        watcher.abort();
        info!("Stopped");
        Ok(true)
    }

    /// Once command
    async fn once(&self, config: &SyncConfig) -> Result<bool> {
        let engine = self.build_engine(config, self.build_cursor(config))?;
        let cancel = CancellationToken::new();
        let watcher = Self::watch_ctrl_c(&cancel);

        let result = engine.process_with_summary(&cancel).await;
        watcher.abort();

        let summary = result?;
        Self::report(&summary);
        Ok(summary.success)
    }

    /// Cursor show command
    async fn cursor_show(&self, config: &SyncConfig) -> Result<bool> {
        let cursor = self.require_cursor_file(config)?;
        match cursor.load().await? {
            Some(value) => println!("{}", value.to_rfc3339()),
            None => println!("(not set)"),
        }
        Ok(true)
    }

    /// Cursor set command
    async fn cursor_set(&self, config: &SyncConfig, value: DateTime<Utc>) -> Result<bool> {
        let cursor = self.require_cursor_file(config)?;
        let previous = cursor.load().await.unwrap_or_else(|e| {
            warn!("Existing cursor is unreadable and will be replaced: {e}");
            None
        });

        cursor.try_set(value).await?;

        match previous {
            Some(previous) => info!(
                "Cursor moved from {} to {}",
                previous.to_rfc3339(),
                value.to_rfc3339()
            ),
            None => info!("Cursor set to {}", value.to_rfc3339()),
        }
        Ok(true)
    }

    fn report(summary: &BatchSummary) {
        if summary.success {
            info!(
                "Batch {}: {} pages, {} leaves applied",
                summary.window, summary.pages_fetched, summary.leaves_applied
            );
        } else {
            warn!(
                "Batch {} failed: {} pages failed, {} leaves failed, cancelled={}",
                summary.window, summary.pages_failed, summary.leaves_failed, summary.cancelled
            );
        }
    }
}
