//! Operation writer
//!
//! A processor that turns every applied leaf into a [`PackageOperation`] and
//! writes it as one line to a sink (stdout for the CLI, a buffer in tests).

use super::operation::{PackageOperation, DEFAULT_PACKAGE_URL_TEMPLATE};
use super::LeafProcessor;
use crate::catalog::{PackageDeleteLeaf, PackageDetailsLeaf};
use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;
use tracing::warn;

/// Line format of the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// `[ADDED] <commit> - id@version`
    Pretty,
}

/// Leaf processor writing one line per operation
pub struct OperationWriter<W: Write + Send> {
    sink: Mutex<W>,
    format: OperationFormat,
    url_template: String,
}

impl<W: Write + Send> OperationWriter<W> {
    /// Create a writer over a sink
    pub fn new(sink: W, format: OperationFormat) -> Self {
        Self {
            sink: Mutex::new(sink),
            format,
            url_template: DEFAULT_PACKAGE_URL_TEMPLATE.to_string(),
        }
    }

    /// Use a different package URL template
    #[must_use]
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    /// Consume the writer, returning the sink
    pub fn into_inner(self) -> W {
        match self.sink.into_inner() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn render(&self, operation: &PackageOperation) -> String {
        match self.format {
            OperationFormat::Json => {
                serde_json::to_string(operation).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
            }
            OperationFormat::Pretty => {
                let label = if operation.is_add() {
                    "[ADDED]"
                } else {
                    "[DELETED]"
                };
                format!(
                    "{label} {} - {}@{}",
                    operation.commit_timestamp.to_rfc3339(),
                    operation.id,
                    operation.version_normalized
                )
            }
        }
    }

    fn emit(&self, operation: &PackageOperation) -> bool {
        let line = self.render(operation);
        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        match writeln!(sink, "{line}").and_then(|()| sink.flush()) {
            Ok(()) => true,
            Err(e) => {
                warn!(id = %operation.id, version = %operation.version, error = %e, "Failed to write operation");
                false
            }
        }
    }
}

impl<W: Write + Send> std::fmt::Debug for OperationWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationWriter")
            .field("format", &self.format)
            .field("url_template", &self.url_template)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<W: Write + Send> LeafProcessor for OperationWriter<W> {
    async fn process_package_details(&self, leaf: &PackageDetailsLeaf) -> bool {
        self.emit(&PackageOperation::for_add(leaf, &self.url_template))
    }

    async fn process_package_delete(&self, leaf: &PackageDeleteLeaf) -> bool {
        self.emit(&PackageOperation::for_delete(leaf))
    }
}
