//! Transport-agnostic application state.
//!
//! `CoreState` owns the shared store and the intake pipeline. It is
//! wrapped in `Arc` at startup and handed to the HTTP layer.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::actions::{ActionDispatcher, ActionTrigger, DispatchError, HttpTransport};
use crate::config::{AppConfig, ConfigError};
use crate::db::{DatabaseError, SharedStore, SqliteStore};
use crate::pipeline::extraction::{PdfTextExtractor, TextExtractor};
use crate::pipeline::IntakeProcessor;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    store: Arc<dyn SharedStore>,
    processor: IntakeProcessor,
}

impl CoreState {
    /// Open the store, wire the dispatcher onto `runtime`, and build
    /// the intake pipeline.
    pub fn bootstrap(config: &AppConfig, runtime: Handle) -> Result<Self, CoreError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store: Arc<dyn SharedStore> = Arc::new(SqliteStore::open(&config.db_path)?);
        let transport = Arc::new(HttpTransport::new(config.action_timeout)?);
        let dispatcher = Arc::new(ActionDispatcher::new(
            Arc::clone(&store),
            transport,
            config.endpoints.clone(),
            config.retry,
            runtime,
        ));

        tracing::info!(
            db = %config.db_path.display(),
            max_attempts = config.retry.max_attempts,
            retry_delay_secs = config.retry.delay.as_secs(),
            "Core state ready"
        );

        Ok(Self::from_parts(store, dispatcher, Box::new(PdfTextExtractor)))
    }

    /// Assemble from explicit collaborators (tests, embedding).
    pub fn from_parts(
        store: Arc<dyn SharedStore>,
        actions: Arc<dyn ActionTrigger>,
        extractor: Box<dyn TextExtractor>,
    ) -> Self {
        let processor = IntakeProcessor::new(Arc::clone(&store), actions, extractor);
        Self { store, processor }
    }

    pub fn store(&self) -> &dyn SharedStore {
        self.store.as_ref()
    }

    pub fn processor(&self) -> &IntakeProcessor {
        &self.processor
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Errors from CoreState construction.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Dispatcher setup failed: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server error: {0}")]
    Server(String),
}
