use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::TemplateKind;
use crate::export::RowExporter;
use crate::schedule::JobRegistry;
use crate::store::JsonStore;
use crate::transport::Transport;

/// A two-step admin interaction waiting for the next text message
#[derive(Debug, Clone, Copy)]
pub enum PendingInput {
    /// /broadcast was issued; the next message is the broadcast text
    BroadcastMessage,
    /// /setmessage <kind> was issued; the next message is the template
    MessageTemplate(TemplateKind),
}

/// Bot state shared across all handlers
pub struct Data {
    /// JSON document store for configuration and participants
    pub store: Arc<JsonStore>,
    /// Outbound message delivery
    pub transport: Arc<dyn Transport>,
    /// The scheduling engine
    pub registry: JobRegistry,
    /// External tabular-store integration
    pub exporter: Arc<dyn RowExporter>,
    /// Maps admin chat ids to the input their next message completes
    pub pending_inputs: DashMap<i64, PendingInput>,
    /// Directory CSV exports are written into
    pub data_dir: PathBuf,
}

impl Data {
    pub fn new(
        store: Arc<JsonStore>,
        transport: Arc<dyn Transport>,
        registry: JobRegistry,
        exporter: Arc<dyn RowExporter>,
        data_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            transport,
            registry,
            exporter,
            pending_inputs: DashMap::new(),
            data_dir,
        }
    }
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
