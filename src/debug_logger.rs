// Decision log for the agent server
//
// Every served decision becomes one JSON line. Writes happen on a spawned task,
// so a slow disk never delays the HTTP reply. The replay tool reads the file back.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::bot::Decision;
use crate::game::GameState;
use crate::types::{LightAction, Player};

/// One logged decision
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogEntry {
    pub step: u32,
    pub player: Player,
    pub remaining_time_ms: Option<u64>,
    pub state: GameState,
    pub action: Option<LightAction>,
    pub value: f64,
    pub depth: u32,
    pub opening: bool,
    pub timestamp: String,
}

impl LogEntry {
    pub fn new(state: GameState, player: Player, remaining_time_ms: Option<u64>, decision: &Decision) -> Self {
        LogEntry {
            step: state.step(),
            player,
            remaining_time_ms,
            state,
            action: decision.action,
            value: decision.value,
            depth: decision.depth,
            opening: decision.opening,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn to_line(&self) -> Result<String, String> {
        serde_json::to_string(self)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| format!("Failed to serialize step {}: {}", self.step, e))
    }
}

/// Cheap to clone; all clones append to the same file
#[derive(Clone)]
pub struct DebugLogger {
    sink: Option<Arc<Mutex<File>>>,
}

impl DebugLogger {
    /// Opens (and truncates) `path` when `enabled`. A file that cannot be
    /// created disables logging instead of failing the server.
    pub async fn new(enabled: bool, path: &str) -> Self {
        if !enabled {
            return DebugLogger::disabled();
        }

        let opened = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await;

        match opened {
            Ok(file) => {
                log::info!("Decision log: {}", path);
                DebugLogger {
                    sink: Some(Arc::new(Mutex::new(file))),
                }
            }
            Err(e) => {
                error!("Cannot create decision log '{}': {}", path, e);
                DebugLogger::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        DebugLogger { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Queues one entry; must run inside a tokio runtime
    pub fn log_decision(
        &self,
        state: GameState,
        player: Player,
        remaining_time_ms: Option<u64>,
        decision: &Decision,
    ) {
        let sink = match &self.sink {
            Some(sink) => sink.clone(),
            None => return,
        };
        let entry = LogEntry::new(state, player, remaining_time_ms, decision);

        tokio::spawn(async move {
            if let Err(e) = append(&sink, &entry).await {
                error!("{}", e);
            }
        });
    }
}

async fn append(sink: &Mutex<File>, entry: &LogEntry) -> Result<(), String> {
    let line = entry.to_line()?;
    let mut file = sink.lock().await;
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| format!("Failed to write step {}: {}", entry.step, e))?;
    file.flush()
        .await
        .map_err(|e| format!("Failed to flush decision log: {}", e))
}
