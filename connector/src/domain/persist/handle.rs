//! Write handles and the join barrier

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use super::level::MissingDimension;

/// Outcome of one dispatched write, surfaced at the barrier
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WriteError {
    #[error("Write to {table} timed out after {timeout:?}")]
    Timeout { table: String, timeout: Duration },

    #[error("Write to {table} failed: {message}")]
    Store { table: String, message: String },

    #[error("Row rejected for {table}: {source}")]
    MissingDimension {
        table: String,
        #[source]
        source: MissingDimension,
    },

    #[error("Row for {table} could not be encoded: {message}")]
    Encode { table: String, message: String },

    #[error("Write task for {table} did not complete: {message}")]
    Aborted { table: String, message: String },
}

enum WriteState {
    Pending(JoinHandle<Result<(), WriteError>>),
    Acknowledged,
    Failed(WriteError),
}

/// Handle to one asynchronous write
pub struct PersistHandle {
    table: String,
    client_id: String,
    session_id: Option<String>,
    state: WriteState,
}

impl PersistHandle {
    pub(super) fn pending(
        table: String,
        client_id: String,
        session_id: Option<String>,
        task: JoinHandle<Result<(), WriteError>>,
    ) -> Self {
        Self {
            table,
            client_id,
            session_id,
            state: WriteState::Pending(task),
        }
    }

    /// Handle for a row that failed before dispatch
    pub(super) fn rejected(
        table: String,
        client_id: String,
        session_id: Option<String>,
        error: WriteError,
    ) -> Self {
        Self {
            table,
            client_id,
            session_id,
            state: WriteState::Failed(error),
        }
    }

    #[cfg(test)]
    pub(crate) fn client_id(&self) -> &str {
        &self.client_id
    }

    #[cfg(test)]
    pub(crate) fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        matches!(self.state, WriteState::Pending(_))
    }

    #[cfg(test)]
    pub(crate) fn is_acknowledged(&self) -> bool {
        matches!(self.state, WriteState::Acknowledged)
    }

    /// Wait for the write to settle. Safe to call more than once.
    pub async fn wait(&mut self) -> Result<(), WriteError> {
        let outcome = match &mut self.state {
            WriteState::Pending(task) => match task.await {
                Ok(result) => result,
                Err(e) => Err(WriteError::Aborted {
                    table: self.table.clone(),
                    message: e.to_string(),
                }),
            },
            WriteState::Acknowledged => return Ok(()),
            WriteState::Failed(e) => return Err(e.clone()),
        };

        self.state = match &outcome {
            Ok(()) => WriteState::Acknowledged,
            Err(e) => WriteState::Failed(e.clone()),
        };
        outcome
    }
}

impl std::fmt::Debug for PersistHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            WriteState::Pending(_) => "pending",
            WriteState::Acknowledged => "acknowledged",
            WriteState::Failed(_) => "failed",
        };
        f.debug_struct("PersistHandle")
            .field("table", &self.table)
            .field("client_id", &self.client_id)
            .field("session_id", &self.session_id)
            .field("state", &state)
            .finish()
    }
}

/// Join barrier: wait for every handle, collecting all failures.
///
/// Does not stop at the first failure.
pub async fn join_all(handles: &mut [PersistHandle]) -> Vec<WriteError> {
    let outcomes = futures::future::join_all(handles.iter_mut().map(|h| h.wait())).await;

    let mut errors = Vec::new();
    for (handle, outcome) in handles.iter().zip(outcomes) {
        if let Err(e) = outcome {
            tracing::debug!(
                table = %handle.table,
                client_id = %handle.client_id,
                session_id = ?handle.session_id,
                error = %e,
                "Write failed"
            );
            errors.push(e);
        }
    }
    errors
}
