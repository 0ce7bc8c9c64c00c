//! Process Executor Abstraction
//!
//! Runs one rendered command string to completion. The call is synchronous
//! from the calling worker's perspective: the worker awaits the outcome, the
//! rest of the engine keeps going.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// External command runner.
///
/// A successful return carries the command's captured output text. A
/// non-zero exit must map to
/// [`BridgeError::CommandFailed`](crate::error::BridgeError::CommandFailed)
/// with enough detail for the engine to record against the item; a failed
/// launch may surface as any other [`BridgeError`](crate::error::BridgeError)
/// variant.
///
/// Implementations impose their own timeout policy, if any; the engine does
/// not preempt a running command.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Execute `command` with `working_dir` as the current directory and
    /// return its combined output text.
    async fn run(&self, command: &str, working_dir: &Path) -> Result<String>;
}
