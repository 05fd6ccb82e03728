//! External tool invocation.
//!
//! Children are spawned with `kill_on_drop`, so a caller that wraps the
//! returned future in `tokio::time::timeout` also reaps the process on expiry.

use crate::error::ToolError;
use std::ffi::OsStr;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const STDERR_EXCERPT: usize = 512;

/// Run `program` with `args` and return its stdout on success.
pub async fn run_tool<I, S>(program: &str, args: I) -> Result<Vec<u8>, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(program, "spawning external tool");
    let output = command.output().await.map_err(|source| ToolError::Spawn {
        program: program.to_string(),
        source,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
        return Err(ToolError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: excerpt,
        });
    }

    Ok(output.stdout)
}
