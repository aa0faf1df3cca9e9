//! Child process plumbing shared by the sandbox and engine adapters.
//!
//! Output pipes are drained on background tasks while the caller waits on the
//! child, so a chatty process can never dead-lock against a full pipe. A
//! caller's deadline must cover the drains as well as the wait: a background
//! grandchild can hold a pipe open long after the shell exits.

use std::io;
use std::process::ExitStatus;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::warn;

/// Background reader draining one output pipe of a child process.
pub(crate) struct Capture(JoinHandle<io::Result<Vec<u8>>>);

impl Capture {
    /// Starts draining `stream` into memory. A missing pipe yields empty output.
    pub(crate) fn spawn<R>(stream: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self(tokio::spawn(async move {
            let mut buffer = Vec::new();
            if let Some(mut reader) = stream {
                reader.read_to_end(&mut buffer).await?;
            }
            Ok(buffer)
        }))
    }

    /// Waits for the pipe to close and returns its content as lossy UTF-8.
    pub(crate) async fn collect(&mut self) -> io::Result<String> {
        let bytes = (&mut self.0).await.map_err(io::Error::other)??;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Stops draining the pipe. Used when the child has been killed.
    pub(crate) fn abandon(self) {
        self.0.abort();
    }
}

/// Exit status and captured output of a finished child.
pub(crate) struct Finished {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

/// Waits for `child` to exit and for both pipes to close.
pub(crate) async fn wait_for_output(
    child: &mut Child,
    stdout: &mut Capture,
    stderr: &mut Capture,
) -> io::Result<Finished> {
    let (status, out, err) = tokio::join!(child.wait(), stdout.collect(), stderr.collect());
    Ok(Finished {
        status: status?,
        stdout: out?,
        stderr: err?,
    })
}

/// Forcibly terminates `child` and waits for it so it is never left orphaned.
pub(crate) async fn kill_and_reap(child: &mut Child) {
    if let Err(err) = child.kill().await {
        warn!(%err, "failed to kill child process");
    }
}

/// Maps an exit status to an integer code, `-1` when terminated by a signal.
pub(crate) fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
