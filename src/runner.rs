//! Running the generated helper script.
//!
//! The script's stdout and stderr share one pipe.  Two tasks are spawned per
//! run and never talk to each other:
//!   - the drain task copies the pipe into a sink until EOF,
//!   - the cleanup task waits for the child and deletes the script file.
//! Output can still be draining after the script is deleted.

use std::fs::{File, Permissions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use log::{debug, info, warn};
use nix::fcntl::OFlag;
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::report::{Reporter, Severity};

const SCRIPT_MODE: u32 = 0o755;

/// Write `script` to `path` and mark it executable.  The file is closed
/// before this returns.
pub async fn write_script(path: &Path, script: &str) -> Result<()> {
    tokio::fs::write(path, script.as_bytes()).await?;
    tokio::fs::set_permissions(path, Permissions::from_mode(SCRIPT_MODE)).await?;
    debug!("script written to {}", path.display());
    Ok(())
}

/// Handles of the two tasks started by [`run_script`].  Dropping this
/// leaves them running; they are abandoned if the process exits first.
#[derive(Debug)]
pub struct ScriptRun {
    output:  JoinHandle<()>,
    cleanup: JoinHandle<()>,
}

impl ScriptRun {
    /// Wait until the output is drained and the script file is gone.
    pub async fn wait(self) -> Result<()> {
        self.output.await?;
        self.cleanup.await?;
        Ok(())
    }
}

/// Start the script at `path` with no arguments.
///
/// Must be called from within a tokio runtime.  Only a failure to start the
/// script is returned; everything after that goes to `reporter`.
pub fn run_script<W>(path: &Path, sink: W, reporter: Arc<dyn Reporter>) -> Result<ScriptRun>
where
    W: Write + Send + 'static,
{
    let (reader, writer) = nix::unistd::pipe2(OFlag::O_CLOEXEC)?;

    let mut cmd = Command::new(path);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(writer.try_clone()?))
        .stderr(Stdio::from(writer));
    let mut child = cmd.spawn()?;
    // The command still owns our copies of the write end; the drain only
    // sees EOF once they are closed.
    drop(cmd);

    info!("started {} (pid {:?})", path.display(), child.id());

    let drain_reporter = Arc::clone(&reporter);
    let output = tokio::task::spawn_blocking(move || {
        if let Err(e) = drain(File::from(reader), sink) {
            drain_reporter.report(Severity::Warning, &format!("error reading script output: {e}"));
        }
    });

    let script: PathBuf = path.to_path_buf();
    let cleanup = tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => info!("{} finished", script.display()),
            Ok(status) => warn!("{} exited with {status}", script.display()),
            Err(e) => reporter.report(
                Severity::Warning,
                &format!("interrupted waiting for script to complete: {e}"),
            ),
        }
        if let Err(e) = tokio::fs::remove_file(&script).await {
            reporter.report(
                Severity::Warning,
                &format!("unable to delete script file {}: {e}", script.display()),
            );
        }
    });

    Ok(ScriptRun { output, cleanup })
}

/// Copy everything readable from `src` into `sink` as it arrives.
fn drain<R: Read, W: Write>(mut src: R, mut sink: W) -> std::io::Result<()> {
    let mut buf = [0u8; 256];
    loop {
        let n = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        sink.write_all(&buf[..n])?;
        sink.flush()?;
    }
    Ok(())
}
