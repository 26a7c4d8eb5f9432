use std::sync::Arc;

use tracing::debug;
use transplant_shell::{RootShell, quote_path};

use super::CopyJob;
use crate::error::InstallError;
use crate::messages;

/// Runs `mkdir`, `rm` and `cp` through the elevated shell.
pub(crate) struct RootShellHandler {
    shell: Arc<RootShell>,
}

impl RootShellHandler {
    pub fn new(shell: Arc<RootShell>) -> Self {
        Self { shell }
    }

    async fn run(&self, step: &'static str, command: String) -> Result<(), InstallError> {
        let out = self.shell.exec(&command).await?;
        if !out.success() {
            debug!(step, exit_code = out.exit_code, stderr = %out.stderr.trim(), "root command failed");
            return Err(InstallError::ShellFailure {
                step,
                exit_code: out.exit_code,
            });
        }
        Ok(())
    }

    pub async fn install(&self, job: &CopyJob<'_>) -> Result<(), InstallError> {
        job.announce(messages::REQUESTING_ROOT);
        self.shell.ensure_session().await?;

        job.announce(messages::PREPARING);
        self.run("mkdir", format!("mkdir -p {}", quote_path(&job.target_dir)))
            .await?;

        job.announce(messages::COPYING);
        let dest = quote_path(&job.destination());
        job.announce(messages::REMOVING_EXISTING);
        self.run("rm", format!("rm -f {dest}")).await?;

        self.run("cp", format!("cp {} {dest}", quote_path(job.source)))
            .await?;
        job.announce(messages::COPY_SUCCESSFUL);
        Ok(())
    }
}
