use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use transplant_helper::HelperConnection;

use super::CopyJob;
use crate::error::InstallError;
use crate::messages;

/// Delegates every filesystem operation to the privileged helper.
pub(crate) struct HelperHandler {
    connection: Arc<HelperConnection>,
    timeout: Duration,
}

impl HelperHandler {
    pub fn new(connection: Arc<HelperConnection>, timeout: Duration) -> Self {
        Self {
            connection,
            timeout,
        }
    }

    pub async fn install(&self, job: &CopyJob<'_>) -> Result<(), InstallError> {
        job.announce(messages::CONNECTING_HELPER);
        let helper = self.connection.service(self.timeout).await?;

        job.announce(messages::PREPARING);
        helper.mkdirs(&job.target_dir).await?;

        job.announce(messages::COPYING);
        let dest = job.destination();
        job.announce(messages::REMOVING_EXISTING);
        let removed = helper.delete(&dest).await?;
        debug!(removed, dest = %dest.display(), "helper cleared destination");

        helper.copy_file(job.source, &dest).await?;
        job.announce(messages::COPY_SUCCESSFUL);
        Ok(())
    }
}
