use tracing::info;

use crate::error::Result;
use crate::extract::extract_body;
use crate::prompts::PromptEngine;
use crate::record::TestCaseRecord;
use crate::transport::Transport;

/// One request/response cycle: prompt → transport → extraction.
pub struct Generator<T: Transport> {
    transport: T,
    prompts: PromptEngine,
}

impl<T: Transport> Generator<T> {
    pub fn new(transport: T, prompts: PromptEngine) -> Self {
        Self { transport, prompts }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Generate a fresh batch for `requirement`.
    ///
    /// Transport and network failures propagate. Anything wrong with the
    /// response content is absorbed into the batch as an error record, so a
    /// successful return is never empty unless the model itself returned no
    /// cases.
    pub async fn generate(
        &self,
        requirement: &str,
        categories: &[String],
    ) -> Result<Vec<TestCaseRecord>> {
        let prompt = self.prompts.build(requirement, categories)?;
        let body = self.transport.send(&prompt).await?;
        let records = extract_body(&body);
        info!(count = records.len(), "generation finished");
        Ok(records)
    }
}
