use log::{debug, warn};

use super::core::AzureDevOpsClient;
use crate::error::Result;
use crate::providers::azure_devops::types::{BuildDefinitionRef, ListResponse};

impl AzureDevOpsClient {
    /// Lists every build definition in the project, following continuation tokens.
    pub async fn fetch_definitions(&self) -> Result<Vec<BuildDefinitionRef>> {
        let mut all_definitions = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut url = self.api_url(&["build", "definitions"]);
            if let Some(token) = &continuation {
                url.query_pairs_mut().append_pair("continuationToken", token);
            }

            let (page, next): (ListResponse<BuildDefinitionRef>, _) = self.get_json(url).await?;
            debug!("Fetched page of {} build definitions", page.value.len());
            all_definitions.extend(page.value);

            match next {
                Some(token) if continuation.as_deref() == Some(token.as_str()) => {
                    warn!("Service repeated continuation token, stopping pagination");
                    break;
                }
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(all_definitions)
    }
}
