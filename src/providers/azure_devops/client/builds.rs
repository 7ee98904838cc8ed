use log::debug;

use super::core::AzureDevOpsClient;
use crate::error::Result;
use crate::providers::azure_devops::selection::BuildConstraint;
use crate::providers::azure_devops::types::{Build, DefinitionId, ListResponse};

impl AzureDevOpsClient {
    /// Lists completed builds of a definition, newest first, narrowed by `constraint`.
    pub async fn fetch_builds(
        &self,
        definition_id: DefinitionId,
        constraint: &BuildConstraint,
    ) -> Result<Vec<Build>> {
        let mut url = self.api_url(&["build", "builds"]);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("definitions", &definition_id.to_string())
                .append_pair("statusFilter", "completed")
                .append_pair("queryOrder", "finishTimeDescending");

            match constraint {
                BuildConstraint::Version(version) => {
                    query.append_pair("buildNumber", version);
                }
                BuildConstraint::Branch(branch) => {
                    query.append_pair("branchName", branch);
                }
                BuildConstraint::Latest => {}
            }
        }

        let (builds, _): (ListResponse<Build>, _) = self.get_json(url).await?;
        debug!(
            "Definition {definition_id} has {} completed builds for {constraint}",
            builds.value.len()
        );

        Ok(builds.value)
    }
}
