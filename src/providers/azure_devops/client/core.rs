use log::debug;
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::{AdoContext, Token};
use crate::error::{AdoError, Result};

const USER_AGENT: &str = concat!("ado-ad/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;
const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

/// Azure DevOps REST client scoped to one project.
pub struct AzureDevOpsClient {
    client: Client,
    project_url: Url,
    token: Token,
    api_version: String,
}

impl AzureDevOpsClient {
    pub fn new(context: &AdoContext, api_version: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect_policy())
            .build()
            .map_err(|e| AdoError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut project_url = Url::parse(&context.organization_url).map_err(|e| {
            AdoError::Config(format!(
                "Invalid organization URL {}: {e}",
                context.organization_url
            ))
        })?;
        project_url
            .path_segments_mut()
            .map_err(|()| {
                AdoError::Config(format!(
                    "Invalid organization URL {}",
                    context.organization_url
                ))
            })?
            .pop_if_empty()
            .push(&context.project);

        Ok(Self {
            client,
            project_url,
            token: context.token.clone(),
            api_version: api_version.to_string(),
        })
    }

    pub fn project_url(&self) -> &Url {
        &self.project_url
    }

    /// Builds `{project}/_apis/{segments..}?api-version=..`
    pub(super) fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.project_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.push("_apis").extend(segments);
        }
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        url
    }

    /// Basic auth with an empty user name and the token as password.
    pub(super) fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth("", Some(self.token.as_str()))
    }

    /// Sends an authenticated GET and fails on any non-success status.
    pub(super) async fn get(&self, url: Url) -> Result<Response> {
        debug!("GET {}", without_query(&url));

        let response = self
            .auth_request(self.client.get(url.clone()))
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NON_AUTHORITATIVE_INFORMATION
        {
            return Err(AdoError::Unauthorized {
                url: without_query(&url),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(AdoError::Api {
                url: without_query(&url),
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// GETs a JSON document, returning it with the continuation token, if any.
    pub(super) async fn get_json<T>(&self, url: Url) -> Result<(T, Option<String>)>
    where
        T: DeserializeOwned,
    {
        let response = self.get(url).await?;

        let continuation = response
            .headers()
            .get(CONTINUATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        let body = response.bytes().await?;
        Ok((serde_json::from_slice(&body)?, continuation))
    }
}

/// Follows up to `MAX_REDIRECTS` hops to the `Location` target.
///
/// The target goes through `Url` parsing: existing `%XX` escapes are sent
/// unchanged (never decoded or double-encoded), while characters that are not
/// valid in a URL path, such as `{` or a space, are percent-encoded once.
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error(format!("too many redirects (limit {MAX_REDIRECTS})"))
        } else {
            debug!("Following redirect to {}", attempt.url().path());
            attempt.follow()
        }
    })
}

/// Drops the query so signatures in download URLs never reach logs or errors.
pub(super) fn without_query(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.into()
}
