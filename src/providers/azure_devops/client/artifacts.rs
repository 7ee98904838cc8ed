use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::{debug, info};
use url::Url;

use super::core::{without_query, AzureDevOpsClient};
use crate::error::{AdoError, Result};
use crate::providers::azure_devops::types::{Artifact, ArtifactRecord, BuildId, ListResponse};

impl AzureDevOpsClient {
    /// Lists the artifacts a build published.
    pub async fn fetch_artifacts(&self, build_id: BuildId) -> Result<Vec<Artifact>> {
        let url = self.api_url(&["build", "builds", &build_id.to_string(), "artifacts"]);
        let (records, _): (ListResponse<ArtifactRecord>, _) = self.get_json(url).await?;

        Ok(records.value.into_iter().map(Artifact::from).collect())
    }

    /// Streams an artifact's zip into `destination`, truncating any existing file.
    ///
    /// Returns the number of bytes written.
    pub async fn download_artifact(&self, artifact: &Artifact, destination: &Path) -> Result<u64> {
        let url = Url::parse(&artifact.download_url).map_err(|e| AdoError::Api {
            url: artifact.download_url.clone(),
            status: 0,
            message: format!("invalid download URL for artifact {}: {e}", artifact.name),
        })?;

        info!("Downloading artifact {}", artifact.name);
        let mut response = self.get(url.clone()).await?;

        let mut file = File::create(destination)
            .map_err(AdoError::file("error creating output zip file", destination))?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .map_err(AdoError::file("error writing content to zip file", destination))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .map_err(AdoError::file("error writing content to zip file", destination))?;

        debug!(
            "Wrote {written} bytes from {} to {}",
            without_query(&url),
            destination.display()
        );

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::auth::{AdoContext, Token};

    fn client_for(server: &mockito::ServerGuard) -> AzureDevOpsClient {
        AzureDevOpsClient::new(
            &AdoContext {
                organization_url: format!("{}/org", server.url()),
                project: "proj".to_string(),
                token: Token::from("pat"),
            },
            "6.0",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_build_artifacts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/org/proj/_apis/build/builds/42/artifacts")
            .match_query(Matcher::UrlEncoded("api-version".into(), "6.0".into()))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"count": 2, "value": [
                    {"id": 1, "name": "drop", "resource": {"type": "Container", "downloadUrl": "https://x/drop"}},
                    {"id": 2, "name": "docs", "resource": {"type": "Container", "downloadUrl": "https://x/docs"}}
                ]}"#,
            )
            .create_async()
            .await;

        let artifacts = client_for(&server).fetch_artifacts(42).await.unwrap();

        mock.assert_async().await;
        let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["drop", "docs"]);
    }

    #[tokio::test]
    async fn downloads_with_basic_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/download/drop")
            .match_query(Matcher::UrlEncoded("format".into(), "zip".into()))
            .match_header("authorization", "Basic OnBhdA==")
            .with_body("zip-bytes")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("drop.zip");
        let artifact = Artifact {
            name: "drop".into(),
            download_url: format!("{}/download/drop?format=zip", server.url()),
        };

        let written = client_for(&server)
            .download_artifact(&artifact, &destination)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(written, 9);
        assert_eq!(std::fs::read(&destination).unwrap(), b"zip-bytes");
    }

    #[tokio::test]
    async fn redirect_keeps_encoded_path_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let target = "/blob/builds%2F42/drop%20%2B%20extras.zip";
        let redirect = server
            .mock("GET", "/download/drop")
            .with_status(302)
            .with_header("location", &format!("{}{}", server.url(), target))
            .create_async()
            .await;
        let blob = server
            .mock("GET", target)
            .with_body("payload")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("drop.zip");
        let artifact = Artifact {
            name: "drop".into(),
            download_url: format!("{}/download/drop", server.url()),
        };

        client_for(&server)
            .download_artifact(&artifact, &destination)
            .await
            .unwrap();

        redirect.assert_async().await;
        blob.assert_async().await;
        assert_eq!(std::fs::read(&destination).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn redirect_encodes_characters_invalid_in_a_path_once() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/download/drop")
            .with_status(302)
            .with_header("location", &format!("{}/blob/a{{b}}.zip", server.url()))
            .create_async()
            .await;
        let encoded = server
            .mock("GET", "/blob/a%7Bb%7D.zip")
            .with_body("encoded")
            .expect(1)
            .create_async()
            .await;
        let raw = server
            .mock("GET", "/blob/a{b}.zip")
            .with_body("raw")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("drop.zip");
        let artifact = Artifact {
            name: "drop".into(),
            download_url: format!("{}/download/drop", server.url()),
        };

        client_for(&server)
            .download_artifact(&artifact, &destination)
            .await
            .unwrap();

        encoded.assert_async().await;
        raw.assert_async().await;
        assert_eq!(std::fs::read(&destination).unwrap(), b"encoded");
    }

    #[tokio::test]
    async fn failed_download_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/download/drop")
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact {
            name: "drop".into(),
            download_url: format!("{}/download/drop", server.url()),
        };

        let result = client_for(&server)
            .download_artifact(&artifact, &dir.path().join("drop.zip"))
            .await;

        assert!(matches!(result, Err(AdoError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn unwritable_destination_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/download/drop")
            .with_body("payload")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact {
            name: "drop".into(),
            download_url: format!("{}/download/drop", server.url()),
        };

        let result = client_for(&server)
            .download_artifact(&artifact, &dir.path().join("missing").join("drop.zip"))
            .await;

        assert!(matches!(result, Err(AdoError::File { .. })));
    }
}
