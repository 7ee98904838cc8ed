use url::Url;

use super::types::BuildId;

/// Converts a build id into a clickable link to its results page.
///
/// # Arguments
///
/// * `project_url` - Project URL (e.g., <https://dev.azure.com/org/project>)
/// * `build_id` - Build identifier
///
/// # Returns
///
/// Results page URL (e.g., <https://dev.azure.com/org/project/_build/results?buildId=42>)
pub fn build_results_url(project_url: &Url, build_id: BuildId) -> String {
    let mut url = project_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(["_build", "results"]);
    }
    url.query_pairs_mut()
        .append_pair("buildId", &build_id.to_string());
    url.into()
}
