mod catalog;
mod client;
mod links;
mod provider;
mod selection;
mod types;

pub use provider::{AzureDevOpsProvider, ResourceOutcome, ResourceStatus};
pub use types::BuildId;

/// REST API version used when the config file does not name one.
pub const DEFAULT_API_VERSION: &str = "6.0";
