mod artifacts;
mod builds;
mod core;
mod definitions;

pub use self::core::AzureDevOpsClient;
