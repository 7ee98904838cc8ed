mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::ResourceProgress;
pub use styling::failure;
use styling::{banner, detail};
pub use summary::{print_state, print_summary};

/// Prints the `ado-ad` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        banner("📦 ado-ad"),
        detail(env!("CARGO_PKG_VERSION")),
        detail("Azure DevOps artifacts downloader")
    );
}
