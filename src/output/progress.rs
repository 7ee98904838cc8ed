use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{fetched, heading, skipped, working};
use crate::providers::BuildId;

/// Spinner tracking one pipeline resource through resolve, select and download.
pub struct ResourceProgress {
    pb: ProgressBar,
    resource: String,
}

impl ResourceProgress {
    pub fn start(resource: &str) -> Self {
        let pb = create_spinner(
            working(format!("{resource}: resolving definition")).to_string(),
        );
        Self {
            pb,
            resource: resource.to_string(),
        }
    }

    pub fn selecting(&self) {
        self.pb.set_message(
            working(format!("{}: selecting build", self.resource)).to_string(),
        );
    }

    pub fn downloading(&self, build_id: BuildId, artifact_count: usize) {
        self.pb.set_message(
            working(format!(
                "{}: downloading {artifact_count} artifacts of build {build_id}",
                self.resource
            ))
            .to_string(),
        );
    }

    pub fn finish_downloaded(self, build_id: BuildId) {
        self.pb.finish_with_message(
            fetched(format!("{}: downloaded build {build_id} ✓", self.resource))
                .to_string(),
        );
    }

    pub fn finish_up_to_date(self, build_id: BuildId) {
        self.pb.finish_with_message(format!(
            "{} {}",
            heading(format!("{}:", self.resource)),
            skipped(format!("build {build_id} already downloaded"))
        ));
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
