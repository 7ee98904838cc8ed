use std::fmt::Display;

use console::{style, StyledObject};

/// A resource that is still being resolved or downloaded.
pub fn working(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).yellow().bright()
}

/// Something new landed on disk.
pub fn fetched(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).green().bright()
}

/// The recorded build was already current, nothing was downloaded.
pub fn skipped(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn failure(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).red().bright().bold()
}

/// Resource names and section titles.
pub fn heading(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

/// Paths, versions and other secondary details.
pub fn detail(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn banner(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}
