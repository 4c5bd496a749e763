//! Command implementations

pub mod deploys;

pub mod doctor;

pub mod info;

pub mod status;

use deploystat_core::DeployStatus;
use owo_colors::{OwoColorize, Stream};

/// Colorize a deployment status for terminal output.
///
/// Shared by `info`, `status`, and `deploys`.
pub fn paint_status(status: DeployStatus) -> String {
    match status {
        DeployStatus::Success => status
            .if_supports_color(Stream::Stdout, |s| s.green().bold().to_string())
            .to_string(),
        DeployStatus::Failed => status
            .if_supports_color(Stream::Stdout, |s| s.red().bold().to_string())
            .to_string(),
        DeployStatus::Unknown => status
            .if_supports_color(Stream::Stdout, |s| s.yellow().to_string())
            .to_string(),
    }
}

/// Section heading, bold and underlined when stdout supports color.
pub fn heading(title: &str) -> String {
    title
        .if_supports_color(Stream::Stdout, |s| s.bold().underline().to_string())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_keeps_the_status_text() {
        owo_colors::set_override(false);
        assert_eq!(paint_status(DeployStatus::Success), "success");
        assert_eq!(paint_status(DeployStatus::Failed), "failed");
        assert_eq!(paint_status(DeployStatus::Unknown), "unknown");
    }

    #[test]
    fn heading_is_plain_without_color() {
        owo_colors::set_override(false);
        assert_eq!(heading("Recent deployments"), "Recent deployments");
    }
}
