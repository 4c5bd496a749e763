//! Box-drawn text report for an [`InfoRecord`].

use std::fmt::Write as _;

use unicode_width::UnicodeWidthStr;

use crate::commit::CommitRecord;
use crate::info::InfoRecord;
use crate::repo::UNKNOWN;

/// Widest a value may get before it is cut with an ellipsis.
const MAX_VALUE_WIDTH: usize = 60;

/// Timestamp format used in the report.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

enum Row {
    Section(&'static str),
    Field(&'static str, String),
}

/// Render `record` as a multi-line box-drawn report.
///
/// Unavailable values print as `unknown`; a missing tag prints as `none`.
pub fn render_report(record: &InfoRecord) -> String {
    let rows = report_rows(record);

    let label_width = rows
        .iter()
        .filter_map(|row| match row {
            Row::Field(label, _) => Some(label.width()),
            Row::Section(_) => None,
        })
        .max()
        .unwrap_or(0);

    let inner = rows
        .iter()
        .map(|row| match row {
            Row::Section(title) => title.width(),
            Row::Field(_, value) => label_width + 2 + value.width(),
        })
        .max()
        .unwrap_or(0);

    let rule = "─".repeat(inner + 2);
    let mut out = String::new();
    let _ = writeln!(out, "┌{rule}┐");
    for (i, row) in rows.iter().enumerate() {
        match row {
            Row::Section(title) => {
                if i > 0 {
                    let _ = writeln!(out, "├{rule}┤");
                }
                let _ = writeln!(out, "│ {} │", pad(title, inner));
            }
            Row::Field(label, value) => {
                let line = format!("{}  {value}", pad(label, label_width));
                let _ = writeln!(out, "│ {} │", pad(&line, inner));
            }
        }
    }
    let _ = write!(out, "└{rule}┘");
    out
}

fn report_rows(record: &InfoRecord) -> Vec<Row> {
    let deploys = &record.deployments;
    let history = if deploys.available {
        "available"
    } else {
        "unavailable"
    };

    vec![
        Row::Section("Build"),
        Row::Field("Version", record.version().to_string()),
        Row::Field("Build", record.build_label().to_string()),
        Row::Field("Loaded", record.loaded_at().format(TIME_FORMAT).to_string()),
        Row::Section("Repository"),
        Row::Field("Branch", record.branch().to_string()),
        Row::Field("Commit", record.commit_hash().to_string()),
        Row::Field("Author", author_line(record.head())),
        Row::Field("Committer", record.committer().to_string()),
        Row::Field("Message", subject_line(record.head())),
        Row::Field("Committed", time_line(record.head())),
        Row::Field("Commits", record.total_commits().to_string()),
        Row::Field("Tag", record.latest_tag().unwrap_or("none").to_string()),
        Row::Section("Deployments"),
        Row::Field("Status", record.deploy_status().to_string()),
        Row::Field("Count", record.deploy_count().to_string()),
        Row::Field("Last deploy", deploy_line(record.last_deploy())),
        Row::Field("History", history.to_string()),
    ]
}

fn author_line(commit: Option<&CommitRecord>) -> String {
    commit.map_or_else(
        || UNKNOWN.to_string(),
        |c| truncate(&format!("{} <{}>", c.author_name, c.author_email)),
    )
}

fn subject_line(commit: Option<&CommitRecord>) -> String {
    commit.map_or_else(|| UNKNOWN.to_string(), |c| truncate(c.subject()))
}

fn time_line(commit: Option<&CommitRecord>) -> String {
    commit.map_or_else(
        || UNKNOWN.to_string(),
        |c| c.timestamp.format(TIME_FORMAT).to_string(),
    )
}

fn deploy_line(commit: Option<&CommitRecord>) -> String {
    commit.map_or_else(
        || "none".to_string(),
        |c| truncate(&format!("{} {}", c.short_hash, c.subject())),
    )
}

/// Right-pad to `width` display columns.
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(fill))
}

/// Cut to [`MAX_VALUE_WIDTH`] display columns, ending in `…` when cut.
fn truncate(s: &str) -> String {
    if s.width() <= MAX_VALUE_WIDTH {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > MAX_VALUE_WIDTH - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::DeployInfo;
    use crate::info::tests::{FakeRepo, snapshot};
    use crate::pattern::ClassificationPattern;

    fn render(repo: FakeRepo) -> String {
        render_report(&DeployInfo::new(snapshot(), repo, ClassificationPattern::default()).query())
    }

    #[test]
    fn every_line_has_the_same_width() {
        let report = render(FakeRepo::with_messages(&["deploy success: v1", "fix bug"]));
        let widths: Vec<usize> = report.lines().map(UnicodeWidthStr::width).collect();
        assert!(widths.len() > 5);
        assert!(widths.iter().all(|w| *w == widths[0]), "{report}");
        assert!(report.starts_with('┌'));
        assert!(report.ends_with('┘'));
    }

    #[test]
    fn report_shows_values() {
        let report = render(FakeRepo::with_messages(&["deploy success: v1", "fix bug"]));
        assert!(report.contains("2.0.0"));
        assert!(report.contains("main"));
        assert!(report.contains("Ada Lovelace <ada@example.com>"));
        assert!(report.contains("success"));
        assert!(report.contains("v1.2.0"));
        assert!(report.contains("0000000 deploy success: v1"));
    }

    #[test]
    fn unavailable_values_print_unknown() {
        let report = render(FakeRepo::default());
        let line = |label: &str| {
            report
                .lines()
                .find(|l| l.starts_with(&format!("│ {label} ")))
                .unwrap_or_default()
                .to_string()
        };
        assert!(line("Branch").contains("unknown"));
        assert!(line("Commit").contains("unknown"));
        assert!(line("Tag").contains("none"));
        assert!(line("Status").contains("unknown"));
        assert!(line("History").contains("unavailable"));
    }

    #[test]
    fn wide_characters_keep_the_box_aligned() {
        let report = render(FakeRepo::with_messages(&["デプロイ deploy success 🚀"]));
        let widths: Vec<usize> = report.lines().map(UnicodeWidthStr::width).collect();
        assert!(widths.iter().all(|w| *w == widths[0]), "{report}");
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(200);
        let cut = truncate(&long);
        assert_eq!(cut.width(), MAX_VALUE_WIDTH);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate("short"), "short");
    }
}
