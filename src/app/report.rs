use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local};
use serde_json::Value;

use crate::login::AuthSession;
use crate::unmark::UnmarkReport;

pub(crate) fn session_summary(session: &AuthSession, path: &Path) -> String {
    let user = session.user_handle.as_deref().unwrap_or("<unknown user>");
    format!(
        "Logged in as {user} at {} ({} cookies, csrf {}).\nSession saved to {}",
        format_timestamp_display(&session.created_at),
        session.cookies.len(),
        mask_token(&session.csrf_token),
        path.display()
    )
}

pub(crate) fn unmark_summary(report: &UnmarkReport) -> String {
    let mut lines = vec![format!(
        "Tweet {}: cleared {} video flag(s), deleted {} file(s).",
        report.tweet_id,
        report.videos_cleared,
        report.files_deleted.len()
    )];
    for path in &report.files_missing {
        lines.push(format!("  already missing: {}", path.display()));
    }
    lines.join("\n")
}

pub(crate) fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn format_timestamp_display(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M %:z")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

/// Keeps just enough of a token to tell two sessions apart.
pub(crate) fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let head: String = token.chars().take(4).collect();
    format!("{head}...{}", "*".repeat(4))
}
