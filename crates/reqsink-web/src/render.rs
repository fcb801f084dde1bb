//! HTML pages for the dashboard, permalink, and login views
//!
//! maud functions fed by presentation data from the query service. The
//! masking policy for `hide_urls` lives here: the pipeline only supplies
//! the flag and the raw values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use maud::{html, DOCTYPE, Markup, PreEscaped};
use reqsink_db::entities::capture;
use uuid::Uuid;

use crate::query::DashboardEntry;

/// Inline CSS for all pages. Flat design, no external assets.
pub const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#fafafa;--fg:#111;--fg2:#555;--fg3:#999;--accent:#0a6e4f;--surface:#fff;--border:rgba(10,110,79,.18);--mono:"SF Mono",SFMono-Regular,ui-monospace,Menlo,monospace}
body{font-family:Inter,-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.6;color:var(--fg);background:var(--bg);min-height:100vh;display:flex;flex-direction:column;align-items:center;padding:1.5rem 1rem}
main{max-width:860px;width:100%;flex:1}
a{color:var(--accent);text-decoration:none}
a:hover{text-decoration:underline}
h1{font-size:1.4rem;letter-spacing:-.01em;margin-bottom:1rem}
table{border-collapse:collapse;width:100%;font-size:.9rem;background:var(--surface);border:1px solid var(--border);border-radius:8px}
th,td{border-bottom:1px solid var(--border);padding:.45rem .75rem;text-align:left;vertical-align:top}
th{background:var(--bg);font-weight:600;font-size:.8rem;text-transform:uppercase;letter-spacing:.03em;color:var(--fg2)}
code,.mono{font-family:var(--mono);font-size:.85em}
.method{display:inline-block;font-family:var(--mono);font-size:.78rem;font-weight:600;padding:.1rem .45rem;border-radius:4px;background:var(--bg);border:1px solid var(--border)}
.muted{color:var(--fg3)}
.empty{color:var(--fg3);padding:2rem 0;text-align:center}
.detail{background:var(--surface);border:1px solid var(--border);border-radius:8px;padding:1.25rem;margin-bottom:1rem}
.detail dt{font-weight:600;font-size:.8rem;text-transform:uppercase;letter-spacing:.03em;color:var(--fg2);margin-top:.75rem}
.detail dd{margin:0;word-break:break-all}
pre{background:var(--bg);border:1px solid var(--border);border-radius:6px;padding:.75rem 1rem;overflow-x:auto;margin:.25rem 0;font-size:.85rem;line-height:1.5;white-space:pre-wrap;word-break:break-word}
form.login{background:var(--surface);border:1px solid var(--border);border-radius:8px;padding:1.5rem;max-width:360px;margin:2rem auto}
form.login label{display:block;font-size:.85rem;font-weight:600;margin-top:.75rem}
form.login input{width:100%;padding:.45rem .6rem;border:1px solid var(--border);border-radius:6px;font-size:.95rem;margin-top:.25rem}
form.login button{margin-top:1.25rem;width:100%;padding:.55rem;border:none;border-radius:6px;background:var(--accent);color:#fff;font-weight:600;cursor:pointer}
.alert{background:#fdecea;border:1px solid #f5c6c2;color:#8a1f11;border-radius:6px;padding:.6rem .9rem;margin-bottom:1rem;font-size:.9rem}
.footer{margin-top:2rem;font-size:.8rem;color:var(--fg3)}
"#;

/// Everything the permalink page needs about one capture.
#[derive(Debug, Clone)]
pub struct CaptureDetail {
    pub public_id: Uuid,
    pub method: String,
    pub url_path: String,
    pub query_params: String,
    pub domain: String,
    /// Headers decoded back from the stored JSON blob
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub made_at: DateTime<Utc>,
}

impl From<capture::Model> for CaptureDetail {
    fn from(model: capture::Model) -> Self {
        // Stored as a JSON object; a blob that fails to decode renders as
        // an empty map rather than failing the page
        let headers: BTreeMap<String, String> =
            serde_json::from_str(&model.headers).unwrap_or_default();

        Self {
            public_id: model.public_id,
            method: model.method,
            url_path: model.url_path,
            query_params: model.query_params,
            domain: model.domain,
            headers,
            body: model.body,
            made_at: model.made_at,
        }
    }
}

/// Format a timestamp as "Mon DD, YYYY HH:MM UTC" plus its ISO form for
/// the `datetime` attribute.
pub fn format_made_at(made_at: DateTime<Utc>) -> (String, String) {
    let display = made_at.format("%b %d, %Y %H:%M UTC").to_string();
    let iso = made_at.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    (display, iso)
}

/// Humanized relative time, e.g. "4 minutes ago".
pub fn time_ago(made_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - made_at).num_seconds();

    if seconds < 10 {
        return "just now".to_string();
    }
    if seconds < 60 {
        return format!("{} seconds ago", seconds);
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }

    let days = hours / 24;
    if days < 30 {
        return plural(days, "day");
    }

    // Month buckets run all the way to a full year; days 360..364 would
    // otherwise floor to zero years
    if days < 365 {
        return plural(days / 30, "month");
    }

    plural(days / 365, "year")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                main {
                    (body)
                }
                footer class="footer" {
                    "reqsink — every request to this host is recorded."
                }
            }
        }
    }
}

/// The dashboard: up to 25 most recent captures, newest first.
pub fn dashboard_page(entries: &[DashboardEntry], hide_urls: bool, now: DateTime<Utc>) -> Markup {
    page(
        "Incoming requests",
        html! {
            h1 { "Incoming requests" }
            @if entries.is_empty() {
                p class="empty" { "Nothing captured yet. Send any request to this host." }
            } @else {
                table {
                    thead {
                        tr {
                            th { "Method" }
                            th { "URL" }
                            th { "Domain" }
                            th { "When" }
                            th { "" }
                        }
                    }
                    tbody {
                        @for entry in entries {
                            tr {
                                td { span class="method" { (entry.method) } }
                                td class="mono" {
                                    @if hide_urls {
                                        span class="muted" { "(hidden)" }
                                    } @else {
                                        (entry.url_path)
                                        @if let Some(query) = &entry.query_params {
                                            @if !query.is_empty() {
                                                span class="muted" { "?" (query) }
                                            }
                                        }
                                    }
                                }
                                td class="mono" { (entry.domain) }
                                td {
                                    @let (display, iso) = format_made_at(entry.made_at);
                                    time datetime=(iso) title=(display) {
                                        (time_ago(entry.made_at, now))
                                    }
                                }
                                td {
                                    a href=(format!("/b/requests/{}", entry.public_id)) { "view" }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

/// Permalink page for a single capture.
pub fn capture_page(detail: &CaptureDetail, now: DateTime<Utc>) -> Markup {
    let (display, iso) = format_made_at(detail.made_at);

    page(
        &format!("Request {}", detail.public_id),
        html! {
            h1 { "Request " code { (detail.public_id) } }
            div class="detail" {
                dl {
                    dt { "Made" }
                    dd {
                        time datetime=(iso) { (display) }
                        " "
                        span class="muted" { "(" (time_ago(detail.made_at, now)) ")" }
                    }
                    dt { "Method" }
                    dd { span class="method" { (detail.method) } }
                    dt { "URL" }
                    dd class="mono" {
                        (detail.url_path)
                        @if !detail.query_params.is_empty() {
                            "?" (detail.query_params)
                        }
                    }
                    dt { "Domain" }
                    dd class="mono" {
                        @if detail.domain.is_empty() {
                            span class="muted" { "(none)" }
                        } @else {
                            (detail.domain)
                        }
                    }
                    dt { "Headers" }
                    dd {
                        @if detail.headers.is_empty() {
                            span class="muted" { "(none)" }
                        } @else {
                            table {
                                tbody {
                                    @for (name, value) in &detail.headers {
                                        tr {
                                            td class="mono" { (name) }
                                            td class="mono" { (value) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    dt { "Body" }
                    dd {
                        @if detail.body.is_empty() {
                            span class="muted" { "(empty)" }
                        } @else {
                            pre { (detail.body) }
                        }
                    }
                }
            }
            p { a href="/" { "← back to the dashboard" } }
        },
    )
}

/// Login form, with an optional error banner and a post-login destination.
pub fn login_page(error: Option<&str>, next: &str) -> Markup {
    page(
        "Sign in",
        html! {
            form class="login" method="post" action="/b/login" {
                h1 { "Sign in" }
                @if let Some(message) = error {
                    div class="alert" { (message) }
                }
                input type="hidden" name="next" value=(next);
                label for="username" { "Username" }
                input type="text" id="username" name="username" autocomplete="username" required;
                label for="password" { "Password" }
                input type="password" id="password" name="password" autocomplete="current-password" required;
                button type="submit" { "Sign in" }
            }
        },
    )
}

/// Change-password form for a logged-in operator.
pub fn password_page(error: Option<&str>) -> Markup {
    page(
        "Change password",
        html! {
            form class="login" method="post" action="/b/password" {
                h1 { "Change password" }
                @if let Some(message) = error {
                    div class="alert" { (message) }
                }
                label for="current_password" { "Current password" }
                input type="password" id="current_password" name="current_password" autocomplete="current-password" required;
                label for="new_password" { "New password" }
                input type="password" id="new_password" name="new_password" autocomplete="new-password" required;
                label for="new_password_again" { "New password (again)" }
                input type="password" id="new_password_again" name="new_password_again" autocomplete="new-password" required;
                button type="submit" { "Update password" }
            }
        },
    )
}

pub fn not_found_page() -> Markup {
    page(
        "Not found",
        html! {
            h1 { "404 — not found" }
            p { "No capture with that identifier." }
            p { a href="/" { "← back to the dashboard" } }
        },
    )
}

pub fn error_page() -> Markup {
    page(
        "Server error",
        html! {
            h1 { "500 — something went wrong" }
            p { "The request could not be recorded or displayed. It has not been retried." }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn time_ago_buckets() {
        let now = at(1_700_000_000);
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(at(1_700_000_000 - 45), now), "45 seconds ago");
        assert_eq!(time_ago(at(1_700_000_000 - 60), now), "1 minute ago");
        assert_eq!(time_ago(at(1_700_000_000 - 300), now), "5 minutes ago");
        assert_eq!(time_ago(at(1_700_000_000 - 7200), now), "2 hours ago");
        assert_eq!(time_ago(at(1_700_000_000 - 86_400 * 3), now), "3 days ago");
        assert_eq!(time_ago(at(1_700_000_000 - 86_400 * 40), now), "1 month ago");
        assert_eq!(time_ago(at(1_700_000_000 - 86_400 * 800), now), "2 years ago");
    }

    #[test]
    fn time_ago_just_under_a_year_stays_in_months() {
        let now = at(1_700_000_000);
        assert_eq!(time_ago(at(1_700_000_000 - 86_400 * 362), now), "12 months ago");
        assert_eq!(time_ago(at(1_700_000_000 - 86_400 * 365), now), "1 year ago");
        assert_eq!(time_ago(at(1_700_000_000 - 86_400 * 366), now), "1 year ago");
    }

    #[test]
    fn format_made_at_display_and_iso() {
        let ts = at(1_704_067_200); // 2024-01-01 00:00:00 UTC
        let (display, iso) = format_made_at(ts);
        assert_eq!(display, "Jan 01, 2024 00:00 UTC");
        assert_eq!(iso, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn dashboard_escapes_captured_values() {
        let entries = vec![DashboardEntry {
            public_id: Uuid::new_v4(),
            method: "GET".to_string(),
            url_path: "/<script>alert(1)</script>".to_string(),
            query_params: Some(String::new()),
            domain: "example.com".to_string(),
            made_at: at(1_700_000_000),
        }];

        let markup = dashboard_page(&entries, false, at(1_700_000_060)).into_string();
        assert!(!markup.contains("<script>alert(1)</script>"));
        assert!(markup.contains("&lt;script&gt;"));
    }

    #[test]
    fn dashboard_masks_urls_when_hidden() {
        let entries = vec![DashboardEntry {
            public_id: Uuid::new_v4(),
            method: "GET".to_string(),
            url_path: "/secret/path".to_string(),
            query_params: Some("token=abc".to_string()),
            domain: "example.com".to_string(),
            made_at: at(1_700_000_000),
        }];

        let markup = dashboard_page(&entries, true, at(1_700_000_060)).into_string();
        assert!(!markup.contains("/secret/path"));
        assert!(!markup.contains("token=abc"));
        assert!(markup.contains("(hidden)"));
    }

    #[test]
    fn capture_page_decodes_header_blob() {
        let model = capture::Model {
            id: 1,
            public_id: Uuid::new_v4(),
            method: "POST".to_string(),
            url_path: "/webhook".to_string(),
            query_params: "a=1".to_string(),
            domain: "example.com".to_string(),
            headers: r#"{"content-type":"application/json"}"#.to_string(),
            body: r#"{"x":1}"#.to_string(),
            made_at: at(1_700_000_000),
        };

        let detail = CaptureDetail::from(model);
        assert_eq!(
            detail.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );

        let markup = capture_page(&detail, at(1_700_003_600)).into_string();
        assert!(markup.contains("content-type"));
        assert!(markup.contains("1 hour ago"));
    }

    #[test]
    fn corrupt_header_blob_renders_as_empty_map() {
        let model = capture::Model {
            id: 1,
            public_id: Uuid::new_v4(),
            method: "GET".to_string(),
            url_path: "/".to_string(),
            query_params: String::new(),
            domain: String::new(),
            headers: "not json".to_string(),
            body: String::new(),
            made_at: at(1_700_000_000),
        };

        let detail = CaptureDetail::from(model);
        assert!(detail.headers.is_empty());
    }
}
