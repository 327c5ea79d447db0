//! Standalone HTML report: one table row per event, hot rows highlighted.

use crate::classification::is_hot;
use crate::domain::Profile;
use std::fmt::Write;

const STYLE: &str = "\
body { font-family: system-ui; padding: 20px; }
table { border-collapse: collapse; width: 100%; }
th, td { padding: 8px; border-bottom: 1px solid #eee; text-align: left; }
.hot { background: #ffe5e5; }";

/// Render `profile` as a self-contained HTML page.
///
/// Rows follow the flat event list; a row is marked hot when its share of
/// `profile.total` reaches `hot_threshold`.
#[must_use]
pub fn html_report(profile: &Profile, hot_threshold: f64) -> String {
    let mut rows = String::new();
    for event in &profile.events {
        let class = if is_hot(event.duration, profile.total, hot_threshold) { "hot" } else { "" };
        let source = event.source.as_ref().map(|s| escape(&s.short())).unwrap_or_default();
        let _ = write!(
            rows,
            "\n    <tr class=\"{class}\">\n      <td>{}</td>\n      <td>{:.2} ms</td>\n      <td>{:.1}%</td>\n      <td>{source}</td>\n    </tr>",
            escape(&event.name),
            event.duration,
            profile.ratio(event.duration) * 100.0,
        );
    }

    format!(
        "<!doctype html>
<html>
<head>
<meta charset=\"utf-8\"/>
<title>stepscope report</title>
<style>
{STYLE}
</style>
</head>
<body>
<h1>🔥 stepscope report</h1>
<p>Total: {total:.2} ms</p>
<table>
<thead>
<tr><th>Step</th><th>Duration</th><th>Ratio</th><th>Source</th></tr>
</thead>
<tbody>{rows}
</tbody>
</table>
</body>
</html>
",
        total = profile.total
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
