//! HTML rendering for analysis output.
//!
//! Engine summaries are CommonMark. Raw HTML in engine output is never
//! trusted and is rendered as escaped text.

use pulldown_cmark::{html, Event, Options, Parser};

use crate::analysis::{AnalysisResult, RemediationItem};

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render markdown to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn render_item(item: &RemediationItem) -> String {
    let controls = if item.controls.is_empty() {
        String::new()
    } else {
        item.controls
            .iter()
            .map(|c| format!("<code>{}</code>", escape_html(c)))
            .collect::<Vec<_>>()
            .join(" ")
    };
    format!(
        "<tr><td>{}</td><td><strong>{}</strong><br />{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        escape_html(&item.id),
        escape_html(&item.title),
        markdown_to_html(&item.description),
        item.priority,
        item.effort,
        escape_html(&item.timeline),
        controls
    )
}

/// Render an analysis as a standalone HTML page.
pub fn render_report_html(title: &str, result: &AnalysisResult) -> String {
    let mut body = String::new();

    match result {
        AnalysisResult::Structured(r) => {
            body.push_str(&format!(
                "<p class=\"score\">Score: <strong>{}</strong>/100 ({})</p>",
                r.overall_score, r.compliance_level
            ));
            body.push_str(&markdown_to_html(&r.summary));
            if !r.action_items.is_empty() {
                body.push_str("<h2>Action items</h2><table><thead><tr><th>#</th><th>Item</th><th>Priority</th><th>Effort</th><th>Timeline</th><th>Controls</th></tr></thead><tbody>");
                for item in &r.action_items {
                    body.push_str(&render_item(item));
                }
                body.push_str("</tbody></table>");
            }
        }
        AnalysisResult::RawText(r) => body.push_str(&markdown_to_html(&r.text)),
        AnalysisResult::Fallback(r) => {
            body.push_str(&format!("<p class=\"note\">{}</p>", escape_html(&r.note)));
            body.push_str(&format!("<pre>{}</pre>", escape_html(&r.raw_text)));
        }
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n<title>{title}</title>\n<style>body{{font-family:sans-serif;max-width:60rem;margin:2rem auto;}}table{{border-collapse:collapse;}}td,th{{border:1px solid #ccc;padding:.4rem;vertical-align:top;}}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
        body = body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FallbackResult, RawTextResult};

    #[test]
    fn test_inline_marks() {
        assert_eq!(
            markdown_to_html("MFA is **required** for *all* staff."),
            "<p>MFA is <strong>required</strong> for <em>all</em> staff.</p>\n"
        );

        let html = markdown_to_html("this is _important_ and __bold__");
        assert!(html.contains("<em>important</em>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_headings_rules_and_paragraphs() {
        let html = markdown_to_html("## Findings\nFirst line\nsecond line\n\n---\n### Gaps\nNone.");
        assert!(html.contains("<h2>Findings</h2>"));
        assert!(html.contains("<p>First line\nsecond line</p>"));
        assert!(html.contains("<hr />"));
        assert!(html.contains("<h3>Gaps</h3>"));
        assert!(html.contains("<p>None.</p>"));
    }

    #[test]
    fn test_bullet_lists_grouped() {
        let html = markdown_to_html("Gaps:\n- No MFA\n- No **logging**\n\nDone");
        assert!(html.contains("<p>Gaps:</p>"));
        assert!(html.contains("<ul>\n<li>No MFA</li>\n<li>No <strong>logging</strong></li>\n</ul>"));
        assert!(html.contains("<p>Done</p>"));
    }

    #[test]
    fn test_numbered_lists() {
        let html = markdown_to_html("Top fixes:\n1. Enable MFA\n2. Rotate keys");
        assert!(html.contains("<p>Top fixes:</p>"));
        assert!(html.contains("<ol>"));
        assert!(html.contains("<li>Enable MFA</li>"));
        assert!(html.contains("<li>Rotate keys</li>"));
    }

    #[test]
    fn test_code_fences() {
        let html = markdown_to_html("```\nNIST-3.5.3\n```");
        assert!(html.contains("<pre><code>NIST-3.5.3"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_html_is_escaped() {
        let html = markdown_to_html("<script>alert(1)</script> & more");
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));

        let inline = markdown_to_html("Click <b onclick=\"x()\">here</b>");
        assert!(!inline.contains("<b "));
        assert!(inline.contains("&lt;b"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_to_html(""), "");
        assert_eq!(markdown_to_html("\n\n"), "");
    }

    #[test]
    fn test_report_variants() {
        let raw = AnalysisResult::RawText(RawTextResult {
            text: "## Summary".into(),
        });
        assert!(render_report_html("Policy", &raw).contains("<h2>Summary</h2>"));

        let fallback = AnalysisResult::Fallback(FallbackResult::new("could not parse", "{oops <x>"));
        let html = render_report_html("Policy <v2>", &fallback);
        assert!(html.contains("<title>Policy &lt;v2&gt;</title>"));
        assert!(html.contains("<pre>{oops &lt;x&gt;</pre>"));
    }
}
