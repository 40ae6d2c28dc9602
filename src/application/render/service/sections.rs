//! Per-section fragment builders.

use crate::domain::content::{
    ComparisonBlock, ImageBlock, ListBlock, MetricsGridBlock, Section, TableBlock, TimelineBlock,
};

use super::charts::{bar_chart, metric_card};
use super::escape::escape_html;

/// What a section contributed to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fragment {
    Markup,
    Code,
    Chart,
    Dropped,
}

/// Append the markup for `section` to `html`.
pub(crate) fn render_section(html: &mut String, section: &Section) -> Fragment {
    match section {
        Section::Heading(block) => {
            html.push_str(&format!("<h2>{}</h2>", escape_html(&block.content)));
            Fragment::Markup
        }
        Section::Paragraph(block) => {
            html.push_str(&format!("<p>{}</p>", escape_html(&block.content)));
            Fragment::Markup
        }
        Section::Image(image) => {
            render_image(html, image);
            Fragment::Markup
        }
        Section::List(list) => {
            render_list(html, list);
            Fragment::Markup
        }
        Section::Blockquote(block) => {
            html.push_str(&format!(
                "<blockquote>{}</blockquote>",
                escape_html(&block.content)
            ));
            Fragment::Markup
        }
        Section::Callout(block) => {
            html.push_str(&format!(
                r#"<div class="callout"><p>{}</p></div>"#,
                escape_html(&block.content)
            ));
            Fragment::Markup
        }
        Section::Table(table) => {
            render_table(html, table);
            Fragment::Markup
        }
        Section::Timeline(timeline) => {
            render_timeline(html, timeline);
            Fragment::Markup
        }
        Section::BarChart(chart) => {
            html.push_str(&bar_chart(&chart.data));
            Fragment::Chart
        }
        Section::MetricsGrid(grid) => {
            render_metrics_grid(html, grid);
            Fragment::Chart
        }
        Section::Code(code) => {
            html.push_str(&format!(
                concat!(
                    r#"<div class="code-block">"#,
                    r#"<div class="code-header">{}</div>"#,
                    "<pre><code>{}</code></pre>",
                    "</div>"
                ),
                escape_html(&code.language),
                escape_html(&code.content),
            ));
            Fragment::Code
        }
        Section::Comparison(comparison) => {
            render_comparison(html, comparison);
            Fragment::Markup
        }
        Section::Unsupported => Fragment::Dropped,
    }
}

fn render_image(html: &mut String, image: &ImageBlock) {
    html.push_str(&format!(
        r#"<img src="{}" alt="{}" class="content-image" loading="lazy">"#,
        escape_html(&image.src),
        escape_html(&image.alt)
    ));
}

fn render_list(html: &mut String, list: &ListBlock) {
    html.push_str("<ul>");
    for item in &list.items {
        html.push_str(&format!("<li>{}</li>", escape_html(item)));
    }
    html.push_str("</ul>");
}

fn render_table(html: &mut String, table: &TableBlock) {
    html.push_str(r#"<div class="table-wrapper"><table class="data-table"><thead><tr>"#);
    for header in &table.headers {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");
}

// Placement alternates by index parity only; even indices sit on the left.
fn render_timeline(html: &mut String, timeline: &TimelineBlock) {
    html.push_str(r#"<div class="timeline">"#);
    for (index, event) in timeline.events.iter().enumerate() {
        let side = if index % 2 == 0 { "left" } else { "right" };
        html.push_str(&format!(
            concat!(
                r#"<div class="timeline-item {}">"#,
                r#"<div class="timeline-content">"#,
                r#"<span class="timeline-date">{}</span>"#,
                "<h3>{}</h3>",
                "<p>{}</p>",
                "</div></div>"
            ),
            side,
            escape_html(&event.date),
            escape_html(&event.title),
            escape_html(&event.desc),
        ));
    }
    html.push_str("</div>");
}

fn render_metrics_grid(html: &mut String, grid: &MetricsGridBlock) {
    html.push_str(r#"<div class="metrics-grid">"#);
    for item in &grid.items {
        html.push_str(&metric_card(item));
    }
    html.push_str("</div>");
}

fn render_comparison(html: &mut String, comparison: &ComparisonBlock) {
    html.push_str(r#"<div class="comparison-grid">"#);
    for item in &comparison.items {
        if item.winner {
            html.push_str(
                r#"<div class="comparison-card winner"><span class="winner-badge">Top Pick</span>"#,
            );
        } else {
            html.push_str(r#"<div class="comparison-card">"#);
        }
        html.push_str(&format!(
            r#"<h3>{}</h3><p class="comparison-price">{}</p><ul>"#,
            escape_html(&item.name),
            escape_html(&item.price)
        ));
        for feature in &item.features {
            html.push_str(&format!("<li>{}</li>", escape_html(feature)));
        }
        html.push_str("</ul></div>");
    }
    html.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::{
        CodeBlock, ComparisonItem, ListBlock, TextBlock, TimelineEvent,
    };

    const HOSTILE: &str = r#"<b>&"'"#;
    const ESCAPED: &str = "&lt;b&gt;&amp;&quot;&#39;";

    fn render(section: &Section) -> (String, Fragment) {
        let mut html = String::new();
        let fragment = render_section(&mut html, section);
        (html, fragment)
    }

    fn assert_escaped(html: &str, fields: usize) {
        assert!(!html.contains("<b>"), "raw markup leaked into {html}");
        assert_eq!(html.matches(ESCAPED).count(), fields, "in {html}");
    }

    #[test]
    fn list_items_keep_their_order() {
        let (html, _) = render(&Section::List(ListBlock {
            items: vec!["b".into(), "a".into(), "c".into()],
        }));
        assert_eq!(html, "<ul><li>b</li><li>a</li><li>c</li></ul>");
    }

    #[test]
    fn table_renders_headers_then_rows() {
        let table = TableBlock::new(
            vec!["Name".into(), "Score".into()],
            vec![
                vec!["Ada".into(), "10".into()],
                vec!["Linus".into(), "9".into()],
            ],
        )
        .expect("valid table");
        let (html, _) = render(&Section::Table(table));
        assert_eq!(
            html,
            concat!(
                r#"<div class="table-wrapper"><table class="data-table"><thead><tr>"#,
                "<th>Name</th><th>Score</th></tr></thead><tbody>",
                "<tr><td>Ada</td><td>10</td></tr><tr><td>Linus</td><td>9</td></tr>",
                "</tbody></table></div>"
            )
        );
    }

    #[test]
    fn timeline_alternates_sides_by_index() {
        let events = (0..4)
            .map(|i| TimelineEvent {
                date: format!("19{i}0"),
                title: "Same".into(),
                desc: "Same".into(),
            })
            .collect();
        let (html, _) = render(&Section::Timeline(TimelineBlock { events }));
        let sides: Vec<&str> = html
            .split(r#"class="timeline-item "#)
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .collect();
        assert_eq!(sides, vec!["left", "right", "left", "right"]);
    }

    #[test]
    fn every_winner_is_marked() {
        let item = |name: &str, winner| ComparisonItem {
            name: name.into(),
            price: "Free".into(),
            features: vec!["Fast".into()],
            winner,
        };
        let (html, fragment) = render(&Section::Comparison(ComparisonBlock {
            items: vec![item("A", true), item("B", false), item("C", true)],
        }));
        assert_eq!(fragment, Fragment::Markup);
        assert_eq!(html.matches("comparison-card winner").count(), 2);
        assert_eq!(html.matches("winner-badge").count(), 2);
        assert_eq!(html.matches(r#"class="comparison-card""#).count(), 1);
    }

    #[test]
    fn code_body_is_escaped() {
        let (html, fragment) = render(&Section::Code(CodeBlock {
            language: "React (JSX)".into(),
            content: "return <h1>Hi</h1>;".into(),
        }));
        assert_eq!(fragment, Fragment::Code);
        assert!(html.contains("<pre><code>return &lt;h1&gt;Hi&lt;/h1&gt;;</code></pre>"));
        assert!(html.contains(r#"<div class="code-header">React (JSX)</div>"#));
    }

    #[test]
    fn text_sections_escape_content() {
        let (html, _) = render(&Section::Callout(TextBlock::new("<script>x</script>")));
        assert_eq!(
            html,
            r#"<div class="callout"><p>&lt;script&gt;x&lt;/script&gt;</p></div>"#
        );
    }

    #[test]
    fn image_attributes_are_escaped() {
        let (html, _) = render(&Section::Image(ImageBlock {
            src: "https://example.com/a.png?x=1&y=2".into(),
            alt: r#"say "hi""#.into(),
        }));
        assert_eq!(
            html,
            r#"<img src="https://example.com/a.png?x=1&amp;y=2" alt="say &quot;hi&quot;" class="content-image" loading="lazy">"#
        );
    }

    #[test]
    fn text_blocks_escape_every_variant() {
        for section in [
            Section::heading(HOSTILE),
            Section::paragraph(HOSTILE),
            Section::Blockquote(TextBlock::new(HOSTILE)),
        ] {
            let (html, _) = render(&section);
            assert_escaped(&html, 1);
        }
    }

    #[test]
    fn list_items_are_escaped() {
        let (html, _) = render(&Section::List(ListBlock {
            items: vec![HOSTILE.into(), HOSTILE.into()],
        }));
        assert_escaped(&html, 2);
    }

    #[test]
    fn table_headers_and_cells_are_escaped() {
        let table = TableBlock::new(
            vec![HOSTILE.into(), "Plain".into()],
            vec![vec!["plain".into(), HOSTILE.into()], vec![HOSTILE.into(), "x".into()]],
        )
        .expect("valid table");
        let (html, _) = render(&Section::Table(table));
        assert_escaped(&html, 3);
        assert!(html.contains(&format!("<th>{ESCAPED}</th>")));
        assert!(html.contains(&format!("<td>{ESCAPED}</td>")));
    }

    #[test]
    fn timeline_fields_are_escaped() {
        let (html, _) = render(&Section::Timeline(TimelineBlock {
            events: vec![TimelineEvent {
                date: HOSTILE.into(),
                title: HOSTILE.into(),
                desc: HOSTILE.into(),
            }],
        }));
        assert_escaped(&html, 3);
        assert!(html.contains(&format!(r#"<span class="timeline-date">{ESCAPED}</span>"#)));
    }

    #[test]
    fn comparison_fields_are_escaped() {
        let (html, _) = render(&Section::Comparison(ComparisonBlock {
            items: vec![ComparisonItem {
                name: HOSTILE.into(),
                price: HOSTILE.into(),
                features: vec![HOSTILE.into(), "Fast".into()],
                winner: true,
            }],
        }));
        assert_escaped(&html, 3);
        assert!(html.contains(&format!(r#"<p class="comparison-price">{ESCAPED}</p>"#)));
    }

    #[test]
    fn code_language_is_escaped() {
        let (html, _) = render(&Section::Code(CodeBlock {
            language: HOSTILE.into(),
            content: "let x = 1;".into(),
        }));
        assert_escaped(&html, 1);
        assert!(html.contains(&format!(r#"<div class="code-header">{ESCAPED}</div>"#)));
    }

    #[test]
    fn unsupported_sections_produce_nothing() {
        let (html, fragment) = render(&Section::Unsupported);
        assert!(html.is_empty());
        assert_eq!(fragment, Fragment::Dropped);
    }
}
