mod charts;
mod escape;
mod sections;

use time::format_description::FormatItem;
use time::macros::format_description;
use tracing::debug;

use crate::application::render::types::{
    RenderError, RenderOutput, RenderRequest, RenderService,
};

use escape::escape_html;
use sections::{Fragment, render_section};

pub use charts::{RingGeometry, bar_chart, metric_card, ring_geometry};

const DATE_STAMP: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Renders a record section by section into a `generated-content` document.
#[derive(Debug, Default, Clone, Copy)]
pub struct SectionRenderService;

impl SectionRenderService {
    pub fn new() -> Self {
        Self
    }
}

impl RenderService for SectionRenderService {
    fn render(&self, request: &RenderRequest<'_>) -> Result<RenderOutput, RenderError> {
        let record = request.record;
        let date = request
            .generated_on
            .format(DATE_STAMP)
            .map_err(|err| RenderError::DateStamp {
                message: err.to_string(),
            })?;

        let mut html = String::from(r#"<div class="generated-content">"#);
        html.push_str(&format!("<h1>{}</h1>", escape_html(&record.title)));
        html.push_str(&format!(
            r#"<p class="meta-info{}">WEAVED ON: {} | {}</p>"#,
            meta_tone(&record.meta),
            date,
            escape_html(&record.meta)
        ));

        let mut output = RenderOutput {
            html: String::new(),
            rendered_sections: 0,
            dropped_sections: 0,
            contains_code: false,
            contains_charts: false,
        };

        for (index, section) in record.sections.iter().enumerate() {
            match render_section(&mut html, section) {
                Fragment::Markup => output.rendered_sections += 1,
                Fragment::Code => {
                    output.rendered_sections += 1;
                    output.contains_code = true;
                }
                Fragment::Chart => {
                    output.rendered_sections += 1;
                    output.contains_charts = true;
                }
                Fragment::Dropped => {
                    output.dropped_sections += 1;
                    debug!(section_index = index, "Dropped section with unknown type");
                }
            }
        }

        html.push_str("</div>");
        output.html = html;
        Ok(output)
    }
}

/// Extra header class chosen by substring of the meta line.
fn meta_tone(meta: &str) -> &'static str {
    if meta.contains("High") {
        " meta-high"
    } else if meta.contains("Low") {
        " meta-low"
    } else {
        ""
    }
}
