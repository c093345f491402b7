//! HTML results page.
//!
//! A single static page summarising the session, written as `index.html`
//! next to the downloaded files:
//!
//! - **Messages**: every status line, in order
//! - **Selection** (only while nothing has been processed): the file list and
//!   a preview grid, plus the process action caption
//! - **Processed images**: a grid with a download link per image
//!
//! Processed images are linked by bare filename, so the page must sit in the
//! same directory as the downloads. Previews link to the source files.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating;
//! all interpolation is escaped.

use crate::imaging::{Dimensions, ImageBackend};
use crate::naming::Clock;
use crate::session::Session;
use crate::types::{InputImage, OutputImage};
use maud::{DOCTYPE, Markup, html};

const CSS: &str = include_str!("../static/report.css");

/// Everything the page shows.
pub struct ReportView<'a> {
    pub messages: &'a [String],
    pub inputs: &'a [InputImage],
    pub outputs: &'a [OutputImage],
    pub canvas: Dimensions,
    pub process_label: &'a str,
}

/// Render the page for the current state of a session.
pub fn render_session<B: ImageBackend, C: Clock>(session: &Session<B, C>) -> Markup {
    let messages = session.messages();
    render_report(&ReportView {
        messages: &messages,
        inputs: session.inputs(),
        outputs: session.outputs(),
        canvas: session.canvas().size,
        process_label: session.process_label(),
    })
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CSS) }
            }
            body {
                (content)
            }
        }
    }
}

fn message_list(messages: &[String]) -> Markup {
    html! {
        div.messages {
            ul {
                @for msg in messages {
                    li { (msg) }
                }
            }
        }
    }
}

fn selection_section(view: &ReportView<'_>) -> Markup {
    html! {
        div.messages {
            ul {
                @for input in view.inputs {
                    li { "🔘 File to process: " (input.name) }
                }
            }
        }
        div.previews {
            h2 { "Selected images" }
            div.images-grid {
                @for input in view.inputs {
                    div.image-card {
                        img.preview-image src=(input.preview.locator()) alt=(input.name) loading="lazy";
                        p { (input.name) }
                    }
                }
            }
        }
        p.process-state { (view.process_label) }
    }
}

fn processed_section(view: &ReportView<'_>) -> Markup {
    html! {
        div.processed-images {
            h2 { "Processed images" }
            p.canvas { (view.canvas.width) "×" (view.canvas.height) " WebP" }
            div.images-grid {
                @for output in view.outputs {
                    div.image-card {
                        img.processed-image src=(output.filename) alt=(output.filename) loading="lazy";
                        p { (output.filename) }
                        a.download-link href=(output.filename) download=(output.filename) {
                            "Download"
                        }
                    }
                }
            }
        }
    }
}

/// Render the full page.
pub fn render_report(view: &ReportView<'_>) -> Markup {
    let content = html! {
        div.section {
            h1 { "Image Processor" }
            @if !view.messages.is_empty() {
                (message_list(view.messages))
            }
        }
        @if !view.outputs.is_empty() {
            div.section { (processed_section(view)) }
        } @else if !view.inputs.is_empty() {
            div.section { (selection_section(view)) }
        }
    };
    base_document("Image Processor", content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CropperConfig;
    use crate::imaging::backend::tests::MockBackend;
    use crate::naming::tests::FixedClock;
    use crate::test_helpers::write_mock_sources;
    use tempfile::TempDir;

    fn session() -> Session<MockBackend, FixedClock> {
        Session::with_clock(
            MockBackend::new(),
            FixedClock::default(),
            &CropperConfig::default(),
        )
    }

    #[test]
    fn empty_session_renders_title_only() {
        let html = render_session(&session()).into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Image Processor</h1>"));
        assert!(!html.contains("class=\"images-grid\""));
    }

    #[test]
    fn selection_shows_files_and_previews() {
        let tmp = TempDir::new().unwrap();
        let paths = write_mock_sources(tmp.path(), &[("beach.jpg", "10x10")]);
        let mut s = session();
        s.select(&paths);

        let html = render_session(&s).into_string();
        assert!(html.contains("🔘 File to process: beach.jpg"));
        assert!(html.contains("src=\"file://"));
        assert!(html.contains("Process images"));
        assert!(!html.contains("Processed images"));
    }

    #[test]
    fn processed_grid_links_filenames() {
        let tmp = TempDir::new().unwrap();
        let paths = write_mock_sources(tmp.path(), &[("beach.jpg", "10x10")]);
        let mut s = session();
        s.select(&paths);
        s.process(None).unwrap();

        let html = render_session(&s).into_string();
        let name = "rioyi-dev-2024-06-15-20240615123045-0-beach.webp";
        assert!(html.contains(&format!("href=\"{name}\" download=\"{name}\"")));
        assert!(html.contains(&format!("✅ Processed: {name}")));
        assert!(html.contains("650×434 WebP"));
        // The selection list is replaced by the results
        assert!(!html.contains("File to process"));
    }

    #[test]
    fn names_are_escaped() {
        let tmp = TempDir::new().unwrap();
        let paths = write_mock_sources(tmp.path(), &[("<b>.jpg", "garbage")]);
        let mut s = session();
        s.select(&paths);
        s.process(None).unwrap();

        let html = render_session(&s).into_string();
        assert!(html.contains("&lt;b&gt;.jpg"));
        assert!(!html.contains("<b>.jpg"));
    }
}
