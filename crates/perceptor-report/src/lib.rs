//! perceptor-report: report rendering.
//!
//! Turns an `EvaluationReport` into a self-contained HTML page or a
//! Markdown document.

pub mod html;
pub mod markdown;

pub use html::{generate_html, write_html_report};
pub use markdown::{generate_markdown, write_markdown_report};
