//! HTML report generation: display records, metrics and template rendering.

pub mod metrics;
mod render;
pub mod transform;

pub use metrics::{calculate_metrics, Counts, Extractor, Metrics, ReportMetrics};
pub use render::{
    ExportOptions, ExportResult, HtmlExporter, Renderer, ReportData, ReportFilters,
    ReportMetadata, BUILTIN_TEMPLATES,
};
pub use transform::{
    escape_html, extract_filename, format_date, format_date_in, process_issue, process_issues,
    DisplayIssue, LineValue, Timestamp,
};
