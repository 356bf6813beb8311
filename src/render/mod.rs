//! Output rendering (workbooks, diagnostic log, batch report)

pub mod log;
pub mod report;
pub mod workbook;

pub use log::{legal_article, DiagnosticLog};
pub use report::{build_report, sha256_hex, write_report, REPORT_SCHEMA_VERSION};
pub use workbook::{MergeMode, MergeOutcome, Template, TemplateMerger};
