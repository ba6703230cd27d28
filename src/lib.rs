// Company Mentions - Core Library
// Resolves company mentions in annotated posts against a canonical roster.
// Exposes all modules for use in the CLI, the upload server, and tests.

pub mod config;
pub mod error;
pub mod normalize;
pub mod splitter;
pub mod workbook;
pub mod entities;
pub mod matcher;
pub mod aggregator;
pub mod report;
pub mod pipeline;

// Re-export commonly used types
pub use config::{Config, MatcherConfig, ReportConfig, ServerConfig, WorkbookConfig};
pub use error::{IngestError, Result};
pub use normalize::normalize;
pub use splitter::split_mentions;
pub use workbook::{
    Sheet, SheetRow, Workbook, WorkbookFormat, WorkbookReader,
    detect_format, get_reader,
};
pub use entities::{
    AliasCollision, AliasIndex, CanonicalCompany, Post, PostColumns, RosterColumns,
};
pub use matcher::{CompanyMatcher, MatchKind, ResolvedIdentity};
pub use aggregator::{MentionAggregator, MentionRecord};
pub use report::{build_report, Report, ReportRow, RunStats};
pub use pipeline::{build_index, process_uploaded_file, process_workbook};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the `tracing` subscriber used by the binaries
///
/// Level defaults to `info`; override with `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
