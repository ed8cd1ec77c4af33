// loan_sweep - housing-loan quote sweeper
// Module re-exports

pub mod browser;
pub mod config;
pub mod db;
pub mod error;
pub mod extractor;
pub mod models;
pub mod navigator;
pub mod normalize;
pub mod session;
pub mod sweep;
pub mod utils;

// Re-export commonly used types
pub use models::{
    NormalizedVariation, QuoteField, QuoteFields, Run, RunParameters, Variation,
};

pub use browser::{Locator, Page, WebDriverPage};
pub use config::SweepConfig;
pub use db::{RunStore, StoreSummary};
pub use error::{Result, SweepError};
pub use session::run_session;
pub use sweep::{fixed_period_grid, SweepReport, TermOutcome};
