// loan_sweep data models

pub mod quote;
pub mod run;
pub mod variation;

// Re-exports for convenience
pub use quote::{QuoteField, QuoteFields};
pub use run::{now_timestamp, Run, RunParameters};
pub use variation::{NormalizedVariation, Variation};
