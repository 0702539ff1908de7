pub mod confidence;
pub mod survivor;
pub mod types;
pub mod verify;

pub use confidence::{parse_confidence, score_confidence_week, season_totals};
pub use survivor::{evaluate_survivor, reconcile, SurvivorInput};
pub use types::{EliminationReason, PickFlag, PickOutcome, SeasonTotal, SurvivorStatus, WeekScore};
pub use verify::{AuditReport, Discrepancy, SurvivorDiscrepancy, Tally};
