//! Domain layer - candidate evaluation, watchlist state and follow-up

pub mod alerts;
pub mod evaluator;
pub mod survival;
pub mod watchlist;

pub use alerts::{AlertDispatcher, AlertSink};
pub use evaluator::{CandidateEvaluator, Verdict};
pub use survival::SurvivalWatcher;
pub use watchlist::Watchlist;
