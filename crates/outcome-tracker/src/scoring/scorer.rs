use crate::catalog::OutcomeStore;

use super::policy::ScoringConfig;

/// Read-only view over a store that computes outcome scores.
///
/// Each layer lives in its own module: `learning` (LO), `program` (PO per
/// course), `aggregate` (PO across courses) and `summary`.
pub struct OutcomeScorer<'a, S: ?Sized> {
    pub(super) store: &'a S,
    pub(super) config: ScoringConfig,
}

impl<'a, S> OutcomeScorer<'a, S>
where
    S: OutcomeStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self::with_config(store, ScoringConfig::default())
    }

    pub fn with_config(store: &'a S, config: ScoringConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> ScoringConfig {
        self.config
    }
}
