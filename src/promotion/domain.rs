//! Promotion state machine over one stage label of one model.
//!
//! ```text
//! Unoccupied ──────────────────────────────▶ Occupied(latest)
//! Occupied(current) ── latest >= current ──▶ Occupied(latest)
//! Occupied(current) ── latest <  current ──▶ Occupied(current)
//! ```

use crate::registry::domain::StageAssignment;

/// Score of one version on the shared holdout set.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PerformanceSample {
    pub version: u32,
    pub score: f64,
}

impl PerformanceSample {
    pub fn new(version: u32, score: f64) -> Self {
        Self { version, score }
    }
}

/// Output of the comparator: the latest version's score and, if the stage
/// was occupied, the incumbent's score on the same rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub latest: PerformanceSample,
    pub incumbent: Option<PerformanceSample>,
    /// Fingerprint of the holdout rows both scores were computed on.
    pub holdout_fingerprint: Option<String>,
}

impl Comparison {
    /// Nothing holds the stage yet: the latest version wins by default.
    pub fn first_deployment(latest_version: u32) -> Self {
        Self {
            latest: PerformanceSample::new(latest_version, 1.0),
            incumbent: None,
            holdout_fingerprint: None,
        }
    }

    pub fn scored(
        latest: PerformanceSample,
        incumbent: PerformanceSample,
        holdout_fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            latest,
            incumbent: Some(incumbent),
            holdout_fingerprint: Some(holdout_fingerprint.into()),
        }
    }

    /// `(latest_score, current_score)`; the current score is 0.0 when there
    /// is no incumbent.
    pub fn scores(&self) -> (f64, f64) {
        (
            self.latest.score,
            self.incumbent.map_or(0.0, |sample| sample.score),
        )
    }

    pub fn incumbent_version(&self) -> Option<u32> {
        self.incumbent.map(|sample| sample.version)
    }
}

/// Who holds the target stage.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StageOccupancy {
    Unoccupied,
    Occupied(u32),
}

impl StageOccupancy {
    pub fn holder(&self) -> Option<u32> {
        match self {
            StageOccupancy::Unoccupied => None,
            StageOccupancy::Occupied(version) => Some(*version),
        }
    }
}

impl From<Option<u32>> for StageOccupancy {
    fn from(holder: Option<u32>) -> Self {
        holder.map_or(StageOccupancy::Unoccupied, StageOccupancy::Occupied)
    }
}

/// Transition chosen by [`crate::promotion::service::decide`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PromotionDecision {
    /// Move the stage from its current occupancy to `to`.
    Promote { from: StageOccupancy, to: u32 },
    /// Self-loop: the incumbent scored strictly higher.
    Retain { incumbent: u32 },
    /// The latest version already holds the stage; nothing to write.
    AlreadyPromoted { version: u32 },
}

/// What `promote` actually did.
#[derive(Clone, Debug, PartialEq)]
pub enum PromotionOutcome {
    Promoted(StageAssignment),
    Retained { incumbent: u32 },
    AlreadyPromoted { version: u32 },
}

impl PromotionOutcome {
    /// Stage holder after the call.
    pub fn holder(&self) -> u32 {
        match self {
            PromotionOutcome::Promoted(assignment) => assignment.version,
            PromotionOutcome::Retained { incumbent } => *incumbent,
            PromotionOutcome::AlreadyPromoted { version } => *version,
        }
    }

    pub fn promoted(&self) -> bool {
        matches!(self, PromotionOutcome::Promoted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_deployment_scores_one_against_zero() {
        let cmp = Comparison::first_deployment(4);
        assert_eq!(cmp.scores(), (1.0, 0.0));
        assert_eq!(cmp.incumbent_version(), None);
    }

    #[test]
    fn occupancy_from_holder() {
        assert_eq!(StageOccupancy::from(None), StageOccupancy::Unoccupied);
        assert_eq!(StageOccupancy::from(Some(3)).holder(), Some(3));
    }
}
