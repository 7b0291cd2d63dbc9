//! Promotion domain: compare the latest version with the stage incumbent and
//! move the stage label when the latest is at least as good.

pub mod domain;
pub mod service;

pub use domain::{
    Comparison, PerformanceSample, PromotionDecision, PromotionOutcome, StageOccupancy,
};
pub use service::{compare, compare_and_promote, decide, promote};
