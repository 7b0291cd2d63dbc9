//! Data domain: labeled evaluation rows and their quality statistics.

pub mod domain;
pub mod service;

pub use domain::{DatasetStats, Label, LabeledDataset};
