//! Aggregate collectors.
//!
//! A collector reads live operational data and produces the
//! [`MetricsBundle`](crate::bundle::MetricsBundle) captured by a snapshot.
//! Collectors are read-only and never modify their source.
//!
//! - [`SqliteDemographicsCollector`]: patient demographics from the health
//!   office database

mod demographics;

pub use demographics::{
    age_bracket, normalize_sex, SqliteDemographicsCollector, AGE_BRACKETS, SEX_LABELS,
    UNASSIGNED_DISTRICT,
};
