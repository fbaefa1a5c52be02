//! # Solar Site Optimizer
//!
//! Site-selection core for solar installations: a read-only per-cell feature
//! grid, a weighted multi-criteria scoring function, a seeded genetic search
//! over candidate placements, and a reality-gap validator comparing predicted
//! scores against field (or synthesized) reference measurements.
//!
//! Imagery preprocessing, terrain classification and result presentation are
//! external collaborators; this crate consumes their outputs as a
//! [`domain::FeatureGrid`] and produces ranked, validated
//! [`domain::CandidateSite`]s plus serializable export rows.

pub mod config;
pub mod domain;
pub mod optimizer;
pub mod scoring;
pub mod simulation;
pub mod telemetry;
pub mod validation;
