use crate::ScoringStrategy;

/// Shared strategy for plain measurement instruments (steps, heart rate,
/// blood pressure, weight, oxygen saturation, risk score).
///
/// The submitted value fields are already final — nothing to derive or
/// score — and threshold lookup uses the default per-field evaluation.
pub struct PassthroughScoring;

impl ScoringStrategy for PassthroughScoring {}
