//! Metrics for the orchestration workflows.
//!
//! Metrics go through the `metrics` facade; the application installs whatever
//! recorder it exports with. Without a recorder every call is a no-op, which
//! is what tests run with.
//!
//! # Example
//!
//! ```rust
//! use coursehub_runtime::metrics::{register_metrics, RegistrationMetrics};
//!
//! register_metrics();
//! RegistrationMetrics::record_outcome("success");
//! ```

use metrics::describe_counter;

// Re-export the counter macro for use in other crates
pub use metrics::counter;

/// Registration attempts by outcome.
pub const REGISTRATION_TOTAL: &str = "registration_total";
/// Compensating account deletions by outcome.
pub const REGISTRATION_COMPENSATIONS_TOTAL: &str = "registration_compensations_total";
/// Upload stages by stage and outcome.
pub const UPLOAD_STAGE_TOTAL: &str = "upload_stage_total";
/// Access-code candidates rejected because they were taken.
pub const ACCESS_CODE_COLLISIONS_TOTAL: &str = "access_code_collisions_total";
/// Access-code allocations by outcome.
pub const ACCESS_CODE_ALLOCATIONS_TOTAL: &str = "access_code_allocations_total";
/// Items dropped from an aggregated result.
pub const AGGREGATION_ELIDED_TOTAL: &str = "aggregation_elided_total";

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(REGISTRATION_TOTAL, "Registration attempts by outcome");
    describe_counter!(
        REGISTRATION_COMPENSATIONS_TOTAL,
        "Compensating account deletions by outcome (a failure leaves an orphaned account)"
    );
    describe_counter!(UPLOAD_STAGE_TOTAL, "Upload pipeline stages by stage and outcome");
    describe_counter!(
        ACCESS_CODE_COLLISIONS_TOTAL,
        "Access-code candidates that were already in use"
    );
    describe_counter!(
        ACCESS_CODE_ALLOCATIONS_TOTAL,
        "Access-code allocations by outcome"
    );
    describe_counter!(
        AGGREGATION_ELIDED_TOTAL,
        "Items elided from aggregated results because their fetch failed or was empty"
    );
}

/// Registration workflow metrics recorder.
pub struct RegistrationMetrics;

impl RegistrationMetrics {
    /// Record a settled registration.
    pub fn record_outcome(outcome: &'static str) {
        counter!(REGISTRATION_TOTAL, "outcome" => outcome).increment(1);
    }

    /// Record a compensating account deletion.
    pub fn record_compensation(succeeded: bool) {
        let outcome = if succeeded { "success" } else { "failure" };
        counter!(REGISTRATION_COMPENSATIONS_TOTAL, "outcome" => outcome).increment(1);
    }
}

/// Upload pipeline metrics recorder.
pub struct UploadMetrics;

impl UploadMetrics {
    /// Record a finished (or skipped) upload stage.
    pub fn record_stage(stage: &'static str, outcome: &'static str) {
        counter!(UPLOAD_STAGE_TOTAL, "stage" => stage, "outcome" => outcome).increment(1);
    }
}

/// Access-code allocator metrics recorder.
pub struct AccessCodeMetrics;

impl AccessCodeMetrics {
    /// Record a candidate that was already taken.
    pub fn record_collision() {
        counter!(ACCESS_CODE_COLLISIONS_TOTAL).increment(1);
    }

    /// Record a settled allocation.
    pub fn record_allocation(outcome: &'static str) {
        counter!(ACCESS_CODE_ALLOCATIONS_TOTAL, "outcome" => outcome).increment(1);
    }
}

/// Fan-out aggregation metrics recorder.
pub struct AggregationMetrics;

impl AggregationMetrics {
    /// Record items elided from one aggregated result.
    pub fn record_elided(count: usize) {
        if count > 0 {
            counter!(AGGREGATION_ELIDED_TOTAL).increment(count as u64);
        }
    }
}
