use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};

pub static RUNS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("sync_runs_total", "Total number of sync runs attempted")
        .expect("sync runs total")
});

pub static RUN_SUCCESSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sync_run_success_total",
        "Sync runs that completed every stage"
    )
    .expect("sync run successes")
});

pub static RUN_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sync_run_failure_total",
        "Sync runs aborted by a stage failure"
    )
    .expect("sync run failures")
});

pub static LAST_RUN_TIMESTAMP: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "sync_last_run_timestamp_seconds",
        "Unix timestamp when the last sync run started"
    )
    .expect("sync last run timestamp")
});

pub static LAST_SUCCESS_TIMESTAMP: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "sync_last_success_timestamp_seconds",
        "Unix timestamp when a sync run last completed successfully"
    )
    .expect("sync last success timestamp")
});

pub static RECORDS_FETCHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sync_records_fetched_total",
        "Normalized keyed records produced by fetch across all runs"
    )
    .expect("sync records fetched")
});

pub static RECORDS_STAGED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sync_records_staged_total",
        "Rows appended to the staging table across all runs"
    )
    .expect("sync records staged")
});

pub static ROWS_UPDATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sync_rows_updated_total",
        "Target rows overwritten by merge across all runs"
    )
    .expect("sync rows updated")
});

pub static ROWS_INSERTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sync_rows_inserted_total",
        "Target rows inserted by merge across all runs"
    )
    .expect("sync rows inserted")
});

pub static RUN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "sync_run_duration_seconds",
        "Duration of sync runs in seconds",
        vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]
    )
    .expect("sync run duration histogram")
});
