//! Prometheus metrics collection and formatting.
//!
//! This module provides metrics in Prometheus text exposition format.

use std::fmt::Write;

use crate::state::AppState;

/// Collect all metrics from AppState and format as Prometheus text.
pub fn collect_metrics(state: &AppState) -> String {
    let mut output = String::new();

    collect_job_metrics(state, &mut output);
    collect_executor_metrics(state, &mut output);

    output
}

/// Collect job metrics by status.
fn collect_job_metrics(state: &AppState, output: &mut String) {
    let counts = state.registry.counts();

    writeln!(output, "# HELP jobtrack_jobs Number of tracked jobs by status").ok();
    writeln!(output, "# TYPE jobtrack_jobs gauge").ok();
    writeln!(output, "jobtrack_jobs{{status=\"queued\"}} {}", counts.queued).ok();
    writeln!(output, "jobtrack_jobs{{status=\"running\"}} {}", counts.running).ok();
    writeln!(output, "jobtrack_jobs{{status=\"succeeded\"}} {}", counts.succeeded).ok();
    writeln!(output, "jobtrack_jobs{{status=\"failed\"}} {}", counts.failed).ok();

    writeln!(output).ok();
    writeln!(output, "# HELP jobtrack_jobs_total Number of tracked jobs").ok();
    writeln!(output, "# TYPE jobtrack_jobs_total gauge").ok();
    writeln!(output, "jobtrack_jobs_total {}", counts.total()).ok();
}

/// Collect CPU pool usage.
fn collect_executor_metrics(state: &AppState, output: &mut String) {
    let workers = state.executor.cpu_workers();
    let available = state.executor.cpu_permits_available();

    writeln!(output).ok();
    writeln!(output, "# HELP jobtrack_cpu_workers Size of the CPU-bound pool").ok();
    writeln!(output, "# TYPE jobtrack_cpu_workers gauge").ok();
    writeln!(output, "jobtrack_cpu_workers {workers}").ok();
    writeln!(output, "# HELP jobtrack_cpu_workers_busy CPU-bound slots in use").ok();
    writeln!(output, "# TYPE jobtrack_cpu_workers_busy gauge").ok();
    writeln!(
        output,
        "jobtrack_cpu_workers_busy {}",
        workers.saturating_sub(available)
    )
    .ok();
}
