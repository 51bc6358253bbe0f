//! Metrics collection.
//!
//! # Metrics
//! - `group_acquire_attempts_total` (counter): attempts by role, endpoint
//! - `group_acquire_failures_total` (counter): failed attempts by role, endpoint
//! - `group_acquire_success_total` (counter): successful acquisitions
//! - `group_reconfigurations_total` (counter): published topologies
//! - `group_topology_version` (gauge): version of the live snapshot
//! - `group_endpoints` (gauge): pool size by role
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade only; installing an
//!   exporter is the embedding application's concern

use metrics::{counter, gauge};

use crate::topology::Role;

pub fn record_acquire_attempt(role: Role, endpoint: &str) {
    counter!(
        "group_acquire_attempts_total",
        "role" => role.as_str(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

pub fn record_acquire_failure(role: Role, endpoint: &str) {
    counter!(
        "group_acquire_failures_total",
        "role" => role.as_str(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

pub fn record_acquire_success(role: Role, endpoint: &str) {
    counter!(
        "group_acquire_success_total",
        "role" => role.as_str(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

pub fn record_reconfiguration(version: u64, read_endpoints: usize, write_endpoints: usize) {
    counter!("group_reconfigurations_total").increment(1);
    gauge!("group_topology_version").set(version as f64);
    gauge!("group_endpoints", "role" => "read").set(read_endpoints as f64);
    gauge!("group_endpoints", "role" => "write").set(write_endpoints as f64);
}
