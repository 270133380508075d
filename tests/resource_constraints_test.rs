//! Resource budget resolution

use std::time::Duration;

use tsad_bench::resource_constraints::{HostResources, ResourceConstraints, GIB};
use tsad_bench::Error;

const HOST: HostResources = HostResources::new(9 * GIB, 8);

fn builder() -> tsad_bench::resource_constraints::ResourceConstraintsBuilder {
    ResourceConstraints::builder().host(HOST)
}

#[test]
fn test_host_share_divided_by_tasks() {
    let constraints = builder().tasks_per_host(4).build().unwrap();
    let (memory, cpus) = constraints.get_resource_limits(None, None);
    assert_eq!(memory, 2 * GIB);
    assert!((cpus - 2.0).abs() < f64::EPSILON);
}

#[test]
fn test_explicit_limits_win_over_host_share() {
    let constraints = builder()
        .tasks_per_host(4)
        .task_memory_limit(3 * GIB)
        .task_cpu_limit(1.5)
        .build()
        .unwrap();
    assert_eq!(constraints.get_resource_limits(None, None), (3 * GIB, 1.5));
}

#[test]
fn test_overwrites_win_and_resolve_independently() {
    let constraints = builder()
        .task_memory_limit(3 * GIB)
        .task_cpu_limit(1.5)
        .build()
        .unwrap();
    assert_eq!(constraints.get_resource_limits(Some(GIB), None), (GIB, 1.5));
    assert_eq!(
        constraints.get_resource_limits(None, Some(0.5)),
        (3 * GIB, 0.5)
    );
}

#[test]
fn test_memory_limit_only() {
    let constraints = builder().tasks_per_host(2).task_memory_limit(GIB).build().unwrap();
    assert_eq!(constraints.get_resource_limits(None, None), (GIB, 4.0));
}

#[test]
fn test_timeouts() {
    let constraints = builder()
        .train_timeout(Duration::from_secs(60))
        .build()
        .unwrap();
    assert_eq!(constraints.get_train_timeout(None), Some(Duration::from_secs(60)));
    assert_eq!(
        constraints.get_train_timeout(Some(Duration::from_secs(5))),
        Some(Duration::from_secs(5))
    );
    assert_eq!(constraints.get_execute_timeout(None), None);
}

#[test]
fn test_forcing_single_task() {
    let constraints = builder().tasks_per_host(4).build().unwrap();
    let local = constraints.with_tasks_per_host(1);
    assert_eq!(local.tasks_per_host(), 1);
    assert_eq!(local.get_resource_limits(None, None), (8 * GIB, 8.0));
    assert_eq!(constraints.with_tasks_per_host(0).tasks_per_host(), 1);
}

#[test]
fn test_zero_tasks_per_host_rejected() {
    let error = builder().tasks_per_host(0).build().unwrap_err();
    assert!(matches!(error, Error::Configuration(_)));
}

#[test]
fn test_probe_reads_this_host() {
    let host = HostResources::probe().unwrap();
    assert!(host.total_memory() > 0);
    assert!(host.cpus() > 0);
}
