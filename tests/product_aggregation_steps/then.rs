//! Then steps for product aggregation BDD scenarios.

use super::world::{AggregationWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use shiftdesk::reconciliation::services::{ErrorKind, ReconciliationError};

fn aggregation_result(
    world: &AggregationWorld,
) -> Result<&Result<(), ReconciliationError>, eyre::Report> {
    world
        .last_aggregation
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing aggregation result"))
}

fn expect_kind(world: &AggregationWorld, expected: ErrorKind) -> Result<(), eyre::Report> {
    match aggregation_result(world)? {
        Err(err) if err.kind() == expected => Ok(()),
        other => Err(eyre::eyre!("expected {expected:?} error, got {other:?}")),
    }
}

#[then("the aggregation succeeds")]
fn aggregation_succeeds(world: &AggregationWorld) -> Result<(), eyre::Report> {
    match aggregation_result(world)? {
        Ok(()) => Ok(()),
        Err(err) => Err(eyre::eyre!("expected aggregation to succeed, got {err}")),
    }
}

#[then("the aggregation is rejected as already aggregated")]
fn rejected_as_already_aggregated(world: &AggregationWorld) -> Result<(), eyre::Report> {
    let result = aggregation_result(world)?;
    if !matches!(result, Err(ReconciliationError::AlreadyAggregated { .. })) {
        return Err(eyre::eyre!("expected AlreadyAggregated error, got {result:?}"));
    }
    Ok(())
}

#[then("the aggregation is rejected as a conflict")]
fn rejected_as_conflict(world: &AggregationWorld) -> Result<(), eyre::Report> {
    expect_kind(world, ErrorKind::Conflict)
}

#[then("the aggregation is rejected as not found")]
fn rejected_as_not_found(world: &AggregationWorld) -> Result<(), eyre::Report> {
    expect_kind(world, ErrorKind::NotFound)
}

#[then(r#"the shift task lists product "{code}""#)]
fn shift_task_lists_product(world: &AggregationWorld, code: String) -> Result<(), eyre::Report> {
    let task_id = world
        .task_id
        .ok_or_else(|| eyre::eyre!("missing shift task in scenario world"))?;
    let view = run_async(world.service.get_task(task_id)).wrap_err("load shift task view")?;
    if !view.products.iter().any(|product| product.as_str() == code) {
        return Err(eyre::eyre!(
            "expected product {code} on task {task_id}, found {:?}",
            view.products
        ));
    }
    Ok(())
}

#[then("the last registration skipped {count:usize} entry")]
fn registration_skipped(world: &AggregationWorld, count: usize) -> Result<(), eyre::Report> {
    let report = world
        .last_registration
        .ok_or_else(|| eyre::eyre!("missing registration report"))?;
    if report.skipped != count {
        return Err(eyre::eyre!(
            "expected {count} skipped entries, got {}",
            report.skipped
        ));
    }
    Ok(())
}

#[then("the store holds {count:usize} consignment")]
fn store_holds_consignments(world: &AggregationWorld, count: usize) -> Result<(), eyre::Report> {
    let stored = world
        .store
        .consignment_count()
        .wrap_err("count consignments")?;
    if stored != count {
        return Err(eyre::eyre!("expected {count} consignments, found {stored}"));
    }
    Ok(())
}
