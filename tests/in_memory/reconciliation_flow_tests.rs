//! End-to-end flows through the reconciliation service.

use std::sync::Arc;

use super::helpers::{TestService, at, consignment, now, product, service, shift_task};
use eyre::WrapErr;
use rstest::rstest;
use serde_json::json;
use shiftdesk::reconciliation::{
    adapters::memory::InMemoryReconciliationStore,
    domain::{ProductCode, TaskInput, TaskPatch},
    services::ReconciliationError,
};

type Harness = (Arc<InMemoryReconciliationStore>, TestService);

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ingested_payload_round_trips_through_task_view(
    service: Harness,
) -> Result<(), eyre::Report> {
    let (_, service) = service;
    let payload: Vec<TaskInput> = serde_json::from_value(json!([{
        "СтатусЗакрытия": false,
        "ПредставлениеЗаданияНаСмену": "Shift task 1",
        "Рабочий центр": "Line 3",
        "Смена": "2",
        "Бригада": "Brigade 4",
        "НомерПартии": 22222,
        "ДатаПартии": "2024-01-30",
        "Номенклатура": "Sparkling water 1.5 l",
        "КодЕКН": "456678",
        "ИдентификаторРЦ": "A",
        "ДатаВремяНачалаСмены": "2024-01-30T20:00:00+05:00",
        "ДатаВремяОкончанияСмены": "2024-01-31T08:00:00+05:00"
    }]))?;

    let ids = service.ingest_tasks(payload.clone()).await?;
    let task_id = *ids.first().ok_or_else(|| eyre::eyre!("no task stored"))?;
    let view = service.get_task(task_id).await?;

    let input = payload
        .first()
        .ok_or_else(|| eyre::eyre!("empty payload"))?;
    assert_eq!(view.id, task_id);
    assert_eq!(view.close_status, input.close_status);
    assert_eq!(view.name, input.name);
    assert_eq!(view.line, input.line);
    assert_eq!(view.shift, input.shift);
    assert_eq!(view.brigade, input.brigade);
    assert_eq!(view.consignment_number, input.consignment_number);
    assert_eq!(view.consignment_date, input.consignment_date);
    assert_eq!(view.nomenclature, input.nomenclature);
    assert_eq!(view.code, input.code);
    assert_eq!(view.identifier, input.identifier);
    assert_eq!(view.started_at, input.started_at);
    assert_eq!(view.completed_at, input.completed_at);
    assert_eq!(view.closed_at, None);
    assert!(view.products.is_empty());

    // Wire values, not just input-to-view equality.
    assert!(!view.close_status);
    assert_eq!(
        (view.shift.as_str(), view.brigade.as_str(), view.identifier.as_str()),
        ("2", "Brigade 4", "A")
    );
    assert_eq!(view.consignment_number, 22222);
    assert_eq!(view.consignment_date, at(2024, 1, 30, 0, 0).date());
    assert_eq!(view.started_at, at(2024, 1, 30, 20, 0));
    assert_eq!(view.completed_at, at(2024, 1, 31, 8, 0));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn many_tasks_for_one_key_create_one_consignment(
    service: Harness,
) -> Result<(), eyre::Report> {
    let (store, service) = service;
    let batch = (0..5)
        .map(|n| shift_task(&format!("Task {n}"), consignment(22222)))
        .collect();

    let ids = service.ingest_tasks(batch).await?;

    assert_eq!(ids.len(), 5);
    assert_eq!(store.consignment_count()?, 1);
    assert_eq!(store.task_count()?, 5);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_insert_rolls_back_whole_batch(service: Harness) -> Result<(), eyre::Report> {
    let (store, service) = service;
    service
        .ingest_tasks(vec![shift_task("Existing", consignment(1))])
        .await?;
    store.fail_task_inserts_after(2)?;

    let result = service
        .ingest_tasks(vec![
            shift_task("A", consignment(2)),
            shift_task("B", consignment(3)),
            shift_task("C", consignment(4)),
        ])
        .await;

    assert!(matches!(result, Err(ReconciliationError::Storage(_))));
    assert_eq!(store.task_count()?, 1);
    assert_eq!(store.consignment_count()?, 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closing_then_reopening_keeps_closing_time(service: Harness) -> Result<(), eyre::Report> {
    let (_, service) = service;
    let ids = service
        .ingest_tasks(vec![shift_task("A", consignment(1))])
        .await?;
    let task_id = *ids.first().ok_or_else(|| eyre::eyre!("no task stored"))?;

    let closed = service
        .update_task(
            task_id,
            serde_json::from_value::<TaskPatch>(json!({ "close_status": true }))?,
        )
        .await
        .wrap_err("close task")?;
    let reopened = service
        .update_task(
            task_id,
            serde_json::from_value::<TaskPatch>(json!({ "close_status": false }))?,
        )
        .await
        .wrap_err("reopen task")?;

    assert_eq!(closed.closed_at, Some(now()));
    assert!(!reopened.close_status);
    assert_eq!(reopened.closed_at, Some(now()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registration_then_aggregation_flow(service: Harness) -> Result<(), eyre::Report> {
    let (store, service) = service;
    service
        .ingest_tasks(vec![shift_task("A", consignment(7))])
        .await?;
    let consignment_id = service.resolve_consignment(consignment(7)).await?;

    let report = service
        .register_products(vec![
            product("P-1", consignment(7))?,
            product("P-1", consignment(7))?,
            product("P-2", consignment(8))?,
        ])
        .await?;
    service
        .aggregate_product(consignment_id, ProductCode::new("P-1")?)
        .await?;

    assert_eq!(report.bound, 1);
    assert_eq!(report.already_bound, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(store.binding_count()?, 1);
    Ok(())
}
