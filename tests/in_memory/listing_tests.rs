//! Filtered listings across several consignments.

use std::sync::Arc;

use super::helpers::{TestService, at, consignment, product, service, shift_task};
use rstest::rstest;
use shiftdesk::reconciliation::{
    adapters::memory::InMemoryReconciliationStore,
    domain::TaskView,
    query::{Page, TaskQuery},
};

type Harness = (Arc<InMemoryReconciliationStore>, TestService);

async fn seed(service: &TestService) -> Result<(), eyre::Report> {
    let mut night = shift_task("Night", consignment(2));
    night.started_at = at(2024, 1, 30, 20, 0);
    night.completed_at = at(2024, 1, 31, 8, 0);
    service
        .ingest_tasks(vec![
            shift_task("Day", consignment(1)),
            night,
            shift_task("Day again", consignment(1)),
        ])
        .await?;
    service
        .register_products(vec![
            product("P-10", consignment(1))?,
            product("P-11", consignment(1))?,
            product("P-20", consignment(2))?,
        ])
        .await?;
    Ok(())
}

fn names(views: &[TaskView]) -> Vec<&str> {
    views.iter().map(|view| view.name.as_str()).collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn products_are_listed_once_per_task(service: Harness) -> Result<(), eyre::Report> {
    let (_, service) = service;
    seed(&service).await?;

    let views = service
        .list_tasks(TaskQuery::new().with_consignment_number(1), Page::default())
        .await?;

    assert_eq!(names(&views), vec!["Day", "Day again"]);
    for view in &views {
        let codes: Vec<&str> = view.products.iter().map(|code| code.as_str()).collect();
        assert_eq!(codes, vec!["P-10", "P-11"]);
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pagination_is_stable_across_pages(service: Harness) -> Result<(), eyre::Report> {
    let (_, service) = service;
    seed(&service).await?;

    let first = service
        .list_tasks(TaskQuery::new(), Page::new(0, 2))
        .await?;
    let second = service
        .list_tasks(TaskQuery::new(), Page::new(2, 2))
        .await?;

    assert_eq!(names(&first), vec!["Day", "Night"]);
    assert_eq!(names(&second), vec!["Day again"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn end_date_uses_completion_day(service: Harness) -> Result<(), eyre::Report> {
    let (_, service) = service;
    seed(&service).await?;

    let views = service
        .list_tasks(
            TaskQuery::new().with_end_date(at(2024, 1, 30, 0, 0).date()),
            Page::default(),
        )
        .await?;

    assert_eq!(names(&views), vec!["Day", "Day again"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_date_in_the_future_matches_nothing(service: Harness) -> Result<(), eyre::Report> {
    let (_, service) = service;
    seed(&service).await?;

    let views = service
        .list_tasks(
            TaskQuery::new().with_start_date(at(2024, 1, 31, 0, 0).date()),
            Page::default(),
        )
        .await?;

    assert!(views.is_empty());
    Ok(())
}
