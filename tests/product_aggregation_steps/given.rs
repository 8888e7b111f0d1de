//! Given steps for product aggregation BDD scenarios.

use super::world::{AggregationWorld, consignment_key, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use shiftdesk::reconciliation::domain::{ProductCode, ProductInput, TaskInput};

#[given(r#"a shift task for consignment {number:i32} dated "{date}""#)]
fn shift_task_for_consignment(
    world: &mut AggregationWorld,
    number: i32,
    date: String,
) -> Result<(), eyre::Report> {
    let key = consignment_key(number, &date)?;
    let shift_day = |hour: u32| {
        key.date()
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| eyre::eyre!("invalid shift hour {hour}"))
    };
    let task = TaskInput {
        close_status: false,
        name: format!("Shift task for {key}"),
        line: "Line 1".to_owned(),
        shift: "1".to_owned(),
        brigade: "Brigade 1".to_owned(),
        consignment_number: key.number(),
        consignment_date: key.date(),
        nomenclature: "Bottled water 0.5 l".to_owned(),
        code: "12345678".to_owned(),
        identifier: "WC-01".to_owned(),
        started_at: shift_day(8)?,
        completed_at: shift_day(20)?,
    };
    let ids = run_async(world.service.ingest_tasks(vec![task])).wrap_err("ingest shift task")?;
    if world.task_id.is_none() {
        world.task_id = ids.first().copied();
    }
    Ok(())
}

#[given(r#"product "{code}" is registered for consignment {number:i32} dated "{date}""#)]
fn product_registered(
    world: &mut AggregationWorld,
    code: String,
    number: i32,
    date: String,
) -> Result<(), eyre::Report> {
    let product = ProductCode::new(code).wrap_err("build product code")?;
    let entry = ProductInput::new(product, consignment_key(number, &date)?);
    let report =
        run_async(world.service.register_products(vec![entry])).wrap_err("register product")?;
    world.last_registration = Some(report);
    Ok(())
}

#[given(r#"product "{code}" has been aggregated into consignment {number:i32} dated "{date}""#)]
fn product_already_aggregated(
    world: &mut AggregationWorld,
    code: String,
    number: i32,
    date: String,
) -> Result<(), eyre::Report> {
    let key = consignment_key(number, &date)?;
    let consignment_id = run_async(world.service.resolve_consignment(key))
        .wrap_err("resolve consignment for aggregation")?;
    let product = ProductCode::new(code).wrap_err("build product code")?;
    run_async(world.service.aggregate_product(consignment_id, product))
        .wrap_err("aggregate product in scenario setup")?;
    Ok(())
}

