//! Reshaping of joined task rows into the denormalized view.

use crate::reconciliation::domain::{ConsignmentId, ProductCode, TaskRecord, TaskView};
use std::collections::HashMap;

impl From<TaskRecord> for TaskView {
    fn from(record: TaskRecord) -> Self {
        let TaskRecord {
            task,
            consignment,
            products,
        } = record;
        let key = consignment.key();
        Self {
            id: task.id,
            consignment_id: consignment.id(),
            close_status: task.close_status,
            name: task.name,
            line: task.line,
            shift: task.shift,
            brigade: task.brigade,
            consignment_number: key.number(),
            consignment_date: key.date(),
            nomenclature: task.nomenclature,
            code: task.code,
            identifier: task.identifier,
            started_at: task.started_at,
            completed_at: task.completed_at,
            closed_at: task.closed_at,
            products,
        }
    }
}

/// Groups `(consignment, product)` binding rows by consignment.
///
/// Row order within each consignment is preserved and repeated codes are
/// dropped.
#[must_use]
pub fn group_products<I>(rows: I) -> HashMap<ConsignmentId, Vec<ProductCode>>
where
    I: IntoIterator<Item = (ConsignmentId, ProductCode)>,
{
    let mut grouped: HashMap<ConsignmentId, Vec<ProductCode>> = HashMap::new();
    for (consignment_id, product) in rows {
        let products = grouped.entry(consignment_id).or_default();
        if !products.contains(&product) {
            products.push(product);
        }
    }
    grouped
}
