//! Diesel schema for consignment reconciliation persistence.

diesel::table! {
    /// Production batches keyed by number and date.
    consignments (id) {
        /// Generated consignment identifier.
        id -> Int4,
        /// Batch number.
        consignment_number -> Int4,
        /// Batch date.
        consignment_date -> Date,
    }
}

diesel::table! {
    /// Shift tasks, each bound to one consignment.
    shift_tasks (id) {
        /// Generated task identifier.
        id -> Int4,
        /// Close flag.
        close_status -> Bool,
        /// Task title.
        name -> Varchar,
        /// Production line.
        line -> Varchar,
        /// Shift label.
        shift -> Varchar,
        /// Crew label.
        brigade -> Varchar,
        /// Nomenclature description.
        nomenclature -> Varchar,
        /// Unified catalogue code.
        code -> Varchar,
        /// Work centre identifier.
        identifier -> Varchar,
        /// Shift start (naive).
        started_at -> Timestamp,
        /// Shift end (naive).
        completed_at -> Timestamp,
        /// Owning consignment.
        consignment_id -> Int4,
        /// Closing time, set once.
        closed_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    /// Products keyed by their external code.
    products (product_id) {
        /// External product code.
        product_id -> Varchar,
    }
}

diesel::table! {
    /// Product-to-consignment bindings with aggregation state.
    products_to_consignments (id) {
        /// Generated binding identifier.
        id -> Int4,
        /// Bound product.
        product_id -> Varchar,
        /// Bound consignment.
        consignment_id -> Int4,
        /// Aggregation flag.
        is_aggregated -> Bool,
        /// Aggregation time.
        aggregated_at -> Nullable<Timestamp>,
    }
}

diesel::joinable!(shift_tasks -> consignments (consignment_id));
diesel::joinable!(products_to_consignments -> consignments (consignment_id));
diesel::joinable!(products_to_consignments -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(
    consignments,
    shift_tasks,
    products,
    products_to_consignments,
);
