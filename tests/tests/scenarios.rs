//! Scripted scenarios over the orders and type-assignment scripts.

use quarry_tests::prelude::*;

mod orders {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("orders")
            .database("shop")
            .seed("orders/seed.sql")
            .operations("orders/queries.sql")
            .step("all_orders", |a| {
                a.columns(&["id", "customer", "qty", "price", "shipped"])
                    .rows(4)
                    .contains(row![4, "carol", 3, 4.0, None::<bool>])
            })
            .step("by_customer", |a| {
                a.returns(vec![row![1, 2], row![3, 5]]).ordered()
            })
            .step("totals", |a| {
                a.columns(&["id", "total"])
                    .returns(vec![row![2, 20.0], row![1, 19.0]])
                    .ordered()
            })
            .step("unshipped", |a| a.returns(vec![row![2], row![4]]).ordered())
            .step("nothing", |a| a.empty())
            .step("qualified", |a| a.value("bob"))
            .step("notes_empty", |a| a.columns(&["id", "body"]).empty())
            .step("unknown_column", |a| a.error_code(ResultCode::UndefinedColumn))
            .step("unknown_table", |a| a.error_code(ResultCode::UndefinedTable))
            .step("syntax", |a| a.error_code(ResultCode::SyntaxError))
            .step("division", |a| {
                a.error_code(ResultCode::DivisionByZero)
                    .error_matches(r"query q_\S+ failed")
            })
    }

    #[test]
    fn test_orders_queries() {
        let _ = env_logger::try_init();
        scenario().run().unwrap();
    }

    #[test]
    fn test_orders_queries_with_latency() {
        scenario().execution_latency(3).run().unwrap();
    }
}

mod types {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("types")
            .operations("types/assignments.sql")
            .step("create", |a| a.empty())
            .step("insert_ok", |a| a.ok())
            .step("float_into_int", |a| a.error_code(ResultCode::DatatypeMismatch))
            .step("string_into_int", |a| a.error_code(ResultCode::DatatypeMismatch))
            .step("string_too_long", |a| a.error_code(ResultCode::DatatypeMismatch))
            .step("bare_identifier", |a| a.error_code(ResultCode::UndefinedColumn))
            .step("too_many_values", |a| a.error_code(ResultCode::DatatypeMismatch))
            .step("only_valid_row", |a| a.returns(vec![row![7, "T"]]))
            .step("duplicate_table", |a| a.error_code(ResultCode::DuplicateTable))
            .step("create_if_not_exists", |a| a.ok())
            .step("drop", |a| a.ok())
            .step("dropped", |a| a.error_code(ResultCode::UndefinedTable))
            .step("drop_if_exists", |a| a.ok())
    }

    #[test]
    fn test_value_assignment_rules() {
        scenario().run().unwrap();
    }
}
