//! Query submission, status tracking and results through the public client.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quarry_client::{ClientConfig, ClientError, QuarryClient, QueryId, QueryState, ResultCode};
use quarry_core::row;
use quarry_service::{CoordinatorConfig, InMemoryCoordinator, LocalServiceTracker};
use quarry_tests::runner::standalone_client;

fn client_with_latency(polls: u32) -> (LocalServiceTracker, QuarryClient) {
    let coordinator = InMemoryCoordinator::with_config(
        CoordinatorConfig::new().with_execution_latency(polls),
    );
    let tracker = LocalServiceTracker::new(Arc::new(coordinator));
    let config = ClientConfig::new()
        .with_poll_interval_ms(1)
        .with_max_poll_interval_ms(4);
    let client = QuarryClient::connect_with_config(&tracker, None, config).unwrap();
    (tracker, client)
}

#[test]
fn test_submission_reports_result_codes() {
    let _ = env_logger::try_init();

    // GIVEN
    let (_tracker, client) = standalone_client().unwrap();

    // WHEN/THEN
    assert_eq!(
        client.execute_query("").unwrap().result_code,
        ResultCode::InternalError
    );
    assert_eq!(
        client.execute_query("CREATE TABL t (a int)").unwrap().result_code,
        ResultCode::SyntaxError
    );
    assert_eq!(
        client.execute_query("CREATE TABLE t (a1 int, a2 char)").unwrap().result_code,
        ResultCode::Ok
    );
    assert_eq!(
        client.execute_query("INSERT INTO t VALUES (a3, 'x')").unwrap().result_code,
        ResultCode::UndefinedColumn
    );
    assert_eq!(
        client.execute_query("INSERT INTO t VALUES (7, 'T')").unwrap().result_code,
        ResultCode::Ok
    );
}

#[test]
fn test_execute_and_get_result_after_insert() {
    // GIVEN
    let (_tracker, client) = standalone_client().unwrap();
    client
        .execute_query_and_get_result("CREATE TABLE t (a1 int, a2 char)")
        .unwrap();
    client
        .execute_query_and_get_result("INSERT INTO t VALUES (7, 'T')")
        .unwrap();

    // WHEN
    let mut result = client.execute_query_and_get_result("SELECT * FROM t;").unwrap();

    // THEN
    assert!(result.advance().unwrap());
    assert_eq!(result.row(), Some(&row![7, "T"]));
    assert_eq!(result.get_int(result.find_column("a1").unwrap()).unwrap(), Some(7));
    assert!(!result.advance().unwrap());
}

#[test]
fn test_status_progresses_monotonically() {
    // GIVEN
    let (_tracker, client) = client_with_latency(3);
    let response = client.execute_query("SELECT 1 AS one").unwrap();
    assert_eq!(response.state, QueryState::Submitted);

    // WHEN
    let statuses: Vec<_> = (0..8)
        .map(|_| client.get_query_status(&response.query_id).unwrap())
        .collect();

    // THEN
    for pair in statuses.windows(2) {
        let (before, after) = (pair[0].state, pair[1].state);
        assert!(before == after || before.can_transition_to(after));
        assert!(pair[0].progress <= pair[1].progress);
    }
    let last = statuses.last().unwrap();
    assert_eq!(last.state, QueryState::Succeeded);
    assert_eq!(last.progress, 1.0);
    assert_eq!(last.error_code, ResultCode::Ok);
}

#[test]
fn test_result_of_finished_query() {
    // GIVEN
    let (_tracker, client) = client_with_latency(1);
    let id = client.execute_query("SELECT 40 + 2").unwrap().query_id;

    // WHEN
    let early = client.get_query_result(&id);
    let status = client.wait_for_completion(&id).unwrap();
    let mut result = client.get_query_result(&id).unwrap();

    // THEN
    assert!(matches!(early, Err(ClientError::InvalidArgument { .. })));
    assert_eq!(status.state, QueryState::Succeeded);
    assert!(result.advance().unwrap());
    assert_eq!(result.get_long(0).unwrap(), Some(42));
}

#[test]
fn test_killed_query_is_terminal() {
    // GIVEN
    let (_tracker, client) = client_with_latency(50);
    let id = client.execute_query("SELECT 1").unwrap().query_id;

    // WHEN
    let state = client.kill_query(&id).unwrap();

    // THEN
    assert_eq!(state, QueryState::Killed);
    let status = client.get_query_status(&id).unwrap();
    assert_eq!(status.state, QueryState::Killed);
    assert_eq!(status.error_code, ResultCode::QueryKilled);
    assert_eq!(client.kill_query(&id).unwrap(), QueryState::Killed);
    assert_eq!(
        client.wait_for_completion(&id).unwrap().state,
        QueryState::Killed
    );
}

#[test]
fn test_queries_belong_to_their_session() {
    // GIVEN
    let tracker = LocalServiceTracker::standalone();
    let owner = QuarryClient::connect(&tracker, None, Default::default()).unwrap();
    let other = QuarryClient::connect(&tracker, None, Default::default()).unwrap();
    let id = owner.execute_query("SELECT 1").unwrap().query_id;

    // WHEN
    let err = other.get_query_status(&id).unwrap_err();

    // THEN
    assert_eq!(
        err,
        ClientError::QueryNotFound {
            query_id: id.to_string()
        }
    );
    assert!(owner.get_query_status(&id).is_ok());
}

#[test]
fn test_script_runs_every_statement() {
    // GIVEN
    let (_tracker, client) = standalone_client().unwrap();

    // WHEN
    let mut result = client
        .execute_query_and_get_result(
            "CREATE TABLE s (v int); INSERT INTO s VALUES (1), (2); SELECT v FROM s ORDER BY v",
        )
        .unwrap();

    // THEN
    let rows = result.collect_rows().unwrap();
    assert_eq!(rows, vec![row![1], row![2]]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_malformed_ids_are_not_found(context in "[a-z0-9]{0,12}", seq in i32::MIN..0) {
        let (tracker, client) = standalone_client().unwrap();
        let before = tracker.coordinator().request_count();

        let ids = [
            QueryId::new(context, seq),
            QueryId::new("", seq.saturating_neg()),
            QueryId::from_parts(None, seq),
        ];
        for id in ids {
            let is_not_found = matches!(
                client.get_query_status(&id),
                Err(ClientError::QueryNotFound { .. })
            );
            prop_assert!(is_not_found);
        }
        prop_assert_eq!(tracker.coordinator().request_count(), before);
    }

    #[test]
    fn prop_unknown_ids_are_not_found(context in "[a-z0-9]{1,12}", seq in 0i32..10_000) {
        let (_tracker, client) = standalone_client().unwrap();
        let id = QueryId::new(context, seq);
        let err = client.get_query_status(&id).unwrap_err();
        prop_assert_eq!(err.code(), ResultCode::QueryNotFound);
    }
}
