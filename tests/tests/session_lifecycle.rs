//! Session creation, database selection, variables and release.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use quarry_client::{ClientError, KeyValueSet, QuarryClient, ResultCode, SessionConnection};
use quarry_core::CURRENT_DATABASE_VAR;
use quarry_service::{LocalServiceTracker, UnreachableServiceTracker};
use quarry_tests::runner::standalone_client;

#[test]
fn test_selected_database_is_visible_immediately() {
    let _ = env_logger::try_init();

    // GIVEN
    let (_tracker, client) = standalone_client().unwrap();
    let before = client.get_session_variable(CURRENT_DATABASE_VAR);
    assert!(matches!(
        before,
        Err(ClientError::NoSuchSessionVariable { .. })
    ));

    // WHEN
    client.create_database("db2").unwrap();
    client.select_database("db2").unwrap();

    // THEN
    assert_eq!(client.get_session_variable(CURRENT_DATABASE_VAR).unwrap(), "db2");
    assert_eq!(client.current_database(), "db2");
    assert_eq!(client.catalog().connection().current_database(), "db2");
}

#[test]
fn test_base_database_sets_variable() {
    let tracker = LocalServiceTracker::standalone();
    let client = QuarryClient::connect(&tracker, Some("default"), KeyValueSet::new()).unwrap();

    assert_eq!(
        client.get_session_variable(CURRENT_DATABASE_VAR).unwrap(),
        "default"
    );
}

#[test]
fn test_select_unknown_database_keeps_current() {
    let (_tracker, client) = standalone_client().unwrap();

    let err = client.select_database("nowhere").unwrap_err();

    assert_eq!(err, ClientError::UndefinedDatabase { name: "nowhere".into() });
    assert_eq!(client.current_database(), "default");
}

#[test]
fn test_variable_updates() {
    // GIVEN
    let (_tracker, client) = standalone_client().unwrap();
    client.create_database("db3").unwrap();
    let mut vars = KeyValueSet::new();
    vars.insert("timezone".into(), "UTC".into());
    vars.insert(CURRENT_DATABASE_VAR.into(), "db3".into());

    // WHEN
    let all = client.update_session_variables(&vars).unwrap();

    // THEN
    assert_eq!(all.get("timezone").map(String::as_str), Some("UTC"));
    assert_eq!(client.current_database(), "db3");
    client.unset_session_variables(&["timezone"]).unwrap();
    assert!(!client.exist_session_variable("timezone").unwrap());
    assert_eq!(
        client.get_session_variable("timezone"),
        Err(ClientError::NoSuchSessionVariable {
            name: "timezone".into()
        })
    );
}

#[test]
fn test_unreachable_coordinator() {
    let tracker = UnreachableServiceTracker::new("quarry://10.0.0.9:26002");

    let err = QuarryClient::connect(&tracker, None, KeyValueSet::new()).unwrap_err();

    assert!(matches!(err, ClientError::Internal { .. }));
    assert_eq!(err.code(), ResultCode::ClientConnectionNotAvailable);
}

#[test]
fn test_close_releases_session_on_every_path() {
    // GIVEN
    let tracker = LocalServiceTracker::standalone();
    let client = QuarryClient::connect(&tracker, None, KeyValueSet::new()).unwrap();
    assert!(client.drop_database("default").is_err());
    assert!(client.execute_query_and_get_result("SELEC").is_err());

    // WHEN
    client.close();
    client.close();

    // THEN
    assert_eq!(tracker.coordinator().session_count(), 0);
    assert_eq!(client.get_all_database_names(), Err(ClientError::SessionClosed));
    assert_eq!(
        client.get_query_status(&quarry_client::QueryId::new("x", 1)),
        Err(ClientError::SessionClosed)
    );
}

#[test]
fn test_sessions_are_isolated() {
    // GIVEN
    let tracker = LocalServiceTracker::standalone();
    let first = Arc::new(SessionConnection::open(&tracker, None, KeyValueSet::new()).unwrap());
    let second = QuarryClient::connect(&tracker, None, KeyValueSet::new()).unwrap();
    let client = QuarryClient::from_connection(first.clone());

    // WHEN
    client.create_database("mine").unwrap();
    client.select_database("mine").unwrap();

    // THEN
    assert_eq!(first.current_database(), "mine");
    assert_eq!(second.current_database(), "default");
    assert_eq!(tracker.coordinator().session_count(), 2);
}

#[test]
fn test_client_properties_configure_the_session() {
    // GIVEN
    let tracker = LocalServiceTracker::standalone();
    let mut properties = KeyValueSet::new();
    properties.insert("quarry.client.fetch-rows".into(), "1".into());
    properties.insert("quarry.client.user".into(), "reporter".into());

    // WHEN
    let client = QuarryClient::connect(&tracker, None, properties).unwrap();

    // THEN
    assert_eq!(client.connection().config().fetch_rows, 1);
    assert_eq!(client.connection().config().user, "reporter");

    let mut bad = KeyValueSet::new();
    bad.insert("quarry.client.max-poll-attempts".into(), "0".into());
    assert!(matches!(
        QuarryClient::connect(&tracker, None, bad),
        Err(ClientError::InvalidArgument { .. })
    ));
}

#[test]
fn test_standalone_helper() {
    let (tracker, client) = standalone_client().unwrap();
    assert!(!client.is_closed());
    assert_eq!(tracker.coordinator().session_count(), 1);
}
