//! End-to-end runs of authenticate -> query -> report -> persist against a
//! mock org.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sfcases::auth::store::{CLIENT_ID, CLIENT_SECRET, INSTANCE_URL, SESSION_ID};
use sfcases::auth::{
    AttemptStatus, AuthMethod, Authenticator, BrowserLauncher, CredentialStore, ErrorKind,
};
use sfcases::cases::{fetch_cases, CaseQuery};
use sfcases::client::ClientConfig;
use sfcases::report::{render_report, write_results};

fn quiet_config() -> ClientConfig {
    ClientConfig::default().with_request_logging(false)
}

fn recording_browser(flag: Arc<AtomicBool>) -> BrowserLauncher {
    Arc::new(move |_url: &str| {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    })
}

fn case(id: &str, number: &str, status: &str, created: &str) -> Value {
    json!({
        "attributes": {
            "type": "Case",
            "url": format!("/services/data/v62.0/sobjects/Case/{id}")
        },
        "Id": id,
        "CaseNumber": number,
        "Subject": format!("Sync job {number} stuck"),
        "Status": status,
        "Priority": "Medium",
        "CreatedDate": created,
        "LastModifiedDate": created,
        "Description": "Integration Service connector keeps retrying.",
        "Type": "Integration Service",
        "Account": {
            "attributes": {"type": "Account", "url": "/services/data/v62.0/sobjects/Account/001A"},
            "Name": "Acme"
        },
        "Owner": {
            "attributes": {"type": "Name", "url": "/services/data/v62.0/sobjects/User/005A"},
            "Name": "Pat Doe"
        }
    })
}

async fn mount_session_check(server: &MockServer, status: u16) {
    let body = if status == 200 {
        json!({"query": "/services/data/v62.0/query"})
    } else {
        json!([{"errorCode": "INVALID_SESSION_ID", "message": "Session expired or invalid"}])
    };

    Mock::given(method("GET"))
        .and(path("/services/data/v62.0/"))
        .and(header("Authorization", "Bearer 00Dxx!sid"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_query(server: &MockServer, days: u32, records: Vec<Value>) {
    let soql = CaseQuery::new(i64::from(days)).unwrap().soql().unwrap();
    Mock::given(method("GET"))
        .and(path("/services/data/v62.0/query"))
        .and(query_param("q", soql.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": records.len(),
            "done": true,
            "records": records
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn session_store(server: &MockServer) -> Vec<(&'static str, String)> {
    vec![
        (SESSION_ID, "00Dxx!sid".to_string()),
        (INSTANCE_URL, server.uri()),
    ]
}

#[tokio::test]
async fn test_session_id_login_groups_and_persists() {
    let server = MockServer::start().await;
    mount_session_check(&server, 200).await;

    let records = vec![
        case("500A", "00001001", "New", "2024-05-03T08:00:00.000+0000"),
        case("500B", "00001002", "New", "2024-05-02T08:00:00.000+0000"),
        case("500C", "00001003", "Closed", "2024-05-01T08:00:00.000+0000"),
    ];
    mount_query(&server, 14, records.clone()).await;

    let mut pairs = session_store(&server);
    pairs.push((CLIENT_ID, "consumer-key".to_string()));
    pairs.push((CLIENT_SECRET, "consumer-secret".to_string()));
    let store = CredentialStore::from_pairs(pairs);

    let browser_opened = Arc::new(AtomicBool::new(false));
    let auth = Authenticator::standard(quiet_config(), recording_browser(browser_opened.clone()));

    let outcome = auth.authenticate(&store).await;
    let session = outcome.result.as_ref().unwrap();

    assert_eq!(session.method(), AuthMethod::SessionId);
    assert!(matches!(
        outcome.status_of(AuthMethod::UsernamePassword),
        Some(AttemptStatus::Skipped { .. })
    ));
    assert_eq!(outcome.status_of(AuthMethod::OAuth), None);
    assert!(!browser_opened.load(Ordering::SeqCst));

    let query = CaseQuery::new(14).unwrap();
    let result = fetch_cases(session, &query).await.unwrap();
    assert_eq!(result.total_size, 3);

    let mut out = Vec::new();
    render_report(&mut out, &result, query.days()).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Integration Service Cases - Last 14 Day(s)"));
    let closed = text.find("## Closed (1 case(s))").unwrap();
    let new = text.find("## New (2 case(s))").unwrap();
    assert!(closed < new);
    assert!(text.find("00001001").unwrap() < text.find("00001002").unwrap());
    assert!(text.contains("  Owner: Pat Doe"));
    assert!(text.contains("  Account: Acme"));

    let dir = tempfile::tempdir().unwrap();
    let saved = write_results(dir.path(), &result.records, &Local::now()).unwrap();
    let name = saved.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("salesforce_cases_") && name.ends_with(".json"));

    let persisted: Value =
        serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(persisted, Value::Array(records));
}

#[tokio::test]
async fn test_zero_days_empty_result() {
    let server = MockServer::start().await;
    mount_session_check(&server, 200).await;
    mount_query(&server, 0, vec![]).await;

    let store = CredentialStore::from_pairs(session_store(&server));
    let auth = Authenticator::standard(quiet_config(), recording_browser(Arc::default()));
    let session = auth.authenticate(&store).await.result.unwrap();

    let query = CaseQuery::new(0).unwrap();
    let result = fetch_cases(&session, &query).await.unwrap();
    assert!(result.is_empty());

    let mut out = Vec::new();
    render_report(&mut out, &result, query.days()).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Total Cases Found: 0"));
    assert!(text.contains("No cases found."));
}

#[tokio::test]
async fn test_rejected_session_without_oauth_config_fails_everything() {
    let server = MockServer::start().await;
    mount_session_check(&server, 401).await;

    let store = CredentialStore::from_pairs(session_store(&server));
    let auth = Authenticator::standard(quiet_config(), recording_browser(Arc::default()));
    let outcome = auth.authenticate(&store).await;

    let err = outcome.result.as_ref().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::AllStrategiesFailed));
    assert!(matches!(
        outcome.status_of(AuthMethod::SessionId),
        Some(AttemptStatus::Failed(_))
    ));
    assert!(matches!(
        outcome.status_of(AuthMethod::OAuth),
        Some(AttemptStatus::Skipped { .. })
    ));
}

#[test]
fn test_negative_days_rejected_before_any_call() {
    let err = CaseQuery::new(-3).unwrap_err();
    assert!(matches!(err.kind, sfcases::ErrorKind::InvalidInput(_)));
}
