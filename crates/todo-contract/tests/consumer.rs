use todo_contract::{
    Error, Pact,
    consumer::{Todo, TodoProxy},
    mock::MockProvider,
    pact::Interaction,
    todo_pact_path,
};

fn pact() -> Pact {
    Pact::load(todo_pact_path()).unwrap()
}

async fn mock_for(descriptions: &[&str]) -> MockProvider {
    let pact = pact();
    let interactions = descriptions
        .iter()
        .map(|d| pact.interaction(d).unwrap().clone())
        .collect();
    MockProvider::start(interactions).await.unwrap()
}

#[tokio::test]
async fn create_todo_returns_recorded_id() {
    let mock = mock_for(&["A request to create a todo"]).await;
    let proxy = TodoProxy::from_host_port("127.0.0.1", mock.port()).unwrap();

    let id = proxy
        .create_todo(&Todo {
            id: "7f1c6a52-3b0e-4c2f-9d7c-1d2f3a4b5c6d".to_string(),
            title: "Another todo".to_string(),
            description: "Another description".to_string(),
            completed: true,
        })
        .await
        .unwrap();

    assert_eq!(id, "id1");
    mock.verify().unwrap();
    mock.shutdown().await.unwrap();
}

#[tokio::test]
async fn list_todos_sends_limit_and_filter() {
    let mock = mock_for(&["A request to list incomplete todos"]).await;
    let proxy = TodoProxy::new(mock.base_url()).unwrap();

    let items = proxy.list_todos(10, true).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "ToDo A");
    mock.verify().unwrap();
    mock.shutdown().await.unwrap();
}

#[tokio::test]
async fn get_and_delete_follow_the_contract() {
    let mock = mock_for(&["A request for todo A", "A request to delete todo B"]).await;
    let proxy = TodoProxy::new(mock.base_url()).unwrap();

    let todo = proxy.get_todo("id1").await.unwrap();
    assert_eq!(todo.id, "id1");
    assert!(!todo.completed);

    proxy.delete_todo("id2").await.unwrap();

    mock.verify().unwrap();
    mock.shutdown().await.unwrap();
}

#[tokio::test]
async fn missing_todo_surfaces_status() {
    let mock = mock_for(&["A request for a todo that does not exist"]).await;
    let proxy = TodoProxy::new(mock.base_url()).unwrap();

    let err = proxy.get_todo("missing").await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedStatus { status: 404, .. }));
    mock.verify().unwrap();
    mock.shutdown().await.unwrap();
}

#[tokio::test]
async fn unmatched_requests_fail_verification() {
    let mock = mock_for(&["A request for todo A"]).await;
    let proxy = TodoProxy::new(mock.base_url()).unwrap();

    assert!(proxy.get_todo("id9").await.is_err());

    match mock.verify() {
        Err(Error::MockVerification {
            missing,
            unexpected,
        }) => {
            assert_eq!(missing, vec!["A request for todo A".to_string()]);
            assert_eq!(unexpected, vec!["GET /v1/todo/id9".to_string()]);
        }
        other => panic!("expected verification failure, got {other:?}"),
    }
    mock.shutdown().await.unwrap();
}

#[tokio::test]
async fn create_with_different_payload_is_unexpected() {
    let mock = mock_for(&["A request to create a todo"]).await;
    let proxy = TodoProxy::new(mock.base_url()).unwrap();

    let result = proxy
        .create_todo(&Todo {
            title: "Something else".to_string(),
            ..Default::default()
        })
        .await;

    assert!(result.is_err());
    assert!(mock.verify().is_err());
    mock.shutdown().await.unwrap();
}

fn interaction(json: &str) -> Interaction {
    serde_json::from_str(json).unwrap()
}

#[tokio::test]
async fn get_without_item_is_an_error() {
    let mock = MockProvider::start(vec![interaction(
        r#"{
            "description": "A todo response without an item",
            "request": {"method": "GET", "path": "/v1/todo/id1"},
            "response": {
                "status": 200,
                "headers": {"Content-Type": "application/json"},
                "body": {}
            }
        }"#,
    )])
    .await
    .unwrap();
    let proxy = TodoProxy::new(mock.base_url()).unwrap();

    let err = proxy.get_todo("id1").await.unwrap_err();
    assert!(matches!(err, Error::MissingField("item")), "{err:?}");
    mock.verify().unwrap();
    mock.shutdown().await.unwrap();
}

#[tokio::test]
async fn percent_encoded_query_matches_form_encoded_request() {
    let mock = MockProvider::start(vec![interaction(
        r#"{
            "description": "A search with a space",
            "request": {"method": "GET", "path": "/search", "query": "title=a%20b"},
            "response": {"status": 200, "body": {"ok": true}}
        }"#,
    )])
    .await
    .unwrap();

    let res = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
        .get(format!("{}/search", mock.base_url()))
        .query(&[("title", "a b")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    mock.verify().unwrap();
    mock.shutdown().await.unwrap();
}
