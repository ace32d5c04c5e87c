use todo_core::{Error, proto::Todo};
use todo_server::store::{MemoryStore, SqlStore, StoreConfig, TodoStore};
use uuid::Uuid;

fn meeting() -> Todo {
    Todo {
        id: Uuid::new_v4().to_string(),
        title: "meeting".to_string(),
        description: String::new(),
        completed: false,
    }
}

async fn sql_store() -> SqlStore {
    SqlStore::connect(&StoreConfig::in_memory()).await.unwrap()
}

async fn run_insert_then_get_round_trips(store: &dyn TodoStore) {
    let item = Todo {
        description: "weekly sync".to_string(),
        completed: true,
        ..meeting()
    };
    store.insert(item.clone()).await.unwrap();

    let found = store.get(&item.id).await.unwrap();
    assert_eq!(found, item);
}

async fn run_duplicate_insert_conflicts(store: &dyn TodoStore) {
    let item = meeting();
    store.insert(item.clone()).await.unwrap();

    let err = store.insert(item.clone()).await.unwrap_err();
    assert_eq!(err, Error::Conflict { id: item.id });
}

async fn run_get_missing_is_not_found(store: &dyn TodoStore) {
    let err = store.get("does-not-exist").await.unwrap_err();
    assert_eq!(err, Error::not_found("does-not-exist"));
}

async fn run_list_filters_by_completion(store: &dyn TodoStore) {
    let item = meeting();
    store.insert(item.clone()).await.unwrap();

    let completed = store.list(Some(10), true).await.unwrap();
    assert!(completed.is_empty());

    let open = store.list(Some(10), false).await.unwrap();
    assert_eq!(open, vec![item]);
}

async fn run_list_respects_limit_and_order(store: &dyn TodoStore) {
    let items: Vec<Todo> = (0..5)
        .map(|i| Todo {
            id: format!("id{i}"),
            title: format!("todo {i}"),
            ..Default::default()
        })
        .collect();
    for item in &items {
        store.insert(item.clone()).await.unwrap();
    }

    let listed = store.list(Some(3), false).await.unwrap();
    assert_eq!(listed, items[..3]);

    let all = store.list(None, false).await.unwrap();
    assert_eq!(all, items);
}

async fn run_delete_then_get_is_not_found(store: &dyn TodoStore) {
    let item = meeting();
    store.insert(item.clone()).await.unwrap();

    store.delete(&item.id).await.unwrap();

    assert_eq!(store.get(&item.id).await.unwrap_err(), Error::not_found(&item.id));
    assert_eq!(store.delete(&item.id).await.unwrap_err(), Error::not_found(&item.id));
}

#[tokio::test]
async fn sql_insert_then_get_round_trips() {
    run_insert_then_get_round_trips(&sql_store().await).await;
}

#[tokio::test]
async fn memory_insert_then_get_round_trips() {
    run_insert_then_get_round_trips(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sql_duplicate_insert_conflicts() {
    run_duplicate_insert_conflicts(&sql_store().await).await;
}

#[tokio::test]
async fn memory_duplicate_insert_conflicts() {
    run_duplicate_insert_conflicts(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sql_get_missing_is_not_found() {
    run_get_missing_is_not_found(&sql_store().await).await;
}

#[tokio::test]
async fn memory_get_missing_is_not_found() {
    run_get_missing_is_not_found(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sql_list_filters_by_completion() {
    run_list_filters_by_completion(&sql_store().await).await;
}

#[tokio::test]
async fn memory_list_filters_by_completion() {
    run_list_filters_by_completion(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sql_list_respects_limit_and_order() {
    run_list_respects_limit_and_order(&sql_store().await).await;
}

#[tokio::test]
async fn memory_list_respects_limit_and_order() {
    run_list_respects_limit_and_order(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sql_delete_then_get_is_not_found() {
    run_delete_then_get_is_not_found(&sql_store().await).await;
}

#[tokio::test]
async fn memory_delete_then_get_is_not_found() {
    run_delete_then_get_is_not_found(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sql_store_persists_across_reconnects() {
    let dir = std::env::temp_dir().join(format!("todo-store-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let config = StoreConfig {
        database_url: format!("sqlite://{}", dir.join("todo.db").display()),
        ..StoreConfig::in_memory()
    };

    let item = meeting();
    {
        let store = SqlStore::connect(&config).await.unwrap();
        store.insert(item.clone()).await.unwrap();
        store.close().await;
    }

    let store = SqlStore::connect(&config).await.unwrap();
    assert_eq!(store.get(&item.id).await.unwrap(), item);
    store.close().await;

    let _ = std::fs::remove_dir_all(&dir);
}
