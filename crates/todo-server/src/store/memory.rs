use super::TodoStore;
use parking_lot::RwLock;
use todo_core::{Error, Result, proto::Todo};

/// In-process [`TodoStore`] backed by an insertion-ordered `Vec`.
///
/// The lock is never held across an `.await`, so a blocking
/// `parking_lot::RwLock` is sufficient.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<Vec<Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `items`, in the given order.
    ///
    /// Later duplicates of an id are dropped.
    pub fn with_items(items: impl IntoIterator<Item = Todo>) -> Self {
        let mut seeded: Vec<Todo> = Vec::new();
        for item in items {
            if !seeded.iter().any(|t| t.id == item.id) {
                seeded.push(item);
            }
        }
        Self {
            items: RwLock::new(seeded),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[tonic::async_trait]
impl TodoStore for MemoryStore {
    async fn insert(&self, item: Todo) -> Result<()> {
        let mut items = self.items.write();
        if items.iter().any(|t| t.id == item.id) {
            return Err(Error::Conflict { id: item.id });
        }
        items.push(item);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Todo> {
        self.items
            .read()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(id))
    }

    async fn list(&self, limit: Option<u32>, completed: bool) -> Result<Vec<Todo>> {
        let limit = limit.map_or(usize::MAX, |n| n as usize);
        Ok(self
            .items
            .read()
            .iter()
            .filter(|t| t.completed == completed)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut items = self.items.write();
        let pos = items
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::not_found(id))?;
        items.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: &str, completed: bool) -> Todo {
        Todo {
            id: id.to_string(),
            title: format!("title {id}"),
            description: String::new(),
            completed,
        }
    }

    #[tokio::test]
    async fn list_preserves_insertion_order_and_limit() {
        let store = MemoryStore::with_items([
            todo("a", false),
            todo("b", true),
            todo("c", false),
            todo("d", false),
        ]);

        let ids: Vec<_> = store
            .list(Some(2), false)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[tokio::test]
    async fn unlimited_list_returns_every_match() {
        let store = MemoryStore::with_items((0..1500).map(|i| todo(&i.to_string(), false)));
        assert_eq!(store.list(None, false).await.unwrap().len(), 1500);
    }

    #[tokio::test]
    async fn seeding_drops_duplicate_ids() {
        let store = MemoryStore::with_items([todo("a", false), todo("a", true)]);
        assert_eq!(store.len(), 1);
        assert!(!store.get("a").await.unwrap().completed);
    }
}
