use crate::error::Error;
use crate::models::{Entity, Fields};
use tracing::warn;

// One cache per entity type: an ordered row list plus the loading/error
// pair. Rows are only ever touched from the success path of a remote call;
// readers never observe an in-flight mutation.
#[derive(Debug, Clone)]
pub struct Store<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
}

impl<T: Entity> Store<T> {
    pub fn new() -> Self {
        Store {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    // fetch leaving the ground: idle|settled -> pending
    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    // On success the whole list is replaced with the normalized response; on
    // failure the previous list stays and only the message is recorded.
    pub fn settle_fetch(&mut self, outcome: Result<Vec<T>, Error>, fallback: &str) {
        self.loading = false;
        match outcome {
            Ok(items) => {
                self.items = items;
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err.message_or(fallback));
            }
        }
    }

    // Appends the confirmed row. Does not touch loading/error; a failed
    // create is reported to its caller, not to the cache.
    pub fn settle_create(&mut self, item: T) {
        match self.items.iter_mut().find(|e| e.id() == item.id()) {
            // The store never reuses ids; at most one row per id.
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn settle_update(&mut self, id: &str, patch: &Fields) {
        let index = match self.items.iter().position(|item| item.id() == id) {
            Some(index) => index,
            // Row no longer cached, e.g. evicted by a concurrent fetch.
            None => return,
        };
        match merged(&self.items[index], patch) {
            Some(updated) => self.items[index] = updated,
            None => warn!(id = id, "dropping update that no longer fits the row shape"),
        }
    }

    pub fn settle_delete(&mut self, id: &str) {
        self.items.retain(|item| item.id() != id);
    }
}

impl<T: Entity> Default for Store<T> {
    fn default() -> Self {
        Store::new()
    }
}

// Shallow merge: every key in the patch overwrites the cached row, all other
// fields stay. A null in the patch clears the field back to its default.
fn merged<T: Entity>(current: &T, patch: &Fields) -> Option<T> {
    let mut value = serde_json::to_value(current).ok()?;
    let object = value.as_object_mut()?;
    for (key, patch_value) in patch {
        if patch_value.is_null() {
            object.remove(key);
        } else {
            object.insert(key.clone(), patch_value.clone());
        }
    }
    serde_json::from_value(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Task};
    use serde_json::json;

    fn task(id: &str, text: &str) -> Task {
        Task {
            id: id.to_string(),
            text: text.to_string(),
            completed: false,
            owner: Some("u1".to_string()),
            shared_with: Vec::new(),
            list: Some("l1".to_string()),
            labels: Vec::new(),
            due_date: None,
            priority: None,
            time_spent: 0.0,
        }
    }

    fn patch(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn begin_fetch_enters_pending() {
        let mut store = Store::<Task>::new();
        store.begin_fetch();
        assert!(store.loading());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn fetch_success_replaces_the_whole_list() {
        let mut store = Store::<Task>::new();
        store.settle_fetch(Ok(vec![task("t1", "old"), task("t2", "older")]), "failed");

        store.begin_fetch();
        store.settle_fetch(Ok(vec![task("t3", "new")]), "failed");

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].id, "t3");
        assert!(!store.loading());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn fetch_failure_keeps_prior_items_and_records_message() {
        let mut store = Store::<Task>::new();
        store.settle_fetch(Ok(vec![task("t1", "keep me")]), "failed");

        store.begin_fetch();
        store.settle_fetch(
            Err(Error::Validation("bad filter".to_string())),
            "Failed to fetch tasks",
        );

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].text, "keep me");
        assert!(!store.loading());
        assert_eq!(store.error(), Some("validation error: bad filter"));
    }

    #[test]
    fn fetch_failure_without_message_uses_fallback() {
        let mut store = Store::<Task>::new();
        store.begin_fetch();
        store.settle_fetch(
            Err(Error::Api {
                status: 502,
                message: String::new(),
            }),
            "Failed to fetch tasks",
        );
        assert_eq!(store.error(), Some("Failed to fetch tasks"));
    }

    #[test]
    fn create_appends_without_touching_flags() {
        let mut store = Store::<Task>::new();
        store.begin_fetch();
        store.settle_fetch(
            Err(Error::Validation("down".to_string())),
            "Failed to fetch tasks",
        );
        let stale_error = store.error().map(str::to_string);

        store.settle_create(task("t9", "x"));

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].id, "t9");
        assert!(!store.loading());
        assert_eq!(store.error().map(str::to_string), stale_error);
    }

    #[test]
    fn update_merges_shallowly_and_keeps_untouched_fields() {
        let mut store = Store::<Task>::new();
        let mut seeded = task("t1", "buy milk");
        seeded.shared_with = vec!["u2".to_string()];
        seeded.time_spent = 15.0;
        store.settle_create(seeded);

        store.settle_update("t1", &patch(json!({ "completed": true })));

        let updated = store.get("t1").unwrap();
        assert!(updated.completed);
        assert_eq!(updated.text, "buy milk");
        assert_eq!(updated.owner.as_deref(), Some("u1"));
        assert_eq!(updated.shared_with, vec!["u2"]);
        assert_eq!(updated.time_spent, 15.0);
    }

    #[test]
    fn update_for_missing_row_is_a_silent_noop() {
        let mut store = Store::<Task>::new();
        store.settle_create(task("t1", "here"));

        store.settle_update("t404", &patch(json!({ "completed": true })));

        assert_eq!(store.items().len(), 1);
        assert!(!store.items()[0].completed);
        assert_eq!(store.error(), None);
    }

    #[test]
    fn update_with_null_clears_the_field() {
        let mut store = Store::<Task>::new();
        let mut seeded = task("t1", "deadline");
        seeded.due_date = Some("2026-08-01T12:00:00Z".to_string());
        seeded.priority = Some(Priority::High);
        store.settle_create(seeded);

        store.settle_update("t1", &patch(json!({ "due_date": null, "priority": null })));

        let updated = store.get("t1").unwrap();
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.priority, None);
    }

    #[test]
    fn delete_removes_the_row_and_is_idempotent() {
        let mut store = Store::<Task>::new();
        store.settle_create(task("t1", "going"));
        store.settle_create(task("t2", "staying"));

        store.settle_delete("t1");
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].id, "t2");

        // Second delete against an already-emptied slot changes nothing.
        store.settle_delete("t1");
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.error(), None);
    }

    #[test]
    fn racing_updates_settle_last_completion_wins() {
        let mut store = Store::<Task>::new();
        store.settle_create(task("t1", "contended"));

        // Issued in one order, resolved in the other; each merges onto
        // whatever state existed when it resolved.
        store.settle_update("t1", &patch(json!({ "priority": "High" })));
        store.settle_update("t1", &patch(json!({ "completed": true })));

        let updated = store.get("t1").unwrap();
        assert_eq!(updated.priority, Some(Priority::High));
        assert!(updated.completed);
    }
}
