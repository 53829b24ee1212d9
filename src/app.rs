use crate::api;
use crate::auth::AuthStore;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Board, Entity, Fields, Label, List, Priority, Task};
use crate::storage::Storage;
use crate::store::Store;
use chrono::DateTime;
use serde_json::{json, Value};
use tracing::warn;

// The dispatcher: owns one cache per entity plus the auth session, and turns
// each intent into exactly one remote call whose outcome settles exactly one
// cache. In-flight intents carry no ordering guarantee relative to each
// other; concurrent updates to one row are last-completion-wins.
pub struct App {
    config: Config,
    storage: Box<dyn Storage>,
    pub auth: AuthStore,
    pub boards: Store<Board>,
    pub lists: Store<List>,
    pub tasks: Store<Task>,
    pub labels: Store<Label>,
    current_board: Option<Board>,
}

impl App {
    pub fn new(config: Config, storage: Box<dyn Storage>) -> App {
        let auth = AuthStore::bootstrap(storage.as_ref());
        App {
            config,
            storage,
            auth,
            boards: Store::new(),
            lists: Store::new(),
            tasks: Store::new(),
            labels: Store::new(),
            current_board: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_board(&self) -> Option<&Board> {
        self.current_board.as_ref()
    }

    pub fn set_current_board(&mut self, board: Option<Board>) {
        self.current_board = board;
    }

    // --- auth intents ---

    pub async fn login(&mut self, email: &str, password: &str) {
        self.auth.begin_auth();
        let outcome = api::login(&self.config.base_url, email, password).await;
        self.auth.settle_login(outcome, self.storage.as_mut());
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str) {
        self.auth.begin_auth();
        let outcome = api::register(&self.config.base_url, name, email, password).await;
        self.auth.settle_register(outcome, self.storage.as_mut());
    }

    pub async fn logout(&mut self) {
        // The remote call may fail; it does not block the local clear.
        if let Err(err) = api::logout(&self.config.base_url, self.auth.token()).await {
            warn!(error = %err, "remote logout failed");
        }
        self.auth.apply_logout(self.storage.as_mut());
    }

    // --- board intents ---

    pub async fn fetch_boards(&mut self) {
        self.boards.begin_fetch();
        let outcome = api::list_rows(
            &self.config.base_url,
            self.auth.token(),
            Board::TABLE_ID,
            None,
        )
        .await
        .map(|rows| rows.into_iter().map(Board::from_row).collect::<Vec<_>>());
        self.boards.settle_fetch(outcome, "Failed to fetch boards");
    }

    pub async fn create_board(&mut self, name: &str, description: &str) -> Result<Board> {
        let fields = fields_from(json!({ "name": name, "description": description }));
        let board: Board = api::create_row(
            &self.config.base_url,
            self.auth.token(),
            Board::TABLE_ID,
            &fields,
        )
        .await?;
        self.boards.settle_create(board.clone());
        Ok(board)
    }

    pub async fn update_board(&mut self, id: &str, name: &str, description: &str) -> Result<()> {
        let fields = fields_from(json!({ "name": name, "description": description }));
        api::update_row(
            &self.config.base_url,
            self.auth.token(),
            Board::TABLE_ID,
            id,
            &fields,
        )
        .await?;
        self.boards.settle_update(id, &fields);
        Ok(())
    }

    pub async fn delete_board(&mut self, id: &str) -> Result<()> {
        api::delete_row(&self.config.base_url, self.auth.token(), Board::TABLE_ID, id).await?;
        self.apply_board_delete(id);
        Ok(())
    }

    // Success handler for board deletion; a matching selection goes with it.
    fn apply_board_delete(&mut self, id: &str) {
        self.boards.settle_delete(id);
        if self.current_board.as_ref().map(|board| board.id.as_str()) == Some(id) {
            self.current_board = None;
        }
    }

    // --- list intents ---

    pub async fn fetch_lists(&mut self, board_id: &str) {
        self.lists.begin_fetch();
        let outcome = api::list_rows(
            &self.config.base_url,
            self.auth.token(),
            List::TABLE_ID,
            Some(("board", board_id)),
        )
        .await
        .map(|rows| rows.into_iter().map(List::from_row).collect::<Vec<_>>());
        self.lists.settle_fetch(outcome, "Failed to fetch lists");
    }

    pub async fn create_list(&mut self, name: &str, board_id: &str) -> Result<List> {
        let fields = fields_from(json!({ "name": name, "board": board_id }));
        let list: List = api::create_row(
            &self.config.base_url,
            self.auth.token(),
            List::TABLE_ID,
            &fields,
        )
        .await?;
        self.lists.settle_create(list.clone());
        Ok(list)
    }

    pub async fn update_list(&mut self, id: &str, name: &str) -> Result<()> {
        let fields = fields_from(json!({ "name": name }));
        api::update_row(
            &self.config.base_url,
            self.auth.token(),
            List::TABLE_ID,
            id,
            &fields,
        )
        .await?;
        self.lists.settle_update(id, &fields);
        Ok(())
    }

    pub async fn delete_list(&mut self, id: &str) -> Result<()> {
        api::delete_row(&self.config.base_url, self.auth.token(), List::TABLE_ID, id).await?;
        self.lists.settle_delete(id);
        Ok(())
    }

    // --- task intents ---

    pub async fn fetch_tasks(&mut self, list_id: &str) {
        self.tasks.begin_fetch();
        let outcome = api::list_rows(
            &self.config.base_url,
            self.auth.token(),
            Task::TABLE_ID,
            Some(("list", list_id)),
        )
        .await
        .map(|rows| rows.into_iter().map(Task::from_row).collect::<Vec<_>>());
        self.tasks.settle_fetch(outcome, "Failed to fetch tasks");
    }

    pub async fn create_task(
        &mut self,
        text: &str,
        list_id: &str,
        owner: Option<&str>,
        priority: Option<Priority>,
        due_date: Option<&str>,
    ) -> Result<Task> {
        if let Some(date) = due_date {
            check_due_date(date)?;
        }
        let mut fields = fields_from(json!({
            "text": text,
            "completed": false,
            "list": list_id,
        }));
        if let Some(owner) = owner {
            fields.insert("owner".to_string(), json!(owner));
        }
        if let Some(priority) = priority {
            fields.insert("priority".to_string(), json!(priority));
        }
        if let Some(date) = due_date {
            fields.insert("due_date".to_string(), json!(date));
        }

        let task: Task = api::create_row(
            &self.config.base_url,
            self.auth.token(),
            Task::TABLE_ID,
            &fields,
        )
        .await?;
        self.tasks.settle_create(task.clone());
        Ok(task)
    }

    pub async fn update_task(&mut self, id: &str, patch: Fields) -> Result<()> {
        if let Some(Value::String(date)) = patch.get("due_date") {
            check_due_date(date)?;
        }
        api::update_row(
            &self.config.base_url,
            self.auth.token(),
            Task::TABLE_ID,
            id,
            &patch,
        )
        .await?;
        self.tasks.settle_update(id, &patch);
        Ok(())
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<()> {
        api::delete_row(&self.config.base_url, self.auth.token(), Task::TABLE_ID, id).await?;
        self.tasks.settle_delete(id);
        Ok(())
    }

    // --- label intents ---

    pub async fn fetch_labels(&mut self) {
        self.labels.begin_fetch();
        let outcome = api::list_rows(
            &self.config.base_url,
            self.auth.token(),
            Label::TABLE_ID,
            None,
        )
        .await
        .map(|rows| rows.into_iter().map(Label::from_row).collect::<Vec<_>>());
        self.labels.settle_fetch(outcome, "Failed to fetch labels");
    }

    pub async fn create_label(&mut self, name: &str, color: &str) -> Result<Label> {
        let fields = fields_from(json!({ "name": name, "color": color }));
        let label: Label = api::create_row(
            &self.config.base_url,
            self.auth.token(),
            Label::TABLE_ID,
            &fields,
        )
        .await?;
        self.labels.settle_create(label.clone());
        Ok(label)
    }

    pub async fn update_label(&mut self, id: &str, name: &str, color: &str) -> Result<()> {
        let fields = fields_from(json!({ "name": name, "color": color }));
        api::update_row(
            &self.config.base_url,
            self.auth.token(),
            Label::TABLE_ID,
            id,
            &fields,
        )
        .await?;
        self.labels.settle_update(id, &fields);
        Ok(())
    }

    pub async fn delete_label(&mut self, id: &str) -> Result<()> {
        api::delete_row(&self.config.base_url, self.auth.token(), Label::TABLE_ID, id).await?;
        self.labels.settle_delete(id);
        Ok(())
    }
}

fn fields_from(value: Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

fn check_due_date(date: &str) -> Result<()> {
    DateTime::parse_from_rfc3339(date)
        .map(|_| ())
        .map_err(|_| Error::Validation(format!("invalid due date: {:?}", date)))
}
