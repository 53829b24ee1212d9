use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Fields = Map<String, Value>;

// Wire shape of one remote row: a server-assigned id plus a fields payload.
#[derive(Clone, Deserialize, Debug)]
pub struct Row {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Deserialize, Debug)]
pub struct RowSet {
    #[serde(default)]
    pub rows: Vec<Row>,
}

// Response of the login/register endpoints.
#[derive(Clone, Deserialize, Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub trait Entity: Clone + Serialize + DeserializeOwned {
    const TABLE_ID: &'static str;

    fn id(&self) -> &str;

    // Builds the entity from a listed row, collapsing reference lists and
    // filling the defaults the UI expects (completed=false, time_spent=0).
    fn from_row(row: Row) -> Self;
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Board {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct List {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub list: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub time_spent: f64,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Label {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Entity for Board {
    const TABLE_ID: &'static str = "b7bc4aa2-c6ff-42df-9ef1-7abbd1d71f0e";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(mut row: Row) -> Self {
        Board {
            name: take_string(&mut row.fields, "name"),
            description: take_string(&mut row.fields, "description"),
            created_by: take_reference(&mut row.fields, "created_by"),
            id: row.id,
        }
    }
}

impl Entity for List {
    const TABLE_ID: &'static str = "5b83e2bb-f93a-413b-85e3-3c9461cf6af1";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(mut row: Row) -> Self {
        List {
            name: take_string(&mut row.fields, "name"),
            board: take_reference(&mut row.fields, "board"),
            created_by: take_reference(&mut row.fields, "created_by"),
            id: row.id,
        }
    }
}

impl Entity for Task {
    const TABLE_ID: &'static str = "d83e5949-4852-4b09-bb1d-9d658b22b26c";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(mut row: Row) -> Self {
        Task {
            text: take_string(&mut row.fields, "text"),
            completed: take_bool(&mut row.fields, "completed"),
            owner: take_reference(&mut row.fields, "owner"),
            shared_with: take_reference_list(&mut row.fields, "shared_with"),
            list: take_reference(&mut row.fields, "list"),
            labels: take_reference_list(&mut row.fields, "labels"),
            due_date: take_opt_string(&mut row.fields, "due_date"),
            priority: take_priority(&mut row.fields, "priority"),
            time_spent: take_number(&mut row.fields, "time_spent"),
            id: row.id,
        }
    }
}

impl Entity for Label {
    const TABLE_ID: &'static str = "d35e82f7-309d-43c5-8b07-0529f9ce6723";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(mut row: Row) -> Self {
        Label {
            name: take_string(&mut row.fields, "name"),
            color: take_string(&mut row.fields, "color"),
            created_by: take_reference(&mut row.fields, "created_by"),
            id: row.id,
        }
    }
}

fn take_string(fields: &mut Fields, key: &str) -> String {
    match fields.remove(key) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

fn take_opt_string(fields: &mut Fields, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn take_bool(fields: &mut Fields, key: &str) -> bool {
    match fields.remove(key) {
        Some(Value::Bool(b)) => b,
        _ => false,
    }
}

fn take_number(fields: &mut Fields, key: &str) -> f64 {
    match fields.remove(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn take_priority(fields: &mut Fields, key: &str) -> Option<Priority> {
    fields
        .remove(key)
        .and_then(|value| serde_json::from_value(value).ok())
}

// A reference field may arrive as a one-element list; collapse it to a scalar.
fn take_reference(fields: &mut Fields, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Array(items)) => items.into_iter().find_map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        }),
        _ => None,
    }
}

// Multi-element reference lists stay lists.
fn take_reference_list(fields: &mut Fields, key: &str) -> Vec<String> {
    match fields.remove(key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => vec![s],
        _ => Vec::new(),
    }
}
