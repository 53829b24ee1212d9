pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod store;

pub use app::App;
pub use auth::AuthStore;
pub use config::Config;
pub use error::{Error, Result};
pub use models::{Board, Entity, Fields, Label, List, Priority, Row, Session, Task, User};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::Store;
