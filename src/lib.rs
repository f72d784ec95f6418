pub mod ai;
pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod placement;
pub mod storage;
pub mod store;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use models::{Category, Position, Priority, Todo, TodoTemplate};
pub use storage::Storage;
pub use store::TodoStore;
pub use utils::Profile;
