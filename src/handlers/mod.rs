pub mod catalog;
pub mod chat;
pub mod health;

pub use catalog::{function_graph_data, function_graph_mermaid, list_functions};
pub use chat::chat_handler;
pub use health::{health_handler, ready_handler};
