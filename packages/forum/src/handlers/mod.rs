pub mod health;
pub mod messages;
pub mod posts;
pub mod session;
pub mod users;
pub mod websocket;

// Re-export all handlers for easy route registration
pub use health::{health_handler, health_live_handler, health_ready_handler, metrics_handler};
pub use messages::message_history_handler;
pub use posts::{create_post_handler, list_posts_handler};
pub use session::logout_handler;
pub use users::online_users_handler;
pub use websocket::forum_websocket_handler;
