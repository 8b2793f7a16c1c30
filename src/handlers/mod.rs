pub mod commands;
pub mod messages;
pub mod callbacks;
pub mod media;
pub mod utils;

pub use commands::command_handler;
pub use messages::message_handler;
pub use callbacks::callback_handler;
