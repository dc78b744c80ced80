/// Concrete implementations of the [core] module.
pub mod app;

/// Application starting arguments and configuration.
pub mod config;

/// Core business logic.
pub mod core;

/// Error types.
pub mod error;

/// The name given to the root folder created for every user.
pub const ROOT_FOLDER_NAME: &str = "main";
