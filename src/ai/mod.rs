pub mod client;
pub mod credentials;
pub mod decoder;
pub mod history;
pub mod http_client;
pub mod prompts;
pub mod types;

pub use client::*;
pub use credentials::*;
pub use decoder::decode_study_package;
pub use history::window_history;
pub use types::*;
