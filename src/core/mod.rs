pub mod config;
pub mod error;
pub mod types;
pub mod window;

pub use config::ConductorConfig;
pub use error::{ConductorError, Result};
pub use types::{AgentId, Tick};
pub use window::RollingWindow;
