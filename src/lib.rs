// Library surface for the binary, headless runs and integration tests.
// Terminal drawing stays in the binary.
pub mod app;
pub mod app_dirs;
pub mod bandit;
pub mod config;
pub mod error;
pub mod log_store;
pub mod machine;
pub mod noise;
pub mod report;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod stimulus;
pub mod timer;

pub use app::{App, Control};
pub use bandit::BanditModel;
pub use error::{ConfigError, LogError, SessionError, UnknownStimulus};
pub use machine::{SessionEvent, SessionMachine};
pub use session::{Phase, SessionRecord, SessionState};
pub use stimulus::Stimulus;
