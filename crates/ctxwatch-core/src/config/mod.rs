mod settings;

pub use settings::{default_state_dir, Command, Config, RecordDefaults, Settings, StatuslineSettings};
