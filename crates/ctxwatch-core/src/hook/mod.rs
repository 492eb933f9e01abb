//! Host boundary: the JSON event read from stdin and the JSON written back.

pub mod event;
pub mod input;
pub mod output;

pub use event::{ContextWindow, CostInfo, HookEvent, ModelInfo};
pub use input::{read_event, MAX_INPUT_BYTES};
pub use output::HookOutput;
