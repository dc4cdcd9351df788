pub mod input;
pub mod classify;
pub mod extraction;
pub mod agents;
pub mod processor; // Intake orchestrator: classify, record, route, follow up

pub use input::RawInput;
pub use classify::*;
pub use processor::*;
