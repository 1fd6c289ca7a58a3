pub mod monitor;
pub mod probe;
pub mod reader;
pub mod registry;
pub mod spawner;
pub mod supervisor;
pub mod terminator;

pub use registry::{ExitSummary, Phase, ProcessRegistry, TrackedInstance};
pub use supervisor::{OverlaySupervisor, StartReply};
pub use terminator::TerminationController;
