//! Thread management module

pub mod entity;
pub mod exec;
pub mod signal;
pub mod state;

pub use entity::Thread;
pub use exec::{ExecEntity, Exception, ExceptionOutcome, Regs, VcpuState};
pub use signal::SignalReceiver;
pub use state::ThreadState;
