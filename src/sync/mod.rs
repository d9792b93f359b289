//! # Synchronization Primitives
//!
//! Primitivas de sincronização do núcleo.
//!
//! ## Regras
//!
//! - Este crate não pode desabilitar interrupções (isso é papel do kernel
//!   que o embute). Toda exclusão mútua aqui é via `spin::Mutex`.
//! - **Ordem de Lock**: Sempre adquirir na mesma ordem para evitar deadlock.
//!   Na prática só existe um lock de topo: o kernel inteiro vive atrás de
//!   um único `Mutex<Kernel>` no lado do embedder.

/// Operações atômicas
pub mod atomic;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use atomic::AtomicCounter;
pub use spin::{Mutex, MutexGuard};
