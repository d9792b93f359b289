//! Módulos Centrais (Lógica do Núcleo)

/// Logging compile-time filtrado
pub mod logging;

/// Arena de threads
pub mod table;

/// Orquestrador de rendezvous e escalonamento
pub mod kernel;

pub use kernel::Kernel;
pub use table::ThreadTable;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(any(test, feature = "self_test"))]
pub mod test;
