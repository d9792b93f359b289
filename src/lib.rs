//! Anvil - Núcleo de IPC Rendezvous e Escalonamento.
//!
//! Ponto central de exportação dos módulos do núcleo.
//!
//! Este crate contém apenas o coração de IPC síncrono + scheduler de um
//! microkernel: endpoints de rendezvous, contextos escalonáveis com helping
//! e o vínculo contexto-CPU. Tudo que é específico de arquitetura (pager de
//! verdade, PIC, world switch) entra pelos traits de `hal`, implementados
//! pelo kernel que embute este crate.

#![cfg_attr(not(test), no_std)]

// Habilitar alocação dinâmica (necessário para Vec/Box/BTreeMap)
extern crate alloc;

// --- Módulos de Baixo Nível (Hardware) ---
pub mod hal; // Traits de CPU/PIC (implementados pelo backend)

// --- Módulos Centrais (Lógica do Núcleo) ---
pub mod core; // Kernel, Tabela de Threads, Logging
pub mod klib; // Utilitários Internos (Test Framework)
pub mod sync; // Primitivas de Sincronização
pub mod sys; // Definições de Sistema (Erros, IDs)

// --- Subsistemas ---
pub mod ipc; // Rendezvous síncrono
pub mod sched; // Scheduler, Contextos e Threads

// Re-exportar os tipos de uso mais frequente no embedder
pub use crate::core::Kernel;
pub use crate::ipc::{Message, MsgFlags};
pub use crate::sched::task::{ExecEntity, Exception, ExceptionOutcome, Regs};
pub use crate::sched::ThreadState;
pub use crate::sys::{CpuId, Errno, Gid, IrqLine, Tid};

/// Executa todas as suites de self-test do núcleo.
/// Chamado pelo embedder durante o boot com a feature `self_test`.
#[cfg(feature = "self_test")]
pub fn run_self_tests() -> bool {
    let ipc_ok = ipc::test::run_ipc_tests();
    let sched_ok = sched::test::run_sched_tests();
    let core_ok = core::test::run_core_tests();
    ipc_ok && sched_ok && core_ok
}
