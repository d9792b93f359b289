//! # Scheduler Subsystem
//!
//! Escalonamento cooperativo multiprocessador do núcleo.
//!
//! ## Arquitetura
//!
//! - **Contexto:** unidade escalonável com prioridade, vínculo de CPU e
//!   relação de helping (`context`).
//! - **RunQueue:** FIFO por classe de prioridade, uma por CPU (`runqueue`).
//! - **CPU:** slot corrente + backend de arquitetura (`cpu`).
//! - **Thread:** a entidade completa, compondo contexto + IPC + execução
//!   (`task`).
//!
//! Não há preempção abaixo do tick de timer: um contexto só perde a CPU em
//! `send` sem match, `wait` com fila vazia, yield explícito ou expiração de
//! quantum sinalizada pelo tick. A orquestração das transições vive em
//! `core::kernel`; este módulo define as estruturas e suas invariantes.

pub mod accounting;
pub mod config;
pub mod context;
pub mod cpu;
pub mod runqueue;
pub mod task;

pub use context::SchedContext;
pub use cpu::{Cpu, CurrentSlot};
pub use runqueue::RunQueue;
pub use task::{Thread, ThreadState};

// =============================================================================
// TESTS
// =============================================================================
