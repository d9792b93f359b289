//! # Inter-Process Communication (IPC)
//!
//! Sistema nervoso do núcleo: rendezvous síncrono entre threads.
//!
//! ## Mecanismo
//!
//! | Operação | Quem bloqueia          | Desbloqueio          |
//! |----------|------------------------|----------------------|
//! | send     | Remetente (sempre)     | reply do receptor    |
//! | wait     | Receptor (fila vazia)  | chegada de remetente |
//! | reply    | Ninguém                | N/A                  |
//!
//! ## Filosofia
//!
//! - **Síncrono estrito**: o reply nunca é observado antes de ser produzido
//! - **FIFO**: remetentes pendentes são atendidos na ordem de chegada
//! - **Sem timeout**: cancelamento só via destruição de um dos endpoints

// =============================================================================
// MESSAGE PASSING
// =============================================================================

/// Mensagens curtas de rendezvous
pub mod message;

/// Endpoint de rendezvous
pub mod node;

pub use message::{Message, MsgFlags, MSG_WORDS};
pub use node::{InboundState, IpcNode, OutboundState};

// =============================================================================
// TESTS
// =============================================================================
