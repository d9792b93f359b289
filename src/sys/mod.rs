//! System Definitions (ABI).
//!
//! Contém as constantes e tipos que definem a interface entre o núcleo e o Mundo.

pub mod error;
pub mod types;

pub use error::Errno;
pub use types::{CpuId, Gid, IrqLine, Tid};
