//! Hardware Abstraction Layer (HAL)
//!
//! Abstração de hardware para facilitar portabilidade.
//!
//! Diferente do kernel completo, este crate não traz implementações de
//! arquitetura: apenas os traits que o backend (x86_64, aarch64, ...) deve
//! implementar para acoplar o núcleo de IPC/escalonamento ao hardware real.

pub mod traits;

pub use traits::*;
