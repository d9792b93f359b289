//! Traits do HAL
//!
//! Define as interfaces abstratas para hardware.

pub mod cpu;

pub use cpu::*;
