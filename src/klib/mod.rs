//! Utilitários Internos do Núcleo

pub mod test_framework;
