//! Constantes de configuração do Scheduler

use crate::sys::IrqLine;

/// Prioridade mínima (IDLE)
pub const PRIORITY_MIN: u8 = 0;

/// Prioridade padrão para threads de usuário
pub const PRIORITY_DEFAULT: u8 = 128;

/// Prioridade máxima (Realtime/Kernel)
pub const PRIORITY_MAX: u8 = 255;

/// Quantum padrão (Timeslice) em ticks do timer
pub const DEFAULT_QUANTUM: u64 = 10;

/// Número máximo de threads vivas na tabela
pub const MAX_THREADS: usize = 1024;

/// Número máximo de CPUs suportadas
pub const MAX_CPUS: usize = 16;

/// Profundidade máxima de uma cadeia de helping.
/// A relação é validada acíclica a cada atribuição; o limite segura
/// travessias contra corrupção de estado.
pub const MAX_HELPING_DEPTH: usize = 16;

/// Linha de IPI usada para forçar reescalonamento em outra CPU
pub const IPI_RESCHED: IrqLine = IrqLine(2);
