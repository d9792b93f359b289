//! Entidade de Execução (Thread vs vCPU).
//!
//! O conjunto de variantes é fechado e conhecido em build time, então o
//! despacho de `exception`/`proceed` é feito por match em um enum, com os
//! payloads de estado específicos de cada modo, em vez de herança aberta.

use alloc::collections::VecDeque;

use crate::sys::IrqLine;

/// Registradores mínimos visíveis ao núcleo.
///
/// O estado completo de registradores vive no frame salvo pelo backend;
/// aqui ficam apenas os campos que o núcleo precisa ler (mensagem de fault)
/// e repassar no resume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Regs {
    /// Instruction pointer
    pub ip: u64,
    /// Stack pointer
    pub sp: u64,
}

impl Regs {
    pub const fn new(ip: u64, sp: u64) -> Self {
        Self { ip, sp }
    }
}

/// Estado de um CPU virtual
#[derive(Debug, Clone, Default)]
pub struct VcpuState {
    /// Registradores do guest no ponto de saída
    pub regs: Regs,
    /// Interrupções virtuais aguardando injeção
    pub pending_virq: VecDeque<IrqLine>,
    /// Interrupções injetadas, consumidas pelo backend no world switch
    pub injected: VecDeque<IrqLine>,
}

impl VcpuState {
    pub fn new(regs: Regs) -> Self {
        Self {
            regs,
            pending_virq: VecDeque::new(),
            injected: VecDeque::new(),
        }
    }
}

/// Entidade de execução de uma thread
pub enum ExecEntity {
    /// Thread comum (kernel ou usuário)
    Thread { regs: Regs },
    /// CPU virtual de uma máquina virtual
    Vcpu { state: VcpuState },
}

impl ExecEntity {
    pub fn thread(regs: Regs) -> Self {
        Self::Thread { regs }
    }

    pub fn vcpu(regs: Regs) -> Self {
        Self::Vcpu {
            state: VcpuState::new(regs),
        }
    }

    /// Instruction pointer corrente (para a mensagem de fault)
    pub fn ip(&self) -> u64 {
        match self {
            Self::Thread { regs } => regs.ip,
            Self::Vcpu { state } => state.regs.ip,
        }
    }
}

/// Causa de uma exceção de hardware despachada ao núcleo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    /// Fault de memória/execução: código cru + contexto do acesso
    Fault { code: u64, ip: u64, addr: u64 },
    /// Interrupção de hardware
    Interrupt(IrqLine),
    /// Trap de syscall (tratado pela camada acima do núcleo)
    Syscall,
}

/// Resultado do despacho de uma exceção
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionOutcome {
    /// Fault encaminhado ao pager; a thread bloqueou aguardando resolução
    FaultDelivered,
    /// Sem pager registrado; a thread foi parada
    ThreadStopped,
    /// Interrupção entregue como sinal ao handler vinculado
    Interrupt,
    /// Syscall: a camada de syscalls do embedder deve assumir
    Syscall,
}
