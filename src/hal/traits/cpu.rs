//! Trait de CPU
//!
//! O núcleo de rendezvous nunca toca hardware diretamente. Tudo que depende
//! de arquitetura (retomada de execução, world switch de vCPU, PIC,
//! classificação de faults) entra por aqui, implementado pelo backend.

use crate::sched::task::exec::{Regs, VcpuState};
use crate::sys::IrqLine;

/// Classe de fault de hardware, já normalizada pelo backend.
///
/// O código cru do fault é específico de arquitetura. O classificador
/// reduz para as três classes que o núcleo entende.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Página ausente (resolvível por um pager)
    PageMissing,
    /// Violação de execução (página não executável)
    Exec,
    /// Causa não reconhecida pelo backend
    Unknown,
}

/// Abstração do controlador de interrupções (PIC/GIC/APIC)
pub trait PicDriver {
    /// Dispara uma interrupção por software na linha dada (ex: IPI de resched)
    fn trigger(&mut self, line: IrqLine);
}

/// Abstração de uma CPU física
///
/// Uma instância por núcleo, fornecida ao `Kernel` na construção.
pub trait CpuDriver: Send {
    /// Acesso ao controlador de interrupções desta CPU
    fn pic(&mut self) -> &mut dyn PicDriver;

    /// Base da stack de kernel desta CPU
    fn stack_start(&self) -> u64;

    /// Mapeia o código de fault cru da arquitetura para uma classe genérica
    fn classify_fault(&self, code: u64) -> FaultKind;

    /// Retoma a execução de hardware de uma thread comum
    fn resume(&mut self, regs: &Regs);

    /// Realiza o world switch para um vCPU (interrupções virtuais já injetadas)
    fn world_switch(&mut self, state: &mut VcpuState);

    /// Para a CPU até a próxima interrupção (idle)
    fn halt(&mut self);
}
