//! Vínculo de Contexto com CPU.
//!
//! Cada CPU física executa no máximo um contexto por vez. A ativação e a
//! desativação do slot corrente são invocadas apenas pelo caminho de
//! escalonamento do `Kernel`, nunca por código externo.

use alloc::boxed::Box;

use super::config::IPI_RESCHED;
use super::runqueue::RunQueue;
use crate::hal::CpuDriver;
use crate::sys::{CpuId, Tid};

/// Slot de execução corrente de uma CPU.
///
/// `owner` é o contexto escolhido pelo scheduler (dono da fatia); `running`
/// é o contexto efetivamente executando após resolver a cadeia de helping.
/// Sem doação em andamento os dois coincidem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentSlot {
    pub owner: Tid,
    pub running: Tid,
}

/// Uma CPU física do ponto de vista do scheduler
pub struct Cpu {
    /// ID do núcleo
    pub id: CpuId,
    /// Backend de arquitetura desta CPU
    pub driver: Box<dyn CpuDriver>,
    /// Fila de contextos prontos vinculados a esta CPU
    pub runqueue: RunQueue,
    /// Slot corrente
    current: Option<CurrentSlot>,
    /// Reescalonamento pendente
    need_resched: bool,
    /// Base da stack de kernel desta CPU (informada pelo backend)
    pub stack_start: u64,
}

impl Cpu {
    pub fn new(id: CpuId, driver: Box<dyn CpuDriver>) -> Self {
        let stack_start = driver.stack_start();
        crate::kinfo!("(CPU) Núcleo registrado. Stack base=", stack_start);
        Self {
            id,
            driver,
            runqueue: RunQueue::new(),
            current: None,
            need_resched: false,
            stack_start,
        }
    }

    /// Slot corrente, se houver
    pub fn current(&self) -> Option<CurrentSlot> {
        self.current
    }

    /// Ativa um slot nesta CPU (somente o caminho de escalonamento)
    pub(crate) fn activate(&mut self, slot: CurrentSlot) {
        self.current = Some(slot);
        self.need_resched = false;
    }

    /// Desativa o slot corrente, devolvendo-o
    pub(crate) fn deactivate(&mut self) -> Option<CurrentSlot> {
        self.current.take()
    }

    /// Sinaliza que esta CPU precisa reescalonar
    pub fn set_need_resched(&mut self) {
        self.need_resched = true;
    }

    /// Reescalonamento pendente?
    pub fn need_resched(&self) -> bool {
        self.need_resched
    }

    /// Dispara a IPI de reescalonamento desta CPU.
    ///
    /// Usada quando alguém acorda um contexto daqui enquanto a CPU executa
    /// outro. Entre CPUs não há doação de fatia, só o pedido de reschedule.
    pub(crate) fn post_resched_ipi(&mut self) {
        self.need_resched = true;
        self.driver.pic().trigger(IPI_RESCHED);
    }
}
