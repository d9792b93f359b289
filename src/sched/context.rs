//! Contexto de Escalonamento.
//!
//! Unidade escalonável (thread ou vCPU) do ponto de vista do scheduler:
//! prioridade, vínculo de CPU, flag de prontidão e a relação de "helping".
//!
//! # Helping
//!
//! Quando um remetente bloqueia em rendezvous com um receptor da MESMA CPU,
//! ele pode doar sua fatia de escalonamento ao receptor até o reply chegar,
//! limitando a latência de inversão de prioridade. A relação é uma aresta
//! opcional "doa-para" (no máximo uma de saída por contexto) e é validada
//! acíclica a cada atribuição pelo `Kernel`. Entre CPUs diferentes não há
//! doação; o desbloqueio cruzado usa escalonamento normal via IPI.

use super::accounting::Accounting;
use crate::sys::{CpuId, Gid, Tid};

/// Contexto escalonável
pub struct SchedContext {
    /// Identidade de grupo (contabilidade agregada / introspecção)
    pub group: Gid,
    /// Classe de prioridade (0 = menor, 255 = maior)
    pub prio: u8,
    /// CPU à qual o contexto está vinculado
    pub cpu: CpuId,
    /// Pronto para executar agora
    pub ready: bool,
    /// Presente em exatamente uma runqueue
    pub queued: bool,
    /// Aresta de doação: para quem este contexto cede sua fatia
    helping: Option<Tid>,
    /// Estatísticas de execução
    pub accounting: Accounting,
}

impl SchedContext {
    pub fn new(group: Gid, prio: u8, cpu: CpuId) -> Self {
        Self {
            group,
            prio,
            cpu,
            ready: false,
            queued: false,
            helping: None,
            accounting: Accounting::new(),
        }
    }

    /// Pronto para executar?
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Tempo de CPU acumulado (ticks)
    pub fn execution_time(&self) -> u64 {
        self.accounting.total_cpu_time
    }

    /// Doação só é possível entre contextos da mesma CPU
    pub fn helping_possible(&self, other: &SchedContext) -> bool {
        self.cpu == other.cpu
    }

    /// Registra a doação da fatia deste contexto para `target`.
    /// O chamador já validou a aciclicidade da cadeia resultante.
    pub(crate) fn help(&mut self, target: Tid) {
        self.helping = Some(target);
    }

    /// Encerra a doação em andamento, se houver
    pub fn helping_finished(&mut self) {
        self.helping = None;
    }

    /// Alvo atual da doação
    pub fn helping(&self) -> Option<Tid> {
        self.helping
    }
}
