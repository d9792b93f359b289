//! Contabilidade de Recursos (Accounting)
//!
//! Rastreia o consumo de CPU por contexto: tempo total, trocas de contexto
//! e quantum restante da fatia atual.

/// Estatísticas de uso de recursos de um contexto
#[derive(Debug, Clone, Copy, Default)]
pub struct Accounting {
    /// Tempo total de CPU consumido (em ticks do sistema)
    pub total_cpu_time: u64,

    /// Timestamp (em ticks) da última vez que o contexto ganhou a CPU
    pub last_start_time: u64,

    /// Número de trocas de contexto voluntárias (yield, bloqueio em IPC)
    pub voluntary_switches: u64,

    /// Número de trocas involuntárias (preempção por quantum expirado)
    pub involuntary_switches: u64,

    /// Quantum restante nesta fatia de tempo (em ticks)
    pub quantum_left: u64,
}

impl Accounting {
    /// Cria uma nova estrutura de contabilidade zerada
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra o início da execução (chamado quando o contexto ganha a CPU)
    pub fn start_exec(&mut self, now: u64) {
        self.last_start_time = now;
        self.reset_quantum();
    }

    /// Reinicia o quantum
    pub fn reset_quantum(&mut self) {
        // TODO: calcular o quantum com base na prioridade do contexto.
        self.quantum_left = super::config::DEFAULT_QUANTUM;
    }

    /// Zera o quantum (yield voluntário)
    pub fn surrender_quantum(&mut self) {
        self.quantum_left = 0;
    }

    /// Credita um tick de execução ao contexto que está rodando
    pub fn charge_tick(&mut self) {
        self.total_cpu_time += 1;
    }

    /// Desconta um tick do quantum. Retorna true se a fatia expirou.
    pub fn tick_quantum(&mut self) -> bool {
        if self.quantum_left > 0 {
            self.quantum_left -= 1;
        }
        self.quantum_left == 0
    }

    /// Incrementa contadores de troca de contexto
    pub fn account_switch(&mut self, voluntary: bool) {
        if voluntary {
            self.voluntary_switches += 1;
        } else {
            self.involuntary_switches += 1;
        }
    }
}
