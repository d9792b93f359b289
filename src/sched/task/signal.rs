//! Notificações assíncronas (sinais e IRQs).
//!
//! Modelo de contagem: `submit(count)` acumula no receptor; se a thread alvo
//! está bloqueada esperando, ela acorda e consome o acumulado de uma vez.

/// Receptor de sinais de uma thread
#[derive(Debug, Default)]
pub struct SignalReceiver {
    /// Contagem pendente ainda não consumida
    pending: u64,
    /// Contagem entregue no último desbloqueio, aguardando consumo
    delivered: Option<u64>,
}

impl SignalReceiver {
    pub const fn new() -> Self {
        Self {
            pending: 0,
            delivered: None,
        }
    }

    /// Acumula `count` notificações
    pub fn submit(&mut self, count: u64) {
        self.pending = self.pending.saturating_add(count);
    }

    /// Contagem pendente
    pub fn pending(&self) -> u64 {
        self.pending
    }

    /// Consome tudo que está pendente
    pub fn take_pending(&mut self) -> u64 {
        core::mem::take(&mut self.pending)
    }

    /// Registra a entrega feita no desbloqueio
    pub(crate) fn mark_delivered(&mut self, count: u64) {
        self.delivered = Some(count);
    }

    /// Consome o resultado da última entrega
    pub fn take_delivered(&mut self) -> Option<u64> {
        self.delivered.take()
    }
}
