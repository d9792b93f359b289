//! Estados de thread

/// Estado de uma thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Recém criada, não executou ainda
    Created,
    /// Pronta para executar
    Ready,
    /// Executando em alguma CPU
    Running,
    /// Bloqueada em rendezvous (send sem match ou wait com fila vazia)
    AwaitsIpc,
    /// Bloqueada esperando notificação assíncrona
    AwaitsSignal,
    /// Bloqueada em page fault, aguardando resolução do pager
    Faulted,
    /// Parada (fault sem pager registrado)
    Stopped,
    /// Destruída
    Dead,
}

impl ThreadState {
    /// Verifica se pode ser escalonada
    pub const fn is_runnable(self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }

    /// Verifica se está bloqueada aguardando evento
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::AwaitsIpc | Self::AwaitsSignal | Self::Faulted)
    }
}
