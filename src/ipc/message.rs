//! Mensagem IPC
//!
//! Mensagens curtas de rendezvous: um pequeno array de words copiado
//! diretamente entre os dois lados no momento do encontro. Payloads grandes
//! não passam por aqui (memória compartilhada é papel de outro subsistema).

use bitflags::bitflags;

use crate::hal::FaultKind;

/// Número máximo de words de payload por mensagem
pub const MSG_WORDS: usize = 4;

bitflags! {
    /// Flags do header da mensagem
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MsgFlags: u32 {
        /// Mensagem de page fault gerada pelo núcleo (página ausente)
        const FAULT_PAGE_MISSING = 1 << 0;
        /// Mensagem de fault de execução gerada pelo núcleo
        const FAULT_EXEC = 1 << 1;
        /// Fault de classe desconhecida (nunca descartado silenciosamente)
        const FAULT_UNKNOWN = 1 << 2;
    }
}

impl MsgFlags {
    /// Converte a classe de fault do HAL para a flag correspondente
    pub fn from_fault(kind: FaultKind) -> Self {
        match kind {
            FaultKind::PageMissing => MsgFlags::FAULT_PAGE_MISSING,
            FaultKind::Exec => MsgFlags::FAULT_EXEC,
            FaultKind::Unknown => MsgFlags::FAULT_UNKNOWN,
        }
    }

    /// Verifica se a mensagem foi gerada pelo caminho de fault
    pub fn is_fault(self) -> bool {
        self.intersects(
            MsgFlags::FAULT_PAGE_MISSING | MsgFlags::FAULT_EXEC | MsgFlags::FAULT_UNKNOWN,
        )
    }
}

/// Mensagem completa (header + payload inline)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    /// Flags
    pub flags: MsgFlags,
    /// Número de words válidas em `words`
    pub len: u32,
    /// Payload
    pub words: [u64; MSG_WORDS],
}

impl Message {
    /// Cria mensagem vazia
    pub const fn new() -> Self {
        Self {
            flags: MsgFlags::empty(),
            len: 0,
            words: [0; MSG_WORDS],
        }
    }

    /// Cria com payload (truncado em MSG_WORDS)
    pub fn with_words(data: &[u64]) -> Self {
        let mut msg = Self::new();
        let len = core::cmp::min(data.len(), MSG_WORDS);
        msg.words[..len].copy_from_slice(&data[..len]);
        msg.len = len as u32;
        msg
    }

    /// Cria a mensagem curta de fault (2 words: instruction pointer e
    /// endereço faltante), enviada ao pager registrado.
    pub fn fault(kind: FaultKind, ip: u64, addr: u64) -> Self {
        let mut msg = Self::with_words(&[ip, addr]);
        msg.flags = MsgFlags::from_fault(kind);
        msg
    }

    /// Payload válido
    pub fn payload(&self) -> &[u64] {
        &self.words[..self.len as usize]
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}
