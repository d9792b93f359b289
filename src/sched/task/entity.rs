//! Thread Control Block
//!
//! A entidade de topo: compõe o vínculo de CPU (contexto escalonável), o
//! endpoint de IPC e a entidade de execução. É com ela que pagers e entrega
//! de sinais interagem.

use super::exec::ExecEntity;
use super::signal::SignalReceiver;
use super::state::ThreadState;
use crate::ipc::IpcNode;
use crate::sched::context::SchedContext;
use crate::sys::{CpuId, Gid, Tid};

/// Thread ID counter
static NEXT_TID: crate::sync::AtomicCounter = crate::sync::AtomicCounter::new(1);

/// Thread Control Block
pub struct Thread {
    /// ID único
    pub tid: Tid,
    /// Estado atual
    pub state: ThreadState,
    /// Contexto escalonável (prioridade, CPU, helping)
    pub sched: SchedContext,
    /// Endpoint de rendezvous
    pub ipc: IpcNode,
    /// Entidade de execução (thread comum ou vCPU)
    pub exec: ExecEntity,
    /// Receptor de notificações assíncronas
    pub signals: SignalReceiver,
    /// Endpoint do pager que resolve faults desta thread
    pub pager: Option<Tid>,
    /// Nome (debug)
    pub name: [u8; 32],
}

impl Thread {
    /// Cria nova thread
    pub fn new(
        name: &str,
        group: Gid,
        prio: u8,
        cpu: CpuId,
        exec: ExecEntity,
        pager: Option<Tid>,
    ) -> Self {
        let tid = Tid::new(NEXT_TID.inc() as u32);

        let mut name_buf = [0u8; 32];
        let bytes = name.as_bytes();
        let len = bytes.len().min(31);
        name_buf[..len].copy_from_slice(&bytes[..len]);

        Self {
            tid,
            state: ThreadState::Created,
            sched: SchedContext::new(group, prio, cpu),
            ipc: IpcNode::new(),
            exec,
            signals: SignalReceiver::new(),
            pager,
            name: name_buf,
        }
    }

    /// Marca como pronta
    pub fn set_ready(&mut self) {
        self.state = ThreadState::Ready;
        self.sched.ready = true;
    }

    /// Marca como executando
    pub fn set_running(&mut self) {
        self.state = ThreadState::Running;
        self.sched.ready = true;
    }

    /// Marca como bloqueada no estado dado
    pub fn set_blocked(&mut self, state: ThreadState) {
        self.state = state;
        self.sched.ready = false;
    }

    /// Pode ser escalonada?
    pub fn is_runnable(&self) -> bool {
        self.state.is_runnable()
    }
}
