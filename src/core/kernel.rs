//! # Orquestrador do Núcleo (Rendezvous + Escalonamento)
//!
//! Todo o estado do núcleo vive em um único valor `Kernel`: a arena de
//! threads, as CPUs com suas runqueues e os vínculos de IRQ. Cada operação
//! de rendezvous ou escalonamento roda de ponta a ponta sob `&mut Kernel`,
//! que é a transação explícita exigida quando não se pode contar com
//! "interrupções desabilitadas" como exclusão mútua implícita. O kernel que
//! embute este crate compartilha o valor como `spin::Mutex<Kernel>`.
//!
//! ## Pontos de suspensão
//!
//! Um contexto só bloqueia em exatamente três lugares: `send` sem match
//! imediato, `wait` com fila vazia e o caminho de fault (que é um `send` ao
//! pager). `yield_now` cede a fatia sem bloquear. Não existe timeout em
//! nenhuma operação; a única forma de cancelamento é `destroy_thread` de um
//! dos endpoints.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::table::ThreadTable;
use crate::hal::{CpuDriver, FaultKind};
use crate::ipc::{InboundState, Message};
use crate::sched::config::{MAX_HELPING_DEPTH, MAX_THREADS};
use crate::sched::cpu::{Cpu, CurrentSlot};
use crate::sched::task::{ExecEntity, Exception, ExceptionOutcome, Thread, ThreadState};
use crate::sys::{CpuId, Errno, Gid, IrqLine, Tid};

/// Estado global do núcleo de IPC/escalonamento
pub struct Kernel {
    /// Arena de threads vivas
    threads: ThreadTable,
    /// CPUs físicas registradas
    cpus: Vec<Cpu>,
    /// Linha de IRQ -> thread handler
    irq_bindings: BTreeMap<IrqLine, Tid>,
    /// Último tick observado
    now: u64,
}

impl Kernel {
    /// Cria o núcleo com a capacidade padrão de threads
    pub fn new(drivers: Vec<Box<dyn CpuDriver>>) -> Self {
        Self::with_capacity(drivers, MAX_THREADS)
    }

    /// Cria o núcleo com capacidade explícita da tabela de threads
    pub fn with_capacity(drivers: Vec<Box<dyn CpuDriver>>, capacity: usize) -> Self {
        crate::kinfo!("(Core) Inicializando núcleo. CPUs=", drivers.len() as u64);
        let cpus = drivers
            .into_iter()
            .enumerate()
            .map(|(i, driver)| Cpu::new(CpuId::new(i as u32), driver))
            .collect();
        Self {
            threads: ThreadTable::new(capacity),
            cpus,
            irq_bindings: BTreeMap::new(),
            now: 0,
        }
    }

    // =========================================================================
    // INTROSPECÇÃO
    // =========================================================================

    pub fn num_cpus(&self) -> usize {
        self.cpus.len()
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Acesso somente-leitura a uma thread viva
    pub fn thread(&self, tid: Tid) -> Option<&Thread> {
        self.threads.get(tid)
    }

    /// Slot corrente de uma CPU
    pub fn current(&self, cpu: CpuId) -> Option<CurrentSlot> {
        self.cpus.get(cpu.as_usize()).and_then(|c| c.current())
    }

    /// Reescalonamento pendente em uma CPU?
    pub fn need_resched(&self, cpu: CpuId) -> bool {
        self.cpus
            .get(cpu.as_usize())
            .map(|c| c.need_resched())
            .unwrap_or(false)
    }

    /// Último tick observado pelo núcleo
    pub fn now(&self) -> u64 {
        self.now
    }

    // =========================================================================
    // CICLO DE VIDA
    // =========================================================================

    /// Cria uma thread vinculada a uma CPU. Não entra na runqueue até
    /// `start_thread`.
    pub fn create_thread(
        &mut self,
        name: &str,
        group: Gid,
        prio: u8,
        cpu: CpuId,
        exec: ExecEntity,
        pager: Option<Tid>,
    ) -> Result<Tid, Errno> {
        if cpu.as_usize() >= self.cpus.len() {
            return Err(Errno::EINVAL);
        }
        if let Some(p) = pager {
            if !self.threads.contains(p) {
                return Err(Errno::ESRCH);
            }
        }
        let thread = Thread::new(name, group, prio, cpu, exec, pager);
        let tid = self.threads.insert(thread)?;
        crate::kinfo!("(Core) Thread criada. Tid=", tid.as_u32() as u64);
        Ok(tid)
    }

    /// Coloca uma thread recém-criada (ou parada) na runqueue de sua CPU
    pub fn start_thread(&mut self, tid: Tid) -> Result<(), Errno> {
        {
            let t = self.threads.get(tid).ok_or(Errno::ESRCH)?;
            match t.state {
                ThreadState::Created | ThreadState::Stopped => {}
                _ => return Err(Errno::EBUSY),
            }
        }
        self.wake(tid);
        Ok(())
    }

    /// Registra (ou troca) o pager de uma thread
    pub fn set_pager(&mut self, tid: Tid, pager: Option<Tid>) -> Result<(), Errno> {
        if let Some(p) = pager {
            if !self.threads.contains(p) {
                return Err(Errno::ESRCH);
            }
        }
        let t = self.threads.get_mut(tid).ok_or(Errno::ESRCH)?;
        t.pager = pager;
        Ok(())
    }

    /// Destrói uma thread, desfazendo toda participação em exchanges
    /// pendentes sem deixar nenhum peer bloqueado para sempre.
    pub fn destroy_thread(&mut self, tid: Tid) -> Result<(), Errno> {
        let mut victim = self.threads.remove(tid).ok_or(Errno::ESRCH)?;
        victim.state = ThreadState::Dead;
        victim.ipc.set_destruct();

        // 1. Pedido em voo nosso: sai da fila do peer, ou anula o reply que
        //    o peer nos devia.
        if let Some(peer) = victim.ipc.peer() {
            if let Some(pt) = self.threads.get_mut(peer) {
                if pt.ipc.caller() == Some(tid) {
                    pt.ipc.force_reply_no_sender();
                } else {
                    victim.ipc.cancel_send(tid, &mut pt.ipc);
                }
            }
        }

        // 2. Remetentes enfileirados em nós acordam com ENOSENDER,
        //    exatamente uma vez cada.
        let senders = victim.ipc.drain_senders();
        for s_tid in senders {
            if let Some(st) = self.threads.get_mut(s_tid) {
                st.ipc.fail_no_sender();
                st.sched.helping_finished();
            }
            self.wake(s_tid);
        }

        // 3. Caller aguardando nosso reply
        if let Some(caller) = victim.ipc.reply_target() {
            if let Some(ct) = self.threads.get_mut(caller) {
                ct.ipc.fail_no_sender();
                ct.sched.helping_finished();
            }
            self.wake(caller);
        }

        // 4. Scheduler: fora da runqueue e do slot corrente
        if let Some(cpu) = self.cpus.get_mut(victim.sched.cpu.as_usize()) {
            cpu.runqueue.remove(tid);
            if let Some(slot) = cpu.current() {
                if slot.owner == tid || slot.running == tid {
                    cpu.deactivate();
                    cpu.set_need_resched();
                }
            }
        }

        // 5. Arestas de helping apontando para a vítima
        for other in self.threads.tids() {
            let points_here =
                self.threads.get(other).and_then(|t| t.sched.helping()) == Some(tid);
            if points_here {
                if let Some(t) = self.threads.get_mut(other) {
                    t.sched.helping_finished();
                }
            }
        }

        // 6. Vínculos de IRQ
        self.irq_bindings.retain(|_, v| *v != tid);

        crate::kinfo!("(Core) Thread destruída. Tid=", tid.as_u32() as u64);
        Ok(())
    }

    // =========================================================================
    // RENDEZVOUS IPC
    // =========================================================================

    /// Envia um pedido síncrono. O remetente bloqueia até o reply do
    /// receptor (ou até a destruição de um dos lados).
    pub fn ipc_send(&mut self, sender: Tid, receiver: Tid, msg: Message) -> Result<(), Errno> {
        self.send_and_block(sender, receiver, msg, ThreadState::AwaitsIpc)
    }

    /// Espera por um pedido. Com remetente pendente a entrega é imediata
    /// (`Some`); com fila vazia o receptor bloqueia (`None`) e o pedido
    /// chega depois via `ipc_outcome`.
    pub fn ipc_wait(&mut self, tid: Tid) -> Result<Option<Message>, Errno> {
        {
            let t = self.threads.get(tid).ok_or(Errno::ESRCH)?;
            if !t.ipc.ready_to_wait() {
                crate::kwarn!("(IPC) wait fora de estado READY. Tid=", tid.as_u32() as u64);
                return Err(Errno::EBUSY);
            }
        }
        loop {
            let head = match self.threads.get_mut(tid) {
                Some(t) => t.ipc.dequeue_sender(),
                None => return Err(Errno::ESRCH),
            };
            match head {
                Some(s_tid) => {
                    let matched = self.threads.with_pair(tid, s_tid, |r, s| {
                        r.ipc.receive_from(s_tid, &mut s.ipc);
                    });
                    if matched.is_none() {
                        // Entrada obsoleta: o remetente já não existe
                        crate::kwarn!("(IPC) Remetente sumiu da fila. Tid=", s_tid.as_u32() as u64);
                        continue;
                    }
                    let msg = self.threads.get_mut(tid).and_then(|t| t.ipc.take_delivery());
                    match msg {
                        Some(m) => {
                            crate::ktrace!("(IPC) wait atendido da fila. De=", s_tid.as_u32() as u64);
                            return Ok(Some(m));
                        }
                        None => continue,
                    }
                }
                None => {
                    if let Some(t) = self.threads.get_mut(tid) {
                        t.ipc.begin_wait();
                    }
                    self.block(tid, ThreadState::AwaitsIpc, false);
                    crate::ktrace!("(IPC) wait bloqueou. Tid=", tid.as_u32() as u64);
                    return Ok(None);
                }
            }
        }
    }

    /// Responde o pedido recebido, liberando o remetente bloqueado.
    /// Sem parceiro ativo é no-op. Idempotente.
    pub fn ipc_reply(&mut self, tid: Tid, msg: Message) -> Result<(), Errno> {
        let target = {
            let t = self.threads.get(tid).ok_or(Errno::ESRCH)?;
            t.ipc.reply_target()
        };
        match target {
            Some(caller) => {
                let delivered = self.threads.with_pair(tid, caller, |t, c| {
                    c.ipc.accept_reply(msg);
                    t.ipc.finish_reply();
                });
                if delivered.is_none() {
                    // Caller já não existe; só zera a contabilidade local
                    if let Some(t) = self.threads.get_mut(tid) {
                        t.ipc.finish_reply();
                    }
                    return Ok(());
                }
                if let Some(c) = self.threads.get_mut(caller) {
                    c.sched.helping_finished();
                }
                self.wake(caller);
                crate::ktrace!("(IPC) reply entregue. Para=", caller.as_u32() as u64);
            }
            None => {
                // Caller destruído antes do reply, ou reply sem pedido: no-op
                let t = self.threads.get_mut(tid).ok_or(Errno::ESRCH)?;
                if t.ipc.inbound() == InboundState::ReplyNoSender {
                    t.ipc.finish_reply();
                }
                crate::ktrace!("(IPC) reply sem parceiro ativo (no-op)");
            }
        }
        Ok(())
    }

    /// Consome o desfecho de uma operação de IPC bloqueada: o reply (ou
    /// pedido) entregue, ou `ENOSENDER` se o peer foi destruído. `None`
    /// enquanto o exchange está em voo.
    pub fn ipc_outcome(&mut self, tid: Tid) -> Result<Option<Result<Message, Errno>>, Errno> {
        let t = self.threads.get_mut(tid).ok_or(Errno::ESRCH)?;
        Ok(t.ipc.take_outcome())
    }

    /// Caminho comum de envio: match imediato ou fila FIFO, helping quando
    /// os dois contextos dividem a CPU, e bloqueio do remetente.
    fn send_and_block(
        &mut self,
        sender: Tid,
        receiver: Tid,
        msg: Message,
        block_state: ThreadState,
    ) -> Result<(), Errno> {
        if sender == receiver {
            return Err(Errno::EINVAL);
        }
        if !self.threads.contains(receiver) {
            return Err(Errno::ESRCH);
        }
        {
            let s = self.threads.get(sender).ok_or(Errno::ESRCH)?;
            if !s.ipc.ready_to_send() {
                crate::kwarn!("(IPC) send fora de estado READY. Tid=", sender.as_u32() as u64);
                return Err(Errno::EBUSY);
            }
        }

        let immediate = self
            .threads
            .with_pair(sender, receiver, |s, r| {
                s.ipc.stage_send(receiver, msg);
                if r.ipc.inbound() == InboundState::Wait {
                    r.ipc.receive_from(sender, &mut s.ipc);
                    true
                } else {
                    r.ipc.enqueue_sender(sender);
                    false
                }
            })
            .ok_or(Errno::ESRCH)?;

        if immediate {
            crate::ktrace!("(IPC) Transferência imediata. Para=", receiver.as_u32() as u64);
            self.wake(receiver);
        } else {
            crate::ktrace!("(IPC) Remetente enfileirado. Em=", receiver.as_u32() as u64);
        }

        // Doação de fatia: só dentro da mesma CPU e nunca formando ciclo
        let helping = self.try_help(sender, receiver);
        self.block(sender, block_state, helping);
        if helping {
            self.push_runqueue(sender);
        }
        Ok(())
    }

    // =========================================================================
    // SINAIS / IRQ
    // =========================================================================

    /// Entrega `count` notificações assíncronas. Um alvo bloqueado em
    /// `await_signal` acorda e consome o acumulado.
    pub fn submit(&mut self, tid: Tid, count: u64) -> Result<(), Errno> {
        let woke = {
            let t = self.threads.get_mut(tid).ok_or(Errno::ESRCH)?;
            t.signals.submit(count);
            if t.state == ThreadState::AwaitsSignal {
                let n = t.signals.take_pending();
                t.signals.mark_delivered(n);
                true
            } else {
                false
            }
        };
        if woke {
            self.wake(tid);
        }
        Ok(())
    }

    /// Consome notificações pendentes ou bloqueia até a próxima entrega
    pub fn await_signal(&mut self, tid: Tid) -> Result<Option<u64>, Errno> {
        let pending = {
            let t = self.threads.get_mut(tid).ok_or(Errno::ESRCH)?;
            if t.signals.pending() > 0 {
                Some(t.signals.take_pending())
            } else {
                None
            }
        };
        match pending {
            Some(n) => Ok(Some(n)),
            None => {
                self.block(tid, ThreadState::AwaitsSignal, false);
                Ok(None)
            }
        }
    }

    /// Consome a contagem entregue no último desbloqueio
    pub fn signal_outcome(&mut self, tid: Tid) -> Result<Option<u64>, Errno> {
        let t = self.threads.get_mut(tid).ok_or(Errno::ESRCH)?;
        Ok(t.signals.take_delivered())
    }

    /// Vincula uma linha de IRQ a uma thread handler
    pub fn bind_irq(&mut self, line: IrqLine, tid: Tid) -> Result<(), Errno> {
        if !self.threads.contains(tid) {
            return Err(Errno::ESRCH);
        }
        if self.irq_bindings.contains_key(&line) {
            return Err(Errno::EEXIST);
        }
        self.irq_bindings.insert(line, tid);
        crate::kinfo!("(Core) IRQ vinculada. Linha=", line.as_u32() as u64);
        Ok(())
    }

    /// Desfaz o vínculo de uma linha de IRQ
    pub fn unbind_irq(&mut self, line: IrqLine) -> Option<Tid> {
        self.irq_bindings.remove(&line)
    }

    /// Enfileira uma interrupção virtual para um vCPU. A injeção efetiva
    /// acontece no próximo `proceed`.
    pub fn inject_virq(&mut self, tid: Tid, line: IrqLine) -> Result<(), Errno> {
        let woke = {
            let t = self.threads.get_mut(tid).ok_or(Errno::ESRCH)?;
            match &mut t.exec {
                ExecEntity::Vcpu { state } => state.pending_virq.push_back(line),
                ExecEntity::Thread { .. } => return Err(Errno::EINVAL),
            }
            t.state == ThreadState::AwaitsSignal
        };
        if woke {
            self.wake(tid);
        }
        Ok(())
    }

    // =========================================================================
    // EXCEÇÕES / PAGER
    // =========================================================================

    /// Despacha uma exceção levantada enquanto o contexto corrente da CPU
    /// executava. Válido apenas com um slot corrente ativo.
    pub fn exception(&mut self, cpu_id: CpuId, ex: Exception) -> Result<ExceptionOutcome, Errno> {
        let idx = cpu_id.as_usize();
        let slot = self
            .cpus
            .get(idx)
            .ok_or(Errno::EINVAL)?
            .current()
            .ok_or(Errno::ESRCH)?;
        let running = slot.running;

        match ex {
            Exception::Syscall => Ok(ExceptionOutcome::Syscall),

            Exception::Interrupt(line) => {
                match self.irq_bindings.get(&line).copied() {
                    Some(handler) => {
                        if self.submit(handler, 1).is_err() {
                            crate::kwarn!("(Core) Handler de IRQ inválido. Linha=", line.as_u32() as u64);
                        }
                    }
                    None => {
                        crate::kwarn!("(Core) IRQ sem handler vinculado. Linha=", line.as_u32() as u64);
                    }
                }
                if let Some(cpu) = self.cpus.get_mut(idx) {
                    cpu.set_need_resched();
                }
                Ok(ExceptionOutcome::Interrupt)
            }

            Exception::Fault { code, ip, addr } => {
                let kind = self
                    .cpus
                    .get(idx)
                    .ok_or(Errno::EINVAL)?
                    .driver
                    .classify_fault(code);
                if kind == FaultKind::Unknown {
                    // Nunca descartado em silêncio: vai logado e segue ao pager
                    crate::kerror!("(Core) Classe de fault desconhecida. Code=", code);
                }

                let pager = self.threads.get(running).ok_or(Errno::ESRCH)?.pager;
                let pager = pager.filter(|p| self.threads.contains(*p));

                match pager {
                    None => {
                        crate::kerror!("(Core) Fault sem pager. Parando Tid=", running.as_u32() as u64);
                        self.block(running, ThreadState::Stopped, false);
                        Ok(ExceptionOutcome::ThreadStopped)
                    }
                    Some(p) => {
                        // Mensagem curta de 2 words: instruction pointer e
                        // endereço do fault, com a classe nas flags.
                        let msg = Message::fault(kind, ip, addr);
                        self.send_and_block(running, p, msg, ThreadState::Faulted)?;
                        crate::kdebug!("(Core) Fault encaminhado ao pager. Tid=", running.as_u32() as u64);
                        Ok(ExceptionOutcome::FaultDelivered)
                    }
                }
            }
        }
    }

    /// Retoma a execução de hardware do contexto corrente da CPU. Para um
    /// vCPU, injeta as interrupções virtuais pendentes antes do world
    /// switch. Sem contexto corrente, a CPU dorme.
    pub fn proceed(&mut self, cpu_id: CpuId) -> Result<(), Errno> {
        let Self { cpus, threads, .. } = self;
        let cpu = cpus.get_mut(cpu_id.as_usize()).ok_or(Errno::EINVAL)?;
        match cpu.current() {
            None => cpu.driver.halt(),
            Some(slot) => match threads.get_mut(slot.running) {
                None => {
                    crate::kerror!("(Core) Slot corrente órfão. Tid=", slot.running.as_u32() as u64);
                    cpu.deactivate();
                    cpu.driver.halt();
                }
                Some(t) => match &mut t.exec {
                    ExecEntity::Thread { regs } => cpu.driver.resume(regs),
                    ExecEntity::Vcpu { state } => {
                        while let Some(line) = state.pending_virq.pop_front() {
                            state.injected.push_back(line);
                        }
                        cpu.driver.world_switch(state);
                    }
                },
            },
        }
        Ok(())
    }

    // =========================================================================
    // ESCALONAMENTO
    // =========================================================================

    /// Tick do timer: credita tempo ao contexto executando, desconta o
    /// quantum do dono da fatia e sinaliza preempção quando ele expira.
    pub fn timer_tick(&mut self, cpu_id: CpuId, now: u64) {
        self.now = now;
        let slot = match self.cpus.get(cpu_id.as_usize()) {
            Some(c) => c.current(),
            None => return,
        };
        if let Some(slot) = slot {
            if let Some(run) = self.threads.get_mut(slot.running) {
                run.sched.accounting.charge_tick();
            }
            let expired = match self.threads.get_mut(slot.owner) {
                Some(owner) => owner.sched.accounting.tick_quantum(),
                None => false,
            };
            if expired {
                if let Some(owner) = self.threads.get_mut(slot.owner) {
                    owner.sched.accounting.account_switch(false);
                }
                if let Some(cpu) = self.cpus.get_mut(cpu_id.as_usize()) {
                    cpu.set_need_resched();
                }
            }
        }
    }

    /// Yield: cede o resto da fatia sem bloquear
    pub fn yield_now(&mut self, tid: Tid) -> Result<(), Errno> {
        let cpu_id = {
            let t = self.threads.get_mut(tid).ok_or(Errno::ESRCH)?;
            t.sched.accounting.account_switch(true);
            t.sched.accounting.surrender_quantum();
            t.sched.cpu
        };
        if let Some(cpu) = self.cpus.get_mut(cpu_id.as_usize()) {
            cpu.set_need_resched();
        }
        crate::ktrace!("(Sched) yield. Tid=", tid.as_u32() as u64);
        Ok(())
    }

    /// Função principal de escalonamento de uma CPU.
    ///
    /// Rotaciona o slot corrente, escolhe o próximo dono de fatia (classe de
    /// prioridade mais alta, FIFO dentro da classe) e resolve a cadeia de
    /// helping para decidir quem executa de fato.
    pub fn schedule(&mut self, cpu_id: CpuId, now: u64) -> Option<Tid> {
        let idx = cpu_id.as_usize();
        self.now = now;

        // 1. Rotaciona o slot corrente
        let old = match self.cpus.get_mut(idx) {
            Some(c) => c.deactivate(),
            None => return None,
        };
        if let Some(slot) = old {
            if slot.running != slot.owner {
                if let Some(run) = self.threads.get_mut(slot.running) {
                    if run.state == ThreadState::Running {
                        run.set_ready();
                    }
                }
            }
            let requeue = match self.threads.get_mut(slot.owner) {
                Some(owner) => {
                    if owner.state == ThreadState::Running {
                        owner.set_ready();
                    }
                    // Dono volta à fila se continua pronto, ou se segue
                    // doando a fatia a alguém (bloqueado com aresta ativa)
                    owner.is_runnable()
                        || (owner.state.is_blocked() && owner.sched.helping().is_some())
                }
                None => false,
            };
            if requeue {
                self.push_runqueue(slot.owner);
            }
        }

        // 2. Escolhe o próximo dono de fatia
        loop {
            let owner = match self.cpus.get_mut(idx) {
                Some(c) => c.runqueue.pop()?,
                None => return None,
            };
            match self.threads.get_mut(owner) {
                Some(t) => t.sched.queued = false,
                None => continue,
            }

            let running = match self.resolve_helping(owner) {
                Some(r) => r,
                None => {
                    // Entrada sem ninguém executável no fim da cadeia
                    crate::kwarn!("(Sched) Contexto enfileirado sem alvo executável. Tid=", owner.as_u32() as u64);
                    continue;
                }
            };

            if let Some(o) = self.threads.get_mut(owner) {
                o.sched.accounting.start_exec(now);
            }
            if running != owner {
                if let Some(r) = self.threads.get_mut(running) {
                    r.sched.accounting.last_start_time = now;
                }
                crate::ktrace!("(Sched) Fatia doada. Executando=", running.as_u32() as u64);
            }
            if let Some(r) = self.threads.get_mut(running) {
                r.set_running();
            }
            if let Some(cpu) = self.cpus.get_mut(idx) {
                cpu.activate(CurrentSlot { owner, running });
            }
            return Some(running);
        }
    }

    // =========================================================================
    // INTERNOS
    // =========================================================================

    /// Segue a cadeia de doação a partir de `owner` até um contexto
    /// executável. Limite de profundidade segura a travessia.
    fn resolve_helping(&self, owner: Tid) -> Option<Tid> {
        let mut cur = owner;
        for _ in 0..MAX_HELPING_DEPTH {
            let t = self.threads.get(cur)?;
            if t.is_runnable() {
                return Some(cur);
            }
            match t.sched.helping() {
                Some(next) => cur = next,
                None => return None,
            }
        }
        None
    }

    /// Tenta registrar a doação de fatia do remetente para o receptor.
    /// Falha silenciosa (sem doação) entre CPUs diferentes ou quando a
    /// aresta fecharia um ciclo.
    fn try_help(&mut self, sender: Tid, receiver: Tid) -> bool {
        let possible = match (self.threads.get(sender), self.threads.get(receiver)) {
            (Some(s), Some(r)) => s.sched.helping_possible(&r.sched),
            _ => false,
        };
        if !possible {
            return false;
        }

        // A cadeia a partir do receptor não pode alcançar o remetente
        let mut cur = receiver;
        let mut depth = 0;
        loop {
            if cur == sender {
                return false;
            }
            depth += 1;
            if depth > MAX_HELPING_DEPTH {
                return false;
            }
            match self.threads.get(cur).and_then(|t| t.sched.helping()) {
                Some(next) => cur = next,
                None => break,
            }
        }

        match self.threads.get_mut(sender) {
            Some(s) => {
                s.sched.help(receiver);
                crate::ktrace!("(Sched) Helping registrado. Alvo=", receiver.as_u32() as u64);
                true
            }
            None => false,
        }
    }

    /// Acorda uma thread: pronta, na runqueue de sua CPU, com pedido de
    /// reescalonamento (IPI se a CPU está ocupada com outro contexto).
    fn wake(&mut self, tid: Tid) {
        let target = match self.threads.get_mut(tid) {
            Some(t) => {
                t.set_ready();
                let push = !t.sched.queued;
                if push {
                    t.sched.queued = true;
                }
                Some((t.sched.cpu, t.sched.prio, push))
            }
            None => None,
        };
        if let Some((cpu_id, prio, push)) = target {
            if let Some(cpu) = self.cpus.get_mut(cpu_id.as_usize()) {
                if push {
                    cpu.runqueue.push(prio, tid);
                }
                if cpu.current().is_some() {
                    cpu.post_resched_ipi();
                } else {
                    cpu.set_need_resched();
                }
            }
        }
    }

    /// Coloca um contexto na runqueue sem alterar seu estado (usado para
    /// manter o doador de uma fatia escalonável enquanto bloqueado)
    fn push_runqueue(&mut self, tid: Tid) {
        let target = match self.threads.get_mut(tid) {
            Some(t) => {
                if t.sched.queued {
                    None
                } else {
                    t.sched.queued = true;
                    Some((t.sched.cpu, t.sched.prio))
                }
            }
            None => None,
        };
        if let Some((cpu_id, prio)) = target {
            if let Some(cpu) = self.cpus.get_mut(cpu_id.as_usize()) {
                cpu.runqueue.push(prio, tid);
            }
        }
    }

    /// Bloqueia uma thread no estado dado. Com `keep_queued`, o contexto
    /// permanece elegível na runqueue como doador de fatia.
    fn block(&mut self, tid: Tid, state: ThreadState, keep_queued: bool) {
        let info = match self.threads.get_mut(tid) {
            Some(t) => {
                t.set_blocked(state);
                let dequeue = !keep_queued && t.sched.queued;
                if dequeue {
                    t.sched.queued = false;
                }
                Some((t.sched.cpu, dequeue))
            }
            None => None,
        };
        if let Some((cpu_id, dequeue)) = info {
            let mut donor = None;
            if let Some(cpu) = self.cpus.get_mut(cpu_id.as_usize()) {
                if dequeue {
                    cpu.runqueue.remove(tid);
                }
                if let Some(slot) = cpu.current() {
                    if slot.owner == tid || slot.running == tid {
                        cpu.deactivate();
                        cpu.set_need_resched();
                        // O dono da fatia segue doando se quem bloqueou foi
                        // só o contexto ajudado
                        if slot.owner != tid {
                            donor = Some(slot.owner);
                        }
                    }
                }
            }
            if let Some(owner) = donor {
                self.push_runqueue(owner);
            }
        }
    }
}
