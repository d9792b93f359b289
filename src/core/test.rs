//! Testes de integração do núcleo
//!
//! Exercitam o protocolo completo de rendezvous contra o scheduler: ordem
//! síncrona, FIFO entre remetentes, teardown sem deadlock, helping, faults
//! via pager, sinais e vCPU. O backend de CPU é um mock com sondas.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::hal::{CpuDriver, FaultKind, PicDriver};
use crate::ipc::{InboundState, Message, MsgFlags};
use crate::klib::test_framework::{run_test_suite, TestCase, TestResult};
use crate::sched::config::DEFAULT_QUANTUM;
use crate::sched::task::{ExecEntity, Exception, ExceptionOutcome, Regs, VcpuState};
use crate::sched::ThreadState;
use crate::sync::Mutex;
use crate::sys::{CpuId, Errno, Gid, IrqLine, Tid};

use super::kernel::Kernel;

// =============================================================================
// MOCK DE CPU
// =============================================================================

/// Sondas compartilhadas entre o teste e o driver mock
#[derive(Clone)]
struct Probes {
    resumes: Arc<AtomicUsize>,
    switches: Arc<AtomicUsize>,
    halts: Arc<AtomicUsize>,
    ipis: Arc<AtomicUsize>,
    injected: Arc<Mutex<Vec<u32>>>,
}

impl Probes {
    fn new() -> Self {
        Self {
            resumes: Arc::new(AtomicUsize::new(0)),
            switches: Arc::new(AtomicUsize::new(0)),
            halts: Arc::new(AtomicUsize::new(0)),
            ipis: Arc::new(AtomicUsize::new(0)),
            injected: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn ipis(&self) -> usize {
        self.ipis.load(Ordering::SeqCst)
    }
}

struct MockPic {
    probes: Probes,
}

impl PicDriver for MockPic {
    fn trigger(&mut self, _line: IrqLine) {
        self.probes.ipis.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockCpu {
    pic: MockPic,
    probes: Probes,
}

impl MockCpu {
    fn new(probes: Probes) -> Self {
        Self {
            pic: MockPic {
                probes: probes.clone(),
            },
            probes,
        }
    }
}

impl CpuDriver for MockCpu {
    fn pic(&mut self) -> &mut dyn PicDriver {
        &mut self.pic
    }

    fn stack_start(&self) -> u64 {
        0xFFFF_8000_0000_0000
    }

    fn classify_fault(&self, code: u64) -> FaultKind {
        match code {
            14 => FaultKind::PageMissing,
            6 => FaultKind::Exec,
            _ => FaultKind::Unknown,
        }
    }

    fn resume(&mut self, _regs: &Regs) {
        self.probes.resumes.fetch_add(1, Ordering::SeqCst);
    }

    fn world_switch(&mut self, state: &mut VcpuState) {
        let mut seen = self.probes.injected.lock();
        while let Some(line) = state.injected.pop_front() {
            seen.push(line.as_u32());
        }
        self.probes.switches.fetch_add(1, Ordering::SeqCst);
    }

    fn halt(&mut self) {
        self.probes.halts.fetch_add(1, Ordering::SeqCst);
    }
}

fn mock_kernel(ncpus: usize) -> (Kernel, Vec<Probes>) {
    let mut probes = Vec::new();
    let mut drivers: Vec<Box<dyn CpuDriver>> = Vec::new();
    for _ in 0..ncpus {
        let p = Probes::new();
        drivers.push(Box::new(MockCpu::new(p.clone())));
        probes.push(p);
    }
    (Kernel::new(drivers), probes)
}

fn spawn(k: &mut Kernel, name: &str, prio: u8, cpu: u32) -> Option<Tid> {
    let exec = ExecEntity::thread(Regs::new(0x1000, 0x7000));
    let tid = k
        .create_thread(name, Gid::ROOT, prio, CpuId::new(cpu), exec, None)
        .ok()?;
    k.start_thread(tid).ok()?;
    Some(tid)
}

fn state_of(k: &Kernel, tid: Tid) -> Option<ThreadState> {
    k.thread(tid).map(|t| t.state)
}

// =============================================================================
// CASOS DE TESTE
// =============================================================================

const CORE_TESTS: &[TestCase] = &[
    TestCase::new("rendezvous_two_nodes", test_rendezvous_two_nodes),
    TestCase::new("send_before_wait", test_send_before_wait),
    TestCase::new("fifo_across_senders", test_fifo_across_senders),
    TestCase::new("destroy_receiver_wakes_senders", test_destroy_receiver_wakes_senders),
    TestCase::new("destroy_sender_dequeues", test_destroy_sender_dequeues),
    TestCase::new("destroy_caller_voids_reply", test_destroy_caller_voids_reply),
    TestCase::new("reply_without_partner_noop", test_reply_without_partner_noop),
    TestCase::new("protocol_misuse_rejected", test_protocol_misuse_rejected),
    TestCase::new("helping_engages_same_cpu", test_helping_engages_same_cpu),
    TestCase::new("helping_cycle_rejected", test_helping_cycle_rejected),
    TestCase::new("cross_cpu_wake_posts_ipi", test_cross_cpu_wake_posts_ipi),
    TestCase::new("quantum_expiry_preempts", test_quantum_expiry_preempts),
    TestCase::new("yield_rotates_slice", test_yield_rotates_slice),
    TestCase::new("thread_table_exhaustion", test_thread_table_exhaustion),
    TestCase::new("fault_routed_to_pager", test_fault_routed_to_pager),
    TestCase::new("fault_without_pager_stops", test_fault_without_pager_stops),
    TestCase::new("unknown_fault_reaches_pager", test_unknown_fault_reaches_pager),
    TestCase::new("signal_submit_wakes", test_signal_submit_wakes),
    TestCase::new("irq_binding_delivers", test_irq_binding_delivers),
    TestCase::new("vcpu_injects_on_proceed", test_vcpu_injects_on_proceed),
    TestCase::new("proceed_resume_and_halt", test_proceed_resume_and_halt),
];

/// Executa todos os testes de integração do núcleo
pub fn run_core_tests() -> bool {
    let (_, failed, _) = run_test_suite("core", CORE_TESTS);
    failed == 0
}

/// Cenário base: A espera, B envia, A responde. Exatamente uma mensagem
/// observada por A e exatamente um desbloqueio de B, nesta ordem.
fn test_rendezvous_two_nodes() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(a) = spawn(&mut k, "a", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(b) = spawn(&mut k, "b", 128, 0) else {
        return TestResult::Failed;
    };

    // A espera com fila vazia: bloqueia
    if k.ipc_wait(a) != Ok(None) {
        return TestResult::Failed;
    }
    if state_of(&k, a) != Some(ThreadState::AwaitsIpc) {
        return TestResult::Failed;
    }

    // B envia: transferência imediata; B bloqueia aguardando reply
    let payload = Message::with_words(&[0x11, 0x22]);
    if k.ipc_send(b, a, payload).is_err() {
        return TestResult::Failed;
    }
    if state_of(&k, b) != Some(ThreadState::AwaitsIpc) {
        return TestResult::Failed;
    }
    if state_of(&k, a) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }

    // A observa exatamente a mensagem de B, uma única vez
    if k.ipc_outcome(a) != Ok(Some(Ok(payload))) {
        return TestResult::Failed;
    }
    if k.ipc_outcome(a) != Ok(None) {
        return TestResult::Failed;
    }

    // O reply só é observado por B depois de produzido por A
    if k.ipc_outcome(b) != Ok(None) {
        return TestResult::Failed;
    }
    let reply = Message::with_words(&[0x33]);
    if k.ipc_reply(a, reply).is_err() {
        return TestResult::Failed;
    }
    if state_of(&k, b) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    if k.ipc_outcome(b) != Ok(Some(Ok(reply))) {
        return TestResult::Failed;
    }
    if k.ipc_outcome(b) != Ok(None) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Remetente chega antes do wait: entrega imediata no wait, sem bloqueio
fn test_send_before_wait() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(r) = spawn(&mut k, "r", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(s) = spawn(&mut k, "s", 128, 0) else {
        return TestResult::Failed;
    };

    let msg = Message::with_words(&[7]);
    if k.ipc_send(s, r, msg).is_err() {
        return TestResult::Failed;
    }

    match k.ipc_wait(r) {
        Ok(Some(m)) => {
            if m != msg {
                return TestResult::Failed;
            }
        }
        _ => return TestResult::Failed,
    }
    // Receptor não bloqueou; remetente segue preso até o reply
    if state_of(&k, r) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    if state_of(&k, s) != Some(ThreadState::AwaitsIpc) {
        return TestResult::Failed;
    }

    if k.ipc_reply(r, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if state_of(&k, s) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// FIFO estrito: a ordem de send define a ordem de entrega, prioridade não
/// reordena a fila
fn test_fifo_across_senders() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(r) = spawn(&mut k, "r", 128, 0) else {
        return TestResult::Failed;
    };

    let prios = [1u8, 255, 128];
    let mut senders = [Tid::new(0); 3];
    for (i, prio) in prios.iter().enumerate() {
        let Some(s) = spawn(&mut k, "s", *prio, 0) else {
            return TestResult::Failed;
        };
        senders[i] = s;
        if k.ipc_send(s, r, Message::with_words(&[i as u64])).is_err() {
            return TestResult::Failed;
        }
    }

    for i in 0..3 {
        match k.ipc_wait(r) {
            Ok(Some(m)) => {
                if m.payload() != &[i as u64] {
                    return TestResult::Failed;
                }
            }
            _ => return TestResult::Failed,
        }
        if k.ipc_reply(r, Message::new()).is_err() {
            return TestResult::Failed;
        }
        if state_of(&k, senders[i]) != Some(ThreadState::Ready) {
            return TestResult::Failed;
        }
    }
    TestResult::Passed
}

/// Receptor destruído com fila não-vazia: cada remetente acorda com a
/// indicação de "sem receptor" exatamente uma vez
fn test_destroy_receiver_wakes_senders() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(r) = spawn(&mut k, "r", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(s1) = spawn(&mut k, "s1", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(s2) = spawn(&mut k, "s2", 128, 0) else {
        return TestResult::Failed;
    };

    if k.ipc_send(s1, r, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.ipc_send(s2, r, Message::new()).is_err() {
        return TestResult::Failed;
    }

    if k.destroy_thread(r).is_err() {
        return TestResult::Failed;
    }

    for s in [s1, s2] {
        if state_of(&k, s) != Some(ThreadState::Ready) {
            return TestResult::Failed;
        }
        // Sem dupla entrega, sem omissão
        if k.ipc_outcome(s) != Ok(Some(Err(Errno::ENOSENDER))) {
            return TestResult::Failed;
        }
        if k.ipc_outcome(s) != Ok(None) {
            return TestResult::Failed;
        }
    }
    TestResult::Passed
}

/// Remetente destruído no meio do send: some da fila do receptor
fn test_destroy_sender_dequeues() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(r) = spawn(&mut k, "r", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(s) = spawn(&mut k, "s", 128, 0) else {
        return TestResult::Failed;
    };

    if k.ipc_send(s, r, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.thread(r).map(|t| t.ipc.pending_count()) != Some(1) {
        return TestResult::Failed;
    }

    if k.destroy_thread(s).is_err() {
        return TestResult::Failed;
    }
    if k.thread(r).map(|t| t.ipc.pending_count()) != Some(0) {
        return TestResult::Failed;
    }

    // O wait posterior nunca observa o remetente destruído
    if k.ipc_wait(r) != Ok(None) {
        return TestResult::Failed;
    }
    if state_of(&k, r) != Some(ThreadState::AwaitsIpc) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Caller destruído depois do match: o reply devido vira no-op e o
/// receptor volta a poder esperar
fn test_destroy_caller_voids_reply() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(a) = spawn(&mut k, "a", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(b) = spawn(&mut k, "b", 128, 0) else {
        return TestResult::Failed;
    };

    if k.ipc_wait(a) != Ok(None) {
        return TestResult::Failed;
    }
    if k.ipc_send(b, a, Message::with_words(&[1])).is_err() {
        return TestResult::Failed;
    }
    if k.ipc_outcome(a) != Ok(Some(Ok(Message::with_words(&[1])))) {
        return TestResult::Failed;
    }

    if k.destroy_thread(b).is_err() {
        return TestResult::Failed;
    }
    if k.thread(a).map(|t| t.ipc.inbound()) != Some(InboundState::ReplyNoSender) {
        return TestResult::Failed;
    }

    // Reply sem destinatário: no-op, estado zerado
    if k.ipc_reply(a, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.thread(a).map(|t| t.ipc.inbound()) != Some(InboundState::Ready) {
        return TestResult::Failed;
    }
    if k.ipc_wait(a) != Ok(None) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Idempotência: reply sem parceiro ativo não muda estado nem falha
fn test_reply_without_partner_noop() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(a) = spawn(&mut k, "a", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(b) = spawn(&mut k, "b", 128, 0) else {
        return TestResult::Failed;
    };

    if k.ipc_reply(a, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.thread(a).map(|t| t.ipc.inbound()) != Some(InboundState::Ready) {
        return TestResult::Failed;
    }

    // Reply duplo depois de um exchange completo: o segundo é no-op
    if k.ipc_wait(a) != Ok(None) {
        return TestResult::Failed;
    }
    if k.ipc_send(b, a, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.ipc_outcome(a) != Ok(Some(Ok(Message::new()))) {
        return TestResult::Failed;
    }
    if k.ipc_reply(a, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.ipc_reply(a, Message::new()).is_err() {
        return TestResult::Failed;
    }
    // B recebeu um único desbloqueio
    if k.ipc_outcome(b) != Ok(Some(Ok(Message::new()))) {
        return TestResult::Failed;
    }
    if k.ipc_outcome(b) != Ok(None) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Violação de contrato é falha da requisição, não do núcleo
fn test_protocol_misuse_rejected() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(r) = spawn(&mut k, "r", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(s) = spawn(&mut k, "s", 128, 0) else {
        return TestResult::Failed;
    };

    if k.ipc_send(s, r, Message::new()).is_err() {
        return TestResult::Failed;
    }
    // Send com pedido já em voo
    if k.ipc_send(s, r, Message::new()) != Err(Errno::EBUSY) {
        return TestResult::Failed;
    }
    // Send para si mesmo
    if k.ipc_send(r, r, Message::new()) != Err(Errno::EINVAL) {
        return TestResult::Failed;
    }
    // Endpoints inexistentes
    if k.ipc_send(Tid::new(9999), r, Message::new()) != Err(Errno::ESRCH) {
        return TestResult::Failed;
    }
    if k.ipc_wait(Tid::new(9999)) != Err(Errno::ESRCH) {
        return TestResult::Failed;
    }

    // Wait devendo reply
    match k.ipc_wait(r) {
        Ok(Some(_)) => {}
        _ => return TestResult::Failed,
    }
    if k.ipc_wait(r) != Err(Errno::EBUSY) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Doação de fatia: remetente bloqueado empresta seu slot ao receptor da
/// mesma CPU até o reply
fn test_helping_engages_same_cpu() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(a) = spawn(&mut k, "a", 200, 0) else {
        return TestResult::Failed;
    };
    let Some(b) = spawn(&mut k, "b", 100, 0) else {
        return TestResult::Failed;
    };

    if k.schedule(CpuId::new(0), 0) != Some(a) {
        return TestResult::Failed;
    }

    if k.ipc_send(a, b, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.thread(a).and_then(|t| t.sched.helping()) != Some(b) {
        return TestResult::Failed;
    }

    // O slot de A (prioridade 200) executa B
    if k.schedule(CpuId::new(0), 1) != Some(b) {
        return TestResult::Failed;
    }
    match k.current(CpuId::new(0)) {
        Some(slot) => {
            if slot.owner != a || slot.running != b {
                return TestResult::Failed;
            }
        }
        None => return TestResult::Failed,
    }

    // B atende e responde; a doação termina
    match k.ipc_wait(b) {
        Ok(Some(_)) => {}
        _ => return TestResult::Failed,
    }
    if k.ipc_reply(b, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.thread(a).and_then(|t| t.sched.helping()).is_some() {
        return TestResult::Failed;
    }
    if state_of(&k, a) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }

    // A volta a executar pelo próprio slot
    if k.schedule(CpuId::new(0), 2) != Some(a) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// A relação de doação nunca fecha ciclo
fn test_helping_cycle_rejected() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(a) = spawn(&mut k, "a", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(b) = spawn(&mut k, "b", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(c) = spawn(&mut k, "c", 128, 0) else {
        return TestResult::Failed;
    };

    // Cadeia a -> b -> c
    if k.ipc_send(a, b, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.ipc_send(b, c, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.thread(a).and_then(|t| t.sched.helping()) != Some(b) {
        return TestResult::Failed;
    }
    if k.thread(b).and_then(|t| t.sched.helping()) != Some(c) {
        return TestResult::Failed;
    }

    // c -> a fecharia o ciclo: o envio acontece, a doação não
    if k.ipc_send(c, a, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if k.thread(c).and_then(|t| t.sched.helping()).is_some() {
        return TestResult::Failed;
    }
    if k.thread(a).map(|t| t.ipc.pending_count()) != Some(1) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Acordar alguém de outra CPU não doa fatia: dispara a IPI de resched
fn test_cross_cpu_wake_posts_ipi() -> TestResult {
    let (mut k, probes) = mock_kernel(2);
    let Some(a) = spawn(&mut k, "a", 200, 1) else {
        return TestResult::Failed;
    };
    if k.schedule(CpuId::new(1), 0) != Some(a) {
        return TestResult::Failed;
    }
    if k.ipc_wait(a) != Ok(None) {
        return TestResult::Failed;
    }

    let Some(c) = spawn(&mut k, "c", 100, 1) else {
        return TestResult::Failed;
    };
    if k.schedule(CpuId::new(1), 1) != Some(c) {
        return TestResult::Failed;
    }

    let Some(b) = spawn(&mut k, "b", 128, 0) else {
        return TestResult::Failed;
    };
    if k.schedule(CpuId::new(0), 2) != Some(b) {
        return TestResult::Failed;
    }

    let baseline = probes[1].ipis();
    if k.ipc_send(b, a, Message::new()).is_err() {
        return TestResult::Failed;
    }

    // Sem doação entre CPUs; CPU 1 ocupada recebe a IPI
    if k.thread(b).and_then(|t| t.sched.helping()).is_some() {
        return TestResult::Failed;
    }
    if probes[1].ipis() != baseline + 1 {
        return TestResult::Failed;
    }
    if state_of(&k, a) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Quantum expira no tick N e sinaliza preempção; tempo de execução conta
fn test_quantum_expiry_preempts() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(a) = spawn(&mut k, "a", 128, 0) else {
        return TestResult::Failed;
    };
    if k.schedule(CpuId::new(0), 0) != Some(a) {
        return TestResult::Failed;
    }

    for t in 1..DEFAULT_QUANTUM {
        k.timer_tick(CpuId::new(0), t);
        if k.need_resched(CpuId::new(0)) {
            return TestResult::Failed;
        }
    }
    k.timer_tick(CpuId::new(0), DEFAULT_QUANTUM);
    if !k.need_resched(CpuId::new(0)) {
        return TestResult::Failed;
    }

    let Some(t) = k.thread(a) else {
        return TestResult::Failed;
    };
    if t.sched.execution_time() != DEFAULT_QUANTUM {
        return TestResult::Failed;
    }
    if t.sched.accounting.involuntary_switches != 1 {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Yield cede a fatia sem bloquear e roda o próximo da fila
fn test_yield_rotates_slice() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(a) = spawn(&mut k, "a", 128, 0) else {
        return TestResult::Failed;
    };
    let Some(b) = spawn(&mut k, "b", 128, 0) else {
        return TestResult::Failed;
    };

    if k.schedule(CpuId::new(0), 0) != Some(a) {
        return TestResult::Failed;
    }
    if k.yield_now(a).is_err() {
        return TestResult::Failed;
    }
    if !k.need_resched(CpuId::new(0)) {
        return TestResult::Failed;
    }

    // A não bloqueou, apenas vai para o fim da classe
    if k.schedule(CpuId::new(0), 1) != Some(b) {
        return TestResult::Failed;
    }
    if state_of(&k, a) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    if k.thread(a).map(|t| t.sched.accounting.voluntary_switches) != Some(1) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Tabela cheia: erro tipado, nunca crash
fn test_thread_table_exhaustion() -> TestResult {
    let drivers: Vec<Box<dyn CpuDriver>> = alloc::vec![Box::new(MockCpu::new(Probes::new()))];
    let mut k = Kernel::with_capacity(drivers, 2);

    let exec = || ExecEntity::thread(Regs::new(0, 0));
    if k
        .create_thread("t1", Gid::ROOT, 128, CpuId::new(0), exec(), None)
        .is_err()
    {
        return TestResult::Failed;
    }
    if k
        .create_thread("t2", Gid::ROOT, 128, CpuId::new(0), exec(), None)
        .is_err()
    {
        return TestResult::Failed;
    }
    match k.create_thread("t3", Gid::ROOT, 128, CpuId::new(0), exec(), None) {
        Err(Errno::EAGAIN) => {}
        _ => return TestResult::Failed,
    }
    // CPU inválida também é erro tipado
    match k.create_thread("t4", Gid::ROOT, 128, CpuId::new(9), exec(), None) {
        Err(Errno::EINVAL) => {}
        _ => return TestResult::Failed,
    }
    TestResult::Passed
}

/// Page fault vira mensagem curta de 2 words ao pager; o reply retoma a
/// thread faltante
fn test_fault_routed_to_pager() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(pager) = spawn(&mut k, "pager", 200, 0) else {
        return TestResult::Failed;
    };
    if k.ipc_wait(pager) != Ok(None) {
        return TestResult::Failed;
    }

    let exec = ExecEntity::thread(Regs::new(0xAA00, 0x7000));
    let Ok(f) = k.create_thread("f", Gid::ROOT, 128, CpuId::new(0), exec, Some(pager)) else {
        return TestResult::Failed;
    };
    if k.start_thread(f).is_err() {
        return TestResult::Failed;
    }
    if k.schedule(CpuId::new(0), 0) != Some(f) {
        return TestResult::Failed;
    }

    let ex = Exception::Fault {
        code: 14,
        ip: 0xAA00,
        addr: 0xBEEF_0000,
    };
    if k.exception(CpuId::new(0), ex) != Ok(ExceptionOutcome::FaultDelivered) {
        return TestResult::Failed;
    }
    if state_of(&k, f) != Some(ThreadState::Faulted) {
        return TestResult::Failed;
    }

    // O pager acorda com ip e endereço do fault
    if state_of(&k, pager) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    match k.ipc_outcome(pager) {
        Ok(Some(Ok(m))) => {
            if m.payload() != &[0xAA00, 0xBEEF_0000] {
                return TestResult::Failed;
            }
            if !m.flags.contains(MsgFlags::FAULT_PAGE_MISSING) {
                return TestResult::Failed;
            }
        }
        _ => return TestResult::Failed,
    }

    // Reply do pager retoma a thread
    if k.ipc_reply(pager, Message::new()).is_err() {
        return TestResult::Failed;
    }
    if state_of(&k, f) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Sem pager registrado a thread é parada, podendo ser reiniciada depois
fn test_fault_without_pager_stops() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(f) = spawn(&mut k, "f", 128, 0) else {
        return TestResult::Failed;
    };
    if k.schedule(CpuId::new(0), 0) != Some(f) {
        return TestResult::Failed;
    }

    let ex = Exception::Fault {
        code: 14,
        ip: 0,
        addr: 0,
    };
    if k.exception(CpuId::new(0), ex) != Ok(ExceptionOutcome::ThreadStopped) {
        return TestResult::Failed;
    }
    if state_of(&k, f) != Some(ThreadState::Stopped) {
        return TestResult::Failed;
    }
    if k.current(CpuId::new(0)).is_some() {
        return TestResult::Failed;
    }

    // Parada não é morte: com pager atribuído ela reinicia
    if k.start_thread(f).is_err() {
        return TestResult::Failed;
    }
    if state_of(&k, f) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Classe desconhecida é logada e ainda assim chega ao pager
fn test_unknown_fault_reaches_pager() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(pager) = spawn(&mut k, "pager", 200, 0) else {
        return TestResult::Failed;
    };
    if k.ipc_wait(pager) != Ok(None) {
        return TestResult::Failed;
    }

    let exec = ExecEntity::thread(Regs::new(0, 0));
    let Ok(f) = k.create_thread("f", Gid::ROOT, 128, CpuId::new(0), exec, Some(pager)) else {
        return TestResult::Failed;
    };
    if k.start_thread(f).is_err() {
        return TestResult::Failed;
    }
    if k.schedule(CpuId::new(0), 0) != Some(f) {
        return TestResult::Failed;
    }

    let ex = Exception::Fault {
        code: 99,
        ip: 1,
        addr: 2,
    };
    if k.exception(CpuId::new(0), ex) != Ok(ExceptionOutcome::FaultDelivered) {
        return TestResult::Failed;
    }
    match k.ipc_outcome(pager) {
        Ok(Some(Ok(m))) => {
            if !m.flags.contains(MsgFlags::FAULT_UNKNOWN) {
                return TestResult::Failed;
            }
        }
        _ => return TestResult::Failed,
    }
    TestResult::Passed
}

/// submit acorda quem espera; contagens se acumulam até o consumo
fn test_signal_submit_wakes() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(t) = spawn(&mut k, "t", 128, 0) else {
        return TestResult::Failed;
    };

    // Acumulação sem ninguém esperando
    if k.submit(t, 2).is_err() || k.submit(t, 3).is_err() {
        return TestResult::Failed;
    }
    if k.await_signal(t) != Ok(Some(5)) {
        return TestResult::Failed;
    }

    // Sem pendências: bloqueia, e o submit desbloqueia com a contagem
    if k.await_signal(t) != Ok(None) {
        return TestResult::Failed;
    }
    if state_of(&k, t) != Some(ThreadState::AwaitsSignal) {
        return TestResult::Failed;
    }
    if k.submit(t, 1).is_err() {
        return TestResult::Failed;
    }
    if state_of(&k, t) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    if k.signal_outcome(t) != Ok(Some(1)) {
        return TestResult::Failed;
    }
    if k.signal_outcome(t) != Ok(None) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// Interrupção de hardware vira sinal para o handler vinculado
fn test_irq_binding_delivers() -> TestResult {
    let (mut k, _probes) = mock_kernel(1);
    let Some(h) = spawn(&mut k, "h", 200, 0) else {
        return TestResult::Failed;
    };
    let Some(a) = spawn(&mut k, "a", 100, 0) else {
        return TestResult::Failed;
    };

    if k.await_signal(h) != Ok(None) {
        return TestResult::Failed;
    }
    if k.bind_irq(IrqLine(5), h).is_err() {
        return TestResult::Failed;
    }
    if k.bind_irq(IrqLine(5), a) != Err(Errno::EEXIST) {
        return TestResult::Failed;
    }

    if k.schedule(CpuId::new(0), 0) != Some(a) {
        return TestResult::Failed;
    }
    let r = k.exception(CpuId::new(0), Exception::Interrupt(IrqLine(5)));
    if r != Ok(ExceptionOutcome::Interrupt) {
        return TestResult::Failed;
    }
    if state_of(&k, h) != Some(ThreadState::Ready) {
        return TestResult::Failed;
    }
    if k.signal_outcome(h) != Ok(Some(1)) {
        return TestResult::Failed;
    }
    if !k.need_resched(CpuId::new(0)) {
        return TestResult::Failed;
    }

    // Linha sem handler só avisa, não falha
    let r = k.exception(CpuId::new(0), Exception::Interrupt(IrqLine(9)));
    if r != Ok(ExceptionOutcome::Interrupt) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// proceed de um vCPU injeta as interrupções virtuais pendentes antes do
/// world switch, na ordem de chegada
fn test_vcpu_injects_on_proceed() -> TestResult {
    let (mut k, probes) = mock_kernel(1);
    let exec = ExecEntity::vcpu(Regs::new(0x8000, 0x9000));
    let Ok(v) = k.create_thread("v", Gid::ROOT, 128, CpuId::new(0), exec, None) else {
        return TestResult::Failed;
    };
    if k.start_thread(v).is_err() {
        return TestResult::Failed;
    }
    if k.schedule(CpuId::new(0), 0) != Some(v) {
        return TestResult::Failed;
    }

    if k.inject_virq(v, IrqLine(3)).is_err() || k.inject_virq(v, IrqLine(4)).is_err() {
        return TestResult::Failed;
    }
    // Injeção virtual só faz sentido para vCPU
    let Some(t) = spawn(&mut k, "t", 128, 0) else {
        return TestResult::Failed;
    };
    if k.inject_virq(t, IrqLine(1)) != Err(Errno::EINVAL) {
        return TestResult::Failed;
    }

    if k.proceed(CpuId::new(0)).is_err() {
        return TestResult::Failed;
    }
    if probes[0].switches.load(Ordering::SeqCst) != 1 {
        return TestResult::Failed;
    }
    if *probes[0].injected.lock() != alloc::vec![3u32, 4] {
        return TestResult::Failed;
    }
    TestResult::Passed
}

/// proceed retoma uma thread comum; sem contexto corrente a CPU dorme
fn test_proceed_resume_and_halt() -> TestResult {
    let (mut k, probes) = mock_kernel(1);
    let Some(t) = spawn(&mut k, "t", 128, 0) else {
        return TestResult::Failed;
    };
    if k.schedule(CpuId::new(0), 0) != Some(t) {
        return TestResult::Failed;
    }
    if k.proceed(CpuId::new(0)).is_err() {
        return TestResult::Failed;
    }
    if probes[0].resumes.load(Ordering::SeqCst) != 1 {
        return TestResult::Failed;
    }

    if k.destroy_thread(t).is_err() {
        return TestResult::Failed;
    }
    if k.proceed(CpuId::new(0)).is_err() {
        return TestResult::Failed;
    }
    if probes[0].halts.load(Ordering::SeqCst) != 1 {
        return TestResult::Failed;
    }
    TestResult::Passed
}

// =============================================================================
// HARNESS (cargo test)
// =============================================================================

#[cfg(test)]
mod harness {
    #[test]
    fn core_suite() {
        assert!(super::run_core_tests());
    }
}
