//! Nó de Rendezvous IPC (Endpoint síncrono).
//!
//! Cada thread possui exatamente um `IpcNode`. O protocolo é o clássico
//! send/wait/reply síncrono:
//!
//! - `send`: se o peer está em WAIT a transferência é imediata; senão o
//!   remetente entra na fila FIFO do peer. Nos dois casos o remetente fica
//!   bloqueado até o `reply` correspondente.
//! - `wait`: consome o primeiro remetente da fila, ou bloqueia se vazia.
//! - `reply`: libera o remetente registrado durante o match; sem parceiro
//!   ativo é no-op.
//!
//! # Propriedade e Referências
//!
//! O nó é um campo da `Thread` dona (arena em `core::table`). A fila de
//! remetentes e os campos `caller`/`peer` guardam apenas `Tid` (referências
//! fracas); quem destrói uma thread é responsável por anular os links que
//! apontavam para ela. Este arquivo contém só a máquina de estados; o
//! encadeamento com o scheduler (bloquear/acordar) vive em `core::kernel`.
//!
//! # Ordem de Atendimento
//!
//! Remetentes pendentes são atendidos estritamente em FIFO. Prioridade afeta
//! apenas o scheduler (quem roda primeiro), nunca a posição na fila.

use alloc::collections::VecDeque;

use super::message::Message;
use crate::sys::{Errno, Tid};

/// Estado do lado de recepção (inbound)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundState {
    /// Ocioso, pronto para `wait`
    Ready,
    /// Bloqueado esperando um remetente
    Wait,
    /// Pedido recebido, devendo `reply` ao caller registrado
    Reply,
    /// O caller foi destruído antes do reply; o próximo `reply` é no-op
    ReplyNoSender,
    /// Nó em destruição
    Destruct,
}

/// Estado do lado de envio (outbound)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundState {
    /// Ocioso, pronto para `send`
    Ready,
    /// Pedido em voo (na fila do peer ou aguardando reply)
    Send,
    /// Nó em destruição
    Destruct,
}

/// Endpoint de rendezvous de uma thread
pub struct IpcNode {
    /// Estado de recepção
    inbound: InboundState,
    /// A quem devemos reply (válido em `Reply`)
    caller: Option<Tid>,
    /// Fila FIFO de remetentes pendentes (referências fracas)
    queue: VecDeque<Tid>,

    /// Estado de envio
    outbound: OutboundState,
    /// Alvo atual do envio (válido em `Send`)
    peer: Option<Tid>,

    /// Pedido preparado aguardando o match
    outbox: Option<Message>,
    /// Última entrega (pedido recebido ou reply do peer)
    inbox: Option<Message>,
    /// Indicação terminal de teardown do peer, consumida uma única vez
    no_sender: bool,
}

impl IpcNode {
    pub const fn new() -> Self {
        Self {
            inbound: InboundState::Ready,
            caller: None,
            queue: VecDeque::new(),
            outbound: OutboundState::Ready,
            peer: None,
            outbox: None,
            inbox: None,
            no_sender: false,
        }
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    /// Pode iniciar um `send`?
    pub fn ready_to_send(&self) -> bool {
        self.outbound == OutboundState::Ready && self.inbound != InboundState::Destruct
    }

    /// Pode iniciar um `wait`?
    pub fn ready_to_wait(&self) -> bool {
        self.inbound == InboundState::Ready
    }

    pub fn inbound(&self) -> InboundState {
        self.inbound
    }

    pub fn outbound(&self) -> OutboundState {
        self.outbound
    }

    /// Alvo atual do envio, se houver pedido em voo
    pub fn peer(&self) -> Option<Tid> {
        self.peer
    }

    /// Caller registrado (a quem o próximo `reply` se destina)
    pub fn caller(&self) -> Option<Tid> {
        self.caller
    }

    /// Número de remetentes pendentes na fila
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    // =========================================================================
    // LADO DE ENVIO
    // =========================================================================

    /// Prepara um pedido para `peer`. O chamador já validou `ready_to_send`.
    pub(crate) fn stage_send(&mut self, peer: Tid, msg: Message) {
        self.outbound = OutboundState::Send;
        self.peer = Some(peer);
        self.outbox = Some(msg);
    }

    /// Entra na fila de remetentes pendentes do receptor
    pub(crate) fn enqueue_sender(&mut self, sender: Tid) {
        self.queue.push_back(sender);
    }

    /// Remove este nó da fila do peer (aborto/destruição).
    ///
    /// `own` é o Tid da thread dona deste nó.
    pub(crate) fn cancel_send(&mut self, own: Tid, peer_node: &mut IpcNode) {
        peer_node.queue.retain(|t| *t != own);
        self.outbound = OutboundState::Ready;
        self.peer = None;
        self.outbox = None;
    }

    /// Aceita o reply do peer e encerra o pedido em voo
    pub(crate) fn accept_reply(&mut self, msg: Message) {
        self.inbox = Some(msg);
        self.outbound = OutboundState::Ready;
        self.peer = None;
    }

    /// Força a indicação terminal de "sem remetente/receptor".
    ///
    /// Usada quando o peer de um exchange pendente é destruído. O pedido em
    /// voo morre aqui; a indicação é entregue exatamente uma vez via
    /// `take_outcome`.
    pub(crate) fn fail_no_sender(&mut self) {
        self.no_sender = true;
        self.outbound = OutboundState::Ready;
        self.peer = None;
        self.outbox = None;
    }

    // =========================================================================
    // LADO DE RECEPÇÃO
    // =========================================================================

    /// Marca o nó como bloqueado esperando remetente
    pub(crate) fn begin_wait(&mut self) {
        self.inbound = InboundState::Wait;
    }

    /// Completa o match entre este receptor e um remetente.
    ///
    /// Copia a mensagem preparada do remetente, registra o remetente como
    /// "o nó a quem responder" e passa a dever um `reply`. O remetente
    /// permanece em `Send` até o reply.
    pub(crate) fn receive_from(&mut self, sender: Tid, sender_node: &mut IpcNode) {
        self.inbox = sender_node.outbox.take();
        self.caller = Some(sender);
        self.inbound = InboundState::Reply;
    }

    /// Retira o primeiro remetente pendente (ordem FIFO)
    pub(crate) fn dequeue_sender(&mut self) -> Option<Tid> {
        self.queue.pop_front()
    }

    /// Consome a última entrega (pedido ou reply)
    pub(crate) fn take_delivery(&mut self) -> Option<Message> {
        self.inbox.take()
    }

    /// Alvo do reply, se o nó deve um
    pub(crate) fn reply_target(&self) -> Option<Tid> {
        match self.inbound {
            InboundState::Reply => self.caller,
            _ => None,
        }
    }

    /// Zera a contabilidade de recepção após um `reply` (ou no-op dele)
    pub(crate) fn finish_reply(&mut self) {
        self.inbound = InboundState::Ready;
        self.caller = None;
    }

    /// O caller registrado foi destruído: o reply devido vira no-op
    pub(crate) fn force_reply_no_sender(&mut self) {
        self.inbound = InboundState::ReplyNoSender;
        self.caller = None;
    }

    // =========================================================================
    // DESTRUIÇÃO / RESULTADO
    // =========================================================================

    /// Marca os dois lados como em destruição
    pub(crate) fn set_destruct(&mut self) {
        self.inbound = InboundState::Destruct;
        self.outbound = OutboundState::Destruct;
    }

    /// Drena a fila de remetentes pendentes durante o teardown
    pub(crate) fn drain_senders(&mut self) -> VecDeque<Tid> {
        core::mem::take(&mut self.queue)
    }

    /// Consome o desfecho de uma operação bloqueada.
    ///
    /// `None` enquanto o exchange está em voo. A indicação de teardown
    /// (`ENOSENDER`) tem precedência sobre uma entrega pendente e é
    /// observada no máximo uma vez.
    pub fn take_outcome(&mut self) -> Option<Result<Message, Errno>> {
        if self.no_sender {
            self.no_sender = false;
            return Some(Err(Errno::ENOSENDER));
        }
        self.inbox.take().map(Ok)
    }
}

impl Default for IpcNode {
    fn default() -> Self {
        Self::new()
    }
}
