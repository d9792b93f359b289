//! Tabela de Threads (arena).
//!
//! Dona de todas as threads vivas. Qualquer referência cruzada entre
//! threads (fila de remetentes, caller, pager, helping) é um `Tid` resolvido
//! aqui, nunca um ponteiro.

use alloc::collections::BTreeMap;

use crate::sched::task::Thread;
use crate::sys::{Errno, Tid};

/// Arena de threads vivas, indexada por Tid
pub struct ThreadTable {
    map: BTreeMap<Tid, Thread>,
    capacity: usize,
}

impl ThreadTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: BTreeMap::new(),
            capacity,
        }
    }

    /// Insere uma thread. Falha com EAGAIN quando a tabela está cheia.
    pub fn insert(&mut self, thread: Thread) -> Result<Tid, Errno> {
        if self.map.len() >= self.capacity {
            crate::kwarn!("(Table) Tabela de threads cheia. Cap=", self.capacity as u64);
            return Err(Errno::EAGAIN);
        }
        let tid = thread.tid;
        self.map.insert(tid, thread);
        Ok(tid)
    }

    /// Remove uma thread, devolvendo a propriedade ao chamador
    pub fn remove(&mut self, tid: Tid) -> Option<Thread> {
        self.map.remove(&tid)
    }

    pub fn get(&self, tid: Tid) -> Option<&Thread> {
        self.map.get(&tid)
    }

    pub fn get_mut(&mut self, tid: Tid) -> Option<&mut Thread> {
        self.map.get_mut(&tid)
    }

    pub fn contains(&self, tid: Tid) -> bool {
        self.map.contains_key(&tid)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Tids de todas as threads vivas (para varreduras de teardown)
    pub fn tids(&self) -> alloc::vec::Vec<Tid> {
        self.map.keys().copied().collect()
    }

    /// Acessa duas threads distintas mutavelmente.
    ///
    /// O BTreeMap não empresta duas entradas ao mesmo tempo; a primeira é
    /// retirada durante a chamada e reinserida ao final. Retorna `None` se
    /// `a == b` ou se alguma das duas não existe.
    pub fn with_pair<R>(
        &mut self,
        a: Tid,
        b: Tid,
        f: impl FnOnce(&mut Thread, &mut Thread) -> R,
    ) -> Option<R> {
        if a == b {
            return None;
        }
        let mut ta = self.map.remove(&a)?;
        let result = self.map.get_mut(&b).map(|tb| f(&mut ta, tb));
        self.map.insert(a, ta);
        result
    }
}
