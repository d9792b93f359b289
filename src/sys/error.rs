//! # Standard Error Codes (Errno)
//!
//! Define os códigos de erro retornados pelo núcleo.
//! Baseado no padrão POSIX para compatibilidade com ferramentas existentes.
//!
//! Valores negativos são usados em retornos de syscalls (isize).
//!
//! Erros de IPC/Rendezvous não têm equivalente POSIX direto. A faixa >= 1000
//! é reservada para códigos específicos do núcleo.

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    Success = 0,
    EPERM = 1,   // Operation not permitted
    ESRCH = 3,   // No such process
    EINTR = 4,   // Interrupted system call
    EAGAIN = 11, // Try again (resource exhaustion)
    ENOMEM = 12, // Out of memory
    EFAULT = 14, // Bad address
    EBUSY = 16,  // Device or resource busy (protocol misuse)
    EEXIST = 17, // Already exists
    EINVAL = 22, // Invalid argument
    ENOSYS = 38, // Function not implemented

    // Anvil Specific
    ENOSENDER = 1000, // Peer destruído durante exchange pendente (no sender)
}

impl Errno {
    pub fn as_usize(self) -> usize {
        self as usize
    }

    pub fn as_isize(self) -> isize {
        -(self as i32) as isize
    }
}
