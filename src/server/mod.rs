//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! 1. Escucha en un puerto
//! 2. Admite conexiones bajo un límite fijo (semáforo)
//! 3. Las reparte a un pool de workers
//! 4. Cada worker lee, despacha, responde y cierra

pub mod admission;
pub mod pool;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use admission::{AdmissionGauge, AdmissionSemaphore, Permit};
pub use pool::WorkerPool;
pub use tcp::Server;
