//! # Control de Admisión
//! src/server/admission.rs
//!
//! Semáforo contador que limita cuántas conexiones se procesan a la vez.
//! El accept loop toma un permiso antes de pasar la conexión al pool y el
//! permiso se libera solo cuando se destruye (`Drop`), en cualquier camino
//! de salida, incluido un panic.
//!
//! ```text
//! accept ─→ acquire() ──(bloquea si no hay permisos)──→ pool
//!                                                        │
//!              release  ←── drop(Permit) ←── worker ─────┘
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

struct Slots {
    available: Mutex<usize>,
    condvar: Condvar,
    capacity: usize,
}

/// Semáforo contador de capacidad fija
#[derive(Clone)]
pub struct AdmissionSemaphore {
    slots: Arc<Slots>,
}

impl AdmissionSemaphore {
    /// Crea un semáforo con `capacity` permisos
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Slots {
                available: Mutex::new(capacity),
                condvar: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Toma un permiso, bloqueando hasta que haya uno libre
    pub fn acquire(&self) -> Permit {
        let mut available = self.slots.available.lock();
        while *available == 0 {
            self.slots.condvar.wait(&mut available);
        }
        *available -= 1;

        Permit {
            slots: Arc::clone(&self.slots),
        }
    }

    /// Permisos libres en este momento
    pub fn available(&self) -> usize {
        *self.slots.available.lock()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity
    }
}

impl std::fmt::Debug for AdmissionSemaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionSemaphore")
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .finish()
    }
}

/// Un permiso de admisión. Devuelve exactamente una unidad al destruirse.
pub struct Permit {
    slots: Arc<Slots>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        let mut available = self.slots.available.lock();
        *available += 1;
        self.slots.condvar.notify_one();
    }
}

impl std::fmt::Debug for Permit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Permit")
    }
}

/// Cuenta handlers en ejecución y el máximo observado
#[derive(Debug, Default)]
pub struct AdmissionGauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marca el inicio de un handler; el guard marca el final
    pub fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlight { gauge: self }
    }

    /// Handlers ejecutándose ahora
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Máximo de handlers simultáneos desde el arranque
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Guard de `AdmissionGauge::enter`
#[derive(Debug)]
pub struct InFlight<'a> {
    gauge: &'a AdmissionGauge,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
