//! # Contador de Visitas
//! src/hits/counter.rs
//!
//! Cuenta cuántas veces se pidió cada ruta. Existe en dos modos:
//!
//! - **racy**: lee, espera, escribe `+1` sin exclusión mutua. Con varios
//!   workers sobre la misma ruta se pierden incrementos (lost update).
//! - **locked**: la misma secuencia, pero dentro de un mutex global de la
//!   tabla. El conteo final es exacto.
//!
//! El modo se elige al construir el contador y queda encapsulado en una
//! estrategia (`IncrementStrategy`). El almacenamiento es el mismo para ambos.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::ValueEnum;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::files::normalize_uri_path;

/// Modo de sincronización del contador
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CounterMode {
    /// Read-modify-write sin lock (demuestra la condición de carrera)
    #[value(alias = "naive")]
    Racy,

    /// Read-modify-write bajo un mutex
    Locked,
}

impl fmt::Display for CounterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterMode::Racy => write!(f, "racy"),
            CounterMode::Locked => write!(f, "locked"),
        }
    }
}

/// Forma de aplicar un incremento sobre un slot
///
/// `delay` se inserta entre la lectura y la escritura para ensanchar la
/// ventana de carrera.
pub trait IncrementStrategy: Send + Sync {
    fn increment(&self, slot: &AtomicU64, delay: Duration);

    fn mode(&self) -> CounterMode;
}

/// Incremento sin sincronización
///
/// `load` y `store` van separados; no usar `fetch_add`.
#[derive(Debug, Default)]
pub struct RacyIncrement;

impl IncrementStrategy for RacyIncrement {
    fn increment(&self, slot: &AtomicU64, delay: Duration) {
        let previous = slot.load(Ordering::Relaxed);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        slot.store(previous + 1, Ordering::Relaxed);
    }

    fn mode(&self) -> CounterMode {
        CounterMode::Racy
    }
}

/// Incremento serializado por un mutex que cubre toda la tabla
#[derive(Debug, Default)]
pub struct LockedIncrement {
    lock: Mutex<()>,
}

impl IncrementStrategy for LockedIncrement {
    fn increment(&self, slot: &AtomicU64, delay: Duration) {
        let _guard = self.lock.lock();
        let previous = slot.load(Ordering::Acquire);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        slot.store(previous + 1, Ordering::Release);
    }

    fn mode(&self) -> CounterMode {
        CounterMode::Locked
    }
}

impl CounterMode {
    /// Construye la estrategia correspondiente al modo
    pub fn strategy(self) -> Box<dyn IncrementStrategy> {
        match self {
            CounterMode::Racy => Box::new(RacyIncrement),
            CounterMode::Locked => Box::new(LockedIncrement::default()),
        }
    }
}

/// Tabla ruta -> visitas, compartida por todos los workers
pub struct HitCounter {
    slots: DashMap<String, Arc<AtomicU64>>,
    strategy: Box<dyn IncrementStrategy>,
    delay: Duration,
}

impl HitCounter {
    /// Crea un contador vacío
    ///
    /// # Ejemplo
    /// ```
    /// use std::time::Duration;
    /// use file_server::hits::{CounterMode, HitCounter};
    ///
    /// let hits = HitCounter::new(CounterMode::Locked, Duration::ZERO);
    /// hits.increment("/a.html");
    /// hits.increment("/a.html?x=1");
    /// assert_eq!(hits.get("/a.html"), 2);
    /// ```
    pub fn new(mode: CounterMode, delay: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            strategy: mode.strategy(),
            delay,
        }
    }

    /// Suma una visita a la ruta (la clave se normaliza)
    pub fn increment(&self, uri: &str) {
        let key = normalize_uri_path(uri);

        // El guard del DashMap se suelta antes del delay
        let slot = self.slots.entry(key).or_default().clone();

        self.strategy.increment(&slot, self.delay);
    }

    /// Visitas registradas para la ruta; 0 si nunca se pidió
    ///
    /// Nunca espera al delay artificial.
    pub fn get(&self, uri: &str) -> u64 {
        let key = normalize_uri_path(uri);
        self.slots
            .get(&key)
            .map(|slot| slot.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    pub fn mode(&self) -> CounterMode {
        self.strategy.mode()
    }
}

impl fmt::Debug for HitCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitCounter")
            .field("mode", &self.mode())
            .field("delay", &self.delay)
            .field("paths", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    /// Lanza `k` incrementos simultáneos sobre la misma ruta
    fn hammer(mode: CounterMode, k: usize, delay: Duration) -> u64 {
        let hits = Arc::new(HitCounter::new(mode, delay));
        let barrier = Arc::new(Barrier::new(k));

        let handles: Vec<_> = (0..k)
            .map(|_| {
                let hits = Arc::clone(&hits);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    hits.increment("/a.html");
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        hits.get("/a.html")
    }

    #[test]
    fn test_unknown_path_is_zero() {
        let hits = HitCounter::new(CounterMode::Racy, Duration::ZERO);
        assert_eq!(hits.get("/never"), 0);
        assert!(hits.slots.is_empty());
    }

    #[test]
    fn test_sequential_increments_both_modes() {
        for mode in [CounterMode::Racy, CounterMode::Locked] {
            let hits = HitCounter::new(mode, Duration::from_millis(1));
            hits.increment("/a.html");
            hits.increment("/a.html");
            assert_eq!(hits.get("/a.html"), 2, "{}", mode);
        }
    }

    #[test]
    fn test_keys_are_normalized() {
        let hits = HitCounter::new(CounterMode::Locked, Duration::ZERO);
        hits.increment("/docs/a%20b.html");
        hits.increment("docs/a b.html?x=1");
        hits.increment("/docs/a%20b.html#top");

        assert_eq!(hits.get("/docs/a b.html"), 3);
        assert_eq!(hits.slots.len(), 1);
    }

    #[test]
    fn test_locked_is_exact() {
        for k in [1, 2, 8] {
            assert_eq!(hammer(CounterMode::Locked, k, Duration::from_millis(5)), k as u64);
        }
    }

    #[test]
    fn test_racy_never_overcounts_and_loses_updates() {
        let k = 8;
        let mut lost = false;

        for _ in 0..5 {
            let count = hammer(CounterMode::Racy, k, Duration::from_millis(20));
            assert!(count <= k as u64);
            assert!(count >= 1);
            if count < k as u64 {
                lost = true;
            }
        }

        assert!(lost, "expected at least one lost update across trials");
    }

    #[test]
    fn test_get_does_not_wait_for_locked_increment() {
        let hits = Arc::new(HitCounter::new(CounterMode::Locked, Duration::from_millis(300)));
        hits.increment("/a.html");

        let writer = {
            let hits = Arc::clone(&hits);
            thread::spawn(move || hits.increment("/a.html"))
        };
        thread::sleep(Duration::from_millis(50));

        let start = std::time::Instant::now();
        let seen = hits.get("/a.html");
        assert!(start.elapsed() < Duration::from_millis(200));
        assert_eq!(seen, 1);

        writer.join().unwrap();
        assert_eq!(hits.get("/a.html"), 2);
    }

    #[test]
    fn test_mode_and_display() {
        assert_eq!(HitCounter::new(CounterMode::Racy, Duration::ZERO).mode(), CounterMode::Racy);
        assert_eq!(CounterMode::Locked.to_string(), "locked");
    }

    #[test]
    fn test_naive_alias() {
        assert_eq!(CounterMode::from_str("naive", true), Ok(CounterMode::Racy));
        assert_eq!(CounterMode::from_str("locked", true), Ok(CounterMode::Locked));
    }
}
