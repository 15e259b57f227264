//! # Rate Limiting por Cliente
//! src/ratelimit/limiter.rs
//!
//! Ventana deslizante de un segundo por dirección IP. Cada dirección guarda
//! los instantes de sus requests admitidos; un request se admite si en el
//! último segundo hubo menos de `R`.
//!
//! ```text
//! R = 3
//! t=0.00  admit  [0.00]
//! t=0.10  admit  [0.00, 0.10]
//! t=0.20  admit  [0.00, 0.10, 0.20]
//! t=0.30  reject
//! t=1.05  admit  [0.10, 0.20, 1.05]
//! ```

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Largo de la ventana
pub const WINDOW: Duration = Duration::from_secs(1);

/// A partir de este tamaño de tabla se purgan las direcciones inactivas
const PRUNE_THRESHOLD: usize = 1024;

/// Limitador de requests por segundo y por dirección
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: usize,
    clients: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Crea un limitador que admite hasta `max_per_second` requests por
    /// dirección en cualquier ventana de un segundo
    pub fn new(max_per_second: u32) -> Self {
        Self {
            max_per_window: max_per_second as usize,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// `None` cuando el límite es 0 (rate limiting desactivado)
    pub fn from_config(max_per_second: u32) -> Option<Self> {
        (max_per_second > 0).then(|| Self::new(max_per_second))
    }

    /// Límite configurado
    pub fn limit(&self) -> usize {
        self.max_per_window
    }

    /// Decide si se admite un request de `ip` ahora
    ///
    /// # Ejemplo
    /// ```
    /// use std::net::{IpAddr, Ipv4Addr};
    /// use file_server::ratelimit::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2);
    /// let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
    /// assert!(limiter.admit(ip));
    /// assert!(limiter.admit(ip));
    /// assert!(!limiter.admit(ip));
    /// ```
    pub fn admit(&self, ip: IpAddr) -> bool {
        self.admit_at(ip, Instant::now())
    }

    /// Igual que `admit` pero con un instante explícito
    pub fn admit_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut clients = self.clients.lock();

        if clients.len() > PRUNE_THRESHOLD {
            clients.retain(|_, log| log.back().is_some_and(|last| now.duration_since(*last) < WINDOW));
        }

        let log = clients.entry(ip).or_default();
        while log
            .front()
            .is_some_and(|first| now.duration_since(*first) >= WINDOW)
        {
            log.pop_front();
        }

        if log.len() < self.max_per_window {
            log.push_back(now);
            true
        } else {
            false
        }
    }
}
