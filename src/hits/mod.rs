//! # Contador de Visitas por Ruta
//!
//! Demostración de condiciones de carrera sobre estado compartido. Ver
//! `counter` para los dos modos.

pub mod counter;

pub use counter::{CounterMode, HitCounter, IncrementStrategy, LockedIncrement, RacyIncrement};
