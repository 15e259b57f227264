//! # Rate Limiting
//!
//! Límite opcional de requests por segundo por dirección IP. Desactivado
//! cuando el límite configurado es 0.

pub mod limiter;

pub use limiter::RateLimiter;
