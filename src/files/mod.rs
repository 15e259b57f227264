//! # Acceso al Sistema de Archivos
//!
//! Todo lo que toca el directorio raíz:
//!
//! - `resolver`: URI -> ruta contenida en el root
//! - `listing`: HTML para directorios
//! - `mime`: Content-Type por extensión

pub mod listing;
pub mod mime;
pub mod resolver;

pub use resolver::{normalize_uri_path, PathResolver};
