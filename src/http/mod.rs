//! # Módulo HTTP
//!
//! Subconjunto mínimo de HTTP/1.1 construido a mano sobre el socket:
//!
//! - Parsing de la request line (los headers se ignoran)
//! - Construcción de responses con `Content-Length` exacto
//! - Códigos de estado
//!
//! No hay conexiones persistentes, chunked encoding ni body en el request:
//! cada respuesta lleva `Connection: close`.

pub mod request;   // Parsing de la request line
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
