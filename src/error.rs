//! # Errores del Servidor
//! src/error.rs
//!
//! - `ServerError`: fallas de arranque o del listener. Son fatales.
//! - `ConnectionError`: fallas de una conexión individual. Se registran en
//!   el log y nunca afectan al resto del servidor.
//!
//! Los errores de parsing viven en `http::request::ParseError` y se
//! traducen a 400 en el dispatcher.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errores fatales del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    /// No se pudo abrir el puerto
    #[error("Error al bindear {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// La configuración no pasó la validación
    #[error("Configuración inválida: {0}")]
    InvalidConfig(String),

    /// No se pudo preparar el directorio raíz
    #[error("Directorio raíz inválido {}: {source}", .path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No se pudo lanzar un thread del pool
    #[error("No se pudo iniciar el pool de workers: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// Todos los workers terminaron y el pool ya no recibe conexiones
    #[error("El pool de workers dejó de aceptar trabajo")]
    PoolClosed,

    /// Falla al consultar el listener
    #[error("Error del listener: {0}")]
    Accept(#[from] io::Error),
}

/// Errores de una conexión individual
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Error leyendo de {peer}: {source}")]
    Read {
        peer: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Error escribiendo a {peer}: {source}")]
    Write {
        peer: SocketAddr,
        #[source]
        source: io::Error,
    },
}
