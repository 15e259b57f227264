//! # File Server
//! src/lib.rs
//!
//! Servidor de archivos HTTP concurrente, escrito sobre sockets bloqueantes
//! para demostrar conceptos de sistemas operativos: admisión con capacidad
//! acotada, resolución segura de rutas y condiciones de carrera sobre
//! estado compartido.
//!
//! ## Arquitectura
//!
//! - `server`: accept loop, semáforo de admisión y pool de workers
//! - `http`: parsing de la request line y construcción de respuestas
//! - `dispatch`: GET → rate limit → resolver → archivo o listado
//! - `files`: resolver de rutas, listado de directorios y tipos MIME
//! - `hits`: contador de visitas por ruta (racy o locked)
//! - `ratelimit`: límite opcional de requests por segundo por IP
//! - `config`: argumentos CLI y variables de entorno
//! - `error`: errores del servidor y de cada conexión
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use file_server::config::Config;
//! use file_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config).expect("Error al iniciar servidor");
//! server.run().expect("Error fatal");
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod files;
pub mod hits;
pub mod http;
pub mod ratelimit;
pub mod server;
