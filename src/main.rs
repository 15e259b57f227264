//! # File Server - Entry Point
//! src/main.rs
//!
//! Lee la configuración (CLI + entorno), inicializa el logging y arranca el
//! accept loop. Cualquier error de arranque termina el proceso con código 1.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use file_server::config::Config;
use file_server::server::Server;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_names(true)
        .init();

    let config = Config::parse();
    config.print_summary();

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "No se pudo iniciar el servidor");
            std::process::exit(1);
        }
    };

    // Bloquea el thread principal
    if let Err(e) = server.run() {
        tracing::error!(error = %e, "Error fatal");
        std::process::exit(1);
    }
}
