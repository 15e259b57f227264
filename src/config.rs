//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de archivos con soporte para argumentos CLI y
//! variables de entorno. La línea de comandos tiene prioridad sobre el
//! entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./file_server --root ./content --port 8080 \
//!   --workers 4 \
//!   --counter-mode locked \
//!   --counter-delay-ms 50
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 ROOT_DIR=/srv RATE_LIMIT=5 ./file_server
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::hits::CounterMode;

/// Configuración del servidor de archivos
#[derive(Debug, Clone, Parser)]
#[command(name = "file_server")]
#[command(about = "Servidor de archivos HTTP con pool acotado, contador de visitas y rate limiting")]
#[command(version)]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8000", env = "HTTP_PORT")]
    pub port: u16,

    /// Directorio raíz que se sirve
    #[arg(long, default_value = "./content", env = "ROOT_DIR")]
    pub root: PathBuf,

    // === Concurrencia ===

    /// Cantidad de workers; también es el máximo de conexiones en proceso
    #[arg(long, default_value = "10", env = "WORKERS")]
    pub workers: usize,

    /// Trabajo simulado por request GET, en milisegundos
    #[arg(long = "delay-ms", default_value = "0", env = "DELAY_MS")]
    pub delay_ms: u64,

    // === Contador de visitas ===

    /// Modo del contador: racy (sin lock, alias naive) o locked
    #[arg(long = "counter-mode", value_enum, default_value = "racy", env = "COUNTER_MODE")]
    pub counter_mode: CounterMode,

    /// Espera entre leer y escribir el contador, en milisegundos
    #[arg(long = "counter-delay-ms", default_value = "0", env = "COUNTER_DELAY_MS")]
    pub counter_delay_ms: u64,

    // === Rate Limiting ===

    /// Máximo de requests por segundo por IP (0 = sin límite)
    #[arg(long = "rate-limit", default_value = "0", env = "RATE_LIMIT")]
    pub rate_limit: u32,

    // === Archivos ===

    /// Extensiones servidas, separadas por coma
    #[arg(
        long = "allow-ext",
        value_delimiter = ',',
        default_value = "html,htm,png,pdf",
        env = "ALLOW_EXT"
    )]
    pub allow_ext: Vec<String>,

    /// Archivo que se sirve en lugar del listado cuando existe en el directorio
    #[arg(long = "index-file", env = "INDEX_FILE")]
    pub index_file: Option<String>,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use file_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Extensiones permitidas normalizadas: minúsculas, sin punto, sin vacías
    ///
    /// ```rust
    /// use file_server::config::Config;
    ///
    /// let mut config = Config::default();
    /// config.allow_ext = vec![".HTML".into(), " png ".into(), "".into()];
    /// assert_eq!(config.allowed_extensions(), vec!["html", "png"]);
    /// ```
    pub fn allowed_extensions(&self) -> Vec<String> {
        self.allow_ext
            .iter()
            .flat_map(|ext| ext.split(','))
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }

        if self.allowed_extensions().is_empty() {
            return Err("Allowed extensions list must not be empty".to_string());
        }

        if let Some(index) = &self.index_file {
            if index.is_empty() || Path::new(index).components().count() != 1 {
                return Err(format!("Index file must be a plain file name: {:?}", index));
            }
        }

        if !self.root.is_dir() {
            return Err(format!(
                "Root directory does not exist or is not a directory: {}",
                self.root.display()
            ));
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());

        let rate_limit = match self.rate_limit {
            0 => "disabled".to_string(),
            n => format!("{} req/sec per IP", n),
        };

        println!("═══ File Server Configuration ═══");
        println!("   Address:      {}", self.address());
        println!("   Root dir:     {}", root.display());
        println!("   Extensions:   {}", self.allowed_extensions().join(", "));
        println!("   Index file:   {}", self.index_file.as_deref().unwrap_or("(listing)"));
        println!("   Workers:      {} (delay {} ms)", self.workers, self.delay_ms);
        println!("   Hit counter:  {} (delay {} ms)", self.counter_mode, self.counter_delay_ms);
        println!("   Rate limit:   {}", rate_limit);
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            root: PathBuf::from("./content"),
            workers: 10,
            delay_ms: 0,
            counter_mode: CounterMode::Racy,
            counter_delay_ms: 0,
            rate_limit: 0,
            allow_ext: ["html", "htm", "png", "pdf"].iter().map(|e| e.to_string()).collect(),
            index_file: None,
        }
    }
}
