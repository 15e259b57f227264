//! # Tipos MIME
//! src/files/mime.rs
//!
//! Tabla chica de extensión -> Content-Type. El dispatcher la consulta
//! después de su tabla de overrides y antes de caer en
//! `application/octet-stream`.

/// Content-Type por defecto para extensiones desconocidas
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Adivina el Content-Type a partir de la extensión (sin el punto)
///
/// La comparación no distingue mayúsculas.
///
/// # Ejemplo
/// ```
/// use file_server::files::mime;
///
/// assert_eq!(mime::guess("PNG"), Some("image/png"));
/// assert_eq!(mime::guess("xyz"), None);
/// ```
pub fn guess(extension: &str) -> Option<&'static str> {
    let content_type = match extension.to_ascii_lowercase().as_str() {
        // Texto
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",

        // Imágenes
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",

        // Documentos
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",

        _ => return None,
    };

    Some(content_type)
}
