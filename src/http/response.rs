//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Arma la respuesta en formato de cable:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Server: file_server\r\n
//! Content-Type: text/html; charset=utf-8\r\n
//! Content-Length: 13\r\n
//! Connection: close\r\n
//! \r\n
//! <h1>hola</h1>
//! ```
//!
//! `Content-Length` y `Connection: close` los pone siempre `to_bytes`, así
//! que ningún handler puede emitir un largo incorrecto.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use file_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "image/png")
//!     .with_body(vec![0x89, 0x50, 0x4E, 0x47]);
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::StatusCode;

/// Valor del header `Server`
pub const SERVER_NAME: &str = "file_server";

/// Content-Type base de todas las respuestas
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP
    status: StatusCode,

    /// Headers en orden de inserción. Los nombres se comparan sin
    /// distinguir mayúsculas, así que no hay duplicados.
    headers: Vec<(String, String)>,

    /// Cuerpo, se envía tal cual
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta con los headers base (`Server` y `Content-Type`)
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: vec![
                ("Server".to_string(), SERVER_NAME.to_string()),
                ("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string()),
            ],
            body: Vec::new(),
        }
    }

    /// Agrega o reemplaza un header
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::{Response, StatusCode};
    ///
    /// let response = Response::new(StatusCode::Ok)
    ///     .with_header("content-type", "application/pdf");
    /// assert_eq!(response.header("Content-Type"), Some("application/pdf"));
    /// ```
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de `with_header`
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el cuerpo de la respuesta
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Respuesta de error con un cuerpo HTML mínimo: `<h1>404 Not Found</h1>`
    pub fn error(status: StatusCode) -> Self {
        let body = format!("<h1>{}</h1>", status);
        Self::new(status).with_body(body.into_bytes())
    }

    /// Convierte la respuesta a bytes listos para el socket
    ///
    /// - Status line: `HTTP/1.1 200 OK\r\n`
    /// - Headers base + overrides
    /// - `Content-Length` (siempre el largo real del body)
    /// - `Connection: close`
    /// - Línea vacía y body sin re-codificar
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(256 + self.body.len());

        result.extend_from_slice(format!("HTTP/1.1 {}\r\n", self.status).as_bytes());

        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("Content-Length") || name.eq_ignore_ascii_case("Connection") {
                continue;
            }
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        result.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        result.extend_from_slice(b"Connection: close\r\n");

        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    /// Obtiene el código de estado
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Busca un header sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Obtiene el body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_and_body(bytes: &[u8]) -> (String, Vec<u8>) {
        let split = bytes.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        (
            String::from_utf8(bytes[..split].to_vec()).unwrap(),
            bytes[split + 4..].to_vec(),
        )
    }

    #[test]
    fn test_new_response_has_base_headers() {
        let response = Response::new(StatusCode::Ok);
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Server"), Some(SERVER_NAME));
        assert_eq!(response.header("Content-Type"), Some(DEFAULT_CONTENT_TYPE));
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_override_is_case_insensitive() {
        let response = Response::new(StatusCode::Ok)
            .with_header("CONTENT-TYPE", "image/png")
            .with_header("X-Custom", "1");

        assert_eq!(response.header("content-type"), Some("image/png"));
        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert_eq!(text.matches("image/png").count(), 1);
        assert!(!text.contains(DEFAULT_CONTENT_TYPE));
        assert!(text.contains("X-Custom: 1\r\n"));
    }

    #[test]
    fn test_to_bytes_layout() {
        let response = Response::new(StatusCode::Ok).with_body(b"Test".to_vec());
        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\nTest"));
    }

    #[test]
    fn test_content_length_cannot_lie() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Length", "999")
            .with_header("Connection", "keep-alive")
            .with_body(vec![1, 2, 3]);

        let (head, body) = head_and_body(&response.to_bytes());
        assert!(head.contains("Content-Length: 3"));
        assert!(!head.contains("999"));
        assert!(!head.contains("keep-alive"));
        assert_eq!(head.matches("Connection:").count(), 1);
        assert_eq!(body, vec![1, 2, 3]);
    }

    #[test]
    fn test_binary_body_untouched() {
        let binary = vec![0x00, 0x0D, 0x0A, 0xFF];
        let response = Response::new(StatusCode::Ok).with_body(binary.clone());

        let (head, body) = head_and_body(&response.to_bytes());
        assert!(head.contains("Content-Length: 4"));
        assert_eq!(body, binary);
    }

    #[test]
    fn test_error_response() {
        let response = Response::error(StatusCode::NotFound);
        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.body(), b"<h1>404 Not Found</h1>");
    }

    #[test]
    fn test_empty_body() {
        let text = String::from_utf8(Response::new(StatusCode::Ok).to_bytes()).unwrap();
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }
}
