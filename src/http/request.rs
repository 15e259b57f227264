//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Solo nos interesa la request line; los headers se ignoran y no hay
//! soporte de body.
//!
//! ```text
//! GET /docs/a%20b.html?x=1 HTTP/1.1\r\n
//! Host: localhost:8000\r\n
//! \r\n
//! ```

use thiserror::Error;

/// Métodos que el dispatcher sabe atender
///
/// El parser no valida el método: cualquier token llega al dispatcher y
/// los que no estén aquí terminan en 501.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un archivo o un listado
    Get,
}

impl Method {
    /// Busca el método en el conjunto cerrado de métodos soportados
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::request::Method;
    ///
    /// assert_eq!(Method::from_token("GET"), Some(Method::Get));
    /// assert_eq!(Method::from_token("get"), None);
    /// assert_eq!(Method::from_token("POST"), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Method::Get),
            _ => None,
        }
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// La request line está vacía, no es UTF-8 o le faltan campos
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(&'static str),
}

/// Request HTTP ya parseado. Inmutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Token del método tal como llegó (ej: "GET", "DELETE")
    method: String,

    /// URI sin decodificar (ej: "/docs/a%20b.html?x=1")
    uri: String,

    /// Versión HTTP (ej: "HTTP/1.1")
    version: String,
}

impl Request {
    /// Parsea la request line desde los bytes leídos del socket
    ///
    /// La línea se separa en a lo sumo tres campos por espacios simples, de
    /// modo que lo que sobre queda dentro de la versión.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use file_server::http::Request;
    ///
    /// let raw = b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), "GET");
    /// assert_eq!(request.uri(), "/index.html");
    /// assert_eq!(request.version(), "HTTP/1.1");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let line_end = buffer
            .windows(2)
            .position(|w| w == b"\r\n")
            .unwrap_or(buffer.len());
        let request_line = &buffer[..line_end];

        if request_line.is_empty() {
            return Err(ParseError::MalformedRequestLine("empty request line"));
        }

        let request_line = std::str::from_utf8(request_line)
            .map_err(|_| ParseError::MalformedRequestLine("request line is not valid UTF-8"))?;

        let mut parts = request_line.splitn(3, ' ');
        let method = parts.next().unwrap_or_default();
        let uri = parts.next().unwrap_or_default();
        let version = parts.next().unwrap_or_default();

        if method.is_empty() || uri.is_empty() || version.is_empty() {
            return Err(ParseError::MalformedRequestLine(
                "expected METHOD SP URI SP VERSION",
            ));
        }

        Ok(Request {
            method: method.to_string(),
            uri: uri.to_string(),
            version: version.to_string(),
        })
    }

    /// Token del método
    pub fn method(&self) -> &str {
        &self.method
    }

    /// URI cruda (todavía con percent-encoding y query)
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }
}
