//! # Resolución Segura de Rutas
//! src/files/resolver.rs
//!
//! Traduce el URI del request a una ruta dentro del directorio raíz.
//! Cualquier URI que, una vez decodificado y normalizado, quede fuera del
//! root produce `None` (el dispatcher responde 404).
//!
//! ```text
//! root = /srv
//! GET /docs/a%20b.html?x=1   ->  Some(/srv/docs/a b.html)
//! GET /../../etc/passwd      ->  None
//! ```

use std::io;
use std::path::{Component, Path, PathBuf};

/// Resuelve URIs contra un root fijo
///
/// El root se fija al construir y no cambia después, así que el resolver
/// se puede compartir entre workers sin sincronización.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: Option<PathBuf>,
}

impl PathResolver {
    /// Crea un resolver con el root dado
    ///
    /// Si el directorio existe se canonicaliza (se resuelven symlinks).
    /// Si no existe se vuelve absoluto de forma léxica.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        let root = match root.canonicalize() {
            Ok(canonical) => canonical,
            Err(_) => normalize_lexically(&std::env::current_dir()?.join(root)),
        };

        Ok(Self { root: Some(root) })
    }

    /// Resolver sin root: toda resolución devuelve `None`
    pub fn unconfigured() -> Self {
        Self { root: None }
    }

    /// Root configurado, si hay
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resuelve un URI crudo a una ruta contenida en el root
    ///
    /// 1. Se descartan query y fragmento, se decodifica el percent-encoding
    /// 2. Se une al root y se normaliza `.`/`..` sin tocar el disco
    /// 3. El resultado debe ser el root o un descendiente
    /// 4. Si la ruta existe se canonicaliza y se vuelve a verificar, para
    ///    que un symlink no saque al cliente del root
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::files::PathResolver;
    ///
    /// let resolver = PathResolver::new("/nonexistent-file-server-root").unwrap();
    /// assert!(resolver.resolve("/../../etc/passwd").is_none());
    /// assert!(resolver.resolve("/a.html").is_some());
    /// ```
    pub fn resolve(&self, uri: &str) -> Option<PathBuf> {
        let root = self.root.as_ref()?;

        let path = normalize_uri_path(uri);
        let candidate = normalize_lexically(&root.join(path.trim_start_matches('/')));

        if !candidate.starts_with(root) {
            return None;
        }

        if candidate.exists() {
            self.confine(&candidate)
        } else {
            Some(candidate)
        }
    }

    /// Verifica que una ruta existente del filesystem quede dentro del root
    ///
    /// La ruta se canonicaliza: si es un symlink que apunta fuera del root,
    /// o si no existe, devuelve `None`.
    pub fn confine(&self, path: &Path) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        path.canonicalize().ok().filter(|real| real.starts_with(root))
    }
}

/// Lleva un URI a la forma canónica usada como clave en todo el servidor
///
/// Quita `?query` y `#fragmento`, decodifica `%XX` (UTF-8 inválido se
/// reemplaza por U+FFFD) y garantiza el `/` inicial. El contador de visitas
/// usa esta misma función, así que `/a%20b` y `/a b` son la misma clave.
///
/// ```
/// use file_server::files::normalize_uri_path;
///
/// assert_eq!(normalize_uri_path("docs/a%20b.html?x=1#top"), "/docs/a b.html");
/// assert_eq!(normalize_uri_path(""), "/");
/// ```
pub fn normalize_uri_path(uri: &str) -> String {
    let path = uri.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode(path);

    if decoded.starts_with('/') {
        decoded
    } else {
        format!("/{}", decoded)
    }
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                decoded.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Resuelve `.` y `..` de forma puramente léxica
///
/// `..` en la raíz del sistema de archivos se queda en la raíz; la
/// verificación de contención la hace quien llama.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }

    out
}
