//! # Despacho de Requests
//! src/dispatch/mod.rs
//!
//! Convierte los bytes leídos del socket en una respuesta completa.
//!
//! ## Flujo
//!
//! ```text
//! bytes → parse ──error──→ 400
//!           │
//!           ├─ método != GET ──→ 501
//!           │
//!           └─ GET → rate limit ──→ 429
//!                 → delay simulado
//!                 → resolver ──None──→ 404
//!                 → directorio: visita + listado (o index)
//!                 → archivo: visita + allow-list + lectura → 200
//! ```
//!
//! El dispatcher es dueño del resolver, del limitador y de una referencia al
//! contador de visitas. El servidor lo comparte entre workers con un `Arc`.

use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::files::{listing, mime, PathResolver};
use crate::hits::HitCounter;
use crate::http::{Method, Request, Response, StatusCode};
use crate::ratelimit::RateLimiter;

/// Extensiones servidas por defecto
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["html", "htm", "png", "pdf"];

/// Content-Types que tienen prioridad sobre la tabla MIME general
const CONTENT_TYPE_OVERRIDES: [(&str, &str); 4] = [
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("png", "image/png"),
    ("pdf", "application/pdf"),
];

/// Parámetros del dispatcher que no son componentes
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Trabajo simulado antes de resolver cada GET
    pub delay: Duration,

    /// Extensiones permitidas, en minúsculas y sin punto
    pub allowed_extensions: Vec<String>,

    /// Si está configurado y existe en el directorio, se sirve en lugar del
    /// listado
    pub index_file: Option<String>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            index_file: None,
        }
    }
}

/// Dispatcher de requests GET sobre el directorio raíz
#[derive(Debug)]
pub struct Dispatcher {
    resolver: PathResolver,
    hits: Arc<HitCounter>,
    limiter: Option<RateLimiter>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        resolver: PathResolver,
        hits: Arc<HitCounter>,
        limiter: Option<RateLimiter>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            resolver,
            hits,
            limiter,
            settings,
        }
    }

    /// Arma el dispatcher completo a partir de la configuración
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        let resolver = PathResolver::new(&config.root).map_err(|source| ServerError::Root {
            path: config.root.clone(),
            source,
        })?;
        let hits = Arc::new(HitCounter::new(
            config.counter_mode,
            Duration::from_millis(config.counter_delay_ms),
        ));
        let settings = DispatchSettings {
            delay: Duration::from_millis(config.delay_ms),
            allowed_extensions: config.allowed_extensions(),
            index_file: config.index_file.clone(),
        };

        Ok(Self::new(
            resolver,
            hits,
            RateLimiter::from_config(config.rate_limit),
            settings,
        ))
    }

    /// Contador de visitas compartido
    pub fn hits(&self) -> Arc<HitCounter> {
        Arc::clone(&self.hits)
    }

    /// Procesa los bytes crudos de un request de `peer`
    pub fn dispatch(&self, raw: &[u8], peer: IpAddr) -> Response {
        match Request::parse(raw) {
            Ok(request) => self.handle(&request, peer),
            Err(e) => {
                debug!(%peer, error = %e, "Request malformado");
                Response::error(StatusCode::BadRequest)
            }
        }
    }

    /// Despacha un request ya parseado según su método
    pub fn handle(&self, request: &Request, peer: IpAddr) -> Response {
        match Method::from_token(request.method()) {
            Some(Method::Get) => self.handle_get(request, peer),
            None => Response::error(StatusCode::NotImplemented),
        }
    }

    fn handle_get(&self, request: &Request, peer: IpAddr) -> Response {
        if let Some(limiter) = &self.limiter {
            if !limiter.admit(peer) {
                debug!(%peer, limit = limiter.limit(), "Rate limit excedido");
                return Response::error(StatusCode::TooManyRequests).with_header("Retry-After", "1");
            }
        }

        if !self.settings.delay.is_zero() {
            thread::sleep(self.settings.delay);
        }

        let Some(target) = self.resolver.resolve(request.uri()) else {
            return Response::error(StatusCode::NotFound);
        };

        let uri = if request.uri().is_empty() { "/" } else { request.uri() };

        if target.is_dir() {
            self.hits.increment(uri);
            self.serve_directory(&target, uri)
        } else if target.is_file() {
            self.hits.increment(uri);
            self.serve_file(&target)
        } else {
            Response::error(StatusCode::NotFound)
        }
    }

    fn serve_directory(&self, dir: &Path, uri: &str) -> Response {
        if let Some(index) = &self.settings.index_file {
            let index_path = self.resolver.confine(&dir.join(index)).filter(|p| p.is_file());
            if let Some(index_path) = index_path {
                return self.serve_file(&index_path);
            }
        }

        let lookup = |href: &str| self.hits.get(href);
        match listing::render(dir, uri, Some(&lookup)) {
            Ok(body) => Response::new(StatusCode::Ok).with_body(body),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "No se pudo listar el directorio");
                Response::error(StatusCode::NotFound)
            }
        }
    }

    fn serve_file(&self, path: &Path) -> Response {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if !self.settings.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Response::error(StatusCode::NotFound);
        }

        match fs::read(path) {
            Ok(body) => Response::new(StatusCode::Ok)
                .with_header("Content-Type", content_type_for(&extension))
                .with_body(body),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "No se pudo leer el archivo");
                Response::error(StatusCode::NotFound)
            }
        }
    }
}

/// Override -> tabla MIME -> `application/octet-stream`
fn content_type_for(extension: &str) -> &'static str {
    CONTENT_TYPE_OVERRIDES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, content_type)| *content_type)
        .or_else(|| mime::guess(extension))
        .unwrap_or(mime::OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hits::CounterMode;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    const PEER: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn setup_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), "<h1>a</h1>").unwrap();
        fs::write(dir.path().join("img.PNG"), [0x89u8, b'P', b'N', b'G']).unwrap();
        fs::write(dir.path().join("doc.pdf"), "%PDF").unwrap();
        fs::write(dir.path().join("notes.txt"), "nope").unwrap();
        fs::write(dir.path().join("data.bin"), [0u8, 1, 2]).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("index.html"), "<p>index</p>").unwrap();
        dir
    }

    fn dispatcher(root: &TempDir, limiter: Option<RateLimiter>, settings: DispatchSettings) -> Dispatcher {
        Dispatcher::new(
            PathResolver::new(root.path()).unwrap(),
            Arc::new(HitCounter::new(CounterMode::Locked, Duration::ZERO)),
            limiter,
            settings,
        )
    }

    fn get(dispatcher: &Dispatcher, uri: &str) -> Response {
        dispatcher.dispatch(format!("GET {} HTTP/1.1\r\n\r\n", uri).as_bytes(), PEER)
    }

    // ==================== Códigos de estado ====================

    #[test]
    fn test_serves_html_file() {
        let root = setup_root();
        let d = dispatcher(&root, None, DispatchSettings::default());

        let response = get(&d, "/a.html");
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));
        assert_eq!(response.body(), b"<h1>a</h1>");
    }

    #[test]
    fn test_malformed_request_is_400() {
        let root = setup_root();
        let d = dispatcher(&root, None, DispatchSettings::default());

        assert_eq!(d.dispatch(b"\r\n\r\n", PEER).status(), StatusCode::BadRequest);
        assert_eq!(d.dispatch(b"GET\r\n\r\n", PEER).status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_other_methods_are_501() {
        let root = setup_root();
        let d = dispatcher(&root, None, DispatchSettings::default());

        for method in ["POST", "PUT", "DELETE", "HEAD", "get"] {
            let raw = format!("{} /a.html HTTP/1.1\r\n\r\n", method);
            let response = d.dispatch(raw.as_bytes(), PEER);
            assert_eq!(response.status(), StatusCode::NotImplemented, "{}", method);
            assert_eq!(response.body(), b"<h1>501 Not Implemented</h1>");
        }
        assert_eq!(d.hits().get("/a.html"), 0);
    }

    #[test]
    fn test_missing_and_traversal_are_404() {
        let root = setup_root();
        let d = dispatcher(&root, None, DispatchSettings::default());

        assert_eq!(get(&d, "/missing.html").status(), StatusCode::NotFound);
        assert_eq!(get(&d, "/../../etc/passwd").status(), StatusCode::NotFound);
        assert_eq!(get(&d, "/%2e%2e/%2e%2e/etc/passwd").status(), StatusCode::NotFound);
    }

    #[test]
    fn test_unconfigured_root_is_404() {
        let d = Dispatcher::new(
            PathResolver::unconfigured(),
            Arc::new(HitCounter::new(CounterMode::Racy, Duration::ZERO)),
            None,
            DispatchSettings::default(),
        );
        assert_eq!(get(&d, "/").status(), StatusCode::NotFound);
    }

    // ==================== Archivos ====================

    #[test]
    fn test_extension_not_allowed_is_404_but_counted() {
        let root = setup_root();
        let d = dispatcher(&root, None, DispatchSettings::default());

        assert_eq!(get(&d, "/notes.txt").status(), StatusCode::NotFound);
        assert_eq!(d.hits().get("/notes.txt"), 1);
    }

    #[test]
    fn test_content_types() {
        let root = setup_root();
        let settings = DispatchSettings {
            allowed_extensions: vec!["png".into(), "pdf".into(), "txt".into(), "bin".into()],
            ..DispatchSettings::default()
        };
        let d = dispatcher(&root, None, settings);

        assert_eq!(get(&d, "/img.PNG").header("Content-Type"), Some("image/png"));
        assert_eq!(get(&d, "/doc.pdf").header("Content-Type"), Some("application/pdf"));
        assert_eq!(
            get(&d, "/notes.txt").header("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(
            get(&d, "/data.bin").header("Content-Type"),
            Some("application/octet-stream")
        );
    }

    #[test]
    fn test_binary_body_is_exact() {
        let root = setup_root();
        let d = dispatcher(&root, None, DispatchSettings::default());

        let response = get(&d, "/img.PNG");
        assert_eq!(response.body(), &[0x89u8, b'P', b'N', b'G']);
        let bytes = String::from_utf8_lossy(&response.to_bytes()).into_owned();
        assert!(bytes.contains("Content-Length: 4\r\n"));
    }

    // ==================== Directorios ====================

    #[test]
    fn test_directory_listing() {
        let root = setup_root();
        let d = dispatcher(&root, None, DispatchSettings::default());
        get(&d, "/a.html");

        let response = get(&d, "/");
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));

        let html = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(html.contains("href=\"/sub/\""));
        assert!(html.contains("a.html</a></td><td>1</td>"));
        assert_eq!(d.hits().get("/"), 1);
    }

    #[test]
    fn test_listing_is_default_even_with_index_present() {
        let root = setup_root();
        let d = dispatcher(&root, None, DispatchSettings::default());

        let html = String::from_utf8(get(&d, "/sub/").body().to_vec()).unwrap();
        assert!(html.contains("Directory listing for /sub/"));
    }

    #[test]
    fn test_index_file_policy() {
        let root = setup_root();
        let settings = DispatchSettings {
            index_file: Some("index.html".into()),
            ..DispatchSettings::default()
        };
        let d = dispatcher(&root, None, settings);

        assert_eq!(get(&d, "/sub/").body(), b"<p>index</p>");
        assert_eq!(d.hits().get("/sub/"), 1);
        // Sin index en el root se sigue listando
        let html = String::from_utf8(get(&d, "/").body().to_vec()).unwrap();
        assert!(html.contains("Directory listing for /"));
    }

    #[cfg(unix)]
    #[test]
    fn test_index_symlink_outside_root_is_not_served() {
        let root = setup_root();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.html"), "TOP SECRET").unwrap();
        let index = root.path().join("sub").join("index.html");
        fs::remove_file(&index).unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.html"), &index).unwrap();

        let settings = DispatchSettings {
            index_file: Some("index.html".into()),
            ..DispatchSettings::default()
        };
        let d = dispatcher(&root, None, settings);

        assert_eq!(get(&d, "/sub/index.html").status(), StatusCode::NotFound);
        let response = get(&d, "/sub/");
        assert_eq!(response.status(), StatusCode::Ok);
        assert!(!String::from_utf8_lossy(response.body()).contains("TOP SECRET"));
        assert!(String::from_utf8_lossy(response.body()).contains("Directory listing for /sub/"));
    }

    // ==================== Visitas y rate limiting ====================

    #[test]
    fn test_two_gets_count_two() {
        let root = setup_root();
        let d = dispatcher(&root, None, DispatchSettings::default());

        get(&d, "/a.html");
        get(&d, "/a.html?cache=no");
        assert_eq!(d.hits().get("/a.html"), 2);
    }

    #[test]
    fn test_rate_limit_returns_429() {
        let root = setup_root();
        let d = dispatcher(&root, RateLimiter::from_config(2), DispatchSettings::default());

        let statuses: Vec<_> = (0..5).map(|_| get(&d, "/a.html").status()).collect();
        assert_eq!(&statuses[..2], &[StatusCode::Ok, StatusCode::Ok]);
        assert!(statuses.contains(&StatusCode::TooManyRequests));

        let limited = get(&d, "/a.html");
        assert_eq!(limited.header("Retry-After"), Some("1"));

        // Otra dirección no se ve afectada
        let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        let response = d.dispatch(b"GET /a.html HTTP/1.1\r\n\r\n", other);
        assert_eq!(response.status(), StatusCode::Ok);
    }

    #[test]
    fn test_rate_limit_does_not_apply_to_bad_requests() {
        let root = setup_root();
        let d = dispatcher(&root, RateLimiter::from_config(1), DispatchSettings::default());

        for _ in 0..3 {
            assert_eq!(d.dispatch(b"POST / HTTP/1.1\r\n\r\n", PEER).status(), StatusCode::NotImplemented);
        }
        assert_eq!(get(&d, "/a.html").status(), StatusCode::Ok);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("htm"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("gif"), "image/gif");
        assert_eq!(content_type_for(""), "application/octet-stream");
    }
}
