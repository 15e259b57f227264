//! # Listado de Directorios
//! src/files/listing.rs
//!
//! Genera el HTML que se devuelve cuando el URI apunta a un directorio.
//! Los subdirectorios van primero y después los archivos, ambos en orden
//! alfabético sin distinguir mayúsculas. Si se pasa un callback de visitas
//! se agrega la columna "Hits".

use std::fs;
use std::io;
use std::path::Path;

use super::normalize_uri_path;

/// Consulta de visitas por href (recibe el href ya codificado)
pub type HitLookup<'a> = &'a dyn Fn(&str) -> u64;

struct Row {
    name: String,
    href: String,
    hits: Option<u64>,
}

/// Renderiza el listado de `dir`, visto desde el URI `request_path`
///
/// # Ejemplo
/// ```no_run
/// use std::path::Path;
/// use file_server::files::listing;
///
/// let html = listing::render(Path::new("/srv"), "/", Some(&|_href: &str| 0u64)).unwrap();
/// assert!(html.starts_with(b"<!doctype html>"));
/// ```
pub fn render(dir: &Path, request_path: &str, hits: Option<HitLookup<'_>>) -> io::Result<Vec<u8>> {
    let mut base = normalize_uri_path(request_path);
    if !base.ends_with('/') {
        base.push('/');
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    entries.sort_by(|a, b| (!a.1, a.0.to_lowercase()).cmp(&(!b.1, b.0.to_lowercase())));

    let mut rows = Vec::with_capacity(entries.len() + 1);

    if base != "/" {
        let trimmed = base.trim_end_matches('/');
        let parent = match trimmed.rfind('/') {
            Some(pos) if pos > 0 => format!("{}/", &trimmed[..pos]),
            _ => "/".to_string(),
        };
        rows.push(Row {
            name: "..".to_string(),
            href: encode_href(&parent),
            hits: None,
        });
    }

    for (name, is_dir) in entries {
        let name = if is_dir { format!("{}/", name) } else { name };
        let href = encode_href(&format!("{}{}", base, name));
        let count = hits.map(|lookup| lookup(&href));
        rows.push(Row { name, href, hits: count });
    }

    Ok(to_html(&base, &rows, hits.is_some()).into_bytes())
}

fn to_html(base: &str, rows: &[Row], with_hits: bool) -> String {
    let title = format!("Directory listing for {}", escape_html(base));
    let mut html = String::new();

    html.push_str("<!doctype html>\n<html><head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", title));
    html.push_str("</head><body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", title));
    html.push_str("<table>\n");

    if with_hits {
        html.push_str("<thead><tr><th>Name</th><th>Hits</th></tr></thead>\n");
    } else {
        html.push_str("<thead><tr><th>Name</th></tr></thead>\n");
    }
    html.push_str("<tbody>\n");

    for row in rows {
        html.push_str(&format!(
            "<tr><td><a href=\"{}\">{}</a></td>",
            escape_html(&row.href),
            escape_html(&row.name)
        ));
        if with_hits {
            let hits = row.hits.map(|h| h.to_string()).unwrap_or_default();
            html.push_str(&format!("<td>{}</td>", hits));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</body></html>\n");

    html
}

/// Escapa caracteres especiales de HTML
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Percent-encoding de un path para usarlo en un href (`/` se conserva)
fn encode_href(path: &str) -> String {
    let mut out = String::with_capacity(path.len());

    for &b in path.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }

    out
}
