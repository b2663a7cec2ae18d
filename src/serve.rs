//! Document server.
//!
//! A small `tiny_http` server exposing the library as JSON, plus an optional
//! static front-end bundle:
//!
//! | Route                               | Response                              |
//! |-------------------------------------|---------------------------------------|
//! | `GET /api/documents`                | `{title, documents: [{id, name}]}`    |
//! | `GET /api/documents/{id}`           | `{document: {id, name, revision, …}}` |
//! | `GET /api/documents/{id}/content`   | processed HTML, `ETag` = revision     |
//! | `GET /api/documents/{id}/search?q=` | `{query, results, highlightedHtml}`   |
//! | anything else                       | file from `static_dir`, SPA fallback  |
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          ▼                       ▼
//!    Handle requests         Re-parse changed
//!    from LIBRARY            documents, config
//! ```

use crate::{
    config::{ManviewConfig, cfg},
    document::{Heading, LoadedDocument, Section},
    library::{Catalog, LIBRARY, Library},
    log,
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::json;
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

const API_PREFIX: &str = "/api/documents";

// ============================================================================
// Server Entry Point
// ============================================================================

/// Load the library and serve it until Ctrl+C.
pub fn serve_library() -> Result<()> {
    let c = cfg();
    let interface: IpAddr = c.serve.interface.parse()?;

    LIBRARY.set_catalog(Catalog::from_config(&c));
    let total = LIBRARY.entries().len();
    let loaded = LIBRARY.preload();
    log!("serve"; "{loaded}/{total} documents parsed");

    let (server, addr) = try_bind_port(interface, c.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    if c.serve.watch {
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking() {
                log!("watch"; "{err}");
            }
        });
    }

    for request in server.incoming_requests() {
        // Re-load config on each request to pick up hot-reloaded changes
        if let Err(e) = handle_request(request, &cfg(), &LIBRARY) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_err = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Routing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    Documents,
    Document(&'a str),
    Content(&'a str),
    Search(&'a str),
    Static(&'a str),
}

fn route(path: &str) -> Route<'_> {
    let Some(rest) = path.strip_prefix(API_PREFIX) else {
        return Route::Static(path);
    };
    let rest = rest.trim_matches('/');
    if rest.is_empty() {
        return Route::Documents;
    }
    match rest.split_once('/') {
        None => Route::Document(rest),
        Some((id, "content")) => Route::Content(id),
        Some((id, "search")) => Route::Search(id),
        Some(_) => Route::Static(path),
    }
}

/// Value of `key` in a query string, `+` and percent escapes decoded.
fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (k == key).then(|| {
            let v = v.replace('+', " ");
            urlencoding::decode(&v)
                .map(|s| s.into_owned())
                .unwrap_or(v)
        })
    })
}

/// Response before it is turned into a `tiny_http` one.
#[derive(Debug)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    etag: Option<String>,
}

impl Reply {
    fn json(status: u16, value: &impl Serialize) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json; charset=utf-8",
                body,
                etag: None,
            },
            Err(err) => {
                log!("error"; "failed to serialize response: {err}");
                Self {
                    status: 500,
                    content_type: "text/plain; charset=utf-8",
                    body: format!("500 Internal Server Error: {err}").into_bytes(),
                    etag: None,
                }
            }
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &json!({ "error": message.into() }))
    }

    fn not_modified(etag: String) -> Self {
        Self {
            status: 304,
            content_type: "text/plain",
            body: Vec::new(),
            etag: Some(etag),
        }
    }
}

#[derive(Serialize)]
struct DocumentSummary<'a> {
    id: &'a str,
    name: &'a str,
    revision: &'a str,
    sections: &'a [Section],
    headings: &'a [Heading],
}

/// Resolve a request to a reply. Pure apart from reading the library and
/// static files, so it can be driven without a socket.
fn respond(
    method: &Method,
    url: &str,
    if_none_match: Option<&str>,
    config: &ManviewConfig,
    library: &Library,
) -> Reply {
    if *method != Method::Get && *method != Method::Head {
        return Reply::error(405, "method not allowed");
    }

    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let path = urlencoding::decode(path)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| path.to_owned());

    let target = route(&path);
    let id = match target {
        Route::Documents => {
            let entries = library.entries();
            return Reply::json(
                200,
                &json!({ "title": config.base.title, "documents": entries }),
            );
        }
        Route::Static(path) => return serve_static(config.serve.static_dir.as_deref(), path),
        Route::Document(id) | Route::Content(id) | Route::Search(id) => id,
    };

    let doc = match library.document(id) {
        None => return Reply::error(404, format!("unknown document `{id}`")),
        Some(Err(err)) => {
            log!("error"; "{id}: {err}");
            return Reply::error(502, err.to_string());
        }
        Some(Ok(doc)) => doc,
    };

    match target {
        Route::Document(id) => document_reply(id, &doc, library),
        Route::Content(_) => content_reply(&doc, if_none_match),
        Route::Search(_) => {
            let q = query_param(query, "q").unwrap_or_default();
            let output = doc.search.run(&q);
            Reply::json(
                200,
                &json!({
                    "query": q,
                    "results": output.results,
                    "highlightedHtml": output.highlighted_html,
                }),
            )
        }
        Route::Documents | Route::Static(_) => Reply::error(404, "not found"),
    }
}

fn document_reply(id: &str, doc: &LoadedDocument, library: &Library) -> Reply {
    let name = library.entry(id).map(|e| e.name).unwrap_or_else(|| id.to_owned());
    let summary = DocumentSummary {
        id,
        name: &name,
        revision: &doc.revision,
        sections: &doc.parsed.sections,
        headings: &doc.parsed.headings,
    };
    Reply::json(200, &json!({ "document": summary }))
}

fn content_reply(doc: &LoadedDocument, if_none_match: Option<&str>) -> Reply {
    let etag = format!("\"{}\"", doc.revision);
    if if_none_match.is_some_and(|tag| tag.split(',').any(|t| t.trim() == etag)) {
        return Reply::not_modified(etag);
    }
    Reply {
        status: 200,
        content_type: "text/html; charset=utf-8",
        body: doc.parsed.base_html().into_bytes(),
        etag: Some(etag),
    }
}

// ============================================================================
// Static Files
// ============================================================================

/// Request path below `root`, refusing anything that would leave it.
fn static_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let rel = Path::new(request_path.trim_start_matches('/'));
    rel.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| root.join(rel))
}

fn serve_static(root: Option<&Path>, request_path: &str) -> Reply {
    let Some(root) = root else {
        return not_found();
    };
    let Some(local) = static_path(root, request_path) else {
        return not_found();
    };

    let candidates = [local.clone(), local.join("index.html")];
    if let Some(file) = candidates.iter().find(|p| p.is_file()) {
        return file_reply(file);
    }

    // Client-side routes: extensionless paths fall back to the app shell
    let index = root.join("index.html");
    if local.extension().is_none() && index.is_file() {
        return file_reply(&index);
    }
    not_found()
}

fn file_reply(path: &Path) -> Reply {
    match fs::read(path) {
        Ok(body) => Reply {
            status: 200,
            content_type: guess_content_type(path),
            body,
            etag: None,
        },
        Err(err) => Reply::error(500, format!("failed to read {}: {err}", path.display())),
    }
}

fn not_found() -> Reply {
    Reply {
        status: 404,
        content_type: "text/plain",
        body: b"404 Not Found".to_vec(),
        etag: None,
    }
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",

        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// tiny_http Glue
// ============================================================================

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name, value).map_err(|_| anyhow!("invalid header `{name}: {value}`"))
}

fn handle_request(request: Request, config: &ManviewConfig, library: &Library) -> Result<()> {
    let if_none_match = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("If-None-Match"))
        .map(|h| h.value.as_str().to_owned());

    let reply = respond(
        request.method(),
        request.url(),
        if_none_match.as_deref(),
        config,
        library,
    );

    let mut headers = vec![header("Content-Type", reply.content_type)?];
    if let Some(etag) = &reply.etag {
        headers.push(header("ETag", etag)?);
    }
    let len = reply.body.len();
    let response = Response::new(
        StatusCode(reply.status),
        headers,
        Cursor::new(reply.body),
        Some(len),
        None,
    );
    request.respond(response)?;
    Ok(())
}
