//! HTTP transport: page routes, the events socket upgrade and static assets.
//!
//! Every page GET creates a fresh [`Session`], renders the route's root
//! component inside the document shell and sets the session cookie. The
//! client then upgrades `events_path` with that cookie and the live layer
//! takes over.

pub mod server_constants;

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::component::{Component, Document, Page};
use crate::config::Settings;
use crate::error::Result;
use crate::live::session::{Session, SessionManager};
use crate::live::socket::{extract_cookie, serve_socket, session_cookie};
use crate::logging;
use server_constants::{
    generate_etag, get_mime_type, resolve_asset, FAVICON_PATH, HTML_CONTENT_TYPE,
    STATIC_CACHE_MAX_AGE,
};

/// Builds the root component of a route, once per page load.
pub type PageFactory = Arc<dyn Fn() -> Result<Arc<dyn Component>> + Send + Sync>;

/// A Schorle application: settings, routes and the live sessions.
pub struct App {
    settings: Settings,
    document: Document,
    sessions: Arc<SessionManager>,
    routes: HashMap<String, PageFactory>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            document: Document::from_settings(&settings),
            settings,
            sessions: Arc::new(SessionManager::new()),
            routes: HashMap::new(),
        }
    }

    /// Serve the component built by `factory` at `path`.
    pub fn page<C, F>(mut self, path: impl Into<String>, factory: F) -> Self
    where
        C: Component,
        F: Fn() -> Result<Arc<C>> + Send + Sync + 'static,
    {
        let factory: PageFactory =
            Arc::new(move || factory().map(|component| component as Arc<dyn Component>));
        self.routes.insert(path.into(), factory);
        self
    }

    /// Replace the document shell, e.g. to add head assets.
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Render the page at `path` for a new session.
    ///
    /// Returns `None` for unknown paths. A failed render leaves no session
    /// behind, and a session whose socket does not connect within
    /// `connect_timeout` is evicted.
    pub fn render_route(&self, path: &str) -> Option<Result<(Arc<Session>, String)>> {
        let factory = self.routes.get(path)?;
        Some(self.render_page(factory))
    }

    fn render_page(&self, factory: &PageFactory) -> Result<(Arc<Session>, String)> {
        let root = factory()?;
        let page = Arc::new(Page::new(root).with_dedupe(self.settings.dedupe_render_queue));
        let session = self.sessions.create_session();
        session.attach_page(page.clone());
        match self.document.render(&page, Some(session.clone())) {
            Ok(markup) => {
                self.sessions
                    .spawn_connect_deadline(session.id(), self.settings.connect_timeout);
                Ok((session, markup))
            }
            Err(e) => {
                self.sessions.remove_session(session.id());
                Err(e)
            }
        }
    }

    /// Route one HTTP request.
    pub async fn handle_request<B>(&self, mut req: Request<B>) -> Response<Full<Bytes>> {
        let path = req.uri().path().to_string();

        if hyper_tungstenite::is_upgrade_request(&req) {
            if path != self.settings.events_path {
                return text_response(StatusCode::NOT_FOUND, "Not Found");
            }
            let session_id = req
                .headers()
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| extract_cookie(Some(cookies), &self.settings.cookie_name));

            let (response, websocket) = match hyper_tungstenite::upgrade(&mut req, None) {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, "events socket upgrade failed");
                    return text_response(
                        StatusCode::BAD_REQUEST,
                        format!("WebSocket upgrade error: {}", e),
                    );
                }
            };

            let sessions = self.sessions.clone();
            tokio::spawn(async move {
                match websocket.await {
                    Ok(stream) => serve_socket(stream, sessions, session_id).await,
                    Err(e) => debug!(error = %e, "events socket handshake failed"),
                }
            });
            return response;
        }

        if req.method() != Method::GET {
            return text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        }

        if let Some(rendered) = self.render_route(&path) {
            return match rendered {
                Ok((session, markup)) => {
                    let mut response = text_response(StatusCode::OK, markup);
                    set_header(&mut response, header::CONTENT_TYPE, HTML_CONTENT_TYPE);
                    let cookie = session_cookie(&self.settings.cookie_name, session.id());
                    set_header(&mut response, header::SET_COOKIE, &cookie);
                    debug!(path = %path, session_id = %session.id(), "page rendered");
                    response
                }
                Err(e) => {
                    error!(path = %path, error = %e, "page render failed");
                    text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                }
            };
        }

        if path == FAVICON_PATH {
            return self.serve_static(&req, FAVICON_PATH);
        }
        if let Some(relative) = path.strip_prefix(self.settings.assets_prefix.as_str()) {
            return self.serve_static(&req, relative);
        }

        text_response(StatusCode::NOT_FOUND, "Not Found")
    }

    fn serve_static<B>(&self, req: &Request<B>, relative: &str) -> Response<Full<Bytes>> {
        let Some(root) = self.settings.assets_dir.as_deref() else {
            return text_response(StatusCode::NOT_FOUND, "Not Found");
        };
        let Some(file_path) = resolve_asset(root, relative) else {
            warn!(path = %relative, "rejected asset path");
            return text_response(StatusCode::FORBIDDEN, "Forbidden");
        };

        let metadata = match std::fs::metadata(&file_path) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return text_response(StatusCode::NOT_FOUND, "Not Found"),
        };
        let etag = metadata.modified().ok().map(generate_etag);

        if let Some(etag) = etag.as_deref() {
            let matches = req
                .headers()
                .get(header::IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .map(|v| v == etag)
                .unwrap_or(false);
            if matches {
                let mut response = text_response(StatusCode::NOT_MODIFIED, Bytes::new());
                set_header(&mut response, header::ETAG, etag);
                return response;
            }
        }

        let contents = match std::fs::read(&file_path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %file_path.display(), error = %e, "failed to read asset");
                return text_response(StatusCode::NOT_FOUND, "Not Found");
            }
        };

        let mut response = text_response(StatusCode::OK, contents);
        set_header(&mut response, header::CONTENT_TYPE, get_mime_type(&file_path));
        if let Some(etag) = etag.as_deref() {
            set_header(&mut response, header::ETAG, etag);
        }
        if !self.settings.is_dev() {
            set_header(&mut response, header::CACHE_CONTROL, STATIC_CACHE_MAX_AGE);
        }
        response
    }

    /// Accept connections until the listener fails.
    pub async fn serve(self: Arc<Self>) -> Result<()> {
        let addr = self.settings.addr();
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %addr, mode = ?self.settings.mode, "schorle listening");

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let app = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let app = app.clone();
                    async move { Ok::<_, Infallible>(app.handle_request(req).await) }
                });

                if let Err(e) = http1::Builder::new()
                    .serve_connection(io, service)
                    .with_upgrades()
                    .await
                {
                    debug!(peer = %peer, error = %e, "connection closed with error");
                }
            });
        }
    }

    /// Install logging from the settings, then [`serve`](Self::serve).
    pub async fn run(self) -> Result<()> {
        logging::init(&self.settings.log_level);
        Arc::new(self).serve().await
    }
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

fn set_header(response: &mut Response<Full<Bytes>>, name: header::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(e) => warn!(header = %name, error = %e, "dropping invalid header value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{mount, Bindable, ComponentId};
    use crate::element::button;
    use crate::error::Error;
    use crate::reactive::Model;
    use http_body_util::{BodyExt, Empty};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[derive(Default)]
    struct Count {
        value: i32,
    }

    struct Counter {
        id: ComponentId,
        model: Model<Count>,
    }

    impl Component for Counter {
        fn id(&self) -> &str {
            self.id.as_str()
        }

        fn initialize(self: &Arc<Self>) -> Result<()> {
            self.bind(&self.model);
            Ok(())
        }

        fn render(&self) -> Result<()> {
            let count = self.model.state().read(|s| s.value);
            button()
                .on("click", &self.model.effector("increment")?)
                .text(format!("Clicked {} times", count))
        }
    }

    fn counter() -> Result<Arc<Counter>> {
        let model = Model::new(Count::default()).with_effector("increment", |state, _| async move {
            state.update(|s| s.value += 1);
            Ok(())
        });
        mount(Counter {
            id: ComponentId::fixed("counter"),
            model,
        })
    }

    struct Broken;

    impl Component for Broken {
        fn id(&self) -> &str {
            "broken"
        }

        fn render(&self) -> Result<()> {
            Err(Error::handler("boom"))
        }
    }

    fn app(settings: Settings) -> App {
        App::new(settings)
            .page("/", counter)
            .page("/broken", || Ok(Arc::new(Broken)))
            .page("/unbuildable", || -> Result<Arc<Broken>> {
                Err(Error::handler("no data"))
            })
    }

    fn get(path: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .uri(path)
            .body(Empty::new())
            .unwrap()
    }

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_page_get_creates_session_and_sets_cookie() {
        let app = app(Settings::default());
        let response = app.handle_request(get("/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            HTML_CONTENT_TYPE
        );
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let ids = app.sessions().ids();
        assert_eq!(ids.len(), 1);
        assert!(cookie.starts_with(&format!("schorle-session-id={};", ids[0])));

        let markup = body_text(response).await;
        assert!(markup.starts_with("<!DOCTYPE html>"));
        assert!(markup.contains(r#"<div id="schorle-page""#));
        assert!(markup.contains("Clicked 0 times"));

        let session = app.sessions().get_session(&ids[0]).unwrap();
        assert_eq!(session.handler_count(), 1);
        assert!(session.page().is_some());
    }

    #[tokio::test]
    async fn test_each_page_get_gets_its_own_session() {
        let app = app(Settings::default());
        app.handle_request(get("/")).await;
        app.handle_request(get("/")).await;
        assert_eq!(app.sessions().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_without_socket_are_evicted() {
        let settings = Settings {
            connect_timeout: Duration::from_secs(5),
            ..Settings::default()
        };
        let app = app(settings);
        for _ in 0..50 {
            app.handle_request(get("/")).await;
        }
        assert_eq!(app.sessions().len(), 50);

        let kept = app.sessions().get_session(&app.sessions().ids()[0]).unwrap();
        let (tx, _rx) = async_channel::unbounded();
        kept.connect(tx).unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(app.sessions().ids(), vec![kept.id().to_string()]);
    }

    #[tokio::test]
    async fn test_failed_render_leaves_no_session() {
        let app = app(Settings::default());

        let response = app.handle_request(get("/broken")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(app.sessions().is_empty());

        let response = app.handle_request(get("/unbuildable")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(app.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_paths_and_methods() {
        let app = app(Settings::default());
        assert_eq!(
            app.handle_request(get("/missing")).await.status(),
            StatusCode::NOT_FOUND
        );

        let post = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Empty::<Bytes>::new())
            .unwrap();
        assert_eq!(
            app.handle_request(post).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert!(app.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_upgrade_outside_events_path_is_not_found() {
        let app = app(Settings::default());
        let req = Request::builder()
            .uri("/elsewhere")
            .header(header::CONNECTION, "upgrade")
            .header(header::UPGRADE, "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
            .body(Empty::<Bytes>::new())
            .unwrap();
        assert_eq!(app.handle_request(req).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/bundle.js"), "console.log(1)").unwrap();
        std::fs::write(dir.path().join("favicon.svg"), "<svg/>").unwrap();

        let settings = Settings {
            assets_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };
        let app = app(settings);

        let response = app.handle_request(get("/_schorle/assets/bundle.js")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/javascript"
        );
        let etag = response.headers().get(header::ETAG).cloned().unwrap();
        assert_eq!(body_text(response).await, "console.log(1)");

        let cached = Request::builder()
            .uri("/_schorle/assets/bundle.js")
            .header(header::IF_NONE_MATCH, etag)
            .body(Empty::<Bytes>::new())
            .unwrap();
        assert_eq!(
            app.handle_request(cached).await.status(),
            StatusCode::NOT_MODIFIED
        );

        let favicon = app.handle_request(get("/favicon.svg")).await;
        assert_eq!(favicon.status(), StatusCode::OK);
        assert_eq!(
            favicon.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );

        assert_eq!(
            app.handle_request(get("/_schorle/../secret")).await.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            app.handle_request(get("/_schorle/assets/missing.js")).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_assets_disabled_without_directory() {
        let app = app(Settings::default());
        assert_eq!(
            app.handle_request(get("/_schorle/assets/bundle.js")).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}
