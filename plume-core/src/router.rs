//! Segment-trie routing with path parameters
//!
//! Routes are registered before the reactor starts accepting connections and
//! the trie is never mutated afterwards; that ordering is what lets every
//! connection read it without a lock.

use std::collections::HashMap;
use std::sync::Arc;

use crate::request::{HttpMethod, HttpRequest};
use crate::response::{HttpResponse, StatusCode};

/// Path parameters extracted from `:name` segments during resolution
pub type PathParams = HashMap<String, String>;

/// Route handler bound to a request and the response it mutates.
///
/// External state (such as a static-file root) is captured by the closure
/// itself; nothing ambient is consulted at dispatch time.
pub type RouteHandler = Arc<dyn Fn(&HttpRequest, &mut HttpResponse) + Send + Sync>;

/// One node of the routing trie.
///
/// A terminal is reached through the sentinel empty-segment child that the
/// trailing slash of a normalized path produces; handlers live only there.
#[derive(Default)]
struct RouteNode {
    children: HashMap<String, RouteNode>,
    param: Option<Box<ParamChild>>,
    handlers: HashMap<HttpMethod, RouteHandler>,
}

/// A `:name` edge. Each node holds at most one; registering a second
/// parameter name at the same level replaces the first, subtree included.
struct ParamChild {
    name: String,
    node: RouteNode,
}

/// Prefix trie over path segments, mapping (method, path) to handlers
///
/// # Example
///
/// ```rust
/// use plume_core::{HttpMethod, Router};
///
/// let mut router = Router::new();
/// router.get("/users/:id", |req, res| {
///     res.send(req.params()["id"].clone());
/// });
///
/// let (_handler, params) = router.resolve(&HttpMethod::GET, "/users/42").unwrap();
/// assert_eq!(params["id"], "42");
/// ```
pub struct Router {
    root: RouteNode,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self { root: RouteNode::default() }
    }

    /// Register `handler` for `method` at `path`.
    ///
    /// The path is normalized (leading slash stripped, exactly one trailing
    /// slash added), so `/api/x/`, `/api/x` and `api/x` all name the same
    /// route. Re-registering the same (method, path) pair silently replaces
    /// the previous handler.
    pub fn route<F>(&mut self, method: HttpMethod, path: &str, handler: F)
    where
        F: Fn(&HttpRequest, &mut HttpResponse) + Send + Sync + 'static,
    {
        let normalized = normalize_route(path);
        let mut node = &mut self.root;
        for segment in normalized.split('/') {
            node = if let Some(name) = segment.strip_prefix(':') {
                let param = node.param.get_or_insert_with(|| {
                    Box::new(ParamChild { name: name.to_string(), node: RouteNode::default() })
                });
                if param.name != name {
                    **param =
                        ParamChild { name: name.to_string(), node: RouteNode::default() };
                }
                &mut param.node
            } else {
                node.children.entry(segment.to_string()).or_default()
            };
        }
        node.handlers.insert(method, Arc::new(handler));
    }

    /// Register a GET handler.
    ///
    /// GET registrations are wrapped so the response status defaults to
    /// `200 OK` before the user handler runs; POST registrations get no such
    /// default.
    pub fn get<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&HttpRequest, &mut HttpResponse) + Send + Sync + 'static,
    {
        self.route(HttpMethod::GET, path, move |req, res| {
            res.set_status(StatusCode::Ok);
            handler(req, res);
        });
    }

    /// Register a POST handler
    pub fn post<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&HttpRequest, &mut HttpResponse) + Send + Sync + 'static,
    {
        self.route(HttpMethod::POST, path, handler);
    }

    /// Resolve `(method, path)` to a handler and its parameter bindings.
    ///
    /// At every level an exact literal child is tried first; only if that
    /// branch fails to reach a handler for `method` is the param child
    /// tried, binding the segment under the parameter's name. Bindings made
    /// on a failed branch are erased when it backtracks. `None` covers both
    /// unknown paths and known paths with no handler for this method.
    pub fn resolve(&self, method: &HttpMethod, path: &str) -> Option<(RouteHandler, PathParams)> {
        let normalized = normalize_route(path);
        let segments: Vec<&str> = normalized.split('/').collect();
        let mut params = PathParams::new();
        let handler = find_handler(&self.root, &segments, method, &mut params)?;
        Some((Arc::clone(handler), params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip one leading slash, ensure one trailing slash.
fn normalize_route(path: &str) -> String {
    let mut route = path.strip_prefix('/').unwrap_or(path).to_string();
    if !route.ends_with('/') {
        route.push('/');
    }
    route
}

/// Depth-first descent: exact child strictly before param child.
fn find_handler<'a>(
    node: &'a RouteNode,
    segments: &[&str],
    method: &HttpMethod,
    params: &mut PathParams,
) -> Option<&'a RouteHandler> {
    let Some((segment, rest)) = segments.split_first() else {
        return node.handlers.get(method);
    };

    if let Some(child) = node.children.get(*segment) {
        if let Some(handler) = find_handler(child, rest, method, params) {
            return Some(handler);
        }
    }

    // The sentinel segment is structural; a parameter never binds it.
    if !segment.is_empty() {
        if let Some(param) = &node.param {
            params.insert(param.name.clone(), segment.to_string());
            if let Some(handler) = find_handler(&param.node, rest, method, params) {
                return Some(handler);
            }
            params.remove(&param.name);
        }
    }

    None
}
