//! Path-pattern router with named parameters.
//!
//! Routes are registered once at startup and scanned in registration order.
//! A template such as `/items/{id}` compiles to an anchored regex in which
//! every `{name}` placeholder captures exactly one path segment. On a match
//! the captures are merged into the request's query parameters, overriding
//! any query parameter of the same name, and the route's [`Handler`] runs.
//!
//! Handlers are either plain async closures or a named action on a
//! [`Controller`] that is resolved through the [`ServiceRegistry`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::Query,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde_json::json;

mod registry;

pub use registry::{Controller, Injectable, ServiceRegistry};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type CallableFn = Arc<dyn Fn(RouteRequest) -> BoxFuture<Response> + Send + Sync>;
type ActionFn = Arc<dyn Fn(&ServiceRegistry, RouteRequest) -> BoxFuture<Response> + Send + Sync>;

// ---

/// What a handler sees: method, bare path and merged parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
}

impl RouteRequest {
    // ---
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// `None` when absent, `Some(Err(raw))` when present but unparsable.
    pub fn parse_param<T: FromStr>(&self, name: &str) -> Option<Result<T, String>> {
        // ---
        self.param(name)
            .map(|raw| raw.trim().parse::<T>().map_err(|_| raw.to_string()))
    }
}

#[derive(Clone)]
pub enum Handler {
    Callable(CallableFn),
    Action {
        controller: &'static str,
        action: &'static str,
        invoke: ActionFn,
    },
}

impl Handler {
    // ---
    pub fn callable<F, Fut>(handler: F) -> Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Handler::Callable(Arc::new(move |req: RouteRequest| -> BoxFuture<Response> {
            Box::pin(handler(req))
        }))
    }

    /// `action` on controller `C`, resolved per request.
    pub fn action<C>(action: &'static str) -> Self
    where
        C: Controller + Injectable,
    {
        Handler::Action {
            controller: std::any::type_name::<C>(),
            action,
            invoke: Arc::new(
                move |services: &ServiceRegistry, req: RouteRequest| -> BoxFuture<Response> {
                    let controller = registry::resolve::<C>(services);
                    Box::pin(async move { controller.call(action, req).await })
                },
            ),
        }
    }

    fn invoke(&self, services: &ServiceRegistry, req: RouteRequest) -> BoxFuture<Response> {
        // ---
        match self {
            Handler::Callable(f) => f(req),
            Handler::Action { invoke, .. } => invoke(services, req),
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // ---
        match self {
            Handler::Callable(_) => f.write_str("Callable"),
            Handler::Action {
                controller, action, ..
            } => write!(f, "Action({controller}::{action})"),
        }
    }
}

#[derive(Debug)]
pub struct Route {
    method: Method,
    template: String,
    matcher: Regex,
    handler: Handler,
}

impl Route {
    // ---
    pub fn new(method: Method, template: &str, handler: Handler) -> Result<Self, regex::Error> {
        // ---
        Ok(Route {
            method,
            template: template.to_string(),
            matcher: Regex::new(&template_to_pattern(template))?,
            handler,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Named captures if `path` matches the whole template.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        // ---
        let caps = self.matcher.captures(path)?;
        Some(
            self.matcher
                .capture_names()
                .flatten()
                .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
                .collect(),
        )
    }
}

/// Regex source for a path template.
fn template_to_pattern(template: &str) -> String {
    // ---
    let mut pattern = String::from("^");
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (literal, tail) = rest.split_at(open);
        pattern.push_str(&regex::escape(literal));

        let name = tail[1..].find('}').map(|close| &tail[1..1 + close]);
        match name {
            Some(name) if is_param_name(name) => {
                pattern.push_str(&format!("(?P<{name}>[^/]+)"));
                rest = &tail[name.len() + 2..];
            }
            _ => {
                pattern.push_str(r"\{");
                rest = &tail[1..];
            }
        }
    }

    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    pattern
}

fn is_param_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic() || c == '_')
}

/// No registered route matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNotFound {
    pub method: Method,
    pub path: String,
}

impl IntoResponse for RouteNotFound {
    fn into_response(self) -> Response {
        // ---
        json_error(
            StatusCode::NOT_FOUND,
            "Not Found",
            format!("Route {} {} not found", self.method, self.path),
        )
    }
}

/// `{error, message}` JSON body with the given status.
pub fn json_error(status: StatusCode, error: &str, message: String) -> Response {
    (status, Json(json!({ "error": error, "message": message }))).into_response()
}

pub struct Router {
    routes: Vec<Route>,
    services: ServiceRegistry,
}

impl Router {
    // ---
    pub fn new(services: ServiceRegistry) -> Self {
        Router {
            routes: Vec::new(),
            services,
        }
    }

    pub fn register(
        &mut self,
        method: Method,
        template: &str,
        handler: Handler,
    ) -> Result<&mut Self, regex::Error> {
        // ---
        tracing::debug!("Registering route: {} {}", method, template);
        self.routes.push(Route::new(method, template, handler)?);
        Ok(self)
    }

    pub fn get(&mut self, template: &str, handler: Handler) -> Result<&mut Self, regex::Error> {
        self.register(Method::GET, template, handler)
    }

    pub fn post(&mut self, template: &str, handler: Handler) -> Result<&mut Self, regex::Error> {
        self.register(Method::POST, template, handler)
    }

    pub fn put(&mut self, template: &str, handler: Handler) -> Result<&mut Self, regex::Error> {
        self.register(Method::PUT, template, handler)
    }

    pub fn delete(&mut self, template: &str, handler: Handler) -> Result<&mut Self, regex::Error> {
        self.register(Method::DELETE, template, handler)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First route matching `method` and the path of `raw_uri`, plus the
    /// request it would receive.
    pub fn resolve(
        &self,
        method: &Method,
        raw_uri: &str,
    ) -> Result<(&Route, RouteRequest), RouteNotFound> {
        // ---
        let path = raw_uri.split_once('?').map_or(raw_uri, |(path, _)| path);

        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            if let Some(captures) = route.captures(path) {
                let mut params = parse_query(raw_uri);
                params.extend(captures);
                let request = RouteRequest {
                    method: method.clone(),
                    path: path.to_string(),
                    params,
                };
                return Ok((route, request));
            }
        }

        Err(RouteNotFound {
            method: method.clone(),
            path: path.to_string(),
        })
    }

    pub async fn dispatch(&self, method: &Method, raw_uri: &str) -> Response {
        // ---
        match self.resolve(method, raw_uri) {
            Ok((route, request)) => {
                tracing::debug!("{} {} -> {:?}", method, route.template, route.handler);
                route.handler.invoke(&self.services, request).await
            }
            Err(not_found) => {
                tracing::debug!("No route for {} {}", not_found.method, not_found.path);
                not_found.into_response()
            }
        }
    }
}

fn parse_query(raw_uri: &str) -> HashMap<String, String> {
    // ---
    raw_uri
        .parse::<Uri>()
        .ok()
        .and_then(|uri| Query::<HashMap<String, String>>::try_from_uri(&uri).ok())
        .map(|Query(params)| params)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn ok_handler() -> Handler {
        Handler::callable(|_req| async { StatusCode::OK.into_response() })
    }

    #[test]
    fn test_template_to_pattern() {
        // ---
        assert_eq!(template_to_pattern("/"), "^/$");
        assert_eq!(template_to_pattern("/items/{id}"), "^/items/(?P<id>[^/]+)$");
        assert_eq!(
            template_to_pattern("/a.b/{first_name}/x"),
            r"^/a\.b/(?P<first_name>[^/]+)/x$"
        );
    }

    #[test]
    fn test_malformed_placeholder_is_literal() {
        // ---
        assert_eq!(template_to_pattern("/x/{1d}"), r"^/x/\{1d\}$");
        assert_eq!(template_to_pattern("/x/{"), r"^/x/\{$");
    }

    #[test]
    fn test_captures_one_segment_only() {
        // ---
        let route = Route::new(Method::GET, "/items/{id}", ok_handler()).unwrap();

        let caps = route.captures("/items/42").unwrap();
        assert_eq!(caps.get("id").map(String::as_str), Some("42"));
        assert!(route.captures("/items/42/extra").is_none());
        assert!(route.captures("/items/").is_none());
        assert!(route.captures("/prefix/items/42").is_none());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        // ---
        assert!(Route::new(Method::GET, "/{id}/{id}", ok_handler()).is_err());
    }

    #[test]
    fn test_resolve_merges_captures_over_query() {
        // ---
        let mut router = Router::new(ServiceRegistry::new());
        router.get("/items/{id}", ok_handler()).unwrap();

        let (route, req) = router.resolve(&Method::GET, "/items/42?x=1&id=7").unwrap();
        assert_eq!(route.template(), "/items/{id}");
        assert_eq!(req.path, "/items/42");
        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(req.param("x"), Some("1"));
    }

    #[test]
    fn test_resolve_first_registered_wins() {
        // ---
        let mut router = Router::new(ServiceRegistry::new());
        router
            .get("/items/{id}", ok_handler())
            .unwrap()
            .get("/items/special", ok_handler())
            .unwrap();

        let (route, _) = router.resolve(&Method::GET, "/items/special").unwrap();
        assert_eq!(route.template(), "/items/{id}");
    }

    #[test]
    fn test_resolve_method_mismatch() {
        // ---
        let mut router = Router::new(ServiceRegistry::new());
        router.get("/items/{id}", ok_handler()).unwrap();

        let err = router.resolve(&Method::POST, "/items/42?x=1").unwrap_err();
        assert_eq!(err.method, Method::POST);
        assert_eq!(err.path, "/items/42");
    }

    #[test]
    fn test_parse_param() {
        // ---
        let mut router = Router::new(ServiceRegistry::new());
        router.get("/", ok_handler()).unwrap();

        let (_, req) = router.resolve(&Method::GET, "/?n=12&bad=abc").unwrap();
        assert_eq!(req.parse_param::<i64>("n"), Some(Ok(12)));
        assert_eq!(req.parse_param::<i64>("bad"), Some(Err("abc".to_string())));
        assert_eq!(req.parse_param::<i64>("missing"), None);
    }
}
