use crate::adapter::{combine_paths, PlaceholderSyntax, RawRoute, RouterAdapter};
use crate::error::Result;
use crate::route_registry::{HttpMethod, PathTemplate};
use crate::source::SourceSet;
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::HashSet;
use std::path::Path;
use syn::{visit::Visit, Expr, ExprMethodCall, Lit};

/// Reads axum routers from source code.
///
/// Understands `.route("/path", get(a).post(b))` chains and `.nest("/prefix",
/// ...)` with either an inline router or a call to a router-building function
/// defined in the same project. Both the 0.7 (`:id`, `*rest`) and the 0.8
/// (`{id}`, `{*rest}`) placeholder syntaxes are accepted.
pub struct AxumSourceAdapter {
    routes: Vec<RawRoute>,
}

impl AxumSourceAdapter {
    /// Collect the routes of every router defined in `sources`
    pub fn from_sources(sources: &SourceSet) -> Self {
        let mut visitor = AxumVisitor::default();
        for file in &sources.files {
            visitor.visit_file(&file.syntax_tree);
        }
        let routes = visitor.resolve();
        debug!("Found {} axum routes", routes.len());
        Self { routes }
    }

    /// Load and scan a project directory
    pub fn from_project(root: &Path) -> anyhow::Result<Self> {
        let sources = SourceSet::load(root)?;
        Ok(Self::from_sources(&sources))
    }
}

impl RouterAdapter for AxumSourceAdapter {
    fn name(&self) -> &str {
        "axum"
    }

    fn list_routes(&self) -> Result<Vec<RawRoute>> {
        Ok(self.routes.clone())
    }

    fn translate(&self, pattern: &str) -> Result<PathTemplate> {
        let canonical = PlaceholderSyntax::Colon.rewrite(pattern);
        PlaceholderSyntax::Braces.translate(&canonical)
    }
}

/// Routes and nested routers declared inside one function
#[derive(Default)]
struct RouterFn {
    routes: Vec<RawRoute>,
    /// (prefix, name of the function building the nested router)
    nests: Vec<(String, String)>,
}

/// Visitor for traversing the AST and finding axum routes
#[derive(Default)]
struct AxumVisitor {
    functions: IndexMap<String, RouterFn>,
    current_fn: Option<String>,
    prefix: Vec<String>,
    /// (enclosing function, local router key)
    locals: Vec<(String, String)>,
}

impl AxumVisitor {
    fn current_prefix(&self) -> String {
        self.prefix
            .iter()
            .fold(String::new(), |acc, p| combine_paths(&acc, p))
    }

    fn current(&mut self) -> Option<&mut RouterFn> {
        let name = self.current_fn.clone()?;
        Some(self.functions.entry(name).or_default())
    }

    /// `.route(path, method_router)`
    fn parse_route_method(&mut self, expr: &ExprMethodCall) {
        if expr.args.len() < 2 {
            return;
        }
        let Some(path) = extract_string_literal(&expr.args[0]) else {
            return;
        };
        let full_path = combine_paths(&self.current_prefix(), &path);

        let mut handlers = Vec::new();
        collect_method_router(&expr.args[1], &mut handlers);
        handlers.reverse();

        if let Some(router_fn) = self.current() {
            for (method, handler) in handlers {
                router_fn
                    .routes
                    .push(RawRoute::new(method, &full_path, handler.as_deref()));
            }
        }
    }

    /// `.nest(path, router)`; returns false if the call was not understood
    fn parse_nest_method(&mut self, expr: &ExprMethodCall) -> bool {
        if expr.args.len() != 2 {
            return false;
        }
        let Some(path) = extract_string_literal(&expr.args[0]) else {
            return false;
        };
        self.nest_router(&expr.receiver, path, &expr.args[1]);
        true
    }

    /// `.merge(router)`, a nest without prefix
    fn parse_merge_method(&mut self, expr: &ExprMethodCall) -> bool {
        if expr.args.len() != 1 {
            return false;
        }
        self.nest_router(&expr.receiver, String::new(), &expr.args[0]);
        true
    }

    fn nest_router(&mut self, receiver: &Expr, path: String, router: &Expr) {
        syn::visit::visit_expr(self, receiver);
        let prefix = combine_paths(&self.current_prefix(), &path);

        let callee = match router {
            Expr::Call(call) if call.args.is_empty() => {
                last_path_ident(&call.func).filter(|name| name != "new")
            }
            Expr::Path(path_expr) => path_expr
                .path
                .get_ident()
                .and_then(|ident| self.local_key(&ident.to_string()))
                .filter(|key| self.functions.contains_key(key)),
            _ => None,
        };
        if let Some(callee) = callee {
            if let Some(router_fn) = self.current() {
                router_fn.nests.push((prefix, callee));
            }
            return;
        }

        self.prefix.push(path);
        syn::visit::visit_expr(self, router);
        self.prefix.pop();
    }

    /// Name under which a router bound to a local variable is recorded
    fn local_key(&self, var: &str) -> Option<String> {
        self.current_fn.as_ref().map(|f| format!("{}::{}", f, var))
    }

    /// Expand nested routers into full routes, starting from routers that are
    /// not nested anywhere
    fn resolve(&mut self) -> Vec<RawRoute> {
        // Local routers never nested are part of the router they were built in.
        let nested = self.nested_routers();
        for (parent, local) in std::mem::take(&mut self.locals) {
            if !nested.contains(&local) {
                self.functions
                    .entry(parent)
                    .or_default()
                    .nests
                    .push((String::new(), local));
            }
        }

        let nested = self.nested_routers();
        let mut routes = Vec::new();
        for name in self.functions.keys() {
            if !nested.contains(name) {
                let mut stack = Vec::new();
                self.expand(name, "", &mut stack, &mut routes);
            }
        }
        routes
    }

    fn nested_routers(&self) -> HashSet<String> {
        self.functions
            .values()
            .flat_map(|f| f.nests.iter().map(|(_, callee)| callee.clone()))
            .collect()
    }

    fn expand<'a>(&'a self, name: &'a str, prefix: &str, stack: &mut Vec<&'a str>, out: &mut Vec<RawRoute>) {
        let Some(router_fn) = self.functions.get(name) else {
            warn!("Unknown router function: {}", name);
            return;
        };
        if stack.contains(&name) {
            warn!("Recursive router nesting through {}", name);
            return;
        }
        stack.push(name);

        for route in &router_fn.routes {
            let mut route = route.clone();
            route.pattern = combine_paths(prefix, &route.pattern);
            out.push(route);
        }
        for (nest_prefix, callee) in &router_fn.nests {
            let full = combine_paths(prefix, nest_prefix);
            self.expand(callee, &full, stack, out);
        }

        stack.pop();
    }
}

impl<'ast> Visit<'ast> for AxumVisitor {
    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        match node.method.to_string().as_str() {
            "route" => {
                // Receiver first so chained routes keep declaration order.
                syn::visit::visit_expr(self, &node.receiver);
                self.parse_route_method(node);
                for arg in &node.args {
                    syn::visit::visit_expr(self, arg);
                }
            }
            "nest" if self.parse_nest_method(node) => {}
            "merge" if self.parse_merge_method(node) => {}
            _ => syn::visit::visit_expr_method_call(self, node),
        }
    }

    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        let previous = self.current_fn.replace(node.sig.ident.to_string());
        syn::visit::visit_item_fn(self, node);
        self.current_fn = previous;
    }

    fn visit_local(&mut self, node: &'ast syn::Local) {
        let binding = match (&node.pat, &node.init) {
            (syn::Pat::Ident(pat), Some(init)) if is_router_expr(&init.expr) => {
                self.local_key(&pat.ident.to_string()).map(|key| (key, &init.expr))
            }
            _ => None,
        };
        let Some((key, init)) = binding else {
            syn::visit::visit_local(self, node);
            return;
        };

        let parent = self.current_fn.replace(key.clone());
        self.functions.entry(key.clone()).or_default();
        syn::visit::visit_expr(self, init);
        self.current_fn = parent.clone();
        if let Some(parent) = parent {
            self.locals.push((parent, key));
        }
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        let previous = self.current_fn.replace(node.sig.ident.to_string());
        syn::visit::visit_impl_item_fn(self, node);
        self.current_fn = previous;
    }
}

/// Collect (method, handler) pairs from `get(a).post(b)` style method routers.
/// Pairs come out in reverse order.
fn collect_method_router(expr: &Expr, out: &mut Vec<(HttpMethod, Option<String>)>) {
    match expr {
        // `get(handler)`; actix's `web::get()` takes no handler.
        Expr::Call(call) if call.args.len() == 1 => {
            if let Some(method) = last_path_ident(&call.func).and_then(|m| m.parse::<HttpMethod>().ok()) {
                out.push((method, call.args.first().and_then(last_path_ident)));
            }
        }
        Expr::MethodCall(call) => {
            if let Ok(method) = call.method.to_string().parse::<HttpMethod>() {
                out.push((method, call.args.first().and_then(last_path_ident)));
            }
            collect_method_router(&call.receiver, out);
        }
        _ => {}
    }
}

/// Whether an expression builds a router: `Router::new()` or a chain of
/// router methods
fn is_router_expr(expr: &Expr) -> bool {
    match expr {
        Expr::MethodCall(call) => {
            matches!(call.method.to_string().as_str(), "route" | "nest" | "merge")
                || is_router_expr(&call.receiver)
        }
        Expr::Call(call) => match &*call.func {
            Expr::Path(path_expr) => {
                let mut segments = path_expr.path.segments.iter().rev();
                matches!(
                    (segments.next(), segments.next()),
                    (Some(new), Some(router)) if new.ident == "new" && router.ident == "Router"
                )
            }
            _ => false,
        },
        _ => false,
    }
}

fn last_path_ident(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Path(path_expr) => path_expr.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

fn extract_string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(lit_str) => Some(lit_str.value()),
            _ => None,
        },
        _ => None,
    }
}
