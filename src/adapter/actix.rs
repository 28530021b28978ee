use crate::adapter::{combine_paths, PlaceholderSyntax, RawRoute, RouterAdapter};
use crate::error::Result;
use crate::route_registry::{HttpMethod, PathTemplate};
use crate::source::SourceSet;
use log::debug;
use std::collections::HashMap;
use std::path::Path;
use syn::punctuated::Punctuated;
use syn::{visit::Visit, Attribute, Expr, ExprMethodCall, Lit, Token};

/// Reads actix-web routes from source code.
///
/// Understands the route macros (`#[get("/users/{id}")]`,
/// `#[route("/x", method = "GET", method = "HEAD")]`), `web::scope` prefixes
/// applied through `.service(handler)`, and `.route("/p", web::get().to(h))`
/// registrations on apps, scopes and resources.
pub struct ActixSourceAdapter {
    routes: Vec<RawRoute>,
}

impl ActixSourceAdapter {
    /// Collect every route declared in `sources`
    pub fn from_sources(sources: &SourceSet) -> Self {
        let mut visitor = ActixVisitor::default();
        for file in &sources.files {
            visitor.visit_file(&file.syntax_tree);
        }

        let mut routes = Vec::new();
        for (method, path, handler) in &visitor.macro_routes {
            let scope = visitor.scopes.get(handler).map(String::as_str).unwrap_or("");
            routes.push(RawRoute::new(
                *method,
                &combine_paths(scope, path),
                Some(handler),
            ));
        }
        routes.extend(visitor.routes);

        debug!("Found {} actix-web routes", routes.len());
        Self { routes }
    }

    /// Load and scan a project directory
    pub fn from_project(root: &Path) -> anyhow::Result<Self> {
        let sources = SourceSet::load(root)?;
        Ok(Self::from_sources(&sources))
    }
}

impl RouterAdapter for ActixSourceAdapter {
    fn name(&self) -> &str {
        "actix-web"
    }

    fn list_routes(&self) -> Result<Vec<RawRoute>> {
        Ok(self.routes.clone())
    }

    fn translate(&self, pattern: &str) -> Result<PathTemplate> {
        PlaceholderSyntax::Braces.translate(pattern)
    }
}

/// Visitor for traversing the AST and finding actix-web routes
#[derive(Default)]
struct ActixVisitor {
    /// (method, path, handler function) from route macros
    macro_routes: Vec<(HttpMethod, String, String)>,
    /// Scope prefix of every handler registered with `.service(handler)`
    scopes: HashMap<String, String>,
    /// Routes registered with `.route(...)`
    routes: Vec<RawRoute>,
}

impl ActixVisitor {
    /// Find and parse route macros (#[get], #[post], #[route], etc.)
    fn find_route_macros(&mut self, item_fn: &syn::ItemFn) {
        let fn_name = item_fn.sig.ident.to_string();
        for attr in &item_fn.attrs {
            for (method, path) in parse_route_macro(attr) {
                self.macro_routes.push((method, path, fn_name.clone()));
            }
        }
    }

    /// Walk a builder chain such as `web::scope("/api").service(a).route(...)`
    fn walk_chain(&mut self, expr: &Expr, outer: &str) {
        let base = match chain_root_path(expr) {
            Some(path) => combine_paths(outer, &path),
            None => outer.to_string(),
        };

        let mut calls = Vec::new();
        let mut current = expr;
        while let Expr::MethodCall(call) = current {
            calls.push(call);
            current = &call.receiver;
        }

        for call in calls.into_iter().rev() {
            match call.method.to_string().as_str() {
                "service" => {
                    if let Some(arg) = call.args.first() {
                        self.walk_service(arg, &base);
                    }
                }
                "route" => self.parse_route_call(call, &base),
                _ => {}
            }
        }
    }

    fn walk_service(&mut self, arg: &Expr, base: &str) {
        match arg {
            Expr::Path(path_expr) => {
                if let Some(segment) = path_expr.path.segments.last() {
                    self.scopes
                        .insert(segment.ident.to_string(), base.to_string());
                }
            }
            Expr::MethodCall(_) | Expr::Call(_) => {
                if chain_root_path(arg).is_some() {
                    self.walk_chain(arg, base);
                }
            }
            _ => {}
        }
    }

    /// `.route("/p", web::get().to(h))` or, on a resource, `.route(web::get().to(h))`
    fn parse_route_call(&mut self, call: &ExprMethodCall, base: &str) {
        let (path, route_expr) = match call.args.len() {
            1 => (String::new(), &call.args[0]),
            2 => match extract_string_literal(&call.args[0]) {
                Some(path) => (path, &call.args[1]),
                None => return,
            },
            _ => return,
        };

        if let Some((method, handler)) = parse_route_target(route_expr) {
            let full_path = combine_paths(base, &path);
            let full_path = if full_path.is_empty() {
                "/".to_string()
            } else {
                full_path
            };
            self.routes
                .push(RawRoute::new(method, &full_path, handler.as_deref()));
        }
    }
}

impl<'ast> Visit<'ast> for ActixVisitor {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.find_route_macros(node);
        syn::visit::visit_item_fn(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        let method = node.method.to_string();
        if method == "service" || method == "route" {
            // The outermost call of a chain sees the whole chain.
            let expr = Expr::MethodCall(node.clone());
            self.walk_chain(&expr, "");
            return;
        }
        syn::visit::visit_expr_method_call(self, node);
    }
}

/// Parse a route macro attribute into (method, path) pairs
fn parse_route_macro(attr: &Attribute) -> Vec<(HttpMethod, String)> {
    let Some(attr_name) = attr.path().segments.last().map(|s| s.ident.to_string()) else {
        return Vec::new();
    };
    let Ok(args) = attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated) else {
        return Vec::new();
    };
    let Some(path) = args.first().and_then(extract_string_literal) else {
        return Vec::new();
    };

    if attr_name == "route" {
        return args
            .iter()
            .skip(1)
            .filter_map(|arg| match arg {
                Expr::Assign(assign) if is_ident(&assign.left, "method") => {
                    extract_string_literal(&assign.right)?.parse::<HttpMethod>().ok()
                }
                _ => None,
            })
            .map(|method| (method, path.clone()))
            .collect();
    }

    match attr_name.parse::<HttpMethod>() {
        Ok(method) => vec![(method, path)],
        Err(_) => Vec::new(),
    }
}

/// `web::get().to(handler)` -> (GET, handler)
fn parse_route_target(expr: &Expr) -> Option<(HttpMethod, Option<String>)> {
    let Expr::MethodCall(to_call) = expr else {
        return None;
    };
    if to_call.method != "to" {
        return None;
    }
    let handler = to_call.args.first().and_then(|arg| match arg {
        Expr::Path(path_expr) => path_expr.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    });

    let mut current = &*to_call.receiver;
    while let Expr::MethodCall(call) = current {
        current = &call.receiver;
    }
    let Expr::Call(method_call) = current else {
        return None;
    };
    let Expr::Path(func) = &*method_call.func else {
        return None;
    };
    let method = func.path.segments.last()?.ident.to_string().parse().ok()?;
    Some((method, handler))
}

/// Path of a `web::scope("/p")` or `web::resource("/p")` chain root
fn chain_root_path(expr: &Expr) -> Option<String> {
    let mut current = expr;
    while let Expr::MethodCall(call) = current {
        current = &call.receiver;
    }
    let Expr::Call(call) = current else {
        return None;
    };
    let Expr::Path(func) = &*call.func else {
        return None;
    };
    let name = func.path.segments.last()?.ident.to_string();
    if name != "scope" && name != "resource" {
        return None;
    }
    call.args.first().and_then(extract_string_literal)
}

fn is_ident(expr: &Expr, ident: &str) -> bool {
    match expr {
        Expr::Path(path_expr) => path_expr.path.is_ident(ident),
        _ => false,
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
