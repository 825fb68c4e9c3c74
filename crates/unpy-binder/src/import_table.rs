//! Import bindings of one stub module.
//!
//! The table maps fully-qualified names to the local alias that binds them,
//! and answers the reverse question: through which alias is `module.symbol`
//! reachable right now. Both directions are memoized; registering a binding
//! invalidates the memo.

use crate::{MODULE_BUILTINS, MODULE_TYPING, MODULE_TYPING_EXTENSIONS};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::cell::RefCell;
use tracing::trace;
use unpy_common::{Span, StubError};

/// Alias stored for `from module import *`.
pub const WILDCARD: &str = "*";

/// How `builtins` can always be reached.
const BUILTINS_ALIAS: &str = "__builtins__";

/// The import that makes a dotted access expression reachable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AccessPath {
    /// Fully-qualified name of the import binding (`typing.Any`, `collections.abc`).
    pub import_fq_name: String,
    /// Attribute path after the alias, if any (`abc.Buffer` for `collections.abc.Buffer`
    /// accessed through `import collections`).
    pub member_path: Option<String>,
}

impl AccessPath {
    pub fn fq_name(&self) -> String {
        match &self.member_path {
            Some(member) => format!("{}.{member}", self.import_fq_name),
            None => self.import_fq_name.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ImportTable {
    /// `{fq_name: alias}` in registration order. Wildcards bind `module.*`.
    imports: IndexMap<String, String>,
    /// `{alias: fq_name}`, without wildcards.
    imports_by_alias: FxHashMap<String, String>,
    /// First segment of every module-level binding.
    global_names: FxHashSet<String>,
    resolve_cache: RefCell<FxHashMap<String, Option<String>>>,
    access_cache: RefCell<FxHashMap<String, Option<AccessPath>>>,
}

impl ImportTable {
    pub fn new() -> ImportTable {
        ImportTable::default()
    }

    /// Record the module-level names, used to detect shadowed builtins.
    pub fn set_global_names(&mut self, names: impl IntoIterator<Item = String>) {
        self.global_names = names.into_iter().collect();
        self.clear_caches();
    }

    pub fn is_global_name(&self, name: &str) -> bool {
        self.global_names.contains(name)
    }

    fn clear_caches(&mut self) {
        self.resolve_cache.get_mut().clear();
        self.access_cache.get_mut().clear();
    }

    /// Register `from <from_module> import <name> [as <alias>]`, or
    /// `import <name> [as <alias>]` when `from_module` is `None`.
    ///
    /// Returns the fully-qualified name of the binding.
    pub fn register_import(
        &mut self,
        name: &str,
        from_module: Option<&str>,
        alias: Option<&str>,
        span: Span,
    ) -> Result<String, StubError> {
        let fq_name = match from_module {
            Some(module) => format!("{}.{name}", module.strip_suffix('.').unwrap_or(module)),
            None => name.to_string(),
        };

        if fq_name == "__future__" || fq_name.starts_with("__future__.") {
            return Err(StubError::policy(
                "__future__ imports are useless in stubs",
                span,
            ));
        }

        let alias = alias.unwrap_or(name);
        let bound = self
            .imports
            .entry(fq_name.clone())
            .or_insert_with(|| alias.to_string());
        if bound.as_str() != alias {
            return Err(StubError::unsupported(
                format!("'{fq_name}' cannot be imported as another name"),
                span,
            ));
        }

        if name != WILDCARD {
            self.imports_by_alias
                .insert(alias.to_string(), fq_name.clone());
        }
        self.clear_caches();
        trace!(fq_name = %fq_name, alias, "registered import");
        Ok(fq_name)
    }

    /// Register `import a.b.c [as x]`. Without an alias this also binds `a.b` and `a`.
    pub fn register_module_import(
        &mut self,
        dotted: &str,
        alias: Option<&str>,
        span: Span,
    ) -> Result<String, StubError> {
        let fq_name = self.register_import(dotted, None, alias, span)?;
        if alias.is_none() {
            let mut parent = fq_name.as_str();
            while let Some((head, _)) = parent.rsplit_once('.') {
                self.register_import(head, None, None, span)?;
                parent = head;
            }
        }
        Ok(fq_name)
    }

    /// Alias bound to a fully-qualified name, `*` for wildcards.
    pub fn alias_of(&self, fq_name: &str) -> Option<&str> {
        self.imports.get(fq_name).map(String::as_str)
    }

    /// Fully-qualified name bound to a local alias.
    pub fn fq_name_of_alias(&self, alias: &str) -> Option<&str> {
        self.imports_by_alias.get(alias).map(String::as_str)
    }

    pub fn is_import_alias(&self, name: &str) -> bool {
        self.imports_by_alias.contains_key(name)
    }

    /// All `(fq_name, alias)` bindings in registration order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.imports
            .iter()
            .map(|(fq_name, alias)| (fq_name.as_str(), alias.as_str()))
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// The expression through which `module.symbol` is reachable, if any.
    ///
    /// With `import collections as col` in scope, `collections.abc.Set`
    /// resolves to `col.abc.Set`; with `from typing import *`, `typing.Any`
    /// resolves to `Any`. Builtins resolve to their bare name unless a
    /// module-level binding shadows it.
    pub fn resolve(&self, module: &str, symbol: &str) -> Option<String> {
        let fq_name = format!("{module}.{symbol}");
        if let Some(cached) = self.resolve_cache.borrow().get(&fq_name) {
            return cached.clone();
        }

        let direct = self
            .imports
            .get(&fq_name)
            .or_else(|| self.imports.get(&format!("{module}.{WILDCARD}")));
        if let Some(alias) = direct {
            let alias = if alias == WILDCARD {
                symbol.to_string()
            } else {
                alias.clone()
            };
            self.resolve_cache
                .borrow_mut()
                .insert(fq_name, Some(alias.clone()));
            return Some(alias);
        }

        let mut default = None;
        let type_check_only = matches!(module, MODULE_TYPING | MODULE_TYPING_EXTENSIONS)
            && matches!(symbol, "reveal_type" | "reveal_locals");
        if module == MODULE_BUILTINS || type_check_only {
            if !self.is_global_name(symbol) {
                return Some(symbol.to_string());
            }
            default = Some(symbol.to_string());
        }

        let parts: Vec<&str> = fq_name.split('.').collect();
        for i in (1..parts.len()).rev() {
            let package = parts[..i].join(".");
            let alias = self
                .imports
                .get(&format!("{package}.{WILDCARD}"))
                .map(String::as_str)
                .or_else(|| self.imports.get(&package).map(String::as_str))
                .or((package == MODULE_BUILTINS).then_some(BUILTINS_ALIAS));
            if let Some(alias) = alias {
                let rest = parts[i..].join(".");
                let resolved = if alias == WILDCARD {
                    rest
                } else {
                    format!("{alias}.{rest}")
                };
                self.resolve_cache
                    .borrow_mut()
                    .insert(fq_name, Some(resolved.clone()));
                return Some(resolved);
            }
        }

        default
    }

    /// `resolve` in `typing`, falling back to `typing_extensions`.
    pub fn imported_from_typing_as(&self, symbol: &str) -> Option<String> {
        self.resolve(MODULE_TYPING, symbol)
            .or_else(|| self.resolve(MODULE_TYPING_EXTENSIONS, symbol))
    }

    /// The import binding through which a dotted access expression is reachable.
    pub fn resolve_access_expression(&self, dotted: &str) -> Option<AccessPath> {
        if let Some(cached) = self.access_cache.borrow().get(dotted) {
            return cached.clone();
        }

        let path = self.find_access_path(dotted);
        self.access_cache
            .borrow_mut()
            .insert(dotted.to_string(), path.clone());
        path
    }

    fn find_access_path(&self, dotted: &str) -> Option<AccessPath> {
        if let Some(fq_name) = self.imports_by_alias.get(dotted) {
            return Some(AccessPath {
                import_fq_name: fq_name.clone(),
                member_path: None,
            });
        }

        let mut head = dotted;
        while let Some((prefix, _)) = head.rsplit_once('.') {
            head = prefix;
            if let Some(fq_name) = self.imports_by_alias.get(head) {
                return Some(AccessPath {
                    import_fq_name: fq_name.clone(),
                    member_path: Some(dotted[head.len() + 1..].to_string()),
                });
            }
        }
        None
    }

    /// Best-effort fully-qualified name of a reference.
    ///
    /// Unbound bare names are assumed to be builtins; locally defined names
    /// stay as they are.
    pub fn fq_name_of(&self, dotted: &str) -> String {
        if let Some(path) = self.resolve_access_expression(dotted) {
            return path.fq_name();
        }
        if let Some(rest) = dotted.strip_prefix("__builtins__.") {
            return format!("{MODULE_BUILTINS}.{rest}");
        }
        if !dotted.contains('.') && !self.is_global_name(dotted) {
            return format!("{MODULE_BUILTINS}.{dotted}");
        }
        dotted.to_string()
    }
}
