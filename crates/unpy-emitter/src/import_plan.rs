//! Import plan - the import delta of one module.
//!
//! The lowering pass asks the plan for every symbol its output refers to and
//! for every binding it makes obsolete. The plan answers with the name to use
//! in the output and remembers which `from` imports have to be added or
//! removed when the import statements are reconciled.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use tracing::{debug, trace};
use unpy_binder::{ImportTable, MODULE_TYPING, MODULE_TYPING_EXTENSIONS};

pub struct ImportPlan<'a> {
    imports: &'a ImportTable,
    /// `(module, name)` imports to add, each bound to its own name.
    added: IndexSet<(String, String)>,
    /// Existing `(module, name)` imports to drop.
    removed: FxHashSet<(String, String)>,
}

fn key(module: &str, name: &str) -> (String, String) {
    (module.to_string(), name.to_string())
}

impl<'a> ImportPlan<'a> {
    pub fn new(imports: &'a ImportTable) -> ImportPlan<'a> {
        ImportPlan {
            imports,
            added: IndexSet::new(),
            removed: FxHashSet::default(),
        }
    }

    /// The expression through which `module.name` is reachable in the output,
    /// scheduling an import when nothing reaches it yet.
    pub fn require(&mut self, module: &str, name: &str) -> String {
        if !self.is_removed(module, name)
            && let Some(alias) = self.imports.resolve(module, name)
        {
            return alias;
        }
        if module == MODULE_TYPING
            && !self.is_removed(MODULE_TYPING_EXTENSIONS, name)
            && let Some(alias) = self.imports.resolve(MODULE_TYPING_EXTENSIONS, name)
        {
            return alias;
        }

        let wanted = key(module, name);
        if self.added.contains(&wanted) {
            return name.to_string();
        }
        if module == MODULE_TYPING && self.added.contains(&key(MODULE_TYPING_EXTENSIONS, name)) {
            return name.to_string();
        }
        if module == MODULE_TYPING_EXTENSIONS {
            self.discard_unaliased(MODULE_TYPING, name);
        }

        debug!(module, name, "import required");
        self.added.insert(wanted);
        name.to_string()
    }

    /// Drop `module.name`: cancel a pending addition, or schedule the removal
    /// of an existing import.
    pub fn discard(&mut self, module: &str, name: &str) {
        let binding = key(module, name);
        if self.added.shift_remove(&binding) {
            trace!(module, name, "cancelled import");
            return;
        }
        if self.imports.alias_of(&format!("{module}.{name}")).is_some() {
            debug!(module, name, "import discarded");
            self.removed.insert(binding);
        }
    }

    /// `discard`, limited to imports bound to their own name.
    fn discard_unaliased(&mut self, module: &str, name: &str) {
        let pending = self.added.contains(&key(module, name));
        let unaliased = self.imports.alias_of(&format!("{module}.{name}")) == Some(name);
        if pending || unaliased {
            self.discard(module, name);
        }
    }

    pub fn is_removed(&self, module: &str, name: &str) -> bool {
        self.removed.contains(&key(module, name))
    }

    pub fn is_added(&self, module: &str, name: &str) -> bool {
        self.added.contains(&key(module, name))
    }

    /// Names to add, grouped by module. Both levels are sorted.
    pub fn grouped_additions(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (module, name) in &self.added {
            grouped.entry(module.clone()).or_default().push(name.clone());
        }
        for names in grouped.values_mut() {
            names.sort();
            names.dedup();
        }
        grouped
    }

    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}
