//! Symbol table and scope chain
//!
//! An explicit stack of name tables owned by the code generator: pushed on
//! function entry, popped on function exit. Lookup walks innermost to
//! outermost, so inner definitions shadow outer ones; defining an existing
//! name in the same scope silently replaces it.

use crate::vm::ir::{Ty, Value};
use indexmap::IndexMap;

/// Resolved symbol: its storage value and type
#[derive(Debug, Clone)]
pub struct Symbol {
    pub value: Value,
    pub ty: Ty,
}

/// Scope chain
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<IndexMap<String, Symbol>>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// A chain with just the root scope; the root lives for the whole
    /// compilation
    pub fn new() -> Self {
        Self {
            scopes: vec![IndexMap::new()],
        }
    }

    /// Open a child scope
    pub fn push_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    /// Discard the innermost scope; the root is never popped
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Insert into the innermost scope, replacing any same-scope entry
    pub fn define(&mut self, name: impl Into<String>, value: Value, ty: Ty) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), Symbol { value, ty });
        }
    }

    /// Search innermost to outermost; first match wins
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
        }
        None
    }

    /// Search the innermost scope only
    pub fn lookup_current(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|s| s.get(name))
    }

    /// Nesting depth (root scope is 0)
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let mut scopes = ScopeStack::new();
        scopes.define("x", Value::ConstI32(0), Ty::I32);
        assert!(scopes.lookup("x").is_some());
        assert!(scopes.lookup("y").is_none());
    }

    #[test]
    fn scope_nesting_and_shadow() {
        let mut scopes = ScopeStack::new();
        scopes.define("a", Value::ConstI32(1), Ty::I32);

        scopes.push_scope();
        assert_eq!(scopes.depth(), 1);
        scopes.define("b", Value::ConstF32(2.0), Ty::F32);
        assert!(scopes.lookup("a").is_some());
        assert!(scopes.lookup("b").is_some());

        // shadowing: the inner definition wins while the scope is open
        scopes.define("a", Value::ConstI32(3), Ty::I32);
        match scopes.lookup("a") {
            Some(symbol) => assert_eq!(symbol.value, Value::ConstI32(3)),
            None => panic!("shadowed name must resolve"),
        }

        scopes.pop_scope();
        assert_eq!(scopes.depth(), 0);
        assert!(scopes.lookup("b").is_none());
        match scopes.lookup("a") {
            Some(symbol) => assert_eq!(symbol.value, Value::ConstI32(1)),
            None => panic!("outer definition must survive the pop"),
        }
    }

    #[test]
    fn same_scope_redefinition_replaces_silently() {
        let mut scopes = ScopeStack::new();
        scopes.define("x", Value::ConstI32(5), Ty::I32);
        scopes.define("x", Value::ConstI32(6), Ty::I32);
        match scopes.lookup("x") {
            Some(symbol) => assert_eq!(symbol.value, Value::ConstI32(6)),
            None => panic!("redefined name must resolve"),
        }
    }

    #[test]
    fn root_scope_is_never_popped() {
        let mut scopes = ScopeStack::new();
        scopes.define("x", Value::ConstI32(0), Ty::I32);
        scopes.pop_scope();
        assert!(scopes.lookup("x").is_some());
    }
}
