//! Compiler-recognized call targets
//!
//! A small closed set of names the code generator lowers to hard-coded
//! externally-linked declarations instead of resolving through user scope.
//! Each is declared in the module lazily, the first time a call site
//! references it. `printf` takes its format from a string-literal argument,
//! which mints a fresh per-call-site format global (string literals are
//! never pooled).

use crate::vm::ir::Ty;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// External signature of an intrinsic
#[derive(Debug, Clone)]
pub struct IntrinsicSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
    pub is_varargs: bool,
}

static INTRINSICS: Lazy<IndexMap<&'static str, IntrinsicSig>> = Lazy::new(|| {
    let mut table = IndexMap::new();
    table.insert(
        "printf",
        IntrinsicSig {
            params: vec![Ty::Ptr],
            ret: Ty::I32,
            is_varargs: true,
        },
    );
    table.insert(
        "memcpy",
        IntrinsicSig {
            params: vec![Ty::Ptr, Ty::Ptr, Ty::I32],
            ret: Ty::Ptr,
            is_varargs: false,
        },
    );
    table.insert(
        "malloc",
        IntrinsicSig {
            params: vec![Ty::I32],
            ret: Ty::Ptr,
            is_varargs: false,
        },
    );
    table.insert(
        "concat",
        IntrinsicSig {
            params: vec![Ty::Ptr, Ty::Ptr],
            ret: Ty::Ptr,
            is_varargs: false,
        },
    );
    table
});

/// Signature of an intrinsic name, or `None` for user-defined calls
pub fn signature(name: &str) -> Option<&'static IntrinsicSig> {
    INTRINSICS.get(name)
}
