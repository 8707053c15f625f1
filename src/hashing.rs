//! This module provides deterministic `HashMap` and `IndexMap` variants. The hashing data
//! structures in the standard library are randomly seeded, which we have no use for: keys are
//! measurement names chosen by the program being timed, not by an adversary.
//!
//! `IndexMap` additionally remembers insertion order. The store relies on this to list
//! measurements in a stable order, which in turn breaks ties when reports sort by runtime.
//!
//! Neither alias has a `new` method because of the custom hasher. Use `default()` instead.

use rustc_hash::FxBuildHasher;

pub use rustc_hash::FxHashMap as HashMap;

/// An insertion-ordered map with a fast, deterministic hasher.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;
