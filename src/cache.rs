// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A process-wide compiled-pattern cache, bounded and LRU-evicted. The
//! free functions in `lib.rs` route through here so that calling code that
//! compiles the same pattern repeatedly (e.g. in a loop) doesn't pay parse
//! and DFA-construction cost on every call.
//!
//! The whole miss path runs under a single global lock, which makes the
//! cache trivially single-flight: two threads racing to compile the same
//! new pattern never do redundant work, because the second thread blocks
//! on the first thread's compile rather than starting its own.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::Error;
use crate::hybrid::CompiledRegex;

const DEFAULT_CAPACITY: usize = 1024;

struct CacheInner {
    map: HashMap<String, Arc<CompiledRegex>>,
    /// Least-recently-used order, oldest first.
    order: Vec<String>,
    capacity: usize,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos);
            self.order.push(k);
        }
    }

    fn insert(&mut self, key: String, value: Arc<CompiledRegex>) {
        if self.map.len() >= self.capacity {
            if !self.order.is_empty() {
                let evict = self.order.remove(0);
                self.map.remove(&evict);
            }
        }
        self.order.push(key.clone());
        self.map.insert(key, value);
    }
}

static CACHE: OnceLock<Mutex<CacheInner>> = OnceLock::new();

fn cache() -> &'static Mutex<CacheInner> {
    CACHE.get_or_init(|| {
        Mutex::new(CacheInner { map: HashMap::new(), order: Vec::new(), capacity: DEFAULT_CAPACITY })
    })
}

/// Compiles `pattern`, reusing a cached compilation if one exists.
/// Compile failures (`Error::Syntax`) are never cached, so a later call
/// with a corrected pattern is unaffected by an earlier failed attempt.
pub fn compile_cached(pattern: &str) -> Result<Arc<CompiledRegex>, Error> {
    let mut guard = cache().lock().unwrap();
    if guard.map.contains_key(pattern) {
        guard.touch(pattern);
        return Ok(guard.map[pattern].clone());
    }
    let compiled = Arc::new(CompiledRegex::compile(pattern)?);
    guard.insert(pattern.to_string(), compiled.clone());
    Ok(compiled)
}

#[cfg(test)]
pub(crate) fn len() -> usize {
    cache().lock().unwrap().map.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_compiles_are_cache_hits() {
        let a = compile_cached("abc").unwrap();
        let b = compile_cached("abc").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn failed_compiles_are_not_cached() {
        assert!(compile_cached("a{2,1}").is_err());
        assert!(compile_cached("a{2,1}").is_err());
    }

    #[test]
    fn eviction_bounds_cache_size() {
        for i in 0..(DEFAULT_CAPACITY + 8) {
            compile_cached(&format!("lit{}", i)).unwrap();
        }
        assert!(len() <= DEFAULT_CAPACITY);
    }
}
