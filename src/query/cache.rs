//! Thread-local cache of parsed selectors.
//!
//! Selector text is usually repeated across calls (`matches` in a loop over
//! every node, `parent(expr)` walking many ancestors), so parsed selectors
//! are kept per thread, capped at 256 entries. When the cap is reached the
//! cache is cleared and rebuilt on demand.
//!
//! Only the parse is cached. Search results are never reused across calls.

use crate::query::errors::QueryError;
use crate::query::selector::Selector;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    static SELECTOR_CACHE: RefCell<HashMap<String, Rc<Selector>>> =
        RefCell::new(HashMap::new());
}

/// Get a parsed selector from cache, or parse and cache it. Parse errors are
/// not cached.
pub fn get_or_parse(input: &str) -> Result<Rc<Selector>, QueryError> {
    SELECTOR_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(selector) = cache.get(input) {
            return Ok(Rc::clone(selector));
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let parsed = Rc::new(Selector::parse(input)?);
        cache.insert(input.to_string(), Rc::clone(&parsed));
        Ok(parsed)
    })
}

/// Clear the selector cache (mainly for testing).
pub fn clear_cache() {
    SELECTOR_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

pub fn cache_size() -> usize {
    SELECTOR_CACHE.with(|cache| cache.borrow().len())
}
