//! Process-wide runtime initialization
//!
//! The element factories live in a process-global registry filled exactly
//! once, lazily, before the first pipeline is built. Initialization is
//! idempotent and safe to trigger from concurrent build calls.

use crate::engine::element::ElementKind;
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Once, RwLock};

static INIT: Once = Once::new();

static FACTORIES: Lazy<RwLock<HashMap<&'static str, ElementKind>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Initialize the runtime if it has not been initialized yet
///
/// Registers the built-in element factories. Called implicitly by
/// `Pipeline::build`; calling it again is a no-op.
pub fn ensure_initialized() {
    INIT.call_once(|| {
        let mut factories = FACTORIES.write().unwrap();
        for kind in ElementKind::ALL {
            factories.insert(kind.factory_name(), kind);
        }
        debug!("runtime initialized ({} element factories)", factories.len());
    });
}

/// Whether the runtime has been initialized
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

/// Look up an element factory by its registered name
pub(crate) fn factory(name: &str) -> Option<ElementKind> {
    FACTORIES.read().unwrap().get(name).copied()
}
