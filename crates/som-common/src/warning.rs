//! Parser warnings with colored terminal output.
//!
//! Provides deduplication to avoid spamming the same warning multiple times.
//! Used by the HTML parser, the CSS parser and the selector matcher to report
//! input they recovered from instead of rejecting.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;
use strum_macros::{Display, EnumString};

/// The subsystem a warning originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Component {
    /// The HTML scanner and tree builder.
    #[strum(serialize = "HTML")]
    Html,
    /// The CSS scanner.
    #[strum(serialize = "CSS")]
    Css,
    /// Selector parsing and matching.
    #[strum(serialize = "Selector")]
    Selector,
}

/// Global set of warnings we've already printed (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// When set, warnings are still deduplicated but never printed.
static QUIET: AtomicBool = AtomicBool::new(false);

/// Warn about recovered input (prints once per unique message)
///
/// # Example
/// ```ignore
/// warn_once(Component::Html, "unmatched closing tag </div>");
/// ```
pub fn warn_once(component: Component, message: &str) {
    let key = format!("[{component}] {message}");
    let should_print = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_print && !QUIET.load(Ordering::Relaxed) {
        eprintln!("{}", format!("[SOM {component}] ⚠ {message}").yellow());
    }
}

/// Silence (or re-enable) warning output for the whole process.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

/// Clear all recorded warnings (call when starting on a new document)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
