// src/core/overlay.rs

//! Environment overlay: `.env` entries beneath the real variables.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::system::environment::{Arguments, Environment, ExitCode, Variables};
use crate::system::stream::{Readable, Writable};

/// Decorates an environment so that its variables are read once and merged
/// with overlay entries.
///
/// Real variables win: an overlay entry is only added when the inner
/// environment has no variable of that name. The merge happens on the first
/// call to `variables()`; every later call returns the same mapping without
/// touching the inner environment. All other accessors pass through.
pub struct OverlayEnvironment {
    inner: Rc<dyn Environment>,
    overlay: BTreeMap<String, String>,
    variables: OnceCell<Variables>,
}

impl fmt::Debug for OverlayEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayEnvironment")
            .field("overlay", &self.overlay)
            .field("variables", &self.variables.get())
            .finish_non_exhaustive()
    }
}

impl OverlayEnvironment {
    /// Wraps `inner`. Its variables are not read until first requested.
    pub fn new(inner: Rc<dyn Environment>, overlay: BTreeMap<String, String>) -> Self {
        Self {
            inner,
            overlay,
            variables: OnceCell::new(),
        }
    }
}

/// Merges `overlay` beneath `real`.
///
/// When every overlay key already exists in `real`, the real mapping itself is
/// returned, so its identity is preserved.
pub fn merge(real: Variables, overlay: &BTreeMap<String, String>) -> Variables {
    let missing: Vec<(&String, &String)> = overlay
        .iter()
        .filter(|(key, _)| !real.contains_key(*key))
        .collect();

    if missing.is_empty() {
        return real;
    }

    let mut merged = (*real).clone();
    for (key, value) in missing {
        merged.insert(key.clone(), value.clone());
    }
    Rc::new(merged)
}

impl Environment for OverlayEnvironment {
    fn interactive(&self) -> bool {
        self.inner.interactive()
    }

    fn input(&self) -> Rc<dyn Readable> {
        self.inner.input()
    }

    fn output(&self) -> Rc<dyn Writable> {
        self.inner.output()
    }

    fn error(&self) -> Rc<dyn Writable> {
        self.inner.error()
    }

    fn arguments(&self) -> Arguments {
        self.inner.arguments()
    }

    fn variables(&self) -> Variables {
        let variables = self.variables.get_or_init(|| {
            log::trace!("Merging {} overlay entries into variables.", self.overlay.len());
            merge(self.inner.variables(), &self.overlay)
        });
        Rc::clone(variables)
    }

    fn exit(&self, code: ExitCode) {
        self.inner.exit(code);
    }

    fn exit_code(&self) -> ExitCode {
        self.inner.exit_code()
    }

    fn working_directory(&self) -> PathBuf {
        self.inner.working_directory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::environment::InMemoryEnvironment;

    fn entries(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_variables_are_read_once_and_cached() {
        let inner = Rc::new(InMemoryEnvironment::new().with_variables([("FOO", "bar")]));
        let env = OverlayEnvironment::new(inner.clone(), BTreeMap::new());

        let first = env.variables();
        let second = env.variables();

        assert!(Rc::ptr_eq(&first, &second));
        assert!(Rc::ptr_eq(&first, &inner.variables()));
        // One call from the overlay, one from the assertion above.
        assert_eq!(inner.variables_calls(), 2);
    }

    #[test]
    fn test_variables_are_not_read_eagerly() {
        let inner = Rc::new(InMemoryEnvironment::new());
        let _env = OverlayEnvironment::new(inner.clone(), entries(&[("FOO", "bar")]));

        assert_eq!(inner.variables_calls(), 0);
    }

    #[test]
    fn test_real_variables_win_over_overlay() {
        let inner = Rc::new(
            InMemoryEnvironment::new().with_variables([("FOO", "bar"), ("BAZ", "bar")]),
        );
        let env = OverlayEnvironment::new(inner.clone(), entries(&[("FOO", "baz"), ("BAR", "foo")]));

        let variables = env.variables();

        assert_eq!(variables.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(variables.get("BAR").map(String::as_str), Some("foo"));
        assert_eq!(variables.get("BAZ").map(String::as_str), Some("bar"));
        assert_eq!(variables.len(), 3);
        assert!(Rc::ptr_eq(&variables, &env.variables()));
        assert_eq!(inner.variables_calls(), 1);
    }

    #[test]
    fn test_merge_keeps_identity_when_nothing_to_add() {
        let real: Variables = Rc::new(entries(&[("FOO", "bar")]));
        let merged = merge(Rc::clone(&real), &entries(&[("FOO", "other")]));
        assert!(Rc::ptr_eq(&real, &merged));
    }

    #[test]
    fn test_merge_matches_union_with_real_precedence() {
        let real: Variables = Rc::new(entries(&[("A", "1"), ("B", "2")]));
        let overlay = entries(&[("B", "overlay"), ("C", "3")]);

        let merged = merge(real, &overlay);

        assert_eq!(*merged, entries(&[("A", "1"), ("B", "2"), ("C", "3")]));
        assert!(!merged.contains_key("D"));
    }

    #[test]
    fn test_other_accessors_pass_through() {
        let inner = Rc::new(
            InMemoryEnvironment::new()
                .with_arguments(["foo", "bar"])
                .with_interactive(true)
                .with_working_directory("/working/directory/"),
        );
        let env = OverlayEnvironment::new(inner.clone(), BTreeMap::new());

        assert!(env.interactive());
        assert!(Rc::ptr_eq(&env.output(), &inner.output()));
        assert!(Rc::ptr_eq(&env.error(), &inner.error()));
        assert!(Rc::ptr_eq(&env.input(), &inner.input()));
        assert!(Rc::ptr_eq(&env.arguments(), &inner.arguments()));
        assert_eq!(env.working_directory(), PathBuf::from("/working/directory/"));

        env.exit(ExitCode::new(3));
        assert_eq!(inner.exit_code(), ExitCode::new(3));
        assert_eq!(env.exit_code(), ExitCode::new(3));
    }
}
