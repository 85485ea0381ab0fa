//! Host-side handlers for annotations, addressed by capability token.
//!
//! The rendering surface never receives host code. It only posts the token
//! back when an annotation is clicked, and the registry routes that to the
//! handler registered for it.

use std::collections::HashMap;

use shared::domain::{Cfi, MarkKind, MarkToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkActivation {
    pub token: MarkToken,
    pub kind: MarkKind,
    pub cfi_range: Cfi,
}

pub type MarkHandler = Box<dyn FnMut(&MarkActivation) + Send>;

struct RegisteredMark {
    kind: MarkKind,
    cfi_range: Cfi,
    handler: MarkHandler,
}

#[derive(Default)]
pub struct MarkRegistry {
    marks: HashMap<MarkToken, RegisteredMark>,
}

impl MarkRegistry {
    pub fn register(&mut self, kind: MarkKind, cfi_range: Cfi, handler: MarkHandler) -> MarkToken {
        let token = MarkToken::generate();
        self.marks.insert(
            token,
            RegisteredMark {
                kind,
                cfi_range,
                handler,
            },
        );
        token
    }

    pub fn unregister(&mut self, token: MarkToken) -> bool {
        self.marks.remove(&token).is_some()
    }

    /// Drops every handler attached to `cfi_range` with the given kind.
    pub fn forget_range(&mut self, cfi_range: &Cfi, kind: MarkKind) -> usize {
        let before = self.marks.len();
        self.marks
            .retain(|_, mark| !(mark.kind == kind && &mark.cfi_range == cfi_range));
        before - self.marks.len()
    }

    /// Invokes the handler for `token`. Returns `false` for unknown tokens.
    pub fn activate(&mut self, token: MarkToken, cfi_range: &Cfi) -> bool {
        let Some(mark) = self.marks.get_mut(&token) else {
            return false;
        };
        let activation = MarkActivation {
            token,
            kind: mark.kind,
            cfi_range: cfi_range.clone(),
        };
        (mark.handler)(&activation);
        true
    }

    /// Drops every handler. Returns how many were registered.
    pub fn clear(&mut self) -> usize {
        let released = self.marks.len();
        self.marks.clear();
        released
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recording() -> (Arc<Mutex<Vec<MarkActivation>>>, MarkHandler) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: MarkHandler = Box::new(move |activation: &MarkActivation| {
            sink.lock().expect("lock").push(activation.clone());
        });
        (seen, handler)
    }

    #[test]
    fn activation_reaches_registered_handler() {
        let mut registry = MarkRegistry::default();
        let (seen, handler) = recording();
        let token = registry.register(MarkKind::Highlight, Cfi::from("r1"), handler);

        assert!(registry.activate(token, &Cfi::from("r1")));
        assert!(registry.activate(token, &Cfi::from("r1")));

        let seen = seen.lock().expect("lock");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, MarkKind::Highlight);
        assert_eq!(seen[0].token, token);
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let mut registry = MarkRegistry::default();
        assert!(!registry.activate(MarkToken::generate(), &Cfi::from("r1")));
    }

    #[test]
    fn forgetting_a_range_is_scoped_to_kind() {
        let mut registry = MarkRegistry::default();
        let (_, first) = recording();
        let (_, second) = recording();
        let (_, third) = recording();
        registry.register(MarkKind::Highlight, Cfi::from("r1"), first);
        registry.register(MarkKind::Underline, Cfi::from("r1"), second);
        registry.register(MarkKind::Highlight, Cfi::from("r2"), third);

        assert_eq!(registry.forget_range(&Cfi::from("r1"), MarkKind::Highlight), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clearing_drops_every_handler() {
        let mut registry = MarkRegistry::default();
        let (seen, handler) = recording();
        let token = registry.register(MarkKind::Mark, Cfi::from("r1"), handler);

        assert_eq!(registry.clear(), 1);
        assert!(registry.is_empty());
        assert!(!registry.activate(token, &Cfi::from("r1")));
        assert!(seen.lock().expect("lock").is_empty());
    }
}
