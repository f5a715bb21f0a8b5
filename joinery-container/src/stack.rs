//! The build stack: the live chain of types under construction.
//!
//! Entries are pushed on entry to a blueprint build and popped on every
//! exit path through a [`BuildFrame`] guard. The stack feeds contextual
//! lookups (the innermost entry is the current consumer), error chains,
//! and cycle detection.
//!
//! Factories get no build entry, so they do not become contextual
//! consumers. Their abstract identifiers are tracked separately through a
//! [`FactoryCall`] guard to catch a factory that resolves itself.

use std::cell::RefCell;

use tracing::trace;

use crate::error::{CircularDependencyError, ContainerError, Result};
use crate::identifier::Identifier;

#[derive(Debug, Default)]
pub(crate) struct BuildStack {
    entries: Vec<Identifier>,
    factories: Vec<Identifier>,
}

impl BuildStack {
    /// The consumer currently being built, if any.
    pub fn current(&self) -> Option<&Identifier> {
        self.entries.last()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.iter().any(|entry| entry == identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the chain, outermost first.
    pub fn chain(&self) -> Vec<Identifier> {
        self.entries.clone()
    }

    /// The cycle closed by `identifier`, from its first occurrence on.
    fn cycle_to(&self, identifier: &Identifier) -> Vec<Identifier> {
        let start = self
            .entries
            .iter()
            .position(|entry| entry == identifier)
            .unwrap_or(0);

        let mut chain = self.entries[start..].to_vec();
        chain.push(identifier.clone());
        chain
    }
}

/// Holds one slot of the build stack; pops it when dropped.
pub(crate) struct BuildFrame<'s> {
    stack: &'s RefCell<BuildStack>,
    identifier: Identifier,
}

impl<'s> BuildFrame<'s> {
    /// Pushes `identifier`, refusing an identifier already being built.
    pub fn enter(stack: &'s RefCell<BuildStack>, identifier: Identifier) -> Result<Self> {
        let mut entries = stack.borrow_mut();

        if entries.contains(&identifier) {
            let chain = entries.cycle_to(&identifier);
            return Err(ContainerError::CircularDependency(CircularDependencyError { chain }));
        }

        entries.entries.push(identifier.clone());
        trace!(identifier = %identifier, depth = entries.len(), "Entered build");
        drop(entries);

        Ok(Self { stack, identifier })
    }
}

impl Drop for BuildFrame<'_> {
    fn drop(&mut self) {
        let mut entries = self.stack.borrow_mut();
        let popped = entries.entries.pop();
        debug_assert_eq!(popped.as_ref(), Some(&self.identifier), "build stack out of order");
    }
}

/// Marks a factory bound to `identifier` as running; unmarks when dropped.
pub(crate) struct FactoryCall<'s> {
    stack: &'s RefCell<BuildStack>,
}

impl<'s> FactoryCall<'s> {
    /// Refuses to run the factory for `identifier` while it is already running.
    pub fn enter(stack: &'s RefCell<BuildStack>, identifier: Identifier) -> Result<Self> {
        let mut inner = stack.borrow_mut();

        if let Some(start) = inner.factories.iter().position(|entry| *entry == identifier) {
            let mut chain = inner.factories[start..].to_vec();
            chain.push(identifier);
            return Err(ContainerError::CircularDependency(CircularDependencyError { chain }));
        }

        trace!(identifier = %identifier, "Invoking factory binding");
        inner.factories.push(identifier);
        drop(inner);

        Ok(Self { stack })
    }
}

impl Drop for FactoryCall<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().factories.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_push_and_pop() {
        let stack = RefCell::new(BuildStack::default());
        {
            let _outer = BuildFrame::enter(&stack, "Controller".into()).unwrap();
            {
                let _inner = BuildFrame::enter(&stack, "Repository".into()).unwrap();
                assert_eq!(stack.borrow().len(), 2);
                assert_eq!(stack.borrow().current().unwrap(), "Repository");
            }
            assert_eq!(stack.borrow().current().unwrap(), "Controller");
        }
        assert!(stack.borrow().is_empty());
    }

    #[test]
    fn reentry_is_a_cycle() {
        let stack = RefCell::new(BuildStack::default());
        let _a = BuildFrame::enter(&stack, "A".into()).unwrap();
        let _b = BuildFrame::enter(&stack, "B".into()).unwrap();

        match BuildFrame::enter(&stack, "A".into()) {
            Err(ContainerError::CircularDependency(err)) => {
                let names: Vec<&str> = err.chain.iter().map(Identifier::as_str).collect();
                assert_eq!(names, vec!["A", "B", "A"]);
            }
            other => panic!("Expected CircularDependency, got: {:?}", other.map(|_| ())),
        }
        assert_eq!(stack.borrow().len(), 2);
    }

    #[test]
    fn factory_reentry_is_a_cycle() {
        let stack = RefCell::new(BuildStack::default());
        {
            let _a = FactoryCall::enter(&stack, "A".into()).unwrap();
            let _b = FactoryCall::enter(&stack, "B".into()).unwrap();

            match FactoryCall::enter(&stack, "A".into()) {
                Err(ContainerError::CircularDependency(err)) => {
                    let names: Vec<&str> = err.chain.iter().map(Identifier::as_str).collect();
                    assert_eq!(names, vec!["A", "B", "A"]);
                }
                other => panic!("Expected CircularDependency, got: {:?}", other.map(|_| ())),
            }
            assert!(stack.borrow().is_empty());
        }
        assert!(FactoryCall::enter(&stack, "A".into()).is_ok());
    }

    #[test]
    fn frame_pops_on_early_return() {
        fn failing(stack: &RefCell<BuildStack>) -> Result<()> {
            let _frame = BuildFrame::enter(stack, "Service".into())?;
            Err(ContainerError::construction("Service", "boom"))
        }

        let stack = RefCell::new(BuildStack::default());
        assert!(failing(&stack).is_err());
        assert!(stack.borrow().is_empty());
    }
}
