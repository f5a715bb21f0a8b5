//! Static verification of the dependency graph.
//!
//! [`Container::verify`] walks everything reachable from a set of root
//! identifiers without constructing anything, and reports the first
//! problem a real resolve would hit:
//! - circular dependencies (including binding loops)
//! - targets with no instantiable blueprint
//! - untyped parameters with no value
//!
//! Factories, contextual literals and cached instances are opaque and
//! count as resolvable leaves.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::binding::Concrete;
use crate::blueprint::Param;
use crate::container::Container;
use crate::contextual::ContextualValue;
use crate::error::{
    CircularDependencyError, ContainerError, Result, UnresolvableDependencyError,
};
use crate::identifier::Identifier;

impl Container {
    /// Checks that every root (and everything it needs) could be resolved.
    ///
    /// Explicit parameters are not known ahead of time, so a root whose
    /// untyped parameters have no default or contextual value fails here
    /// even if every caller passes them.
    ///
    /// # Errors
    /// - [`ContainerError::CircularDependency`]: cycle detected
    /// - [`ContainerError::NotInstantiable`]: missing or abstract blueprint
    /// - [`ContainerError::UnresolvableDependency`]: untyped parameter without a value
    #[instrument(skip_all, name = "graph_verification")]
    pub fn verify<I, S>(&self, roots: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Identifier>,
    {
        let mut validator = GraphValidator::new(self);
        let mut count = 0usize;

        for root in roots {
            validator.validate_abstract(None, &root.into())?;
            count += 1;
        }

        debug!(roots = count, types = validator.validated.len(), "Dependency graph verified");
        Ok(())
    }
}

/// Depth-first walk over blueprints.
///
/// `visiting` plus `path` detect cycles; `validated` caches types already
/// proven buildable.
struct GraphValidator<'c> {
    container: &'c Container,
    visiting: HashSet<Identifier>,
    validated: HashSet<Identifier>,
    path: Vec<Identifier>,
}

impl<'c> GraphValidator<'c> {
    fn new(container: &'c Container) -> Self {
        Self {
            container,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Follows contextual overrides and bindings from `abstract_id` down to
    /// a concrete type, as seen by `consumer`.
    fn validate_abstract(&mut self, consumer: Option<&Identifier>, abstract_id: &Identifier) -> Result<()> {
        let mut hops: Vec<Identifier> = Vec::new();
        let mut current = abstract_id.clone();

        loop {
            let contextual = consumer.and_then(|c| self.container.contextual.lookup(c, &current));

            if contextual.is_none() && self.container.instances.contains_key(&current) {
                return Ok(());
            }

            let concrete = match contextual {
                Some(ContextualValue::Value(_) | ContextualValue::Factory(_)) => return Ok(()),
                Some(ContextualValue::Type(id)) => Concrete::Type(id),
                None => self.container.bindings.concrete_for(&current).0,
            };

            match concrete {
                Concrete::Factory(_) => return Ok(()),
                Concrete::Type(next) if next == current => return self.validate_type(&next),
                Concrete::Type(next) => {
                    hops.push(current);
                    if hops.contains(&next) {
                        hops.push(next);
                        return Err(ContainerError::CircularDependency(CircularDependencyError { chain: hops }));
                    }
                    current = next;
                }
            }
        }
    }

    fn validate_type(&mut self, identifier: &Identifier) -> Result<()> {
        if self.validated.contains(identifier) {
            return Ok(());
        }

        if self.visiting.contains(identifier) {
            let start = self.path.iter().position(|k| k == identifier).unwrap_or(0);
            let mut chain = self.path[start..].to_vec();
            chain.push(identifier.clone());
            return Err(ContainerError::CircularDependency(CircularDependencyError { chain }));
        }

        let blueprint = match self.container.blueprint(identifier) {
            Some(blueprint) if blueprint.is_instantiable() => blueprint,
            _ => return Err(self.container.not_instantiable(identifier, self.path.clone())),
        };

        self.visiting.insert(identifier.clone());
        self.path.push(identifier.clone());

        let outcome = self.validate_params(identifier, blueprint.params());

        // Unwound on failure too: an optional parameter upstream may swallow
        // this error and keep walking.
        self.path.pop();
        self.visiting.remove(identifier);

        if outcome.is_ok() {
            self.validated.insert(identifier.clone());
        }
        outcome
    }

    fn validate_params(&mut self, identifier: &Identifier, params: &[Param]) -> Result<()> {
        for param in params {
            let outcome = match param.declared_type() {
                None => self.validate_primitive(identifier, param),
                Some(declared) => self.validate_abstract(Some(identifier), declared),
            };

            if let Err(err) = outcome {
                if err.is_circular() || !param.is_optional() {
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn validate_primitive(&mut self, declaring: &Identifier, param: &Param) -> Result<()> {
        let key = Identifier::variable(param.name());
        match self.container.contextual.lookup(declaring, &key) {
            Some(ContextualValue::Type(id)) => self.validate_abstract(Some(declaring), &id),
            Some(_) => Ok(()),
            None if param.has_default() => Ok(()),
            None => Err(ContainerError::UnresolvableDependency(UnresolvableDependencyError {
                parameter: param.name().clone(),
                declaring: declaring.clone(),
            })),
        }
    }
}
