use std::sync::Arc;

use futures::future::BoxFuture;

use crate::evaluator::AuthorizationContext;
use crate::requirement::{
    AuthenticatedUserRequirement, ClaimRequirement, DelegatedRequirement, Outcome, Requirement,
};

/// A named unit of authorization: an immutable, ordered set of requirements.
///
/// Built once at configuration time via [`PolicyBuilder`], read-only
/// thereafter, shared across all requests for the process lifetime.
#[derive(Debug, Clone)]
pub struct Policy {
    requirements: Vec<Arc<dyn Requirement>>,
}

impl Policy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// The requirements in declaration order.
    pub fn requirements(&self) -> &[Arc<dyn Requirement>] {
        &self.requirements
    }
}

/// Assembles a [`Policy`] from requirement declarations.
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    requirements: Vec<Arc<dyn Requirement>>,
}

impl PolicyBuilder {
    /// Require a claim of the given type, any value.
    pub fn require_claim(self, claim_type: impl Into<String>) -> Self {
        self.require(Arc::new(ClaimRequirement::new(claim_type)))
    }

    /// Require a claim of the given type whose value is among `allowed_values`.
    pub fn require_claim_values<I, S>(
        self,
        claim_type: impl Into<String>,
        allowed_values: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require(Arc::new(ClaimRequirement::with_allowed_values(
            claim_type,
            allowed_values,
        )))
    }

    /// Require an authenticated principal.
    pub fn require_authenticated_user(self) -> Self {
        self.require(AuthenticatedUserRequirement::shared())
    }

    /// Require a custom async check.
    pub fn require_delegate<F>(self, delegate: F) -> Self
    where
        F: for<'a> Fn(&'a AuthorizationContext<'a>) -> BoxFuture<'a, Outcome>
            + Send
            + Sync
            + 'static,
    {
        self.require(Arc::new(DelegatedRequirement::new(delegate)))
    }

    /// Add a raw requirement.
    pub fn require(mut self, requirement: Arc<dyn Requirement>) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Freeze the requirement list.
    pub fn build(self) -> Policy {
        Policy {
            requirements: self.requirements,
        }
    }
}
