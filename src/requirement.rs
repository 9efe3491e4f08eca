use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::evaluator::AuthorizationContext;

/// The result of a single requirement check.
///
/// "Not met" is a normal outcome, not an error: the payload is the
/// human-readable description that ends up as one line of the denial message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Met,
    NotMet(String),
}

impl Outcome {
    pub fn not_met(reason: impl Into<String>) -> Self {
        Outcome::NotMet(reason.into())
    }

    pub fn is_met(&self) -> bool {
        matches!(self, Outcome::Met)
    }
}

/// One pass/fail authorization check. Requirements are stateless beyond
/// construction and are shared across concurrent evaluations.
///
/// Implementations may suspend (e.g. a remote claims lookup); built-in claim
/// and authentication checks are CPU-only and return immediately.
#[async_trait]
pub trait Requirement: Send + Sync + fmt::Debug {
    async fn check(&self, context: &AuthorizationContext<'_>) -> Outcome;
}

/// Requires a claim of the given type to be present and, when allowed values
/// are specified, its value to be among them.
#[derive(Debug, Clone)]
pub struct ClaimRequirement {
    claim_type: String,
    allowed_values: Vec<String>,
    display_values: Option<Vec<String>>,
}

impl ClaimRequirement {
    pub fn new(claim_type: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            allowed_values: Vec::new(),
            display_values: None,
        }
    }

    pub fn with_allowed_values<I, S>(claim_type: impl Into<String>, allowed_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            claim_type: claim_type.into(),
            allowed_values: allowed_values.into_iter().map(Into::into).collect(),
            display_values: None,
        }
    }

    /// Values shown in the denial message instead of the allowed values.
    pub fn display_values<I, S>(mut self, display_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.display_values = Some(display_values.into_iter().map(Into::into).collect());
        self
    }

    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }

    fn describe(&self) -> String {
        if self.allowed_values.is_empty() {
            format!("Required claim '{}' is not present.", self.claim_type)
        } else {
            let shown = self.display_values.as_ref().unwrap_or(&self.allowed_values);
            format!(
                "Required claim '{}' with any value of '{}' is not present.",
                self.claim_type,
                shown.join(", ")
            )
        }
    }
}

#[async_trait]
impl Requirement for ClaimRequirement {
    async fn check(&self, context: &AuthorizationContext<'_>) -> Outcome {
        let found = if self.allowed_values.is_empty() {
            context.principal.has_claim(&self.claim_type)
        } else {
            context
                .principal
                .has_claim_value(&self.claim_type, &self.allowed_values)
        };

        if found {
            Outcome::Met
        } else {
            Outcome::not_met(self.describe())
        }
    }
}

/// Requires the principal to be authenticated. Stateless; use [`shared`] to
/// reuse one instance across all policies.
///
/// [`shared`]: AuthenticatedUserRequirement::shared
#[derive(Debug, Clone, Default)]
pub struct AuthenticatedUserRequirement;

impl AuthenticatedUserRequirement {
    pub fn shared() -> Arc<AuthenticatedUserRequirement> {
        static SHARED: OnceLock<Arc<AuthenticatedUserRequirement>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(AuthenticatedUserRequirement)))
    }
}

#[async_trait]
impl Requirement for AuthenticatedUserRequirement {
    async fn check(&self, context: &AuthorizationContext<'_>) -> Outcome {
        if context.principal.is_authenticated() {
            Outcome::Met
        } else {
            Outcome::not_met("An authenticated user is required.")
        }
    }
}

type Delegate =
    Box<dyn for<'a> Fn(&'a AuthorizationContext<'a>) -> BoxFuture<'a, Outcome> + Send + Sync>;

/// Wraps an async closure, enabling custom checks without a new type.
pub struct DelegatedRequirement {
    delegate: Delegate,
}

impl DelegatedRequirement {
    pub fn new<F>(delegate: F) -> Self
    where
        F: for<'a> Fn(&'a AuthorizationContext<'a>) -> BoxFuture<'a, Outcome>
            + Send
            + Sync
            + 'static,
    {
        Self {
            delegate: Box::new(delegate),
        }
    }
}

impl fmt::Debug for DelegatedRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedRequirement").finish_non_exhaustive()
    }
}

#[async_trait]
impl Requirement for DelegatedRequirement {
    async fn check(&self, context: &AuthorizationContext<'_>) -> Outcome {
        (self.delegate)(context).await
    }
}

/// Stands in for a policy name that did not resolve in the registry at
/// evaluation time. Never met, so a missing-policy reference degrades into a
/// normal denial instead of a server error.
#[derive(Debug, Clone)]
pub struct PolicyExistsRequirement {
    policy_name: String,
}

impl PolicyExistsRequirement {
    pub fn new(policy_name: impl Into<String>) -> Self {
        Self {
            policy_name: policy_name.into(),
        }
    }

    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }
}

#[async_trait]
impl Requirement for PolicyExistsRequirement {
    async fn check(&self, _context: &AuthorizationContext<'_>) -> Outcome {
        Outcome::not_met(format!(
            "Required policy '{}' is not present.",
            self.policy_name
        ))
    }
}
