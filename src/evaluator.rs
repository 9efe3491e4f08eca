use std::sync::Arc;

use async_graphql_value::Variables;
use futures::future::{join_all, BoxFuture};

use crate::principal::Principal;
use crate::requirement::{Outcome, PolicyExistsRequirement, Requirement};
use crate::settings::AuthorizationSettings;

/// Read-only state shared by every requirement check of one evaluation.
///
/// Created fresh per [`AuthorizationEvaluator::evaluate`] call, never shared
/// across concurrent document validations. All fields borrow from the caller
/// for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationContext<'a> {
    /// The principal under evaluation; anonymous when the request had none.
    pub principal: &'a Principal,
    /// Host-supplied ambient data, if any.
    pub user_context: Option<&'a serde_json::Value>,
    /// Variable inputs of the executed document.
    pub inputs: Option<&'a Variables>,
}

/// Why an evaluation was denied: the descriptions of every requirement that
/// was not met, in policy registration order then requirement declaration
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationFailure {
    reasons: Vec<String>,
}

impl AuthorizationFailure {
    pub fn unmet(reasons: Vec<String>) -> Self {
        Self { reasons }
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

/// The outcome of one evaluation. `Authorized` is a plain unit; the green
/// path allocates nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    Authorized,
    Denied(AuthorizationFailure),
}

impl AuthorizationResult {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthorizationResult::Authorized)
    }

    pub fn failure(&self) -> Option<&AuthorizationFailure> {
        match self {
            AuthorizationResult::Authorized => None,
            AuthorizationResult::Denied(failure) => Some(failure),
        }
    }
}

/// Orchestrates requirement execution for a set of policy names against one
/// context.
///
/// Every requirement of every named policy runs concurrently (fan-out) and
/// the evaluator awaits all completions (fan-in). Requirements are
/// independent pure checks, so no ordering between them is required, but the
/// collected outcome order stays deterministic for reproducible messages.
///
/// A name that does not resolve in the registry fails CLOSED: it is replaced
/// by a [`PolicyExistsRequirement`], so a typo in a policy name denies the
/// request with a normal denial message rather than widening access or
/// crashing the pipeline.
#[derive(Debug, Clone)]
pub struct AuthorizationEvaluator {
    settings: Arc<AuthorizationSettings>,
}

impl AuthorizationEvaluator {
    pub fn new(settings: Arc<AuthorizationSettings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AuthorizationSettings {
        &self.settings
    }

    /// Evaluates the named policies. An empty name list is an immediate
    /// success: the overwhelming majority of schema elements carry no
    /// policy, and that path constructs nothing.
    pub async fn evaluate(
        &self,
        principal: Option<&Principal>,
        user_context: Option<&serde_json::Value>,
        inputs: Option<&Variables>,
        policy_names: &[String],
    ) -> AuthorizationResult {
        if policy_names.is_empty() {
            return AuthorizationResult::Authorized;
        }

        let anonymous;
        let principal = match principal {
            Some(p) => p,
            None => {
                anonymous = Principal::anonymous();
                &anonymous
            }
        };
        let context = AuthorizationContext {
            principal,
            user_context,
            inputs,
        };

        let mut checks: Vec<BoxFuture<'_, Outcome>> = Vec::new();
        for name in policy_names {
            match self.settings.policy(name) {
                Some(policy) => {
                    for requirement in policy.requirements() {
                        checks.push(requirement.check(&context));
                    }
                }
                None => {
                    tracing::warn!(
                        policy = %name,
                        "referenced policy is not registered; failing closed"
                    );
                    let missing = PolicyExistsRequirement::new(name.as_str());
                    checks.push(Box::pin(async move { missing.check(&context).await }));
                }
            }
        }

        let reasons: Vec<String> = join_all(checks)
            .await
            .into_iter()
            .filter_map(|outcome| match outcome {
                Outcome::Met => None,
                Outcome::NotMet(reason) => Some(reason),
            })
            .collect();

        if reasons.is_empty() {
            AuthorizationResult::Authorized
        } else {
            AuthorizationResult::Denied(AuthorizationFailure::unmet(reasons))
        }
    }
}
