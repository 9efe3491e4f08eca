use std::collections::HashMap;
use std::sync::Arc;

use crate::policy::{Policy, PolicyBuilder};

/// The policy registry: a case-insensitive name → [`Policy`] map.
///
/// Mutations happen only during setup; once the first evaluation runs the
/// registry must be treated as read-only. Shared across unlimited concurrent
/// evaluations (wrap in `Arc`) without locking.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationSettings {
    policies: HashMap<String, Arc<Policy>>,
}

impl AuthorizationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a policy, replacing any existing entry with the same name
    /// (names compare case-insensitively).
    ///
    /// Panics if `name` is empty: that is a programming error and
    /// configuration is the place to fail fast.
    pub fn add_policy(&mut self, name: impl Into<String>, policy: Policy) {
        let name = name.into();
        assert!(
            !name.trim().is_empty(),
            "policy name must not be empty"
        );
        self.policies.insert(name.to_lowercase(), Arc::new(policy));
    }

    /// Registers a policy assembled by the given builder closure.
    pub fn add_policy_with(
        &mut self,
        name: impl Into<String>,
        configure: impl FnOnce(PolicyBuilder) -> PolicyBuilder,
    ) {
        self.add_policy(name, configure(Policy::builder()).build());
    }

    /// Looks up one policy by name, case-insensitively.
    pub fn policy(&self, name: &str) -> Option<&Arc<Policy>> {
        self.policies.get(&name.to_lowercase())
    }

    /// All registered policies, in no particular order.
    pub fn policies(&self) -> impl Iterator<Item = &Arc<Policy>> {
        self.policies.values()
    }

    /// Resolves the subset of `names` that are registered, silently dropping
    /// unknown names. The evaluator does NOT use this; it fails closed on
    /// unknown names instead.
    pub fn matching_policies<'a, I>(&self, names: I) -> Vec<Arc<Policy>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|name| self.policy(name).cloned())
            .collect()
    }
}
