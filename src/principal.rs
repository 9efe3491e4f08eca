use serde::{Deserialize, Serialize};

/// A single (type, value) attribute of a principal, e.g. `role = "Admin"`.
///
/// Claim types compare case-insensitively; claim values compare exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// The identity a request is evaluated against: a set of claims plus an
/// authenticated flag.
///
/// A request without an identity is represented by [`Principal::anonymous`]
/// (zero claims, not authenticated), never by the absence of a principal
/// during requirement checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Principal {
    claims: Vec<Claim>,
    authenticated: bool,
}

impl Principal {
    /// No claims, not authenticated.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Carries claims but did not authenticate (e.g. a bare attribute bag).
    pub fn with_claims(claims: Vec<Claim>) -> Self {
        Self {
            claims,
            authenticated: false,
        }
    }

    /// An authenticated identity carrying the given claims.
    pub fn authenticated(claims: Vec<Claim>) -> Self {
        Self {
            claims,
            authenticated: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// True if at least one claim of the given type is present.
    pub fn has_claim(&self, claim_type: &str) -> bool {
        self.claims
            .iter()
            .any(|c| c.claim_type.eq_ignore_ascii_case(claim_type))
    }

    /// True if a claim of the given type exists whose value is among `allowed`.
    pub fn has_claim_value(&self, claim_type: &str, allowed: &[String]) -> bool {
        self.claims.iter().any(|c| {
            c.claim_type.eq_ignore_ascii_case(claim_type) && allowed.iter().any(|v| *v == c.value)
        })
    }
}

/// Extracts the claims-bearing principal from whatever user context the host
/// attached to a validation run.
///
/// Hosts implement this on their own user-context type; [`Principal`] itself
/// implements it for callers that have nothing else to carry.
pub trait ProvideClaimsPrincipal: Send + Sync {
    /// The principal for this request, if any.
    fn principal(&self) -> Option<&Principal>;

    /// Arbitrary host data made visible to delegated requirements.
    fn ambient_data(&self) -> Option<&serde_json::Value> {
        None
    }
}

impl ProvideClaimsPrincipal for Principal {
    fn principal(&self) -> Option<&Principal> {
        Some(self)
    }
}
