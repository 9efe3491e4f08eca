use std::sync::Arc;

use async_graphql_parser::parse_query;
use async_graphql_value::Variables;
use graphql_authz::{
    AuthorizationError, AuthorizationEvaluator, AuthorizationSettings, AuthorizationValidationRule,
    Claim, PolicyBuilder, Principal, ProvideClaimsPrincipal, SchemaModel, SkipCondition,
};

/// A user context with no principal at all.
pub struct NoPrincipal;

impl ProvideClaimsPrincipal for NoPrincipal {
    fn principal(&self) -> Option<&Principal> {
        None
    }
}

/// An unauthenticated principal carrying the given (type, value) claims.
pub fn principal_with(claims: &[(&str, &str)]) -> Principal {
    Principal::with_claims(
        claims
            .iter()
            .map(|(claim_type, value)| Claim::new(*claim_type, *value))
            .collect(),
    )
}

/// Builder for one validation run: schema, registered policies, query,
/// variables and principal.
pub struct ValidationScenario {
    schema: SchemaModel,
    settings: AuthorizationSettings,
    skip_conditions: Vec<Box<dyn SkipCondition>>,
    query: String,
    operation_name: Option<String>,
    variables: Variables,
    principal: Option<Principal>,
}

impl ValidationScenario {
    pub fn new(schema: SchemaModel, query: &str) -> Self {
        Self {
            schema,
            settings: AuthorizationSettings::new(),
            skip_conditions: Vec::new(),
            query: query.to_string(),
            operation_name: None,
            variables: Variables::default(),
            principal: None,
        }
    }

    pub fn policy(
        mut self,
        name: &str,
        configure: impl FnOnce(PolicyBuilder) -> PolicyBuilder,
    ) -> Self {
        self.settings.add_policy_with(name, configure);
        self
    }

    pub fn operation_name(mut self, name: &str) -> Self {
        self.operation_name = Some(name.to_string());
        self
    }

    pub fn variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = Variables::from_json(variables);
        self
    }

    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn skip_condition(mut self, condition: Box<dyn SkipCondition>) -> Self {
        self.skip_conditions.push(condition);
        self
    }

    pub async fn run(self) -> Vec<AuthorizationError> {
        let document = parse_query(&self.query).expect("query must parse");
        let evaluator = AuthorizationEvaluator::new(Arc::new(self.settings));
        let rule = AuthorizationValidationRule::with_skip_conditions(evaluator, self.skip_conditions);
        match &self.principal {
            Some(principal) => {
                rule.validate(
                    &self.schema,
                    &document,
                    self.operation_name.as_deref(),
                    &self.variables,
                    principal,
                )
                .await
            }
            None => {
                rule.validate(
                    &self.schema,
                    &document,
                    self.operation_name.as_deref(),
                    &self.variables,
                    &NoPrincipal,
                )
                .await
            }
        }
    }

    pub async fn should_pass(self) {
        let errors = self.run().await;
        let messages: Vec<&str> = errors.iter().map(|e| e.message()).collect();
        assert!(
            errors.is_empty(),
            "expected no authorization errors, got: {messages:?}"
        );
    }

    pub async fn should_fail(self) -> Vec<AuthorizationError> {
        let errors = self.run().await;
        assert!(
            !errors.is_empty(),
            "expected authorization errors though there were none"
        );
        errors
    }
}
