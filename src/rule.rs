use std::fmt;

use async_graphql_parser::types::{ExecutableDocument, OperationType};
use async_graphql_parser::Pos;
use async_graphql_value::Variables;

use crate::evaluator::{AuthorizationEvaluator, AuthorizationFailure};
use crate::principal::{Principal, ProvideClaimsPrincipal};
use crate::schema::SchemaModel;
use crate::skip::{SkipCondition, SkipContext};
use crate::walker::{resolve_operation, DocumentWalker};

/// One authorization failure attached to the offending AST node.
///
/// The message is the user-visible denial: a header naming the operation kind
/// followed by one line per unmet requirement. The structured
/// [`AuthorizationFailure`] stays available for richer downstream rendering.
#[derive(Debug, Clone)]
pub struct AuthorizationError {
    message: String,
    position: Pos,
    operation_type: OperationType,
    failure: AuthorizationFailure,
}

impl AuthorizationError {
    pub(crate) fn new(
        position: Pos,
        operation_type: OperationType,
        failure: &AuthorizationFailure,
    ) -> Self {
        Self {
            message: denial_message(operation_type, failure),
            position,
            operation_type,
            failure: failure.clone(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> Pos {
        self.position
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn failure(&self) -> &AuthorizationFailure {
        &self.failure
    }

    /// The error-code tag distinguishing authorization denials from other
    /// validation errors in an `errors` response array.
    pub fn code(&self) -> &'static str {
        "authorization"
    }
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn operation_word(operation_type: OperationType) -> &'static str {
    match operation_type {
        OperationType::Query => "query",
        OperationType::Mutation => "mutation",
        OperationType::Subscription => "subscription",
    }
}

fn denial_message(operation_type: OperationType, failure: &AuthorizationFailure) -> String {
    let mut message = format!(
        "You are not authorized to run this {}.",
        operation_word(operation_type)
    );
    for reason in failure.reasons() {
        message.push('\n');
        message.push_str(reason);
    }
    message
}

/// The document-validation entry point: plugs into the host's validation
/// pipeline ahead of execution.
///
/// `validate` returns the accumulated authorization errors for one document;
/// an empty list means execution may proceed. The rule is fully re-entrant
/// (it holds only immutable configuration), so one instance serves unlimited
/// concurrent validation runs.
///
/// Known limitation: a denial message can reveal that a guarded field or type
/// exists at all. Hiding schema elements would require filtering the schema
/// itself, which is out of scope for this layer.
pub struct AuthorizationValidationRule {
    evaluator: AuthorizationEvaluator,
    skip_conditions: Vec<Box<dyn SkipCondition>>,
}

impl AuthorizationValidationRule {
    pub fn new(evaluator: AuthorizationEvaluator) -> Self {
        Self {
            evaluator,
            skip_conditions: Vec::new(),
        }
    }

    /// A rule that short-circuits whole documents matched by any of the given
    /// conditions (e.g. [`crate::skip::IntrospectionSkipCondition`]).
    pub fn with_skip_conditions(
        evaluator: AuthorizationEvaluator,
        skip_conditions: Vec<Box<dyn SkipCondition>>,
    ) -> Self {
        Self {
            evaluator,
            skip_conditions,
        }
    }

    pub fn evaluator(&self) -> &AuthorizationEvaluator {
        &self.evaluator
    }

    /// Walks the executing operation of `document` and evaluates the policies
    /// of every schema element it touches. Dropping the returned future
    /// cancels the pass.
    pub async fn validate(
        &self,
        schema: &SchemaModel,
        document: &ExecutableDocument,
        operation_name: Option<&str>,
        variables: &Variables,
        user_context: &dyn ProvideClaimsPrincipal,
    ) -> Vec<AuthorizationError> {
        let skip_context = SkipContext {
            document,
            operation_name,
            variables,
        };
        for condition in &self.skip_conditions {
            if condition.should_skip(&skip_context).await {
                tracing::debug!("skip condition satisfied; bypassing authorization checks");
                return Vec::new();
            }
        }

        let Some(operation) = resolve_operation(document, operation_name) else {
            // Nothing will execute, so there is nothing to authorize.
            return Vec::new();
        };

        let anonymous;
        let principal = match user_context.principal() {
            Some(principal) => principal,
            None => {
                anonymous = Principal::anonymous();
                &anonymous
            }
        };

        let walker = DocumentWalker::new(
            schema,
            &self.evaluator,
            document,
            variables,
            principal,
            user_context.ambient_data(),
            operation.node.ty,
        );
        walker.run(operation).await
    }
}
