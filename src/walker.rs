//! Recursive descent over the executing operation's reachable selections.
//!
//! The walk starts at the resolved operation and follows fragment spreads on
//! demand, so selections belonging to sibling operations (and fragments only
//! they use) are never visited. Dispatch over node kinds is a pattern match
//! on the parser's `Selection` union.

use std::collections::HashSet;

use async_graphql_parser::types::{
    Directive, DocumentOperations, ExecutableDocument, Field, OperationDefinition, OperationType,
    Selection, SelectionSet,
};
use async_graphql_parser::{Pos, Positioned};
use async_graphql_value::{ConstValue, Value, Variables};
use futures::future::BoxFuture;

use crate::evaluator::{AuthorizationEvaluator, AuthorizationResult};
use crate::principal::Principal;
use crate::rule::AuthorizationError;
use crate::schema::{named_type, SchemaElement, SchemaModel};

/// Resolves the operation a validation run executes: the requested name, the
/// lone operation of a single-operation document, or the first operation in
/// document order when no name was requested.
pub(crate) fn resolve_operation<'a>(
    document: &'a ExecutableDocument,
    operation_name: Option<&str>,
) -> Option<&'a Positioned<OperationDefinition>> {
    match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), _) => Some(operation),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .iter()
            .find(|(candidate, _)| candidate.as_str() == name)
            .map(|(_, operation)| operation),
        (DocumentOperations::Multiple(operations), None) => operations
            .values()
            .min_by_key(|operation| (operation.pos.line, operation.pos.column)),
    }
}

pub(crate) fn variable_value<'a>(variables: &'a Variables, name: &str) -> Option<&'a ConstValue> {
    variables
        .iter()
        .find(|(candidate, _)| candidate.as_str() == name)
        .map(|(_, value)| value)
}

fn resolve_bool(value: &Value, variables: &Variables) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Variable(name) => match variable_value(variables, name.as_str()) {
            Some(ConstValue::Boolean(b)) => Some(*b),
            _ => None,
        },
        _ => None,
    }
}

/// A node suppressed by `@skip`/`@include` never executes, so it is never
/// authorization-checked either. Unresolvable conditions leave the node
/// included; the executor rejects those documents on its own.
fn directives_allow(directives: &[Positioned<Directive>], variables: &Variables) -> bool {
    for directive in directives {
        let name = directive.node.name.node.as_str();
        if name != "skip" && name != "include" {
            continue;
        }
        let condition = directive
            .node
            .arguments
            .iter()
            .find(|(argument, _)| argument.node.as_str() == "if")
            .and_then(|(_, value)| resolve_bool(&value.node, variables));
        match (name, condition) {
            ("skip", Some(true)) | ("include", Some(false)) => return false,
            _ => {}
        }
    }
    true
}

pub(crate) struct DocumentWalker<'a> {
    schema: &'a SchemaModel,
    evaluator: &'a AuthorizationEvaluator,
    document: &'a ExecutableDocument,
    variables: &'a Variables,
    principal: &'a Principal,
    user_context: Option<&'a serde_json::Value>,
    operation_type: OperationType,
    /// Elements whose policies were already evaluated this run.
    checked: HashSet<SchemaElement>,
    /// Fragments currently being expanded, to break spread cycles.
    active_fragments: HashSet<&'a str>,
    errors: Vec<AuthorizationError>,
}

impl<'a> DocumentWalker<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        schema: &'a SchemaModel,
        evaluator: &'a AuthorizationEvaluator,
        document: &'a ExecutableDocument,
        variables: &'a Variables,
        principal: &'a Principal,
        user_context: Option<&'a serde_json::Value>,
        operation_type: OperationType,
    ) -> Self {
        Self {
            schema,
            evaluator,
            document,
            variables,
            principal,
            user_context,
            operation_type,
            checked: HashSet::new(),
            active_fragments: HashSet::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) async fn run(
        mut self,
        operation: &'a Positioned<OperationDefinition>,
    ) -> Vec<AuthorizationError> {
        // Schema-wide policies first, then the operation's root type.
        let schema = self.schema;
        self.authorize(SchemaElement::Schema, operation.pos).await;
        let Some(root) = schema.root_type(self.operation_type) else {
            return self.errors;
        };
        self.authorize(SchemaElement::named_type(root), operation.pos)
            .await;
        self.walk_selection_set(&operation.node.selection_set, root)
            .await;
        self.errors
    }

    /// Evaluates the element's policies exactly once per run; a denial becomes
    /// one positioned error at the first offending node.
    async fn authorize(&mut self, element: SchemaElement, pos: Pos) {
        if !self.checked.insert(element.clone()) {
            return;
        }
        let policies = self.schema.policies(&element);
        if policies.is_empty() {
            return;
        }
        let result = self
            .evaluator
            .evaluate(
                Some(self.principal),
                self.user_context,
                Some(self.variables),
                policies,
            )
            .await;
        if let AuthorizationResult::Denied(failure) = result {
            tracing::debug!(element = %element, "authorization denied");
            self.errors
                .push(AuthorizationError::new(pos, self.operation_type, &failure));
        }
    }

    fn walk_selection_set<'s>(
        &'s mut self,
        set: &'a Positioned<SelectionSet>,
        parent_type: &'s str,
    ) -> BoxFuture<'s, ()> {
        Box::pin(async move {
            let document = self.document;
            for item in &set.node.items {
                match &item.node {
                    Selection::Field(field) => self.walk_field(field, parent_type).await,
                    Selection::FragmentSpread(spread) => {
                        if !directives_allow(&spread.node.directives, self.variables) {
                            continue;
                        }
                        let name = spread.node.fragment_name.node.as_str();
                        if self.active_fragments.contains(name) {
                            continue;
                        }
                        let Some(fragment) = document
                            .fragments
                            .iter()
                            .find(|(candidate, _)| candidate.as_str() == name)
                            .map(|(_, fragment)| fragment)
                        else {
                            continue;
                        };
                        self.active_fragments.insert(name);
                        let on = fragment.node.type_condition.node.on.node.as_str();
                        self.walk_selection_set(&fragment.node.selection_set, on)
                            .await;
                        self.active_fragments.remove(name);
                    }
                    Selection::InlineFragment(inline) => {
                        if !directives_allow(&inline.node.directives, self.variables) {
                            continue;
                        }
                        let on = inline
                            .node
                            .type_condition
                            .as_ref()
                            .map(|tc| tc.node.on.node.as_str())
                            .unwrap_or(parent_type);
                        self.walk_selection_set(&inline.node.selection_set, on).await;
                    }
                }
            }
        })
    }

    /// A field is checked twice: the declaration itself (access control) and
    /// its return type (data-level control). A field may be publicly
    /// invokable while the returned type is restricted, or vice versa.
    async fn walk_field(&mut self, field: &'a Positioned<Field>, parent_type: &str) {
        let schema = self.schema;
        if !directives_allow(&field.node.directives, self.variables) {
            return;
        }
        let name = field.node.name.node.as_str();
        if name.starts_with("__") {
            return;
        }
        let Some(parent) = schema.object(parent_type) else {
            return;
        };
        let Some(field_def) = parent.field_def(name) else {
            return;
        };

        self.authorize(SchemaElement::field(parent.name(), field_def.name()), field.pos)
            .await;
        let return_type = named_type(field_def.type_ref());
        self.authorize(SchemaElement::named_type(return_type), field.pos)
            .await;

        for (argument_name, argument_value) in &field.node.arguments {
            let Some(argument_def) = field_def.argument_def(argument_name.node.as_str()) else {
                continue;
            };
            self.authorize(
                SchemaElement::argument(parent.name(), field_def.name(), argument_def.name()),
                argument_name.pos,
            )
            .await;
            self.walk_argument_value(
                named_type(argument_def.type_ref()),
                &argument_value.node,
                argument_value.pos,
            )
            .await;
        }

        if !field.node.selection_set.node.items.is_empty() {
            self.walk_selection_set(&field.node.selection_set, return_type)
                .await;
        }
    }

    /// Descends into an argument value: input-object literals check each
    /// supplied input field, variable references hand off to the supplied
    /// variable value, lists recurse element-wise.
    fn walk_argument_value<'s>(
        &'s mut self,
        declared_type: &'s str,
        value: &'a Value,
        pos: Pos,
    ) -> BoxFuture<'s, ()> {
        Box::pin(async move {
            let schema = self.schema;
            match value {
                Value::Object(fields) => {
                    let Some(input) = schema.input_object(declared_type) else {
                        return;
                    };
                    for (key, field_value) in fields {
                        let Some(input_field) = input.field_def(key.as_str()) else {
                            continue;
                        };
                        self.authorize(
                            SchemaElement::input_field(input.name(), input_field.name()),
                            pos,
                        )
                        .await;
                        self.walk_argument_value(
                            named_type(input_field.type_ref()),
                            field_value,
                            pos,
                        )
                        .await;
                    }
                }
                Value::List(items) => {
                    for item in items {
                        self.walk_argument_value(declared_type, item, pos).await;
                    }
                }
                Value::Variable(variable) => {
                    self.walk_variable_usage(declared_type, variable.as_str(), pos)
                        .await;
                }
                _ => {}
            }
        })
    }

    /// A variable used where a complex input type is expected: authorize the
    /// type itself, then every input field present in the supplied value.
    /// Fields absent from the value are never checked; a policy cannot be
    /// violated by data that was not supplied.
    async fn walk_variable_usage(&mut self, declared_type: &str, variable: &str, pos: Pos) {
        let schema = self.schema;
        let variables = self.variables;
        let Some(input) = schema.input_object(declared_type) else {
            return;
        };
        let input_name = input.name();
        self.authorize(SchemaElement::named_type(input_name), pos)
            .await;
        let Some(value) = variable_value(variables, variable) else {
            return;
        };
        self.walk_supplied_value(input_name, value, pos).await;
    }

    fn walk_supplied_value<'s>(
        &'s mut self,
        declared_type: &'s str,
        value: &'a ConstValue,
        pos: Pos,
    ) -> BoxFuture<'s, ()> {
        Box::pin(async move {
            let schema = self.schema;
            match value {
                ConstValue::Object(fields) => {
                    let Some(input) = schema.input_object(declared_type) else {
                        return;
                    };
                    for (key, field_value) in fields {
                        let Some(input_field) = input.field_def(key.as_str()) else {
                            continue;
                        };
                        self.authorize(
                            SchemaElement::input_field(input.name(), input_field.name()),
                            pos,
                        )
                        .await;
                        self.walk_supplied_value(
                            named_type(input_field.type_ref()),
                            field_value,
                            pos,
                        )
                        .await;
                    }
                }
                ConstValue::List(items) => {
                    for item in items {
                        self.walk_supplied_value(declared_type, item, pos).await;
                    }
                }
                _ => {}
            }
        })
    }
}
