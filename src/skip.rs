use std::collections::HashSet;

use async_graphql_parser::types::{ExecutableDocument, OperationType, Selection, SelectionSet};
use async_graphql_value::Variables;
use async_trait::async_trait;

use crate::walker::resolve_operation;

/// Everything a whole-document skip predicate may inspect.
pub struct SkipContext<'a> {
    pub document: &'a ExecutableDocument,
    pub operation_name: Option<&'a str>,
    pub variables: &'a Variables,
}

/// A whole-document predicate that, when satisfied, bypasses all
/// authorization checking for that document before any node is visited.
#[async_trait]
pub trait SkipCondition: Send + Sync {
    async fn should_skip(&self, context: &SkipContext<'_>) -> bool;
}

/// Skips authorization for introspection queries: query operations whose
/// selections contain only `__schema`, `__type` and `__typename` top-level
/// fields (reached directly or through fragments).
#[derive(Debug, Clone, Default)]
pub struct IntrospectionSkipCondition;

impl IntrospectionSkipCondition {
    fn is_introspection_field(name: &str) -> bool {
        matches!(name, "__schema" | "__type" | "__typename")
    }

    fn contains_only_introspection_fields(
        set: &SelectionSet,
        document: &ExecutableDocument,
        expanding: &mut HashSet<String>,
    ) -> bool {
        if set.items.is_empty() {
            // invalid document, better to not skip
            return false;
        }

        for item in &set.items {
            match &item.node {
                Selection::Field(field) => {
                    if !Self::is_introspection_field(field.node.name.node.as_str()) {
                        return false;
                    }
                }
                Selection::InlineFragment(inline) => {
                    if !Self::contains_only_introspection_fields(
                        &inline.node.selection_set.node,
                        document,
                        expanding,
                    ) {
                        return false;
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    if !expanding.insert(name.to_string()) {
                        continue;
                    }
                    let Some(fragment) = document
                        .fragments
                        .iter()
                        .find(|(candidate, _)| candidate.as_str() == name)
                        .map(|(_, fragment)| fragment)
                    else {
                        return false;
                    };
                    if !Self::contains_only_introspection_fields(
                        &fragment.node.selection_set.node,
                        document,
                        expanding,
                    ) {
                        return false;
                    }
                }
            }
        }

        true
    }
}

#[async_trait]
impl SkipCondition for IntrospectionSkipCondition {
    async fn should_skip(&self, context: &SkipContext<'_>) -> bool {
        let Some(operation) = resolve_operation(context.document, context.operation_name) else {
            return false;
        };
        if operation.node.ty != OperationType::Query {
            return false;
        }
        Self::contains_only_introspection_fields(
            &operation.node.selection_set.node,
            context.document,
            &mut HashSet::new(),
        )
    }
}
