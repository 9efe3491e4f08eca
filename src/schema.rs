//! The schema metadata bridge: a minimal type index plus per-element policy
//! attachments.
//!
//! The host constructs a [`SchemaModel`] at startup, mirroring its real
//! schema, and attaches policy names to elements with the `authorize_*`
//! builder methods. The validation rule consumes the model read-only: type
//! resolution for the walk, and [`PolicyMetadata`] queries per element.

use std::collections::HashMap;
use std::fmt;

use async_graphql_parser::types::OperationType;

use crate::errors::AuthzError;

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Identifies one schema element that policies can attach to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaElement {
    /// The schema root itself (schema-wide policies).
    Schema,
    /// An object or input object type.
    Type(String),
    /// A field of an object type.
    Field { type_name: String, field: String },
    /// An argument of a field.
    Argument {
        type_name: String,
        field: String,
        argument: String,
    },
    /// A field of an input object type.
    InputField { type_name: String, field: String },
}

impl SchemaElement {
    pub fn named_type(name: impl Into<String>) -> Self {
        SchemaElement::Type(name.into())
    }

    pub fn field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        SchemaElement::Field {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    pub fn argument(
        type_name: impl Into<String>,
        field: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        SchemaElement::Argument {
            type_name: type_name.into(),
            field: field.into(),
            argument: argument.into(),
        }
    }

    pub fn input_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        SchemaElement::InputField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for SchemaElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaElement::Schema => write!(f, "schema"),
            SchemaElement::Type(name) => write!(f, "type `{name}`"),
            SchemaElement::Field { type_name, field } => {
                write!(f, "field `{type_name}.{field}`")
            }
            SchemaElement::Argument {
                type_name,
                field,
                argument,
            } => write!(f, "argument `{type_name}.{field}({argument}:)`"),
            SchemaElement::InputField { type_name, field } => {
                write!(f, "input field `{type_name}.{field}`")
            }
        }
    }
}

/// Read side of the policy metadata attached to schema elements.
pub trait PolicyMetadata {
    /// Ordered-unique policy names attached to the element.
    fn policies(&self, element: &SchemaElement) -> &[String];

    /// Was authorization ever declared for the element?
    fn requires_authorization(&self, element: &SchemaElement) -> bool {
        !self.policies(element).is_empty()
    }
}

/// Strips list and non-null wrappers from a type reference: `[Post!]!` → `Post`.
pub fn named_type(type_ref: &str) -> &str {
    type_ref.trim_matches(|c| c == '[' || c == ']' || c == '!' || c == ' ')
}

#[derive(Debug, Clone)]
pub struct ArgumentDef {
    name: String,
    ty: String,
}

impl ArgumentDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full type reference, wrappers included.
    pub fn type_ref(&self) -> &str {
        &self.ty
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    ty: String,
    arguments: Vec<ArgumentDef>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            arguments: Vec::new(),
        }
    }

    pub fn argument(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.arguments.push(ArgumentDef {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> &str {
        &self.ty
    }

    pub fn arguments(&self) -> &[ArgumentDef] {
        &self.arguments
    }

    pub fn argument_def(&self, name: &str) -> Option<&ArgumentDef> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    name: String,
    fields: Vec<FieldDef>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct InputFieldDef {
    name: String,
    ty: String,
}

impl InputFieldDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> &str {
        &self.ty
    }
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    name: String,
    fields: Vec<InputFieldDef>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(InputFieldDef {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_def(&self, name: &str) -> Option<&InputFieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
enum TypeDef {
    Object(ObjectType),
    InputObject(InputObjectType),
    Scalar,
}

/// The compiled, immutable schema index the validation rule walks against.
///
/// Built once at configuration time; shared across unlimited concurrent
/// validations without locking.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: HashMap<String, TypeDef>,
    policies: HashMap<SchemaElement, Vec<String>>,
}

impl SchemaModel {
    pub fn builder(query_type: impl Into<String>) -> SchemaModelBuilder {
        SchemaModelBuilder::new(query_type)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        match self.types.get(name) {
            Some(TypeDef::Object(object)) => Some(object),
            _ => None,
        }
    }

    pub fn input_object(&self, name: &str) -> Option<&InputObjectType> {
        match self.types.get(name) {
            Some(TypeDef::InputObject(input)) => Some(input),
            _ => None,
        }
    }

    /// The root type name for the given operation kind, if declared.
    pub fn root_type(&self, operation: OperationType) -> Option<&str> {
        match operation {
            OperationType::Query => Some(self.query_type.as_str()),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }
    }

    pub fn policies(&self, element: &SchemaElement) -> &[String] {
        self.policies.get(element).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn requires_authorization(&self, element: &SchemaElement) -> bool {
        !self.policies(element).is_empty()
    }
}

impl PolicyMetadata for SchemaModel {
    fn policies(&self, element: &SchemaElement) -> &[String] {
        SchemaModel::policies(self, element)
    }
}

/// Assembles and validates a [`SchemaModel`].
///
/// `build()` is the fail-fast point for configuration mistakes: dangling type
/// references, duplicate type names, and policies attached to elements that
/// do not exist all surface here, never at request time.
#[derive(Debug)]
pub struct SchemaModelBuilder {
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    objects: Vec<ObjectType>,
    input_objects: Vec<InputObjectType>,
    scalars: Vec<String>,
    attachments: Vec<(SchemaElement, String)>,
}

impl SchemaModelBuilder {
    pub fn new(query_type: impl Into<String>) -> Self {
        Self {
            query_type: query_type.into(),
            mutation_type: None,
            subscription_type: None,
            objects: Vec::new(),
            input_objects: Vec::new(),
            scalars: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.subscription_type = Some(name.into());
        self
    }

    pub fn object(mut self, object: ObjectType) -> Self {
        self.objects.push(object);
        self
    }

    pub fn input_object(mut self, input: InputObjectType) -> Self {
        self.input_objects.push(input);
        self
    }

    pub fn scalar(mut self, name: impl Into<String>) -> Self {
        self.scalars.push(name.into());
        self
    }

    /// Attaches a policy name to an element. Repeated names on the same
    /// element are kept once, in first-seen order.
    pub fn authorize(mut self, element: SchemaElement, policy: impl Into<String>) -> Self {
        self.attachments.push((element, policy.into()));
        self
    }

    pub fn authorize_schema(self, policy: impl Into<String>) -> Self {
        self.authorize(SchemaElement::Schema, policy)
    }

    pub fn authorize_type(self, type_name: impl Into<String>, policy: impl Into<String>) -> Self {
        self.authorize(SchemaElement::named_type(type_name), policy)
    }

    pub fn authorize_field(
        self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        policy: impl Into<String>,
    ) -> Self {
        self.authorize(SchemaElement::field(type_name, field), policy)
    }

    pub fn authorize_argument(
        self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        argument: impl Into<String>,
        policy: impl Into<String>,
    ) -> Self {
        self.authorize(SchemaElement::argument(type_name, field, argument), policy)
    }

    pub fn authorize_input_field(
        self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        policy: impl Into<String>,
    ) -> Self {
        self.authorize(SchemaElement::input_field(type_name, field), policy)
    }

    pub fn build(self) -> Result<SchemaModel, AuthzError> {
        let mut types: HashMap<String, TypeDef> = HashMap::new();
        for scalar in BUILTIN_SCALARS {
            types.insert(scalar.to_string(), TypeDef::Scalar);
        }
        for scalar in self.scalars {
            if types.insert(scalar.clone(), TypeDef::Scalar).is_some()
                && !BUILTIN_SCALARS.contains(&scalar.as_str())
            {
                return Err(AuthzError::DuplicateType(scalar));
            }
        }
        for object in self.objects {
            let name = object.name.clone();
            if types.insert(name.clone(), TypeDef::Object(object)).is_some() {
                return Err(AuthzError::DuplicateType(name));
            }
        }
        for input in self.input_objects {
            let name = input.name.clone();
            if types
                .insert(name.clone(), TypeDef::InputObject(input))
                .is_some()
            {
                return Err(AuthzError::DuplicateType(name));
            }
        }

        // Every type reference must resolve before the walker ever sees it.
        for def in types.values() {
            match def {
                TypeDef::Object(object) => {
                    for field in &object.fields {
                        let referenced = named_type(&field.ty);
                        if !types.contains_key(referenced) {
                            return Err(AuthzError::UndefinedType {
                                referenced: referenced.to_string(),
                                referrer: SchemaElement::field(&object.name, &field.name)
                                    .to_string(),
                            });
                        }
                        for argument in &field.arguments {
                            let referenced = named_type(&argument.ty);
                            if !types.contains_key(referenced) {
                                return Err(AuthzError::UndefinedType {
                                    referenced: referenced.to_string(),
                                    referrer: SchemaElement::argument(
                                        &object.name,
                                        &field.name,
                                        &argument.name,
                                    )
                                    .to_string(),
                                });
                            }
                        }
                    }
                }
                TypeDef::InputObject(input) => {
                    for field in &input.fields {
                        let referenced = named_type(&field.ty);
                        if !types.contains_key(referenced) {
                            return Err(AuthzError::UndefinedType {
                                referenced: referenced.to_string(),
                                referrer: SchemaElement::input_field(&input.name, &field.name)
                                    .to_string(),
                            });
                        }
                    }
                }
                TypeDef::Scalar => {}
            }
        }

        for (operation, root) in [
            ("query", Some(self.query_type.as_str())),
            ("mutation", self.mutation_type.as_deref()),
            ("subscription", self.subscription_type.as_deref()),
        ] {
            if let Some(type_name) = root {
                if !matches!(types.get(type_name), Some(TypeDef::Object(_))) {
                    return Err(AuthzError::MissingRootType {
                        operation,
                        type_name: type_name.to_string(),
                    });
                }
            }
        }

        let mut policies: HashMap<SchemaElement, Vec<String>> = HashMap::new();
        for (element, policy) in self.attachments {
            let known = match &element {
                SchemaElement::Schema => true,
                SchemaElement::Type(name) => types.contains_key(name),
                SchemaElement::Field { type_name, field } => types
                    .get(type_name)
                    .and_then(|def| match def {
                        TypeDef::Object(object) => object.field_def(field),
                        _ => None,
                    })
                    .is_some(),
                SchemaElement::Argument {
                    type_name,
                    field,
                    argument,
                } => types
                    .get(type_name)
                    .and_then(|def| match def {
                        TypeDef::Object(object) => object.field_def(field),
                        _ => None,
                    })
                    .and_then(|f| f.argument_def(argument))
                    .is_some(),
                SchemaElement::InputField { type_name, field } => types
                    .get(type_name)
                    .and_then(|def| match def {
                        TypeDef::InputObject(input) => input.field_def(field),
                        _ => None,
                    })
                    .is_some(),
            };
            if !known {
                return Err(AuthzError::UnknownElement {
                    element: element.to_string(),
                    policy,
                });
            }
            let names = policies.entry(element).or_default();
            if !names.contains(&policy) {
                names.push(policy);
            }
        }

        tracing::info!(
            types = types.len() - BUILTIN_SCALARS.len(),
            guarded_elements = policies.len(),
            "Compiled schema authorization metadata"
        );

        Ok(SchemaModel {
            query_type: self.query_type,
            mutation_type: self.mutation_type,
            subscription_type: self.subscription_type,
            types,
            policies,
        })
    }
}
