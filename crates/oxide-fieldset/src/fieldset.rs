//! Fieldsets: ordered, named collections of fields and nested fieldsets.
//!
//! A [`Fieldset`] is a template. [`Fieldset::bind`] produces a
//! [`BoundFieldset`] holding bound clones of every field, and
//! [`BoundFieldset::extract`] walks the bound tree once, producing the typed
//! data together with every conversion and validation error.
//!
//! # Extraction
//!
//! For each level of the tree:
//!
//! 1. Nested fieldsets are extracted first. Their data is stored under the
//!    fieldset name and their errors are appended unchanged.
//! 2. Every field not in display mode is extracted, converted with
//!    `to_field` (a `Null` result falls back to the field's missing value),
//!    validated, and prepared. A failure is recorded and the field keeps its
//!    missing value (conversion failure) or its converted value (validation
//!    failure). The value is stored under the field's local name.
//! 3. When the level produced no errors, the fieldset validators run against
//!    the assembled data.
//!
//! No field is skipped because another one failed.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{FormError, Invalid, Result};
use crate::field::{BoundField, Context, Field, Mode};
use crate::params::Params;
use crate::request::Request;
use crate::validation::join_errors;
use crate::value::{Data, Value};

/// Cross-field validator run against a bound fieldset and its extracted data.
pub trait FieldsetValidator: Send + Sync {
    /// Validates the assembled data.
    fn validate(&self, fieldset: &BoundFieldset, data: &Data) -> std::result::Result<(), Invalid>;
}

impl<F> FieldsetValidator for F
where
    F: Fn(&BoundFieldset, &Data) -> std::result::Result<(), Invalid> + Send + Sync,
{
    fn validate(&self, fieldset: &BoundFieldset, data: &Data) -> std::result::Result<(), Invalid> {
        self(fieldset, data)
    }
}

/// Predicate deciding which fields are bound.
pub type FieldFilter = Arc<dyn Fn(&Field) -> bool + Send + Sync>;

/// A child of a fieldset template.
#[derive(Debug, Clone)]
pub enum Node {
    /// A field.
    Field(Field),
    /// A nested fieldset.
    Fieldset(Fieldset),
}

impl Node {
    /// Returns the name the node is stored under.
    pub fn name(&self) -> &str {
        match self {
            Self::Field(field) => field.name(),
            Self::Fieldset(fieldset) => fieldset.name(),
        }
    }
}

impl From<Field> for Node {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<Fieldset> for Node {
    fn from(fieldset: Fieldset) -> Self {
        Self::Fieldset(fieldset)
    }
}

/// A fieldset template.
#[derive(Clone, Default)]
pub struct Fieldset {
    name: String,
    title: String,
    description: String,
    prefix: String,
    nodes: IndexMap<String, Node>,
    validators: Vec<Arc<dyn FieldsetValidator>>,
    filter: Option<FieldFilter>,
}

impl fmt::Debug for Fieldset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fieldset")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("nodes", &self.nodes)
            .field("validators", &self.validators.len())
            .finish_non_exhaustive()
    }
}

impl Fieldset {
    /// Creates an empty unnamed fieldset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty fieldset named `name`, with prefix `name.`.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            prefix: if name.is_empty() {
                String::new()
            } else {
                format!("{name}.")
            },
            name,
            ..Self::default()
        }
    }

    /// Creates an unnamed fieldset from fields.
    pub fn from_fields(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        Self::from_nodes(fields.into_iter().map(Node::Field))
    }

    /// Creates an unnamed fieldset from fields and fieldsets.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self> {
        let mut fieldset = Self::new();
        for node in nodes {
            fieldset.append(node)?;
        }
        Ok(fieldset)
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a fieldset validator.
    #[must_use]
    pub fn validator(mut self, validator: impl FieldsetValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Sets the filter deciding which fields are bound.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&Field) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Appends a node and returns the fieldset.
    pub fn with(mut self, node: impl Into<Node>) -> Result<Self> {
        self.append(node)?;
        Ok(self)
    }

    /// Appends a node, rejecting a name already used at this level.
    pub fn append(&mut self, node: impl Into<Node>) -> Result<()> {
        let node = node.into();
        let name = node.name().to_string();
        if self.nodes.contains_key(&name) {
            return Err(FormError::DuplicateName(name));
        }
        self.nodes.insert(name, node);
        Ok(())
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the title.
    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Returns the prefix of field names.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Overrides the prefix of field names.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// Returns the node stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Returns the field stored under `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self.nodes.get(name)? {
            Node::Field(field) => Some(field),
            Node::Fieldset(_) => None,
        }
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Returns the nodes in order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns the fields at this level.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.nodes.values().filter_map(|node| match node {
            Node::Field(field) => Some(field),
            Node::Fieldset(_) => None,
        })
    }

    /// Returns this fieldset followed by the nested fieldsets at this level.
    pub fn fieldsets(&self) -> Vec<&Fieldset> {
        std::iter::once(self)
            .chain(self.nodes.values().filter_map(|node| match node {
                Node::Fieldset(fieldset) => Some(fieldset),
                Node::Field(_) => None,
            }))
            .collect()
    }

    fn retain(&self, keep: impl Fn(&str) -> bool) -> Self {
        Self {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            prefix: self.prefix.clone(),
            nodes: self
                .nodes
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, node)| (name.clone(), node.clone()))
                .collect(),
            validators: Vec::new(),
            filter: self.filter.clone(),
        }
    }

    /// Returns a copy holding only the named nodes. Validators are dropped.
    pub fn select(&self, names: &[&str]) -> Self {
        self.retain(|name| names.contains(&name))
    }

    /// Returns a copy without the named nodes. Validators are dropped.
    pub fn omit(&self, names: &[&str]) -> Self {
        self.retain(|name| !names.contains(&name))
    }

    /// Combines two fieldsets.
    ///
    /// When `other` is unnamed or has this fieldset's name, its nodes and
    /// validators are spliced into the copy; otherwise it is nested as a
    /// child fieldset.
    pub fn merge(&self, other: &Fieldset) -> Result<Self> {
        let mut merged = self.clone();
        if other.name.is_empty() || other.name == self.name {
            for node in other.nodes.values() {
                merged.append(node.clone())?;
            }
            merged.validators.extend(other.validators.iter().cloned());
        } else {
            merged.append(other.clone())?;
        }
        Ok(merged)
    }

    /// Binds every field to a request.
    ///
    /// `data` holds prior content values by local name; nested fieldsets
    /// read theirs from the entry under their name.
    pub fn bind(
        &self,
        request: &Request,
        data: Option<&Data>,
        params: &Arc<Params>,
        context: Option<&Context>,
    ) -> Result<BoundFieldset> {
        self.bind_prefixed(request, &self.prefix, data, params, context, None)
    }

    /// Binds with a filter overriding the fieldset's own.
    pub fn bind_filtered(
        &self,
        request: &Request,
        data: Option<&Data>,
        params: &Arc<Params>,
        context: Option<&Context>,
        filter: impl Fn(&Field) -> bool + Send + Sync + 'static,
    ) -> Result<BoundFieldset> {
        let filter: FieldFilter = Arc::new(filter);
        self.bind_prefixed(request, &self.prefix, data, params, context, Some(&filter))
    }

    pub(crate) fn bind_prefixed(
        &self,
        request: &Request,
        prefix: &str,
        data: Option<&Data>,
        params: &Arc<Params>,
        context: Option<&Context>,
        filter: Option<&FieldFilter>,
    ) -> Result<BoundFieldset> {
        let filter = filter.or(self.filter.as_ref());
        let data = data.cloned().unwrap_or_default();

        let mut nodes = IndexMap::with_capacity(self.nodes.len());
        for (name, node) in &self.nodes {
            let bound = match node {
                Node::Field(field) => {
                    if filter.is_some_and(|keep| !keep(field)) {
                        continue;
                    }
                    let value = data.get(name).cloned().unwrap_or_default();
                    BoundNode::Field(field.bind(request, prefix, value, params, context)?)
                }
                Node::Fieldset(fieldset) => {
                    let nested = format!("{prefix}{}.", fieldset.name);
                    BoundNode::Fieldset(fieldset.bind_prefixed(
                        request,
                        &nested,
                        data.get(name).and_then(Value::as_map),
                        params,
                        context,
                        filter,
                    )?)
                }
            };
            nodes.insert(name.clone(), bound);
        }

        debug!(fieldset = %self.name, prefix, fields = nodes.len(), "bound fieldset");
        Ok(BoundFieldset {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            prefix: prefix.to_string(),
            nodes,
            validators: self.validators.clone(),
            data,
            params: Arc::clone(params),
        })
    }
}

/// A child of a bound fieldset.
#[derive(Debug, Clone)]
pub enum BoundNode {
    /// A bound field.
    Field(BoundField),
    /// A bound nested fieldset.
    Fieldset(BoundFieldset),
}

/// A fieldset bound to one request.
#[derive(Clone)]
pub struct BoundFieldset {
    /// Name.
    pub name: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Prefix the fields were bound with.
    pub prefix: String,
    /// Prior content values.
    pub data: Data,
    /// Submitted parameters.
    pub params: Arc<Params>,
    nodes: IndexMap<String, BoundNode>,
    validators: Vec<Arc<dyn FieldsetValidator>>,
}

impl fmt::Debug for BoundFieldset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFieldset")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

impl BoundFieldset {
    /// Returns the node stored under `name`.
    pub fn get(&self, name: &str) -> Option<&BoundNode> {
        self.nodes.get(name)
    }

    /// Returns the field stored under the local `name` at this level.
    pub fn field(&self, name: &str) -> Option<&BoundField> {
        match self.nodes.get(name)? {
            BoundNode::Field(field) => Some(field),
            BoundNode::Fieldset(_) => None,
        }
    }

    /// Returns the field stored under the local `name` at this level.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut BoundField> {
        match self.nodes.get_mut(name)? {
            BoundNode::Field(field) => Some(field),
            BoundNode::Fieldset(_) => None,
        }
    }

    /// Returns the fields at this level.
    pub fn fields(&self) -> impl Iterator<Item = &BoundField> {
        self.nodes.values().filter_map(|node| match node {
            BoundNode::Field(field) => Some(field),
            BoundNode::Fieldset(_) => None,
        })
    }

    /// Returns the fields at this level.
    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut BoundField> {
        self.nodes.values_mut().filter_map(|node| match node {
            BoundNode::Field(field) => Some(field),
            BoundNode::Fieldset(_) => None,
        })
    }

    /// Returns the nested fieldsets at this level.
    pub fn child_fieldsets(&self) -> impl Iterator<Item = &BoundFieldset> {
        self.nodes.values().filter_map(|node| match node {
            BoundNode::Fieldset(fieldset) => Some(fieldset),
            BoundNode::Field(_) => None,
        })
    }

    /// Returns this fieldset followed by every nested fieldset, depth first.
    pub fn fieldsets(&self) -> Vec<&BoundFieldset> {
        let mut result = vec![self];
        for child in self.child_fieldsets() {
            result.extend(child.fieldsets());
        }
        result
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds a field anywhere in the tree by its resolved name.
    pub fn find_field(&self, name: &str) -> Option<&BoundField> {
        for node in self.nodes.values() {
            match node {
                BoundNode::Field(field) => {
                    if field.name == name {
                        return Some(field);
                    }
                    if let Some(found) = field.fields.as_ref().and_then(|f| f.find_field(name)) {
                        return Some(found);
                    }
                }
                BoundNode::Fieldset(fieldset) => {
                    if let Some(found) = fieldset.find_field(name) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Finds a field anywhere in the tree by its resolved name.
    pub fn find_field_mut(&mut self, name: &str) -> Option<&mut BoundField> {
        for node in self.nodes.values_mut() {
            match node {
                BoundNode::Field(field) => {
                    if field.name == name {
                        return Some(field);
                    }
                    if let Some(children) = field.fields.as_mut() {
                        if let Some(found) = children.find_field_mut(name) {
                            return Some(found);
                        }
                    }
                }
                BoundNode::Fieldset(fieldset) => {
                    if let Some(found) = fieldset.find_field_mut(name) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Extracts typed data and every error from the submitted parameters.
    pub fn extract(&self) -> (Data, FieldsetErrors) {
        let mut data = Data::new();
        let mut errors = FieldsetErrors::new(&self.name);

        for fieldset in self.child_fieldsets() {
            let (sub_data, sub_errors) = fieldset.extract();
            data.insert(fieldset.name.clone(), Value::Map(sub_data));
            errors.extend(sub_errors);
        }

        for field in self.fields() {
            if field.mode == Some(Mode::Display) {
                continue;
            }
            let (value, error) = extract_field(field);
            if let Some(error) = error {
                errors.push(error);
            }
            data.insert(field.local_name.clone(), value);
        }

        if errors.is_empty() {
            if let Err(error) = self.validate(&data) {
                errors.push(error);
            }
        }

        debug!(
            fieldset = %self.name,
            values = data.len(),
            errors = errors.len(),
            "extracted fieldset"
        );
        (data, errors)
    }

    /// Runs the fieldset validators against `data`.
    pub fn validate(&self, data: &Data) -> std::result::Result<(), Invalid> {
        join_errors(
            self.validators
                .iter()
                .filter_map(|validator| validator.validate(self, data).err())
                .collect(),
        )
    }

    /// Prepares every field for rendering.
    pub fn update(&mut self) {
        for node in self.nodes.values_mut() {
            match node {
                BoundNode::Field(field) => field.update(),
                BoundNode::Fieldset(fieldset) => fieldset.update(),
            }
        }
    }

    /// Sets the render mode of every field without a fixed mode.
    pub fn set_mode(&mut self, mode: Mode) {
        for node in self.nodes.values_mut() {
            match node {
                BoundNode::Field(field) => {
                    if field.mode.is_none() {
                        field.mode = Some(mode);
                    }
                }
                BoundNode::Fieldset(fieldset) => fieldset.set_mode(mode),
            }
        }
    }

    /// Recomputes widget ids of every field under `prefix`.
    pub fn set_id_prefix(&mut self, prefix: &str) {
        for node in self.nodes.values_mut() {
            match node {
                BoundNode::Field(field) => field.set_id_prefix(prefix),
                BoundNode::Fieldset(fieldset) => fieldset.set_id_prefix(prefix),
            }
        }
    }

    /// Attaches errors to the fields that raised them.
    ///
    /// A field keeps the first error attached to it. Sub-errors of composite
    /// aggregates are attached to the child fields as well.
    pub fn apply_errors(&mut self, errors: &FieldsetErrors) {
        for error in errors {
            self.apply_error(error);
        }
    }

    fn apply_error(&mut self, error: &Invalid) {
        if let Some(field) = error
            .field
            .as_deref()
            .and_then(|name| self.find_field_mut(name))
        {
            if field.error.is_none() {
                field.error = Some(error.clone());
            }
        }
        for sub in error.errors.values() {
            self.apply_error(sub);
        }
    }
}

/// Runs one field through convert, validate and prepare.
fn extract_field(field: &BoundField) -> (Value, Option<Invalid>) {
    let raw = field.extract();

    let value = match field.to_field(&raw) {
        Ok(value) if value.is_null() => field.missing.clone(),
        Ok(value) => value,
        Err(error) => {
            return (
                field.missing.clone(),
                Some(error.tagged(&field.name, &field.local_name)),
            )
        }
    };

    if let Err(error) = field.validate(&value) {
        return (value, Some(error.tagged(&field.name, &field.local_name)));
    }

    match field.preparer() {
        Some(prepare) => (prepare(value), None),
        None => (value, None),
    }
}

/// Errors collected by one [`BoundFieldset::extract`] call, in visiting
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldsetErrors {
    /// Name of the fieldset the errors were collected for.
    pub fieldset: String,
    errors: Vec<Invalid>,
}

impl FieldsetErrors {
    /// Creates an empty collection for a fieldset.
    pub fn new(fieldset: impl Into<String>) -> Self {
        Self {
            fieldset: fieldset.into(),
            errors: Vec::new(),
        }
    }

    /// Appends an error.
    pub fn push(&mut self, error: Invalid) {
        self.errors.push(error);
    }

    /// Appends every error of another collection.
    pub fn extend(&mut self, other: FieldsetErrors) {
        self.errors.extend(other.errors);
    }

    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns whether no errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns an iterator over the errors.
    pub fn iter(&self) -> std::slice::Iter<'_, Invalid> {
        self.errors.iter()
    }

    /// Returns the errors with composite aggregates flattened into their
    /// leaf errors.
    pub fn leaves(&self) -> Vec<&Invalid> {
        self.errors.iter().flat_map(Invalid::leaves).collect()
    }

    /// Maps the resolved name of every failing leaf field to its message.
    /// Form-level errors are keyed by an empty name.
    pub fn msg(&self) -> IndexMap<String, String> {
        self.leaves()
            .into_iter()
            .map(|error| (error.field.clone().unwrap_or_default(), error.message()))
            .collect()
    }

    /// Records an error for the field with the given resolved name and
    /// attaches it to that field.
    pub fn add_field_error(
        &mut self,
        fieldset: &mut BoundFieldset,
        name: &str,
        error: impl Into<Invalid>,
    ) -> Result<()> {
        let field = fieldset
            .find_field_mut(name)
            .ok_or_else(|| FormError::FieldNotFound(name.to_string()))?;
        let error = error.into().tagged(&field.name, &field.local_name);
        field.error = Some(error.clone());
        self.errors.push(error);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FieldsetErrors {
    type Item = &'a Invalid;
    type IntoIter = std::slice::Iter<'a, Invalid>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::ops::Index<usize> for FieldsetErrors {
    type Output = Invalid;

    fn index(&self, index: usize) -> &Self::Output {
        &self.errors[index]
    }
}

impl fmt::Display for FieldsetErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}
