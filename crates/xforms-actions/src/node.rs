use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::LocationData;
use crate::ids::COMPONENT_SEPARATOR;

/// Qualified name. Equality and hashing only consider the namespace URI and
/// the local name; the prefix is kept for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QName {
    #[serde(default)]
    pub prefix: Option<String>,
    pub local: String,
    #[serde(default)]
    pub ns_uri: Option<String>,
}

impl QName {
    pub fn new(ns_uri: Option<String>, prefix: Option<String>, local: impl Into<String>) -> Self {
        Self { prefix, local: local.into(), ns_uri }
    }

    /// Name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self { prefix: None, local: local.into(), ns_uri: None }
    }

    pub fn ns(ns_uri: &str, prefix: &str, local: &str) -> Self {
        Self {
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            local: local.to_string(),
            ns_uri: Some(ns_uri.to_string()),
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.ns_uri == other.ns_uri
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ns_uri.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{prefix}:")?;
        }
        f.write_str(&self.local)
    }
}

/// In-scope namespace declarations of an action element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMapping {
    pub by_prefix: BTreeMap<String, String>,
}

impl NamespaceMapping {
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.by_prefix.insert(prefix.into(), uri.into());
        self
    }

    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.by_prefix.get(prefix).map(String::as_str)
    }
}

/// Lexical scope an element's ids are resolved in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub scope_id: String,
}

impl Scope {
    pub fn new(scope_id: impl Into<String>) -> Self {
        Self { scope_id: scope_id.into() }
    }

    pub fn is_top_level(&self) -> bool {
        self.scope_id.is_empty()
    }

    /// Prefix of ids declared directly in this scope.
    pub fn full_prefix(&self) -> String {
        if self.is_top_level() {
            String::new()
        } else {
            format!("{}{COMPONENT_SEPARATOR}", self.scope_id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// How an attribute is looked up on an action element.
#[derive(Debug, Clone, Copy)]
pub enum AttributeKey<'k> {
    /// Local name in no namespace.
    Local(&'k str),
    Qualified(&'k QName),
}

impl<'k> From<&'k str> for AttributeKey<'k> {
    fn from(local: &'k str) -> Self {
        AttributeKey::Local(local)
    }
}

impl<'k> From<&'k QName> for AttributeKey<'k> {
    fn from(name: &'k QName) -> Self {
        AttributeKey::Qualified(name)
    }
}

/// Static description of one action element, produced by document analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
    name: QName,
    #[serde(rename = "id")]
    static_id: String,
    #[serde(default)]
    attributes: Vec<Attribute>,
    #[serde(default)]
    namespaces: NamespaceMapping,
    #[serde(default)]
    scope: Scope,
    #[serde(default)]
    location: Option<LocationData>,
    #[serde(default)]
    children: Vec<ActionNode>,
}

impl ActionNode {
    pub fn builder(name: QName, static_id: impl Into<String>) -> ActionNodeBuilder {
        ActionNodeBuilder {
            node: ActionNode {
                name,
                static_id: static_id.into(),
                attributes: Vec::new(),
                namespaces: NamespaceMapping::default(),
                scope: Scope::default(),
                location: None,
                children: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn static_id(&self) -> &str {
        &self.static_id
    }

    pub fn namespaces(&self) -> &NamespaceMapping {
        &self.namespaces
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn location(&self) -> Option<&LocationData> {
        self.location.as_ref()
    }

    pub fn children(&self) -> &[ActionNode] {
        &self.children
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Raw attribute text, no template evaluation.
    pub fn attribute<'k>(&self, key: impl Into<AttributeKey<'k>>) -> Option<&str> {
        let key = key.into();
        self.attributes
            .iter()
            .find(|attribute| match key {
                AttributeKey::Local(local) => {
                    attribute.name.ns_uri.is_none() && attribute.name.local == local
                }
                AttributeKey::Qualified(name) => attribute.name == *name,
            })
            .map(|attribute| attribute.value.as_str())
    }

    pub fn if_condition(&self) -> Option<&str> {
        self.attribute("if")
    }

    pub fn while_condition(&self) -> Option<&str> {
        self.attribute("while")
    }

    pub fn iterate(&self) -> Option<&str> {
        self.attribute("iterate")
    }

    pub fn context(&self) -> Option<&str> {
        self.attribute("context")
    }

    pub fn model(&self) -> Option<&str> {
        self.attribute("model")
    }

    pub fn bind(&self) -> Option<&str> {
        self.attribute("bind")
    }

    /// The `ref` attribute.
    pub fn reference(&self) -> Option<&str> {
        self.attribute("ref")
    }
}

pub struct ActionNodeBuilder {
    node: ActionNode,
}

impl ActionNodeBuilder {
    pub fn attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.node.attributes.iter_mut().find(|attribute| attribute.name == name) {
            Some(existing) => existing.value = value,
            None => self.node.attributes.push(Attribute { name, value }),
        }
        self
    }

    pub fn attribute_local(self, local: &str, value: impl Into<String>) -> Self {
        self.attribute(QName::local(local), value)
    }

    pub fn with_if(self, expression: impl Into<String>) -> Self {
        self.attribute_local("if", expression)
    }

    pub fn with_while(self, expression: impl Into<String>) -> Self {
        self.attribute_local("while", expression)
    }

    pub fn with_iterate(self, expression: impl Into<String>) -> Self {
        self.attribute_local("iterate", expression)
    }

    pub fn with_context(self, expression: impl Into<String>) -> Self {
        self.attribute_local("context", expression)
    }

    pub fn with_model(self, model_id: impl Into<String>) -> Self {
        self.attribute_local("model", model_id)
    }

    pub fn with_bind(self, bind_id: impl Into<String>) -> Self {
        self.attribute_local("bind", bind_id)
    }

    pub fn with_ref(self, expression: impl Into<String>) -> Self {
        self.attribute_local("ref", expression)
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.node.namespaces.by_prefix.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.node.scope = scope;
        self
    }

    pub fn with_location(mut self, location: LocationData) -> Self {
        self.node.location = Some(location);
        self
    }

    pub fn child(mut self, child: ActionNode) -> Self {
        self.node.children.push(child);
        self
    }

    pub fn build(self) -> ActionNode {
        self.node
    }
}
