//! Sheet schema: attribute definitions compiled from configuration.
//!
//! A schema document (JSON or YAML) lists the attributes a sheet may carry,
//! the header labels each one accepts and the checks its values must pass.
//! Loading goes through three steps:
//!
//! 1. parse the document into a JSON value,
//! 2. check its shape against the embedded `schemas/sheet-schema.json`,
//! 3. compile it into a [`Schema`], rejecting semantic problems
//!    (missing names, missing headings, duplicate names, unknown types).
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetpack::Schema;
//!
//! let schema = Schema::from_yaml_str(r#"
//! attributes:
//!   - name: ark
//!     headings: [ARK, Identifier]
//!     requirement: required
//!     unique: true
//!     data_type: ark-identifier
//! "#)?;
//! assert!(schema.attribute("ark").unwrap().required);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::models::Orientation;
use crate::validation::{self, types::normalize_tag, TypeRegistry};

/// Default separator for multivalued cells.
pub const DEFAULT_SEPARATOR: &str = "|";

const SHEET_SCHEMA: &str = include_str!("../../schemas/sheet-schema.json");

static XML_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9._-]*$").ok());

// =============================================================================
// Raw configuration
// =============================================================================

/// Schema document as written by users, before compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSchema {
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub identifier: Option<String>,
    /// Custom types: tag → regular expression.
    #[serde(default)]
    pub types: IndexMap<String, String>,
    #[serde(default)]
    pub structural: StructuralFields,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
}

/// One attribute descriptor as written by users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAttribute {
    #[serde(default)]
    pub name: Option<String>,
    /// Expected to be a non-empty array of strings; checked at compile time.
    #[serde(default)]
    pub headings: Option<Value>,
    #[serde(default)]
    pub requirement: Option<String>,
    #[serde(default)]
    pub heading_requirement: Option<String>,
    #[serde(default)]
    pub multivalued: bool,
    #[serde(default)]
    pub separator: Option<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub element: Option<String>,
}

/// Attribute names the structural mapper reads from each record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralFields {
    pub sequence: String,
    pub filename: String,
    pub visible_page: String,
    pub toc: String,
    pub illustrations: String,
}

impl Default for StructuralFields {
    fn default() -> Self {
        Self {
            sequence: "sequence".to_string(),
            filename: "filename".to_string(),
            visible_page: "visible_page".to_string(),
            toc: "toc".to_string(),
            illustrations: "illustrations".to_string(),
        }
    }
}

// =============================================================================
// Compiled schema
// =============================================================================

/// A compiled attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDefinition {
    pub name: String,
    /// Accepted header labels, lowercased, in declaration order.
    pub headings: Vec<String>,
    /// Every cell must hold a value.
    pub required: bool,
    /// The header must be present, even if the column may be empty.
    pub heading_required: bool,
    pub multivalued: bool,
    pub separator: String,
    pub unique: bool,
    pub data_type: Option<String>,
    /// Target element in descriptive XML.
    pub element: Option<String>,
}

impl AttributeDefinition {
    /// Definition with the given headings and every flag off.
    pub fn new<I, S>(name: impl Into<String>, headings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            headings: normalize_headings(headings),
            required: false,
            heading_required: false,
            multivalued: false,
            separator: DEFAULT_SEPARATOR.to_string(),
            unique: false,
            data_type: None,
            element: None,
        }
    }

    /// Whether `label` (any case) is one of this attribute's headings.
    pub fn accepts(&self, label: &str) -> bool {
        let label = label.trim().to_lowercase();
        self.headings.iter().any(|h| *h == label)
    }

    /// The header must appear in the sheet.
    pub fn needs_heading(&self) -> bool {
        self.required || self.heading_required
    }
}

/// A compiled sheet schema with its type registry.
#[derive(Debug, Clone)]
pub struct Schema {
    orientation: Orientation,
    identifier: Option<String>,
    attributes: Vec<AttributeDefinition>,
    /// Lowercased heading → index into `attributes`; first declaration wins.
    label_index: HashMap<String, usize>,
    types: TypeRegistry,
    structural: StructuralFields,
}

impl Schema {
    /// Compile a raw document against the default type registry.
    pub fn compile(raw: RawSchema) -> ConfigResult<Self> {
        Self::compile_with_types(raw, TypeRegistry::with_defaults())
    }

    /// Compile a raw document, starting from the given type registry.
    pub fn compile_with_types(raw: RawSchema, mut types: TypeRegistry) -> ConfigResult<Self> {
        for (tag, pattern) in &raw.types {
            types
                .register_pattern(tag, pattern)
                .map_err(|e| ConfigError::InvalidTypePattern {
                    tag: tag.clone(),
                    message: e.to_string(),
                })?;
        }

        let mut attributes = Vec::with_capacity(raw.attributes.len());
        let mut names = HashSet::new();
        for (index, raw_attr) in raw.attributes.into_iter().enumerate() {
            let definition = compile_attribute(index, raw_attr)?;
            if !names.insert(definition.name.clone()) {
                return Err(ConfigError::DuplicateAttribute(definition.name));
            }
            attributes.push(definition);
        }

        let mut schema = Self {
            orientation: raw.orientation,
            identifier: raw.identifier,
            attributes,
            label_index: HashMap::new(),
            types,
            structural: raw.structural,
        };
        schema.rebuild_label_index();
        schema.check_types()?;
        schema.check_identifier()?;
        Ok(schema)
    }

    /// Build a schema directly from definitions (row orientation, default types).
    pub fn from_definitions(attributes: Vec<AttributeDefinition>) -> ConfigResult<Self> {
        let mut names = HashSet::new();
        for definition in &attributes {
            if !names.insert(definition.name.as_str()) {
                return Err(ConfigError::DuplicateAttribute(definition.name.clone()));
            }
        }

        let mut schema = Self {
            orientation: Orientation::Row,
            identifier: None,
            attributes,
            label_index: HashMap::new(),
            types: TypeRegistry::with_defaults(),
            structural: StructuralFields::default(),
        };
        schema.rebuild_label_index();
        schema.check_types()?;
        Ok(schema)
    }

    /// Parse, check and compile a JSON document.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let doc: Value = serde_json::from_str(text)?;
        Self::from_value(doc)
    }

    /// Parse, check and compile a YAML document.
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let doc: Value = serde_yaml::from_str(text)?;
        Self::from_value(doc)
    }

    /// Check and compile an already-parsed document.
    pub fn from_value(doc: Value) -> ConfigResult<Self> {
        check_document(&doc)?;
        let raw: RawSchema = serde_json::from_value(doc)?;
        Self::compile(raw)
    }

    /// Load a schema file; `.yml`/`.yaml` are read as YAML, anything else as JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"));

        if is_yaml {
            Self::from_yaml_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_structural(mut self, structural: StructuralFields) -> Self {
        self.structural = structural;
        self
    }

    /// Designate the identifier attribute used by the descriptive XML.
    pub fn with_identifier(mut self, attribute: impl Into<String>) -> ConfigResult<Self> {
        self.identifier = Some(attribute.into());
        self.check_identifier()?;
        Ok(self)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Definition whose headings contain `label`, ignoring case.
    pub fn definition_for_label(&self, label: &str) -> Option<&AttributeDefinition> {
        self.label_index
            .get(&label.trim().to_lowercase())
            .map(|&index| &self.attributes[index])
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Mutable access to the type registry; changes apply to later extraction passes.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn structural(&self) -> &StructuralFields {
        &self.structural
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Element that holds the record identifier in descriptive XML.
    pub fn identifier_element(&self) -> Option<&str> {
        self.identifier
            .as_deref()
            .and_then(|name| self.attribute(name))
            .and_then(|a| a.element.as_deref())
    }

    /// (attribute, element) pairs in declaration order.
    pub fn element_mapping(&self) -> Vec<(&str, &str)> {
        self.attributes
            .iter()
            .filter_map(|a| a.element.as_deref().map(|e| (a.name.as_str(), e)))
            .collect()
    }

    /// Every data-type tag in use must have a registered predicate.
    pub fn check_types(&self) -> ConfigResult<()> {
        for attribute in &self.attributes {
            if let Some(tag) = &attribute.data_type {
                if !self.types.contains(tag) {
                    return Err(ConfigError::UnknownDataType {
                        attribute: attribute.name.clone(),
                        tag: tag.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_identifier(&self) -> ConfigResult<()> {
        let Some(name) = &self.identifier else {
            return Ok(());
        };
        if self.identifier_element().is_none() {
            return Err(ConfigError::UndefinedIdentifier(name.clone()));
        }
        if self.attribute(name).is_some_and(|a| a.multivalued) {
            return Err(ConfigError::MultivaluedIdentifier(name.clone()));
        }
        Ok(())
    }

    fn rebuild_label_index(&mut self) {
        self.label_index.clear();
        for (index, attribute) in self.attributes.iter().enumerate() {
            for heading in &attribute.headings {
                self.label_index.entry(heading.clone()).or_insert(index);
            }
        }
    }
}

// =============================================================================
// Compilation helpers
// =============================================================================

/// Check a document against the embedded configuration schema.
fn check_document(doc: &Value) -> ConfigResult<()> {
    let schema: Value = serde_json::from_str(SHEET_SCHEMA)?;
    validation::validate(&schema, doc).map_err(ConfigError::MalformedSchema)
}

fn compile_attribute(index: usize, raw: RawAttribute) -> ConfigResult<AttributeDefinition> {
    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(ConfigError::AttrNotDefined { index })?;

    let headings = match raw.headings {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>(),
        _ => None,
    }
    .map(normalize_headings)
    .filter(|h| !h.is_empty())
    .ok_or_else(|| ConfigError::NoHeadingsArray { attribute: name.clone() })?;

    if let Some(element) = &raw.element {
        let valid = XML_NAME.as_ref().is_some_and(|re| re.is_match(element));
        if !valid {
            return Err(ConfigError::InvalidElementName {
                attribute: name,
                element: element.clone(),
            });
        }
    }

    Ok(AttributeDefinition {
        name,
        headings,
        required: is_required_tag(raw.requirement.as_deref()),
        heading_required: is_required_tag(raw.heading_requirement.as_deref()),
        multivalued: raw.multivalued,
        separator: raw.separator.unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
        unique: raw.unique,
        data_type: raw.data_type.as_deref().map(normalize_tag).filter(|t| !t.is_empty()),
        element: raw.element,
    })
}

/// A requirement tag means "required" iff it equals `required`, ignoring case.
pub fn is_required_tag(tag: Option<&str>) -> bool {
    tag.is_some_and(|t| t.trim().eq_ignore_ascii_case("required"))
}

fn normalize_headings<I, S>(headings: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    headings
        .into_iter()
        .map(|h| h.as_ref().trim().to_lowercase())
        .filter(|h| !h.is_empty() && seen.insert(h.clone()))
        .collect()
}
