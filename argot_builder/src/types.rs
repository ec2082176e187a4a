use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::constant::BOOLEAN_TYPE;
use crate::model::Value;

/// Construct a value of some type from Cli text, or `None` when the text does not convert.
pub type FromText = fn(&str) -> Option<Value>;
/// Check that an already constructed value belongs to some type.
pub type Predicate = fn(&Value) -> bool;
/// Fold the elements of a repeated parameter into one value.
pub type ListConstructor = fn(Vec<Value>) -> Value;

/// A shared handle to a registered (or synthesized) type.
pub type TypeRef = Arc<TypeDescriptor>;

static TYPE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap());
static TYPE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+(?:_[A-Z]+)?)(\d*)$").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TypeError {
    #[error("Unknown type '{0}'.")]
    UnknownType(String),

    #[error("Cannot register '{0}': the name is already in use.")]
    DuplicateType(String),

    #[error("Invalid type name '{0}' (expected PascalCase, ex: 'ByteCount').")]
    InvalidTypeName(String),

    #[error("Invalid type identifier '{0}' (expected ex: 'COUNT', 'BYTE_COUNT', 'COUNT2').")]
    InvalidTypeIdentifier(String),

    #[error("A variant requires at least two distinct member types, found {0}.")]
    VariantTooSmall(String),

    #[error("Variant members {members} do not share one canonical supertype ({supers}).")]
    UnrelatedVariant { members: String, supers: String },
}

/// How a type converts and checks values.
#[derive(Clone)]
pub enum TypeKind {
    /// A root type with its own conversion.
    Primitive {
        /// Conversion from Cli text.
        from_text: FromText,
        /// Membership check for constructed values.
        predicate: Predicate,
    },
    /// A subtype synthesized from its name, ex: `IcoFile` over `File`.
    Derived {
        /// The leading name segment, ex: `Ico`.
        prefix: String,
        /// The type this one refines.
        super_type: TypeRef,
    },
    /// A discriminated union of types sharing one canonical supertype.
    Variant(Vec<TypeRef>),
    /// A closed set of literal words.
    Enum(Vec<String>),
    /// Exactly one literal word.
    Literal(String),
}

impl std::fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKind::Primitive { .. } => write!(f, "Primitive"),
            TypeKind::Derived { prefix, super_type } => {
                write!(f, "Derived({prefix} over {})", super_type.name())
            }
            TypeKind::Variant(members) => {
                let names: Vec<&str> = members.iter().map(|m| m.name()).collect();
                write!(f, "Variant({})", names.join("|"))
            }
            TypeKind::Enum(values) => write!(f, "Enum({})", values.join("|")),
            TypeKind::Literal(text) => write!(f, "Literal({text})"),
        }
    }
}

/// Describes one type: its names, how it converts Cli text, and how it participates in subtyping.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    alias_names: Vec<String>,
    kind: TypeKind,
    accepts_placeholder: bool,
    list_constructor: Option<ListConstructor>,
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeDescriptor {}

impl TypeDescriptor {
    /// Describe a root type.
    ///
    /// ### Example
    /// ```
    /// # use argot_builder as argot;
    /// use argot::{TypeDescriptor, TypeRegistry, Value};
    ///
    /// let registry = TypeRegistry::new();
    /// registry
    ///     .register(
    ///         TypeDescriptor::primitive(
    ///             "File",
    ///             |text| Some(Value::Text(text.to_string())),
    ///             |value| matches!(value, Value::Text(_)),
    ///         )
    ///         .accepting_placeholder(),
    ///     )
    ///     .unwrap();
    ///
    /// let ico = registry.resolve("IcoFile").unwrap();
    /// assert!(ico.accepts_placeholder_input());
    /// assert_eq!(registry.canonical_super_name("IcoFile").unwrap(), "File");
    /// ```
    pub fn primitive(name: impl Into<String>, from_text: FromText, predicate: Predicate) -> Self {
        Self {
            name: name.into(),
            alias_names: Vec::default(),
            kind: TypeKind::Primitive {
                from_text,
                predicate,
            },
            accepts_placeholder: false,
            list_constructor: None,
        }
    }

    /// Add an alternate name.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias_names.push(name.into());
        self
    }

    /// Declare that this type may bind the file topic.
    pub fn accepting_placeholder(mut self) -> Self {
        self.accepts_placeholder = true;
        self
    }

    /// Fold repeated values of this type with `constructor` instead of `Value::List`.
    pub fn list_constructor(mut self, constructor: ListConstructor) -> Self {
        self.list_constructor.replace(constructor);
        self
    }

    fn derived(name: String, prefix: String, super_type: TypeRef) -> Self {
        Self {
            name,
            alias_names: Vec::default(),
            accepts_placeholder: super_type.accepts_placeholder,
            list_constructor: super_type.list_constructor,
            kind: TypeKind::Derived { prefix, super_type },
        }
    }

    fn variant(name: String, members: Vec<TypeRef>) -> Self {
        Self {
            name,
            alias_names: Vec::default(),
            accepts_placeholder: members.iter().any(|m| m.accepts_placeholder),
            list_constructor: None,
            kind: TypeKind::Variant(members),
        }
    }

    /// The canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternate names under which the registry resolves this type.
    pub fn alias_names(&self) -> &[String] {
        &self.alias_names
    }

    /// How this type converts and checks values.
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// The type this one directly refines, if synthesized as a subtype.
    pub fn super_type(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Derived { super_type, .. } => Some(super_type),
            _ => None,
        }
    }

    /// The members of a variant type.
    pub fn variant_members(&self) -> Option<&[TypeRef]> {
        match &self.kind {
            TypeKind::Variant(members) => Some(members.as_slice()),
            _ => None,
        }
    }

    /// Whether this is a single literal word.
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, TypeKind::Literal(_))
    }

    /// Whether this is a closed set of literal words.
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    /// Whether this type may bind the file topic.
    pub fn accepts_placeholder_input(&self) -> bool {
        self.accepts_placeholder
    }

    /// Whether this type is (or refines) the boolean type.
    pub fn is_boolean(&self) -> bool {
        self.canonical_super_name() == BOOLEAN_TYPE
    }

    /// The ultimate non-synthesized ancestor's name.
    pub fn canonical_super_name(&self) -> &str {
        match &self.kind {
            TypeKind::Derived { super_type, .. } => super_type.canonical_super_name(),
            TypeKind::Variant(members) => match members.first() {
                Some(member) => member.canonical_super_name(),
                None => &self.name,
            },
            _ => &self.name,
        }
    }

    /// The accepted words of a literal or enum type.
    pub fn choices(&self) -> Option<Vec<String>> {
        match &self.kind {
            TypeKind::Enum(values) => Some(values.clone()),
            TypeKind::Literal(text) => Some(vec![text.clone()]),
            _ => None,
        }
    }

    /// Convert Cli text into a value of this type.
    pub fn coerce(&self, text: &str) -> Option<Value> {
        match &self.kind {
            TypeKind::Primitive {
                from_text,
                predicate,
            } => from_text(text).filter(|value| predicate(value)),
            TypeKind::Derived { super_type, .. } => super_type.coerce(text),
            // First member to convert wins.
            TypeKind::Variant(members) => members.iter().find_map(|m| m.coerce(text)),
            TypeKind::Enum(values) => values
                .iter()
                .find(|v| v.as_str() == text)
                .map(|v| Value::Text(v.clone())),
            TypeKind::Literal(literal) => {
                if literal == text {
                    Some(Value::Text(literal.clone()))
                } else {
                    None
                }
            }
        }
    }

    /// Check an already constructed value against this type.
    pub fn accepts(&self, value: &Value) -> bool {
        if value == &Value::Topic {
            return self.accepts_placeholder;
        }

        match &self.kind {
            TypeKind::Primitive { predicate, .. } => predicate(value),
            TypeKind::Derived { super_type, .. } => super_type.accepts(value),
            TypeKind::Variant(members) => members.iter().any(|m| m.accepts(value)),
            TypeKind::Enum(_) | TypeKind::Literal(_) => match value {
                Value::Text(text) => self.coerce(text).is_some(),
                _ => false,
            },
        }
    }

    /// Fold repeated values of this type into one value.
    pub fn construct_list(&self, values: Vec<Value>) -> Value {
        match self.list_constructor {
            Some(constructor) => constructor(values),
            None => Value::List(values),
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    descriptors: HashMap<String, TypeRef>,
    aliases: HashMap<String, String>,
}

impl Registry {
    fn get(&self, name: &str) -> Option<TypeRef> {
        let canonical = self.aliases.get(name).map(|s| s.as_str()).unwrap_or(name);
        self.descriptors.get(canonical).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name) || self.aliases.contains_key(name)
    }

    // Keeps the first inserted descriptor so that handles stay identical per name.
    fn memoize(&mut self, descriptor: TypeDescriptor) -> TypeRef {
        self.descriptors
            .entry(descriptor.name.clone())
            .or_insert_with(|| Arc::new(descriptor))
            .clone()
    }
}

/// Registry of type descriptors, keyed by canonical name.
///
/// Subtypes, variants, enums and literals are synthesized on demand and memoized; once handed out a descriptor never changes.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    inner: RwLock<Registry>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the standard primitives: `String` (`Str`, `Text`), `Int` (`Integer`), `Number` (`Float`), `Boolean` (`Bool`), and `Count`.
    pub fn standard() -> Self {
        let registry = Self::new();

        for descriptor in standard_descriptors() {
            if let Err(error) = registry.register(descriptor) {
                unreachable!("internal error - standard types must register: {error}");
            }
        }

        registry
    }

    /// Register a root type.
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<TypeRef, TypeError> {
        for name in std::iter::once(&descriptor.name).chain(descriptor.alias_names.iter()) {
            if !TYPE_NAME.is_match(name) {
                return Err(TypeError::InvalidTypeName(name.clone()));
            }
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        for name in std::iter::once(&descriptor.name).chain(descriptor.alias_names.iter()) {
            if inner.contains(name) {
                return Err(TypeError::DuplicateType(name.clone()));
            }
        }

        for alias in &descriptor.alias_names {
            inner
                .aliases
                .insert(alias.clone(), descriptor.name.clone());
        }

        let name = descriptor.name.clone();
        let handle = Arc::new(descriptor);
        inner.descriptors.insert(name, handle.clone());
        Ok(handle)
    }

    /// Resolve a type by name or alias, synthesizing a subtype when the name is unknown.
    ///
    /// Synthesis splits the name at its first internal uppercase boundary: `IcoFile` becomes prefix `Ico` over `File`.
    pub fn resolve(&self, name: &str) -> Result<TypeRef, TypeError> {
        if let Some(descriptor) = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(descriptor);
        }

        if !TYPE_NAME.is_match(name) {
            return Err(TypeError::InvalidTypeName(name.to_string()));
        }

        let boundary = name
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_ascii_uppercase())
            .map(|(i, _)| i)
            .ok_or_else(|| TypeError::UnknownType(name.to_string()))?;
        let (prefix, super_name) = name.split_at(boundary);
        let super_type = self
            .resolve(super_name)
            .map_err(|_| TypeError::UnknownType(name.to_string()))?;

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Synthesizing subtype {name}: prefix {prefix} over {super_name}.");
        }

        let descriptor =
            TypeDescriptor::derived(name.to_string(), prefix.to_string(), super_type);
        Ok(self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .memoize(descriptor))
    }

    /// Resolve (or synthesize) the discriminated union of `names`.
    ///
    /// Members must share one canonical supertype.
    /// The union's name is the member names in code point order, pipe joined and parenthesised: `(IcoFile|PngFile)`.
    pub fn union(&self, names: &[&str]) -> Result<TypeRef, TypeError> {
        let mut members: Vec<TypeRef> = Vec::default();

        for name in names {
            let member = self.resolve(name)?;

            if !members.iter().any(|m| m.name == member.name) {
                members.push(member);
            }
        }

        members.sort_by(|a, b| a.name.cmp(&b.name));
        let member_names: Vec<&str> = members.iter().map(|m| m.name()).collect();
        let name = format!("({})", member_names.join("|"));

        if members.len() < 2 {
            return Err(TypeError::VariantTooSmall(name));
        }

        let mut supers: Vec<&str> = members.iter().map(|m| m.canonical_super_name()).collect();
        supers.sort();
        supers.dedup();

        if supers.len() != 1 {
            return Err(TypeError::UnrelatedVariant {
                members: name,
                supers: supers.join(", "),
            });
        }

        if let Some(descriptor) = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name)
        {
            return Ok(descriptor);
        }

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Synthesizing variant {name}.");
        }

        let descriptor = TypeDescriptor::variant(name, members);
        Ok(self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .memoize(descriptor))
    }

    /// Resolve (or synthesize) the enum accepting exactly `values`, in declared order.
    pub fn enumeration(&self, values: &[&str]) -> TypeRef {
        let name = format!("({})", values.join("|"));
        let descriptor = TypeDescriptor {
            name,
            alias_names: Vec::default(),
            kind: TypeKind::Enum(values.iter().map(|v| v.to_string()).collect()),
            accepts_placeholder: false,
            list_constructor: None,
        };
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .memoize(descriptor)
    }

    /// Resolve (or synthesize) the type accepting only `text`.
    pub fn literal(&self, text: &str) -> TypeRef {
        let descriptor = TypeDescriptor {
            name: text.to_string(),
            alias_names: Vec::default(),
            kind: TypeKind::Literal(text.to_string()),
            accepts_placeholder: false,
            list_constructor: None,
        };
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .memoize(descriptor)
    }

    /// The ultimate non-synthesized ancestor's name for `name`.
    pub fn canonical_super_name(&self, name: &str) -> Result<String, TypeError> {
        Ok(self.resolve(name)?.canonical_super_name().to_string())
    }
}

/// Split a grammar type identifier into its type name and numeric suffix.
///
/// `BYTE_COUNT` is `ByteCount`; `INT2` is `Int` with suffix `2`.
pub(crate) fn type_name_from_identifier(
    identifier: &str,
) -> Result<(String, Option<String>), TypeError> {
    let captures = TYPE_IDENTIFIER
        .captures(identifier)
        .ok_or_else(|| TypeError::InvalidTypeIdentifier(identifier.to_string()))?;
    let name = captures[1]
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(head) => head.to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::default(),
            }
        })
        .collect::<String>();
    let suffix = match &captures[2] {
        "" => None,
        digits => Some(digits.to_string()),
    };
    Ok((name, suffix))
}

fn standard_descriptors() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::primitive(
            "String",
            |text| Some(Value::Text(text.to_string())),
            |value| matches!(value, Value::Text(_)),
        )
        .alias("Str")
        .alias("Text"),
        TypeDescriptor::primitive(
            "Int",
            |text| text.parse::<i64>().ok().map(Value::Integer),
            |value| matches!(value, Value::Integer(_)),
        )
        .alias("Integer"),
        TypeDescriptor::primitive(
            "Number",
            |text| {
                text.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Value::Number)
            },
            |value| matches!(value, Value::Number(_) | Value::Integer(_)),
        )
        .alias("Float"),
        TypeDescriptor::primitive(
            BOOLEAN_TYPE,
            |text| match text {
                "true" | "yes" | "on" | "1" => Some(Value::Boolean(true)),
                "false" | "no" | "off" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },
            |value| matches!(value, Value::Boolean(_)),
        )
        .alias("Bool"),
        TypeDescriptor::primitive(
            "Count",
            |text| text.parse::<u64>().ok().map(Value::Count),
            |value| matches!(value, Value::Count(_)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn file_registry() -> TypeRegistry {
        let registry = TypeRegistry::standard();
        registry
            .register(
                TypeDescriptor::primitive(
                    "File",
                    |text| Some(Value::Text(text.to_string())),
                    |value| matches!(value, Value::Text(_)),
                )
                .accepting_placeholder(),
            )
            .unwrap();
        registry
    }

    #[rstest]
    #[case("String", "String")]
    #[case("Str", "String")]
    #[case("Text", "String")]
    #[case("Int", "Int")]
    #[case("Integer", "Int")]
    #[case("Float", "Number")]
    #[case("Bool", "Boolean")]
    #[case("Count", "Count")]
    fn resolve_standard(#[case] name: &str, #[case] expected: &str) {
        let registry = TypeRegistry::standard();

        assert_eq!(registry.resolve(name).unwrap().name(), expected);
    }

    #[test]
    fn resolve_identical_handles() {
        let registry = TypeRegistry::standard();

        let a = registry.resolve("Str").unwrap();
        let b = registry.resolve("String").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn subtype_synthesis() {
        // Setup
        let registry = TypeRegistry::standard();

        // Execute
        let byte_count = registry.resolve("ByteCount").unwrap();

        // Verify
        assert_eq!(byte_count.name(), "ByteCount");
        assert_eq!(byte_count.super_type().unwrap().name(), "Count");
        assert_matches!(byte_count.kind(), TypeKind::Derived { prefix, .. } if prefix == "Byte");
        assert_eq!(registry.canonical_super_name("ByteCount").unwrap(), "Count");
        assert_eq!(byte_count.coerce("12"), Some(Value::Count(12)));
        assert_eq!(byte_count.coerce("-12"), None);
        assert!(byte_count.accepts(&Value::Count(3)));
        assert!(Arc::ptr_eq(
            &byte_count,
            &registry.resolve("ByteCount").unwrap()
        ));
    }

    #[test]
    fn subtype_synthesis_nested() {
        let registry = file_registry();

        let descriptor = registry.resolve("LargeIcoFile").unwrap();

        assert_eq!(descriptor.super_type().unwrap().name(), "IcoFile");
        assert_eq!(registry.canonical_super_name("LargeIcoFile").unwrap(), "File");
        assert!(descriptor.accepts_placeholder_input());
    }

    #[rstest]
    #[case("Widget")]
    #[case("FooWidget")]
    fn resolve_unknown(#[case] name: &str) {
        let registry = TypeRegistry::standard();

        assert_eq!(
            registry.resolve(name).unwrap_err(),
            TypeError::UnknownType(name.to_string())
        );
    }

    #[test]
    fn resolve_invalid() {
        let registry = TypeRegistry::standard();

        assert_eq!(
            registry.resolve("byte_count").unwrap_err(),
            TypeError::InvalidTypeName("byte_count".to_string())
        );
    }

    #[test]
    fn register_duplicate() {
        let registry = TypeRegistry::standard();

        let error = registry
            .register(TypeDescriptor::primitive("Path", |_| None, |_| false).alias("Str"))
            .unwrap_err();

        assert_eq!(error, TypeError::DuplicateType("Str".to_string()));
        assert_matches!(registry.resolve("Path"), Err(TypeError::UnknownType(_)));
    }

    #[test]
    fn union_canonical() {
        // Setup
        let registry = file_registry();

        // Execute
        let a = registry.union(&["PngFile", "IcoFile"]).unwrap();
        let b = registry.union(&["IcoFile", "PngFile", "IcoFile"]).unwrap();

        // Verify
        assert_eq!(a.name(), "(IcoFile|PngFile)");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.canonical_super_name(), "File");
        assert!(a.accepts_placeholder_input());
        assert_eq!(a.variant_members().unwrap().len(), 2);
    }

    #[test]
    fn union_unrelated() {
        let registry = TypeRegistry::standard();

        let error = registry.union(&["Str", "Int"]).unwrap_err();

        assert_eq!(
            error,
            TypeError::UnrelatedVariant {
                members: "(Int|String)".to_string(),
                supers: "Int, String".to_string(),
            }
        );
    }

    #[test]
    fn union_too_small() {
        let registry = TypeRegistry::standard();

        assert_matches!(
            registry.union(&["Count", "Count"]),
            Err(TypeError::VariantTooSmall(_))
        );
    }

    #[test]
    fn union_coerce_first_member() {
        let registry = TypeRegistry::standard();
        let variant = registry.union(&["Count", "ByteCount"]).unwrap();

        assert_eq!(variant.name(), "(ByteCount|Count)");
        assert_eq!(variant.coerce("7"), Some(Value::Count(7)));
        assert_eq!(variant.coerce("x"), None);
    }

    #[test]
    fn enumeration_and_literal() {
        let registry = TypeRegistry::standard();

        let mode = registry.enumeration(&["fast", "slow"]);
        let commit = registry.literal("commit");

        assert!(mode.is_enum());
        assert_eq!(mode.name(), "(fast|slow)");
        assert_eq!(mode.coerce("slow"), Some(Value::Text("slow".to_string())));
        assert_eq!(mode.coerce("medium"), None);
        assert_eq!(
            mode.choices(),
            Some(vec!["fast".to_string(), "slow".to_string()])
        );
        assert!(commit.is_literal());
        assert_eq!(commit.coerce("commit"), Some(Value::Text("commit".to_string())));
        assert_eq!(commit.coerce("push"), None);
        assert!(Arc::ptr_eq(&mode, &registry.enumeration(&["fast", "slow"])));
    }

    #[rstest]
    #[case("String", "-", true)]
    #[case("Int", "-4", true)]
    #[case("Int", "4.5", false)]
    #[case("Number", "4.5", true)]
    #[case("Number", "inf", false)]
    #[case("Boolean", "yes", true)]
    #[case("Boolean", "maybe", false)]
    #[case("Count", "0", true)]
    #[case("Count", "-1", false)]
    fn standard_coerce(#[case] name: &str, #[case] text: &str, #[case] expected_ok: bool) {
        let registry = TypeRegistry::standard();

        assert_eq!(
            registry.resolve(name).unwrap().coerce(text).is_some(),
            expected_ok
        );
    }

    #[test]
    fn topic_acceptance() {
        let registry = file_registry();

        assert!(registry.resolve("File").unwrap().accepts(&Value::Topic));
        assert!(!registry.resolve("Str").unwrap().accepts(&Value::Topic));
    }

    #[test]
    fn list_constructor_inherited() {
        let registry = TypeRegistry::standard();
        registry
            .register(
                TypeDescriptor::primitive(
                    "Words",
                    |text| Some(Value::Text(text.to_string())),
                    |value| matches!(value, Value::Text(_)),
                )
                .list_constructor(|values| {
                    let words: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    Value::Text(words.join(" "))
                }),
            )
            .unwrap();

        let descriptor = registry.resolve("KeyWords").unwrap();

        assert_eq!(
            descriptor.construct_list(vec![
                Value::Text("a".to_string()),
                Value::Text("b".to_string())
            ]),
            Value::Text("a b".to_string())
        );
    }

    #[rstest]
    #[case("INT", "Int", None)]
    #[case("INT1", "Int", Some("1"))]
    #[case("BYTE_COUNT", "ByteCount", None)]
    #[case("ICO_FILE23", "IcoFile", Some("23"))]
    fn identifier(#[case] text: &str, #[case] name: &str, #[case] suffix: Option<&str>) {
        assert_eq!(
            type_name_from_identifier(text).unwrap(),
            (name.to_string(), suffix.map(|s| s.to_string()))
        );
    }

    #[rstest]
    #[case("Int")]
    #[case("A_B_C")]
    #[case("_A")]
    #[case("1A")]
    fn identifier_invalid(#[case] text: &str) {
        assert_eq!(
            type_name_from_identifier(text).unwrap_err(),
            TypeError::InvalidTypeIdentifier(text.to_string())
        );
    }
}
