use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::constant::{BOOLEAN_TYPE, COUNT_TYPE, NEGATION_PREFIX};
use crate::grammar::{option_key, NamedOptionNode, OptionValue};
use crate::model::{DefaultValue, Value};
use crate::types::{TypeError, TypeRef, TypeRegistry};

#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum OptionModelError {
    #[error("The option '{0}' is declared more than once.")]
    DuplicateDeclaration(String),

    #[error("The negated option '{0}' cannot repeat.")]
    NegatedRecurring(String),

    #[error("The option '{0}' is already declared; it cannot be redeclared with a type or default.")]
    ConflictingDeclaration(String),

    #[error("Cannot determine a type for the option '{0}'.")]
    MissingType(String),

    #[error("The boolean option '{0}' requires a default.")]
    MissingDefault(String),

    #[error("The switch '{0}' is claimed by more than one option.")]
    DuplicateOption(String),

    #[error("{0}")]
    Type(#[from] TypeError),
}

/// How many values a switch takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// A boolean switch.
    None,
    /// `--name=VALUE` or `--name VALUE`.
    Required,
    /// `--name=VALUE`, or `--name` alone for the implied value.
    Optional,
}

/// Where an option was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginGroup {
    /// The usage text.
    Usage,
    /// The binding layer.
    Inline,
    /// A host platform, by name.
    Platform(String),
}

/// Which sides of a boolean switch are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negation {
    /// Only `--x`.
    Affirmative,
    /// Only `--no-x`.
    Negative,
    /// Both `--x` and `--no-x`: the caller must pick a side.
    Both,
}

/// One logical named option, reconciled from every declaration of its key.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedOption {
    key: String,
    switch_spellings: Vec<String>,
    negative_spellings: Vec<String>,
    short_alias: Option<char>,
    type_ref: TypeRef,
    arity: Arity,
    mandatory: bool,
    recurs: bool,
    default: Option<DefaultValue>,
    origin: OriginGroup,
    negation: Option<Negation>,
    metavar: Option<String>,
    annotation: Option<String>,
}

impl NamedOption {
    /// The normalized key, ex: `dry_run`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The spellings binding the option (or the affirmative side of a boolean).
    pub fn switch_spellings(&self) -> &[String] {
        &self.switch_spellings
    }

    /// The `--no-..` spellings of a boolean.
    pub fn negative_spellings(&self) -> &[String] {
        &self.negative_spellings
    }

    /// The single character short alias, if any.
    pub fn short_alias(&self) -> Option<char> {
        self.short_alias
    }

    /// The type values are coerced to.
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// How many values each switch takes.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Whether the invocation must supply this option.
    pub fn mandatory(&self) -> bool {
        self.mandatory
    }

    /// Whether the option may be repeated.
    pub fn recurs(&self) -> bool {
        self.recurs
    }

    /// The value bound when the option is absent.
    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Where the option was declared.
    pub fn origin(&self) -> &OriginGroup {
        &self.origin
    }

    /// Which sides are declared, for a boolean switch.
    pub fn negation(&self) -> Option<Negation> {
        self.negation
    }

    /// The value label, ex: `INT`.
    pub fn metavar(&self) -> Option<&str> {
        self.metavar.as_deref()
    }

    /// Line-trailing `-- text`.
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// Whether this is a boolean switch.
    pub fn is_flag(&self) -> bool {
        self.arity == Arity::None
    }

    /// The spelling used in messages, ex: `--dry-run`.
    pub fn primary_spelling(&self) -> &str {
        self.switch_spellings
            .iter()
            .chain(self.negative_spellings.iter())
            .find(|s| s.starts_with("--"))
            .or_else(|| self.switch_spellings.first())
            .map(|s| s.as_str())
            .unwrap_or(&self.key)
    }

    /// Every spelling, affirmative then negative.
    pub fn spellings(&self) -> impl Iterator<Item = &String> {
        self.switch_spellings
            .iter()
            .chain(self.negative_spellings.iter())
    }

    pub(crate) fn with_origin(mut self, origin: OriginGroup) -> Self {
        self.origin = origin;
        self
    }

    fn from_node(
        node: &NamedOptionNode,
        mandatory: bool,
        boolean: &TypeRef,
        count: &TypeRef,
    ) -> Self {
        let (type_ref, arity) = match &node.value {
            OptionValue::Flag if node.recurs => (count.clone(), Arity::None),
            OptionValue::Flag => (boolean.clone(), Arity::None),
            OptionValue::Required(type_ref) => (type_ref.clone(), Arity::Required),
            OptionValue::Optional(type_ref) => (type_ref.clone(), Arity::Optional),
        };
        let (switch_spellings, negative_spellings, negation) = if node.negated {
            (Vec::default(), node.switch_spellings.clone(), Some(Negation::Negative))
        } else if arity == Arity::None {
            (node.switch_spellings.clone(), Vec::default(), Some(Negation::Affirmative))
        } else {
            (node.switch_spellings.clone(), Vec::default(), None)
        };

        let mut option = Self {
            key: node.key.clone(),
            switch_spellings,
            negative_spellings,
            short_alias: node.short_alias,
            type_ref,
            arity,
            mandatory,
            recurs: node.recurs,
            default: None,
            origin: OriginGroup::Usage,
            negation,
            metavar: node.metavar.clone(),
            annotation: node.annotation.clone(),
        };
        option.default = option.implicit_default();
        option
    }

    fn implicit_default(&self) -> Option<DefaultValue> {
        match (self.negation, self.recurs) {
            (Some(_), true) => Some(DefaultValue::Instantiated(Value::Count(0))),
            (Some(Negation::Affirmative), false) => {
                Some(DefaultValue::Instantiated(Value::Boolean(false)))
            }
            (Some(Negation::Negative), false) => {
                Some(DefaultValue::Instantiated(Value::Boolean(true)))
            }
            _ => None,
        }
    }

    // Collapse `--x` and `--no-x` into one tri-state switch.
    fn pair(self, other: Self) -> Result<Self, OptionModelError> {
        let (mut affirmative, negative) = match (self.negation, other.negation) {
            (Some(Negation::Affirmative), Some(Negation::Negative)) => (self, other),
            (Some(Negation::Negative), Some(Negation::Affirmative)) => (other, self),
            _ => return Err(OptionModelError::DuplicateDeclaration(self.key)),
        };

        if affirmative.recurs {
            return Err(OptionModelError::DuplicateDeclaration(affirmative.key));
        }

        affirmative.switch_spellings.extend(negative.switch_spellings);
        affirmative.negative_spellings = negative.negative_spellings;
        affirmative.short_alias = affirmative.short_alias.or(negative.short_alias);
        affirmative.mandatory = affirmative.mandatory || negative.mandatory;
        affirmative.annotation = affirmative.annotation.or(negative.annotation);
        affirmative.negation = Some(Negation::Both);
        affirmative.default = None;
        Ok(affirmative)
    }
}

/// Merge the usage declared options by key.
///
/// The result keeps the order of first declaration.
pub(crate) fn reconcile(
    mandatory: &[NamedOptionNode],
    optional: &[NamedOptionNode],
    registry: &TypeRegistry,
) -> Result<Vec<NamedOption>, OptionModelError> {
    let boolean = registry.resolve(BOOLEAN_TYPE)?;
    let count = registry.resolve(COUNT_TYPE)?;
    let mut options: Vec<NamedOption> = Vec::default();
    let mut positions: HashMap<String, usize> = HashMap::default();
    let declarations = mandatory
        .iter()
        .map(|node| (node, true))
        .chain(optional.iter().map(|node| (node, false)));

    for (node, is_mandatory) in declarations {
        if node.negated && node.recurs {
            return Err(OptionModelError::NegatedRecurring(
                node.switch_spellings.join("|"),
            ));
        }

        let option = NamedOption::from_node(node, is_mandatory, &boolean, &count);

        match positions.get(&node.key) {
            Some(&position) => {
                let existing = options.remove(position);
                options.insert(position, existing.pair(option)?);
            }
            None => {
                positions.insert(node.key.clone(), options.len());
                options.push(option);
            }
        }
    }

    #[cfg(feature = "tracing_debug")]
    {
        let keys: Vec<&str> = options.iter().map(|o| o.key()).collect();
        debug!("Reconciled named options: {keys:?}.");
    }

    Ok(options)
}

/// A named option declared by the binding layer.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineOption {
    name: String,
    type_name: Option<String>,
    default: Option<DefaultValue>,
}

impl InlineOption {
    /// Declare an option by name, ex: `dry-run` or `dry_run`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            default: None,
        }
    }

    /// Declare the option's type by name, ex: `Int`.
    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name.replace(type_name.into());
        self
    }

    /// Declare the option's default.
    pub fn default(mut self, default: DefaultValue) -> Self {
        self.default.replace(default);
        self
    }

    fn key(&self) -> String {
        option_key(&self.name).0
    }

    fn inferred_type_name(&self) -> Option<&str> {
        if let Some(type_name) = &self.type_name {
            return Some(type_name.as_str());
        }

        match &self.default {
            Some(DefaultValue::Instantiated(value)) => match value {
                Value::Text(_) => Some("String"),
                Value::Integer(_) => Some("Int"),
                Value::Number(_) => Some("Number"),
                Value::Boolean(_) => Some(BOOLEAN_TYPE),
                Value::Count(_) => Some(COUNT_TYPE),
                Value::List(_) | Value::Topic | Value::Tail(_) => None,
            },
            _ => None,
        }
    }

    /// Reconcile against the options already declared, producing a new option when the key is not yet declared.
    pub(crate) fn reconcile(
        &self,
        declared: &[NamedOption],
        registry: &TypeRegistry,
    ) -> Result<Option<NamedOption>, OptionModelError> {
        let key = self.key();

        if declared.iter().any(|o| o.key == key) {
            if self.type_name.is_some() || self.default.is_some() {
                return Err(OptionModelError::ConflictingDeclaration(key));
            }

            // A bare shadow of a usage option.
            return Ok(None);
        }

        let type_name = self
            .inferred_type_name()
            .ok_or_else(|| OptionModelError::MissingType(key.clone()))?;
        let type_ref = registry.resolve(type_name)?;
        let spelling = format!("--{}", key.replace('_', "-"));

        if type_ref.is_boolean() {
            let default = self
                .default
                .clone()
                .ok_or_else(|| OptionModelError::MissingDefault(key.clone()))?;
            let negative = format!("--{NEGATION_PREFIX}{}", key.replace('_', "-"));

            return Ok(Some(NamedOption {
                key,
                switch_spellings: vec![spelling],
                negative_spellings: vec![negative],
                short_alias: None,
                type_ref,
                arity: Arity::None,
                mandatory: false,
                recurs: false,
                default: Some(default),
                origin: OriginGroup::Inline,
                negation: Some(Negation::Both),
                metavar: None,
                annotation: None,
            }));
        }

        Ok(Some(NamedOption {
            key,
            switch_spellings: vec![spelling],
            negative_spellings: Vec::default(),
            short_alias: None,
            metavar: Some(type_ref.name().to_uppercase()),
            type_ref,
            arity: Arity::Required,
            mandatory: false,
            recurs: false,
            default: self.default.clone(),
            origin: OriginGroup::Inline,
            negation: None,
            annotation: None,
        }))
    }
}

/// The per-spelling record the token matcher consults.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOption {
    key: String,
    arity: Arity,
    implied_value: Option<Value>,
}

impl CliOption {
    /// The key the spelling binds.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// How many values the spelling takes.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// The value bound when the spelling appears without a value.
    pub fn implied_value(&self) -> Option<&Value> {
        self.implied_value.as_ref()
    }
}

/// Switch spelling to option lookup table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptionMap {
    spellings: BTreeMap<String, CliOption>,
}

impl CliOptionMap {
    /// Map every spelling of `options`.
    pub(crate) fn build(options: &[NamedOption]) -> Result<Self, OptionModelError> {
        let mut spellings: BTreeMap<String, CliOption> = BTreeMap::default();

        for option in options {
            let affirmative = CliOption {
                key: option.key.clone(),
                arity: option.arity,
                implied_value: match option.arity {
                    Arity::None | Arity::Optional => Some(Value::Boolean(true)),
                    Arity::Required => None,
                },
            };
            let negative = CliOption {
                key: option.key.clone(),
                arity: Arity::None,
                implied_value: Some(Value::Boolean(false)),
            };
            let entries = option
                .switch_spellings
                .iter()
                .map(|s| (s, &affirmative))
                .chain(option.negative_spellings.iter().map(|s| (s, &negative)));

            for (spelling, cli_option) in entries {
                if let Some(existing) = spellings.insert(spelling.clone(), cli_option.clone()) {
                    if existing.key != option.key {
                        return Err(OptionModelError::DuplicateOption(spelling.clone()));
                    }
                }
            }
        }

        Ok(Self { spellings })
    }

    /// Look up a spelling, ex: `--verbose` or `-v`.
    pub fn get(&self, spelling: &str) -> Option<&CliOption> {
        self.spellings.get(spelling)
    }

    /// Every spelling, in code point order.
    pub fn spellings(&self) -> impl Iterator<Item = &String> {
        self.spellings.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;
    use rstest::rstest;

    fn options(text: &str) -> Result<Vec<NamedOption>, OptionModelError> {
        let registry = TypeRegistry::standard();
        let ast = grammar::parse(text, &registry).unwrap();
        reconcile(&ast.mandatory, &ast.optional, &registry)
    }

    #[test]
    fn single_declarations() {
        // Setup
        let text = "--name=STR [--jobs|-j=INT] [--verbose|-v]... [--color[=(always|never)]]";

        // Execute
        let options = options(text).unwrap();

        // Verify
        let keys: Vec<&str> = options.iter().map(|o| o.key()).collect();
        assert_eq!(keys, vec!["name", "jobs", "verbose", "color"]);
        assert!(options[0].mandatory());
        assert_eq!(options[0].arity(), Arity::Required);
        assert_eq!(options[0].default(), None);
        assert!(!options[1].mandatory());
        assert_eq!(options[1].short_alias(), Some('j'));
        assert_eq!(options[1].primary_spelling(), "--jobs");
        assert!(options[2].recurs());
        assert!(options[2].is_flag());
        assert_eq!(options[2].type_ref().name(), "Count");
        assert_eq!(
            options[2].default(),
            Some(&DefaultValue::Instantiated(Value::Count(0)))
        );
        assert_eq!(options[3].arity(), Arity::Optional);
        assert_eq!(options[3].metavar(), Some("(always|never)"));
    }

    #[rstest]
    #[case("[--force]", Negation::Affirmative, Some(Value::Boolean(false)))]
    #[case("[--no-cache]", Negation::Negative, Some(Value::Boolean(true)))]
    #[case("[--color|--no-color]", Negation::Both, None)]
    #[case("[--color] [--no-color]", Negation::Both, None)]
    #[case("[--no-color] (--color)", Negation::Both, None)]
    fn boolean_defaults(
        #[case] text: &str,
        #[case] negation: Negation,
        #[case] default: Option<Value>,
    ) {
        let options = options(text).unwrap();

        assert_eq!(options.len(), 1);
        assert!(options[0].is_flag());
        assert!(options[0].type_ref().is_boolean());
        assert_eq!(options[0].negation(), Some(negation));
        assert_eq!(
            options[0].default(),
            default.map(DefaultValue::Instantiated).as_ref()
        );
    }

    #[test]
    fn boolean_pair_spellings() {
        let options = options("[--color|--no-color|-c]").unwrap();

        assert_eq!(options[0].switch_spellings(), &["--color", "-c"]);
        assert_eq!(options[0].negative_spellings(), &["--no-color"]);
        assert_eq!(options[0].short_alias(), Some('c'));
        assert_eq!(options[0].primary_spelling(), "--color");
    }

    #[test]
    fn negative_only_spellings() {
        let options = options("[--no-cache|-C]").unwrap();

        assert!(options[0].switch_spellings().is_empty());
        assert_eq!(options[0].negative_spellings(), &["--no-cache", "-C"]);
        assert_eq!(options[0].primary_spelling(), "--no-cache");
    }

    #[rstest]
    #[case("[--x] [--x]", OptionModelError::DuplicateDeclaration("x".to_string()))]
    #[case("[--x=INT] [--no-x]", OptionModelError::DuplicateDeclaration("x".to_string()))]
    #[case("[--x]... [--no-x]", OptionModelError::DuplicateDeclaration("x".to_string()))]
    #[case("[--no-x]...", OptionModelError::NegatedRecurring("--no-x".to_string()))]
    fn reconcile_errors(#[case] text: &str, #[case] expected: OptionModelError) {
        assert_eq!(options(text).unwrap_err(), expected);
    }

    #[test]
    fn inline_shadow() {
        let registry = TypeRegistry::standard();
        let declared = options("[--jobs=INT]").unwrap();

        assert_eq!(
            InlineOption::new("jobs").reconcile(&declared, &registry),
            Ok(None)
        );
        assert_eq!(
            InlineOption::new("jobs")
                .typed("Int")
                .reconcile(&declared, &registry),
            Err(OptionModelError::ConflictingDeclaration("jobs".to_string()))
        );
        assert_eq!(
            InlineOption::new("jobs")
                .default(DefaultValue::Raw("3".to_string()))
                .reconcile(&declared, &registry),
            Err(OptionModelError::ConflictingDeclaration("jobs".to_string()))
        );
    }

    #[test]
    fn inline_only() {
        // Setup
        let registry = TypeRegistry::standard();

        // Execute
        let limit = InlineOption::new("max-count")
            .default(DefaultValue::Instantiated(Value::Integer(10)))
            .reconcile(&[], &registry)
            .unwrap()
            .unwrap();
        let name = InlineOption::new("name")
            .typed("Str")
            .reconcile(&[], &registry)
            .unwrap()
            .unwrap();

        // Verify
        assert_eq!(limit.key(), "max_count");
        assert_eq!(limit.switch_spellings(), &["--max-count"]);
        assert_eq!(limit.type_ref().name(), "Int");
        assert_eq!(limit.origin(), &OriginGroup::Inline);
        assert_eq!(name.type_ref().name(), "String");
        assert_eq!(name.default(), None);
    }

    #[test]
    fn inline_boolean() {
        let registry = TypeRegistry::standard();

        let option = InlineOption::new("dry_run")
            .default(DefaultValue::Instantiated(Value::Boolean(true)))
            .reconcile(&[], &registry)
            .unwrap()
            .unwrap();

        assert!(option.is_flag());
        assert_eq!(option.switch_spellings(), &["--dry-run"]);
        assert_eq!(option.negative_spellings(), &["--no-dry-run"]);
        assert_eq!(
            option.default(),
            Some(&DefaultValue::Instantiated(Value::Boolean(true)))
        );
    }

    #[rstest]
    #[case(InlineOption::new("x"), OptionModelError::MissingType("x".to_string()))]
    #[case(
        InlineOption::new("x").default(DefaultValue::Raw("1".to_string())),
        OptionModelError::MissingType("x".to_string())
    )]
    #[case(InlineOption::new("x").typed("Bool"), OptionModelError::MissingDefault("x".to_string()))]
    #[case(
        InlineOption::new("x").typed("Widget"),
        OptionModelError::Type(TypeError::UnknownType("Widget".to_string()))
    )]
    fn inline_errors(#[case] inline: InlineOption, #[case] expected: OptionModelError) {
        let registry = TypeRegistry::standard();

        assert_eq!(inline.reconcile(&[], &registry).unwrap_err(), expected);
    }

    #[test]
    fn cli_map() {
        // Setup
        let options = options("[--color|--no-color|-c] [--jobs|-j=INT] [--tint[=STR]]").unwrap();

        // Execute
        let map = CliOptionMap::build(&options).unwrap();

        // Verify
        let spellings: Vec<&str> = map.spellings().map(|s| s.as_str()).collect();
        assert_eq!(
            spellings,
            vec!["--color", "--jobs", "--no-color", "--tint", "-c", "-j"]
        );
        assert_eq!(map.get("--color").unwrap().key(), "color");
        assert_eq!(
            map.get("-c").unwrap().implied_value(),
            Some(&Value::Boolean(true))
        );
        assert_eq!(
            map.get("--no-color").unwrap().implied_value(),
            Some(&Value::Boolean(false))
        );
        assert_eq!(map.get("-j").unwrap().arity(), Arity::Required);
        assert_eq!(map.get("-j").unwrap().implied_value(), None);
        assert_eq!(map.get("--tint").unwrap().arity(), Arity::Optional);
        assert_eq!(map.get("--missing"), None);
    }

    #[test]
    fn cli_map_duplicate() {
        let options = options("[--verbose|-v] [--version|-v]").unwrap();

        assert_eq!(
            CliOptionMap::build(&options).unwrap_err(),
            OptionModelError::DuplicateOption("-v".to_string())
        );
    }
}
