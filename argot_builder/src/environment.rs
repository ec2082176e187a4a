use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::constant::{FILE_TOPIC, POSITIONAL_ARRAY_KEY, TAIL_KEY};
use crate::error::ParseError;
use crate::matcher::{Descriptor, DescriptorKey, Payload, Token};
use crate::model::{DefaultValue, Value};
use crate::options::Negation;
use crate::positional::Slot;
use crate::types::TypeRef;
use crate::usage::Usage;

#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BindError {
    #[error("Cannot repeat option '{0}'.")]
    DuplicateOption(String),

    #[error("Missing option '{0}'.")]
    MissingOption(String),

    /// Neither side of a declared `--x|--no-x` pair was supplied, and nothing defaults it.
    ///
    /// This is the missing value case for boolean pairs; it reads as a missing option.
    #[error("Missing option '{affirmative}' or '{negative}'.")]
    MissingChoice {
        affirmative: String,
        negative: String,
    },

    #[error("Invalid value '{value}' for '{parameter}': expected {expected}.")]
    TypeCoercion {
        value: String,
        parameter: String,
        target_type: String,
        expected: String,
    },

    #[error("The file topic '-' is already bound to '{first}'; it cannot also bind '{second}'.")]
    PlaceholderReused { first: String, second: String },

    #[error("Cannot evaluate '{parameter}': {message}")]
    Evaluation { parameter: String, message: String },

    #[error("No parameter answers to the key '{0}'.")]
    UnknownKey(String),
}

/// Read access to bound values, handed to the [`Evaluator`].
pub trait EnvironmentView {
    /// The value bound to `key`, if any.
    fn get(&self, key: &str) -> Option<&Value>;
}

/// Resolves expression-valued arguments into Cli text.
pub trait Evaluator {
    /// Evaluate `expression` against the values bound so far, or describe why it cannot be.
    fn evaluate(&self, expression: &str, view: &dyn EnvironmentView) -> Result<String, String>;
}

/// Rejects every expression.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvaluator;

impl Evaluator for NoEvaluator {
    fn evaluate(&self, expression: &str, _view: &dyn EnvironmentView) -> Result<String, String> {
        Err(format!("expressions are not supported ('{expression}')."))
    }
}

/// A deterministic evaluator for tests.
///
/// `env:NAME` reads from a fixed map, `$key` reads an already bound value.
#[cfg(any(test, feature = "unit_test"))]
#[derive(Debug, Clone, Default)]
pub struct MapEvaluator {
    variables: HashMap<String, String>,
}

#[cfg(any(test, feature = "unit_test"))]
impl MapEvaluator {
    /// An evaluator with no variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define the variable `name`.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

#[cfg(any(test, feature = "unit_test"))]
impl Evaluator for MapEvaluator {
    fn evaluate(&self, expression: &str, view: &dyn EnvironmentView) -> Result<String, String> {
        if let Some(name) = expression.strip_prefix("env:") {
            self.variables
                .get(name)
                .cloned()
                .ok_or_else(|| format!("undefined variable '{name}'."))
        } else if let Some(key) = expression.strip_prefix('$') {
            view.get(key)
                .map(|value| value.to_string())
                .ok_or_else(|| format!("unbound key '{key}'."))
        } else {
            Err(format!("unsupported expression '{expression}'."))
        }
    }
}

/// The finalized, type coerced, defaulted values of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexicalEnvironment {
    values: BTreeMap<String, Value>,
    explicit: BTreeSet<String>,
}

impl LexicalEnvironment {
    /// The value bound to `key`: an option key, a positional key (`$1`), an alias, `$`, or `...`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether `key` was supplied by the invocation (rather than defaulted).
    pub fn is_explicit(&self, key: &str) -> bool {
        self.explicit.contains(key)
    }

    /// Every positional value, in argument order.
    pub fn positionals(&self) -> &[Value] {
        self.values
            .get(POSITIONAL_ARRAY_KEY)
            .and_then(|value| value.as_list())
            .unwrap_or(&[])
    }

    /// Every bound key.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Take the bound values.
    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl EnvironmentView for LexicalEnvironment {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

struct LayeredView<'a> {
    partial: &'a BTreeMap<String, Value>,
    completed: &'a BTreeMap<String, Value>,
}

impl<'a> EnvironmentView for LayeredView<'a> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.completed.get(key).or_else(|| self.partial.get(key))
    }
}

#[derive(Debug)]
enum Entry {
    Ready(Value),
    Deferred(String),
}

#[derive(Debug)]
struct Pending {
    key: String,
    parameter: String,
    type_ref: TypeRef,
    entries: Vec<Entry>,
    list: bool,
}

#[derive(Debug, Default)]
struct TopicClaim {
    first: Option<String>,
}

impl TopicClaim {
    fn coerce(
        &mut self,
        type_ref: &TypeRef,
        text: &str,
        parameter: &str,
    ) -> Result<Value, BindError> {
        if text == FILE_TOPIC && type_ref.accepts_placeholder_input() {
            if let Some(first) = &self.first {
                return Err(BindError::PlaceholderReused {
                    first: first.clone(),
                    second: parameter.to_string(),
                });
            }

            self.first.replace(parameter.to_string());
            return Ok(Value::Topic);
        }

        type_ref
            .coerce(text)
            .ok_or_else(|| BindError::TypeCoercion {
                value: text.to_string(),
                parameter: parameter.to_string(),
                target_type: type_ref.name().to_string(),
                expected: match type_ref.choices() {
                    Some(choices) => format!("one of {}", choices.join(", ")),
                    None => type_ref.name().to_string(),
                },
            })
    }

    fn entry(
        &mut self,
        type_ref: &TypeRef,
        payload: Payload,
        parameter: &str,
    ) -> Result<Entry, BindError> {
        match payload {
            Payload::Text(text) => Ok(Entry::Ready(self.coerce(type_ref, &text, parameter)?)),
            Payload::Instantiated(value) => Ok(Entry::Ready(value)),
            Payload::Deferred(expression) => Ok(Entry::Deferred(expression)),
            Payload::Tail(tokens) => Ok(Entry::Ready(Value::Tail(tokens))),
        }
    }
}

// Phase one output: directly bound values plus the expressions still to resolve.
#[derive(Debug, Default)]
struct PartialEnvironment {
    values: BTreeMap<String, Value>,
    explicit: BTreeSet<String>,
    pending: Vec<Pending>,
}

impl PartialEnvironment {
    fn bind(
        &mut self,
        key: &str,
        parameter: &str,
        type_ref: &TypeRef,
        entries: Vec<Entry>,
        list: bool,
    ) {
        if entries.iter().all(|e| matches!(e, Entry::Ready(_))) {
            let mut values: Vec<Value> = entries
                .into_iter()
                .filter_map(|e| match e {
                    Entry::Ready(value) => Some(value),
                    Entry::Deferred(_) => None,
                })
                .collect();
            let value = if list {
                type_ref.construct_list(values)
            } else {
                match values.pop() {
                    Some(value) => value,
                    None => unreachable!("internal error - a single parameter binds one value"),
                }
            };
            self.values.insert(key.to_string(), value);
        } else {
            self.pending.push(Pending {
                key: key.to_string(),
                parameter: parameter.to_string(),
                type_ref: type_ref.clone(),
                entries,
                list,
            });
        }
    }

    fn bind_default(
        &mut self,
        key: &str,
        parameter: &str,
        type_ref: &TypeRef,
        default: &DefaultValue,
        list: bool,
        topic: &mut TopicClaim,
    ) -> Result<(), BindError> {
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Defaulting '{key}' to {default:?}.");
        }

        let value = match default {
            DefaultValue::Instantiated(value) => value.clone(),
            DefaultValue::Raw(text) => {
                let value = topic.coerce(type_ref, text, parameter)?;

                if list {
                    type_ref.construct_list(vec![value])
                } else {
                    value
                }
            }
        };
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    named: HashMap<String, Vec<Payload>>,
    positionals: Vec<Payload>,
    tail: Option<Vec<Token>>,
}

/// Accumulates matched descriptors and finalizes them into a [`LexicalEnvironment`].
///
/// ### Example
/// ```
/// # use argot_builder as argot;
/// use argot::{Binder, CliParser, NoEvaluator, Token, TypeRegistry, Usage, Value};
///
/// let registry = TypeRegistry::standard();
/// let usage = Usage::parse("[--jobs=INT] STR", &registry).unwrap();
/// let mut binder = Binder::new(&usage);
/// let tokens = Token::classify_all(&["--jobs=2", "abc"]);
///
/// for descriptor in CliParser::new(usage.cli_options(), tokens, usage.tree().tail_start()) {
///     binder.feed(descriptor.unwrap()).unwrap();
/// }
///
/// let environment = binder.finalize(&NoEvaluator).unwrap();
/// assert_eq!(environment.get("jobs"), Some(&Value::Integer(2)));
/// assert_eq!(environment.get("str"), Some(&Value::Text("abc".to_string())));
/// ```
#[derive(Debug)]
pub struct Binder<'u> {
    usage: &'u Usage,
    defaults: BTreeMap<String, DefaultValue>,
    state: Option<Accumulator>,
}

impl<'u> Binder<'u> {
    /// Bind against `usage`.
    pub fn new(usage: &'u Usage) -> Self {
        Self {
            usage,
            defaults: BTreeMap::default(),
            state: Some(Accumulator::default()),
        }
    }

    /// Supply a host default for `key`, overriding any implicit default.
    pub fn with_default(mut self, key: impl Into<String>, default: DefaultValue) -> Self {
        self.defaults.insert(key.into(), default);
        self
    }

    /// Accumulate one descriptor.
    pub fn feed(&mut self, descriptor: Descriptor) -> Result<(), ParseError> {
        let usage = self.usage;
        let state = self.state.as_mut().ok_or_else(|| {
            ParseError::Internal("cannot feed a finalized environment.".to_string())
        })?;

        match descriptor.key {
            DescriptorKey::Named(key) => {
                let option = usage
                    .option(&key)
                    .ok_or_else(|| BindError::UnknownKey(key.clone()))?;
                let occurrences = state.named.entry(key).or_default();

                if !option.recurs() && !occurrences.is_empty() {
                    let spelling = descriptor
                        .spelling
                        .unwrap_or_else(|| option.primary_spelling().to_string());
                    return Err(BindError::DuplicateOption(spelling).into());
                }

                occurrences.push(descriptor.payload);
            }
            DescriptorKey::Positional(index) => {
                if index != state.positionals.len() {
                    return Err(ParseError::Internal(format!(
                        "positional {index} arrived out of order."
                    )));
                }

                state.positionals.push(descriptor.payload);
            }
            DescriptorKey::Tail => match descriptor.payload {
                Payload::Tail(tokens) => {
                    state.tail.replace(tokens);
                }
                _ => {
                    return Err(ParseError::Internal(
                        "a tail descriptor must carry tokens.".to_string(),
                    ))
                }
            },
        }

        Ok(())
    }

    /// Bind, default and coerce every parameter, then resolve deferred expressions in declaration order.
    ///
    /// Finalization happens once; a second call is an internal error.
    pub fn finalize(
        &mut self,
        evaluator: &dyn Evaluator,
    ) -> Result<LexicalEnvironment, ParseError> {
        let mut state = self.state.take().ok_or_else(|| {
            ParseError::Internal("the environment is already finalized.".to_string())
        })?;
        let usage = self.usage;
        let tree = usage.tree();

        for key in self.defaults.keys() {
            if usage.option(key).is_none() && !tree.options().iter().any(|o| o.key() == key) {
                return Err(BindError::UnknownKey(key.clone()).into());
            }
        }

        let mut partial = PartialEnvironment::default();
        let mut topic = TopicClaim::default();

        for option in usage.options() {
            let key = option.key();
            let parameter = option.primary_spelling();

            match state.named.remove(key).filter(|o| !o.is_empty()) {
                Some(occurrences) => {
                    partial.explicit.insert(key.to_string());

                    if option.is_flag() && option.recurs() {
                        let count = occurrences.len() as u64;
                        partial.values.insert(key.to_string(), Value::Count(count));
                    } else {
                        let entries = occurrences
                            .into_iter()
                            .map(|payload| topic.entry(option.type_ref(), payload, parameter))
                            .collect::<Result<Vec<Entry>, BindError>>()?;
                        partial.bind(key, parameter, option.type_ref(), entries, option.recurs());
                    }
                }
                None => match self.defaults.get(key).or(option.default()) {
                    Some(default) => partial.bind_default(
                        key,
                        parameter,
                        option.type_ref(),
                        default,
                        option.recurs() && !option.is_flag(),
                        &mut topic,
                    )?,
                    None if option.negation() == Some(Negation::Both) => {
                        let negative = option
                            .negative_spellings()
                            .first()
                            .cloned()
                            .unwrap_or_default();
                        return Err(BindError::MissingChoice {
                            affirmative: parameter.to_string(),
                            negative,
                        }
                        .into());
                    }
                    None if option.recurs() => {
                        let empty = option.type_ref().construct_list(Vec::default());
                        partial.values.insert(key.to_string(), empty);
                    }
                    None if option.mandatory() => {
                        return Err(BindError::MissingOption(parameter.to_string()).into());
                    }
                    None => {}
                },
            }
        }

        for (option, slot) in tree.arrange(std::mem::take(&mut state.positionals))? {
            let parameter = option.source_identifier();
            let (payloads, list) = match slot {
                Slot::Single(payload) => (vec![payload], false),
                Slot::List(payloads) => (payloads, true),
            };
            let entries = payloads
                .into_iter()
                .map(|payload| topic.entry(option.type_ref(), payload, parameter))
                .collect::<Result<Vec<Entry>, BindError>>()?;
            partial.bind(option.key(), parameter, option.type_ref(), entries, list);
            partial.explicit.insert(option.key().to_string());
        }

        // Positional lists stay unbound when empty, unless the host supplies a default.
        for option in tree.options() {
            if partial.values.contains_key(option.key())
                || partial.pending.iter().any(|p| p.key == option.key())
            {
                continue;
            }

            if let Some(default) = self.defaults.get(option.key()) {
                partial.bind_default(
                    option.key(),
                    option.source_identifier(),
                    option.type_ref(),
                    default,
                    option.recurs(),
                    &mut topic,
                )?;
            }
        }

        if let Some(tokens) = state.tail.take() {
            partial.values.insert(TAIL_KEY.to_string(), Value::Tail(tokens));
            partial.explicit.insert(TAIL_KEY.to_string());
        }

        let completed = resolve_pending(&mut partial, evaluator, &mut topic)?;
        let mut values = partial.values;
        values.extend(completed);
        let mut explicit = partial.explicit;

        let mut ordered = Vec::default();
        let mut aliases = Vec::default();

        for option in tree.options() {
            let value = match values.get(option.key()) {
                Some(value) => value,
                None => continue,
            };

            match (option.recurs(), value.as_list()) {
                (true, Some(items)) => ordered.extend(items.iter().cloned()),
                _ => ordered.push(value.clone()),
            }

            for alias in option.alias_set() {
                if !values.contains_key(alias) {
                    aliases.push((alias.clone(), option.key().to_string(), value.clone()));
                }
            }
        }

        for (alias, key, value) in aliases {
            if explicit.contains(&key) {
                explicit.insert(alias.clone());
            }

            values.insert(alias, value);
        }

        values.insert(POSITIONAL_ARRAY_KEY.to_string(), Value::List(ordered));
        Ok(LexicalEnvironment { values, explicit })
    }
}

fn resolve_pending(
    partial: &mut PartialEnvironment,
    evaluator: &dyn Evaluator,
    topic: &mut TopicClaim,
) -> Result<BTreeMap<String, Value>, BindError> {
    let mut completed: BTreeMap<String, Value> = BTreeMap::default();

    for pending in std::mem::take(&mut partial.pending) {
        let mut values = Vec::default();

        for entry in pending.entries {
            let value = match entry {
                Entry::Ready(value) => value,
                Entry::Deferred(expression) => {
                    let view = LayeredView {
                        partial: &partial.values,
                        completed: &completed,
                    };
                    let text = evaluator.evaluate(&expression, &view).map_err(|message| {
                        BindError::Evaluation {
                            parameter: pending.parameter.clone(),
                            message,
                        }
                    })?;

                    #[cfg(feature = "tracing_debug")]
                    {
                        debug!("Resolved '{expression}' for '{}' to '{text}'.", pending.key);
                    }

                    topic.coerce(&pending.type_ref, &text, &pending.parameter)?
                }
            };
            values.push(value);
        }

        let value = if pending.list {
            pending.type_ref.construct_list(values)
        } else {
            match values.pop() {
                Some(value) => value,
                None => unreachable!("internal error - a single parameter binds one value"),
            }
        };
        completed.insert(pending.key, value);
    }

    Ok(completed)
}
