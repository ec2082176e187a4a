use std::collections::BTreeSet;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::environment::{Binder, Evaluator, LexicalEnvironment};
use crate::error::{ConfigError, ParseError};
use crate::grammar::{self, Node};
use crate::matcher::{CliParser, Token};
use crate::options::{
    self, Arity, CliOptionMap, InlineOption, NamedOption, OptionModelError, OriginGroup,
};
use crate::positional::{PositionalOption, PositionalTree};
use crate::types::TypeRegistry;

/// The compiled model of one usage text.
///
/// A `Usage` is immutable: merging options or enabling tail capture produces a new model.
///
/// ### Example
/// ```
/// # use argot_builder as argot;
/// use argot::{NoEvaluator, Token, TypeRegistry, Usage, Value};
///
/// let registry = TypeRegistry::standard();
/// let usage = Usage::parse("copy [--verbose|-v]... [--jobs|-j=INT] STR1 [STR2]", &registry).unwrap();
///
/// let environment = usage
///     .invoke(Token::classify_all(&["-vv", "-j4", "from"]), &NoEvaluator)
///     .unwrap();
/// assert_eq!(environment.get("verbose"), Some(&Value::Count(2)));
/// assert_eq!(environment.get("jobs"), Some(&Value::Integer(4)));
/// assert_eq!(environment.get("str1"), Some(&Value::Text("from".to_string())));
/// assert_eq!(environment.get("$2"), None);
/// ```
#[derive(Debug, Clone)]
pub struct Usage {
    literals: Vec<String>,
    options: Vec<NamedOption>,
    positional_terms: Vec<Node>,
    tree: PositionalTree,
    cli_options: CliOptionMap,
}

impl Usage {
    /// Compile `text` against `registry`.
    pub fn parse(text: &str, registry: &TypeRegistry) -> Result<Self, ConfigError> {
        let ast = grammar::parse(text, registry)?;
        let options = options::reconcile(&ast.mandatory, &ast.optional, registry)?;
        let tree = PositionalTree::build(&ast.positionals, registry)?;
        let cli_options = CliOptionMap::build(&options)?;

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Compiled usage '{text}'.");
        }

        Ok(Self {
            literals: ast.literals,
            options,
            positional_terms: ast.positionals,
            tree,
            cli_options,
        })
    }

    /// The leading command words.
    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    /// Every named option, in declaration order.
    pub fn options(&self) -> &[NamedOption] {
        &self.options
    }

    /// Every positional parameter, in index order.
    pub fn positionals(&self) -> &[PositionalOption] {
        self.tree.options()
    }

    /// The named option under `key`.
    pub fn option(&self, key: &str) -> Option<&NamedOption> {
        self.options.iter().find(|o| o.key() == key)
    }

    /// The positional branch structure.
    pub fn tree(&self) -> &PositionalTree {
        &self.tree
    }

    /// The switch spelling lookup.
    pub fn cli_options(&self) -> &CliOptionMap {
        &self.cli_options
    }

    /// The switch spellings declared by both `self` and `other`, sorted.
    pub fn conflicting_option_names(&self, other: &Usage) -> Vec<String> {
        other
            .cli_options
            .spellings()
            .filter(|spelling| self.cli_options.get(spelling).is_some())
            .cloned()
            .collect()
    }

    /// Merge the named options of `other` (ex: platform options such as `--cwd`) into a new model.
    ///
    /// Only `other`'s named options are taken; its literals and positionals are ignored.
    pub fn add_options(&self, other: &Usage, origin: OriginGroup) -> Result<Self, ConfigError> {
        let mut merged = self.clone();

        for option in other.options() {
            if merged.option(option.key()).is_some() {
                return Err(OptionModelError::DuplicateDeclaration(option.key().to_string()).into());
            }

            merged.options.push(option.clone().with_origin(origin.clone()));
        }

        merged.cli_options = CliOptionMap::build(&merged.options)?;
        Ok(merged)
    }

    /// Reconcile the options declared by the binding layer into a new model.
    ///
    /// A bare inline declaration of a key the usage already declares is a shadow, and adds nothing.
    pub fn with_inline_options(
        &self,
        inline: &[InlineOption],
        registry: &TypeRegistry,
    ) -> Result<Self, ConfigError> {
        let mut merged = self.clone();

        for declaration in inline {
            if let Some(option) = declaration.reconcile(&merged.options, registry)? {
                merged.options.push(option);
            }
        }

        merged.cli_options = CliOptionMap::build(&merged.options)?;
        Ok(merged)
    }

    /// Capture every token after the longest positional branch verbatim, under the key `...`.
    pub fn add_trailing_capture(&self) -> Result<Self, ConfigError> {
        let mut merged = self.clone();
        merged.tree = merged.tree.with_tail_capture()?;

        if !merged.positional_terms.contains(&Node::Rest) {
            merged.positional_terms.push(Node::Rest);
        }

        Ok(merged)
    }

    /// A canonical usage line: literals, then options, then positionals.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self.literals.clone();
        parts.extend(self.options.iter().map(describe_option));
        parts.extend(self.positional_terms.iter().map(|term| term.to_string()));
        parts.join(" ")
    }

    /// Match, bind and finalize one invocation.
    ///
    /// `tokens` exclude the leading command words.
    pub fn invoke(
        &self,
        tokens: impl IntoIterator<Item = Token>,
        evaluator: &dyn Evaluator,
    ) -> Result<LexicalEnvironment, ParseError> {
        let mut binder = Binder::new(self);

        for descriptor in CliParser::new(&self.cli_options, tokens, self.tree.tail_start()) {
            binder.feed(descriptor?)?;
        }

        binder.finalize(evaluator)
    }
}

fn describe_option(option: &NamedOption) -> String {
    let mut spellings: Vec<&str> = Vec::default();
    let mut seen = BTreeSet::default();

    for spelling in option.spellings() {
        if seen.insert(spelling.as_str()) {
            spellings.push(spelling.as_str());
        }
    }

    let mut text = spellings.join("|");

    match (option.arity(), option.metavar()) {
        (Arity::Required, Some(metavar)) => text.push_str(&format!("={metavar}")),
        (Arity::Optional, Some(metavar)) => text.push_str(&format!("[={metavar}]")),
        _ => {}
    }

    let text = match (option.mandatory(), spellings.len()) {
        (true, 1) => text,
        (true, _) => format!("({text})"),
        (false, _) => format!("[{text}]"),
    };

    if option.recurs() {
        format!("{text}...")
    } else {
        text
    }
}
