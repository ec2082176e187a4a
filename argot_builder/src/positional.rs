use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::constant::POSITIONAL_KEY_PREFIX;
use crate::grammar::Node;
use crate::types::{TypeRef, TypeRegistry};

#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AmbiguityError {
    #[error("Only one positional list is allowed, found '{first}' and '{second}'.")]
    MultipleLists { first: String, second: String },

    #[error("The positional list '{0}' must sit at the deepest optional level.")]
    ListNotDeepest(String),

    #[error("A trailing capture cannot follow the positional list '{0}'.")]
    TailAfterList(String),
}

/// The positional argument count did not fit any branch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentCountError {
    /// Fewer arguments than the shortest branch.
    TooFew {
        /// The shortest branch length.
        needed: usize,
        /// The number of arguments supplied.
        got: usize,
        /// Whether longer branches exist.
        ranged: bool,
    },
    /// More arguments than the longest branch.
    TooMany {
        /// The longest branch length.
        limit: usize,
        /// The number of arguments supplied.
        got: usize,
        /// Whether shorter branches exist.
        ranged: bool,
    },
    /// The count falls between branch lengths.
    NoMatchingBranch {
        /// The accepted branch lengths.
        lengths: Vec<BranchLength>,
        /// The number of arguments supplied.
        got: usize,
    },
}

fn arguments(count: usize) -> &'static str {
    if count == 1 {
        "argument"
    } else {
        "arguments"
    }
}

impl std::fmt::Display for ArgumentCountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgumentCountError::TooFew {
                needed,
                got,
                ranged,
            } => {
                let qualifier = if *ranged { "at least" } else { "exactly" };
                write!(
                    f,
                    "Required {qualifier} {needed} {}, got {got}.",
                    arguments(*needed)
                )
            }
            ArgumentCountError::TooMany { limit, got, ranged } => {
                let qualifier = if *ranged { "at most" } else { "exactly" };
                write!(
                    f,
                    "Required {qualifier} {limit} {}, got {got}.",
                    arguments(*limit)
                )
            }
            ArgumentCountError::NoMatchingBranch { lengths, got } => {
                let parts: Vec<String> = lengths.iter().map(|l| l.to_string()).collect();
                let listing = match parts.split_last() {
                    Some((last, [])) => last.clone(),
                    Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
                    None => String::default(),
                };
                write!(f, "Required {listing} arguments, got {got}.")
            }
        }
    }
}

/// The length of one branch: fixed, or open ended when the branch holds the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchLength {
    /// Exactly this many arguments.
    Exactly(usize),
    /// This many arguments or more.
    AtLeast(usize),
}

impl BranchLength {
    fn minimum(&self) -> usize {
        match self {
            BranchLength::Exactly(length) | BranchLength::AtLeast(length) => *length,
        }
    }

    fn admits(&self, count: usize) -> bool {
        match self {
            BranchLength::Exactly(length) => count == *length,
            BranchLength::AtLeast(length) => count >= *length,
        }
    }
}

impl std::fmt::Display for BranchLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchLength::Exactly(length) => write!(f, "{length}"),
            BranchLength::AtLeast(length) => write!(f, "at least {length}"),
        }
    }
}

/// One positional parameter of the longest branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalOption {
    key: String,
    index: usize,
    depth: usize,
    type_ref: TypeRef,
    recurs: bool,
    min_occurs: u8,
    source_type_name: String,
    source_identifier: String,
    alias_set: BTreeSet<String>,
    annotation: Option<String>,
}

impl PositionalOption {
    /// The binding key, ex: `$1`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The zero based position within the longest branch.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The optional nesting level, `0` for parameters present in every branch.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The type values are coerced to.
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Whether this is the list parameter.
    pub fn recurs(&self) -> bool {
        self.recurs
    }

    /// The minimum list length: `0` for `[TYPE]...`, `1` for `TYPE...` (and for any non-list).
    pub fn min_occurs(&self) -> u8 {
        self.min_occurs
    }

    /// The type name as resolved from the grammar.
    pub fn source_type_name(&self) -> &str {
        &self.source_type_name
    }

    /// The exact token written in the grammar, ex: `INT2`.
    pub fn source_identifier(&self) -> &str {
        &self.source_identifier
    }

    /// Additional keys this parameter is published under.
    pub fn alias_set(&self) -> &BTreeSet<String> {
        &self.alias_set
    }

    /// Line-trailing `-- text` of a list.
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }
}

/// An argument assigned to its parameter slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<T> {
    /// The value for a single parameter.
    Single(T),
    /// The values folded into the list parameter.
    List(Vec<T>),
}

/// The branch structure over all legal positional argument counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalTree {
    options: Vec<PositionalOption>,
    branches: Vec<BranchLength>,
    has_optional: bool,
    shortest: usize,
    longest: Option<usize>,
    tail_start: Option<usize>,
}

struct Leaf<'a> {
    node: &'a Node,
    depth: usize,
    recurs: bool,
    min_occurs: u8,
    annotation: Option<String>,
}

fn flatten<'a>(
    nodes: &'a [Node],
    depth: usize,
    leaves: &mut Vec<Leaf<'a>>,
    max_depth: &mut usize,
    rest: &mut bool,
) {
    *max_depth = std::cmp::max(*max_depth, depth);

    for node in nodes {
        match node {
            Node::Optional(inner) => flatten(inner, depth + 1, leaves, max_depth, rest),
            Node::List {
                inner,
                min_occurs,
                annotation,
            } => leaves.push(Leaf {
                node: inner,
                depth,
                recurs: true,
                min_occurs: *min_occurs,
                annotation: annotation.clone(),
            }),
            Node::Rest => *rest = true,
            _ => leaves.push(Leaf {
                node,
                depth,
                recurs: false,
                min_occurs: 1,
                annotation: None,
            }),
        }
    }
}

impl PositionalTree {
    /// Build the tree for a positional sequence.
    pub(crate) fn build(nodes: &[Node], registry: &TypeRegistry) -> Result<Self, AmbiguityError> {
        let mut leaves = Vec::default();
        let mut max_depth = 0;
        let mut rest = false;
        flatten(nodes, 0, &mut leaves, &mut max_depth, &mut rest);

        let mut options: Vec<PositionalOption> = Vec::default();
        let mut list: Option<usize> = None;

        for (index, leaf) in leaves.into_iter().enumerate() {
            let (type_ref, source_type_name, source_identifier) = match leaf.node {
                Node::Literal(text) => (registry.literal(text), text.clone(), text.clone()),
                Node::Positional {
                    type_ref,
                    source_identifier,
                }
                | Node::PositionalWithSuffix {
                    type_ref,
                    source_identifier,
                    ..
                } => (
                    type_ref.clone(),
                    type_ref.name().to_string(),
                    source_identifier.clone(),
                ),
                Node::PositionalVariant { type_ref, .. } | Node::Enum { type_ref, .. } => (
                    type_ref.clone(),
                    type_ref.name().to_string(),
                    leaf.node.to_string(),
                ),
                Node::NamedOption(_) | Node::List { .. } | Node::Optional(_) | Node::Rest => {
                    unreachable!("internal error - the grammar only nests positional terms")
                }
            };

            if leaf.recurs {
                if let Some(first) = list {
                    return Err(AmbiguityError::MultipleLists {
                        first: options[first].source_identifier.clone(),
                        second: source_identifier,
                    });
                }

                if leaf.depth != max_depth {
                    return Err(AmbiguityError::ListNotDeepest(source_identifier));
                }

                list.replace(index);
            }

            options.push(PositionalOption {
                key: format!("{POSITIONAL_KEY_PREFIX}{}", index + 1),
                index,
                depth: leaf.depth,
                type_ref,
                recurs: leaf.recurs,
                min_occurs: leaf.min_occurs,
                source_type_name,
                source_identifier,
                alias_set: BTreeSet::default(),
                annotation: leaf.annotation,
            });
        }

        if rest {
            if let Some(list) = list {
                return Err(AmbiguityError::TailAfterList(
                    options[list].source_identifier.clone(),
                ));
            }
        }

        assign_aliases(&mut options);

        let branches: Vec<BranchLength> = (0..=max_depth)
            .map(|depth| {
                let fixed = options
                    .iter()
                    .filter(|o| o.depth <= depth && !o.recurs)
                    .count();

                match list.map(|l| &options[l]) {
                    Some(option) if option.depth <= depth => {
                        BranchLength::AtLeast(fixed + option.min_occurs as usize)
                    }
                    _ => BranchLength::Exactly(fixed),
                }
            })
            .collect();
        let shortest = branches[0].minimum();
        let longest = match branches[max_depth] {
            BranchLength::Exactly(length) => Some(length),
            BranchLength::AtLeast(_) => None,
        };
        let tail_start = if rest { longest } else { None };

        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "Positional branches: {branches:?}, shortest={shortest}, longest={longest:?}, \
                 tail_start={tail_start:?}."
            );
        }

        Ok(Self {
            options,
            branches,
            has_optional: max_depth > 0,
            shortest,
            longest,
            tail_start,
        })
    }

    /// Every positional parameter, in index order.
    pub fn options(&self) -> &[PositionalOption] {
        &self.options
    }

    /// The accepted lengths, from the shortest branch to the longest.
    pub fn branches(&self) -> &[BranchLength] {
        &self.branches
    }

    /// The number of arguments every invocation must supply.
    pub fn shortest(&self) -> usize {
        self.shortest
    }

    /// The most arguments accepted, `None` when a list makes it unbounded.
    pub fn longest(&self) -> Option<usize> {
        self.longest
    }

    /// The positional index at which a trailing capture starts, if the grammar ends in `...`.
    pub fn tail_start(&self) -> Option<usize> {
        self.tail_start
    }

    /// Enable trailing capture after the longest branch.
    pub(crate) fn with_tail_capture(mut self) -> Result<Self, AmbiguityError> {
        match (self.longest, self.options.iter().find(|o| o.recurs)) {
            (Some(longest), _) => {
                self.tail_start.replace(longest);
                Ok(self)
            }
            (None, Some(list)) => Err(AmbiguityError::TailAfterList(
                list.source_identifier.clone(),
            )),
            (None, None) => unreachable!("internal error - an unbounded tree must hold a list"),
        }
    }

    /// Assign raw positional values to their parameters.
    ///
    /// The deepest branch whose minimum length fits `values` is chosen.
    /// An empty list leaves its parameter without a slot.
    pub fn arrange<T>(
        &self,
        values: Vec<T>,
    ) -> Result<Vec<(&PositionalOption, Slot<T>)>, ArgumentCountError> {
        let count = values.len();
        let ranged = self.has_optional || self.longest.is_none();

        if count < self.shortest {
            return Err(ArgumentCountError::TooFew {
                needed: self.shortest,
                got: count,
                ranged,
            });
        }

        if let Some(longest) = self.longest {
            if count > longest {
                return Err(ArgumentCountError::TooMany {
                    limit: longest,
                    got: count,
                    ranged,
                });
            }
        }

        let depth = self
            .branches
            .iter()
            .rposition(|branch| branch.minimum() <= count)
            .unwrap_or(0);

        if !self.branches[depth].admits(count) {
            let mut lengths = self.branches.clone();
            lengths.dedup();
            return Err(ArgumentCountError::NoMatchingBranch {
                lengths,
                got: count,
            });
        }

        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "Arranging {count} positional(s) into branch {depth} ({}).",
                self.branches[depth]
            );
        }

        let selected: Vec<&PositionalOption> =
            self.options.iter().filter(|o| o.depth <= depth).collect();
        let fixed = selected.iter().filter(|o| !o.recurs).count();
        let list_length = count - fixed;
        let mut values = values.into_iter();
        let mut arranged = Vec::default();

        for option in selected {
            if option.recurs {
                let list: Vec<T> = values.by_ref().take(list_length).collect();

                if !list.is_empty() {
                    arranged.push((option, Slot::List(list)));
                }
            } else {
                match values.next() {
                    Some(value) => arranged.push((option, Slot::Single(value))),
                    None => unreachable!("internal error - branch length must match the values"),
                }
            }
        }

        Ok(arranged)
    }
}

fn assign_aliases(options: &mut [PositionalOption]) {
    let mut type_names: HashMap<String, usize> = HashMap::default();
    let mut identifiers: HashMap<String, usize> = HashMap::default();

    for option in options.iter().filter(|o| names_a_type(o)) {
        *type_names
            .entry(option.source_type_name.to_lowercase())
            .or_default() += 1;
        *identifiers
            .entry(option.source_identifier.to_lowercase())
            .or_default() += 1;
    }

    for option in options.iter_mut().filter(|o| names_a_type(o)) {
        let type_name = option.source_type_name.to_lowercase();
        let identifier = option.source_identifier.to_lowercase();

        if type_names.get(&type_name) == Some(&1) {
            option
                .alias_set
                .insert(format!("{POSITIONAL_KEY_PREFIX}{type_name}"));
        }

        if identifiers.get(&identifier) == Some(&1) {
            option.alias_set.insert(identifier);
        }
    }
}

// Only parameters written as a type token (ex: `INT2`) carry aliases.
fn names_a_type(option: &PositionalOption) -> bool {
    option
        .source_identifier
        .chars()
        .next()
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}
