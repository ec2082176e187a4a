use crate::types::TypeRef;

/// The value a named option takes on the Cli.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// No value: a boolean switch.
    Flag,
    /// `--name=TYPE`: a value must follow.
    Required(TypeRef),
    /// `--name[=TYPE]`: a value may be attached.
    Optional(TypeRef),
}

/// One named option declaration as written in the usage text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedOptionNode {
    /// Normalized key, ex: `dry_run` for `--dry-run` and `--no-dry-run`.
    pub key: String,
    /// Every spelling written for this declaration, ex: `["--verbose", "-v"]`.
    pub switch_spellings: Vec<String>,
    /// The single character short alias, if any.
    pub short_alias: Option<char>,
    /// Whether this is the `--no-..` side of a boolean.
    pub negated: bool,
    /// The value taken on the Cli.
    pub value: OptionValue,
    /// The value label as written, ex: `INT` or `(fast|slow)`.
    pub metavar: Option<String>,
    /// Whether the option may be repeated (`...`).
    pub recurs: bool,
    /// Line-trailing `-- text`.
    pub annotation: Option<String>,
}

/// A usage grammar term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A literal word that must appear verbatim.
    Literal(String),
    /// A named option.
    NamedOption(NamedOptionNode),
    /// A typed positional, ex: `FILE`.
    Positional {
        /// The resolved type.
        type_ref: TypeRef,
        /// The identifier as written.
        source_identifier: String,
    },
    /// A typed positional with a numeric suffix, ex: `INT2`.
    PositionalWithSuffix {
        /// The resolved type.
        type_ref: TypeRef,
        /// The numeric suffix, ex: `2`.
        suffix: String,
        /// The identifier as written.
        source_identifier: String,
    },
    /// A positional accepting any of several related types, ex: `(ICO_FILE|PNG_FILE)`.
    PositionalVariant {
        /// The synthesized union type.
        type_ref: TypeRef,
        /// The member type names, in declared order.
        type_names: Vec<String>,
    },
    /// A positional accepting one of several literal words, ex: `(fast|slow)`.
    Enum {
        /// The synthesized enum type.
        type_ref: TypeRef,
        /// The accepted words, in declared order.
        literal_values: Vec<String>,
    },
    /// A repeated positional.
    List {
        /// The repeated term.
        inner: Box<Node>,
        /// `0` for `[TYPE]...`, `1` for `TYPE...`.
        min_occurs: u8,
        /// Line-trailing `-- text`.
        annotation: Option<String>,
    },
    /// A bracketed, elidable segment.
    Optional(Vec<Node>),
    /// Trailing capture of every remaining token.
    Rest,
}

impl Node {
    /// Whether this term is, or directly contains, a list.
    pub(crate) fn contains_list(&self) -> bool {
        match self {
            Node::List { .. } => true,
            Node::Optional(nodes) => nodes.iter().any(|n| n.contains_list()),
            _ => false,
        }
    }
}

impl std::fmt::Display for NamedOptionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.switch_spellings.join("|"))?;

        match (&self.value, &self.metavar) {
            (OptionValue::Required(_), Some(metavar)) => write!(f, "={metavar}"),
            (OptionValue::Optional(_), Some(metavar)) => write!(f, "[={metavar}]"),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Literal(text) => write!(f, "{text}"),
            Node::NamedOption(option) => write!(f, "{option}"),
            Node::Positional {
                source_identifier, ..
            }
            | Node::PositionalWithSuffix {
                source_identifier, ..
            } => write!(f, "{source_identifier}"),
            Node::PositionalVariant { type_names, .. } => {
                let identifiers: Vec<String> =
                    type_names.iter().map(|n| identifier_from_name(n)).collect();
                write!(f, "({})", identifiers.join("|"))
            }
            Node::Enum { literal_values, .. } => write!(f, "({})", literal_values.join("|")),
            Node::List {
                inner, min_occurs, ..
            } => {
                if *min_occurs == 0 {
                    write!(f, "[{inner}]...")
                } else {
                    write!(f, "{inner}...")
                }
            }
            Node::Optional(nodes) => {
                let parts: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
                write!(f, "[{}]", parts.join(" "))
            }
            Node::Rest => write!(f, "..."),
        }
    }
}

/// `ByteCount` is written `BYTE_COUNT`.
fn identifier_from_name(name: &str) -> String {
    let mut identifier = String::default();

    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            identifier.push('_');
        }

        identifier.push(c.to_ascii_uppercase());
    }

    identifier
}

/// The parsed usage text: `literal* namedSequence positionalSequence`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageAst {
    /// Leading command words.
    pub literals: Vec<String>,
    /// Options that must be supplied: bare `--x` or `(--x|-y)`.
    pub mandatory: Vec<NamedOptionNode>,
    /// Options that may be supplied: `[--x]`.
    pub optional: Vec<NamedOptionNode>,
    /// The positional sequence, with at most one `Node::Optional` per nesting level.
    pub positionals: Vec<Node>,
}
