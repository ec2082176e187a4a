use crate::constant::FILE_TOPIC;
use crate::model::Value;

/// The lexical class of a raw argument token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// An option spelling, possibly with an attached value: `--jobs`, `-vvv`, `-j3`.
    Name,
    /// An operator token; matched like a name.
    Operator,
    /// A plain positional value.
    PositionalValue,
    /// A positional whose value is computed by the evaluator.
    PositionalExpression,
    /// A value already split from its option, ex: the `3` of `--jobs=3`.
    NamedValue,
    /// A named value computed by the evaluator.
    NamedExpression,
}

/// One raw argument token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    text: String,
}

impl Token {
    /// Construct a token.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// The token's lexical class.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The token's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Split one plain argv entry into tokens.
    ///
    /// `--name=value` splits into a name and a named value; any other `-` prefixed argument (except the file topic and negative numbers) is a name.
    /// ### Example
    /// ```
    /// # use argot_builder as argot;
    /// use argot::{Token, TokenKind};
    ///
    /// assert_eq!(
    ///     Token::classify("--jobs=3"),
    ///     vec![
    ///         Token::new(TokenKind::Name, "--jobs"),
    ///         Token::new(TokenKind::NamedValue, "3"),
    ///     ]
    /// );
    /// assert_eq!(
    ///     Token::classify("-4"),
    ///     vec![Token::new(TokenKind::PositionalValue, "-4")]
    /// );
    /// ```
    pub fn classify(arg: &str) -> Vec<Token> {
        let negative_number = arg
            .strip_prefix('-')
            .map(|number| number.parse::<f64>().is_ok())
            .unwrap_or(false);

        if arg == FILE_TOPIC || negative_number {
            return vec![Token::new(TokenKind::PositionalValue, arg)];
        }

        if let Some(long) = arg.strip_prefix("--") {
            return match long.split_once('=') {
                Some((name, value)) => vec![
                    Token::new(TokenKind::Name, format!("--{name}")),
                    Token::new(TokenKind::NamedValue, value),
                ],
                None => vec![Token::new(TokenKind::Name, arg)],
            };
        }

        if arg.starts_with('-') {
            vec![Token::new(TokenKind::Name, arg)]
        } else {
            vec![Token::new(TokenKind::PositionalValue, arg)]
        }
    }

    /// [`Token::classify`] over a whole argv.
    pub fn classify_all<S: AsRef<str>>(args: &[S]) -> Vec<Token> {
        args.iter()
            .flat_map(|arg| Token::classify(arg.as_ref()))
            .collect()
    }
}

/// The parameter a descriptor binds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DescriptorKey {
    /// A named option, by key.
    Named(String),
    /// The n-th positional token (zero based).
    Positional(usize),
    /// The captured tail.
    Tail,
}

/// The value carried by a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Cli text, to be coerced.
    Text(String),
    /// A value bound as-is (implied values of switches).
    Instantiated(Value),
    /// An expression, resolved by the evaluator after direct binding.
    Deferred(String),
    /// Raw tokens, captured verbatim.
    Tail(Vec<Token>),
}

/// One matched option or positional.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub(crate) key: DescriptorKey,
    pub(crate) payload: Payload,
    pub(crate) spelling: Option<String>,
}

impl Descriptor {
    pub(crate) fn named(
        key: impl Into<String>,
        payload: Payload,
        spelling: impl Into<String>,
    ) -> Self {
        Self {
            key: DescriptorKey::Named(key.into()),
            payload,
            spelling: Some(spelling.into()),
        }
    }

    pub(crate) fn positional(index: usize, payload: Payload) -> Self {
        Self {
            key: DescriptorKey::Positional(index),
            payload,
            spelling: None,
        }
    }

    pub(crate) fn tail(tokens: Vec<Token>) -> Self {
        Self {
            key: DescriptorKey::Tail,
            payload: Payload::Tail(tokens),
            spelling: None,
        }
    }

    /// The parameter this descriptor binds.
    pub fn key(&self) -> &DescriptorKey {
        &self.key
    }

    /// The carried value.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The switch spelling as written, for named descriptors.
    pub fn spelling(&self) -> Option<&str> {
        self.spelling.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc", vec![(TokenKind::PositionalValue, "abc")])]
    #[case("-", vec![(TokenKind::PositionalValue, "-")])]
    #[case("-12", vec![(TokenKind::PositionalValue, "-12")])]
    #[case("-1.5", vec![(TokenKind::PositionalValue, "-1.5")])]
    #[case("-v", vec![(TokenKind::Name, "-v")])]
    #[case("-vvv", vec![(TokenKind::Name, "-vvv")])]
    #[case("-j=3", vec![(TokenKind::Name, "-j=3")])]
    #[case("--verbose", vec![(TokenKind::Name, "--verbose")])]
    #[case("--jobs=3", vec![(TokenKind::Name, "--jobs"), (TokenKind::NamedValue, "3")])]
    #[case("--name=a=b", vec![(TokenKind::Name, "--name"), (TokenKind::NamedValue, "a=b")])]
    #[case("--name=", vec![(TokenKind::Name, "--name"), (TokenKind::NamedValue, "")])]
    fn classify(#[case] arg: &str, #[case] expected: Vec<(TokenKind, &str)>) {
        let expected: Vec<Token> = expected
            .into_iter()
            .map(|(kind, text)| Token::new(kind, text))
            .collect();

        assert_eq!(Token::classify(arg), expected);
    }

    #[test]
    fn classify_all() {
        let tokens = Token::classify_all(&["a", "--b=c"]);

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].kind(), TokenKind::NamedValue);
        assert_eq!(tokens[2].text(), "c");
    }

    #[test]
    fn descriptor() {
        let descriptor = Descriptor::named("jobs", Payload::Text("3".to_string()), "-j");

        assert_eq!(descriptor.key(), &DescriptorKey::Named("jobs".to_string()));
        assert_eq!(descriptor.payload(), &Payload::Text("3".to_string()));
        assert_eq!(descriptor.spelling(), Some("-j"));
        assert_eq!(Descriptor::positional(0, Payload::Deferred("x".to_string())).spelling(), None);
    }
}
