use std::collections::VecDeque;
use thiserror::Error;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::matcher::model::*;
use crate::model::Value;
use crate::options::{Arity, CliOptionMap};

#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum MatchError {
    #[error("Unknown option '{0}'.")]
    UnknownOption(String),

    #[error("Missing value for option '{0}'.")]
    MissingValue(String),

    #[error("Option '{0}' does not take a value.")]
    UnexpectedValue(String),
}

#[derive(Debug)]
enum State {
    ExpectingOption {
        last_switch: Option<String>,
    },
    ExpectingNamedValue {
        key: String,
        spelling: String,
    },
    ExpectingOptionalValue {
        key: String,
        spelling: String,
        implied: Value,
    },
}

/// Reclassify a raw token stream into option and positional descriptors.
///
/// Iteration stops after the first error.
pub struct CliParser<'m, I>
where
    I: Iterator<Item = Token>,
{
    option_map: &'m CliOptionMap,
    tokens: I,
    tail_start: Option<usize>,
    state: State,
    positionals: usize,
    pending: VecDeque<Descriptor>,
    done: bool,
}

impl<'m, I> CliParser<'m, I>
where
    I: Iterator<Item = Token>,
{
    /// Match `tokens` against `option_map`.
    ///
    /// When `tail_start` is given, the positional token at that index and every token after it are captured verbatim.
    pub fn new(
        option_map: &'m CliOptionMap,
        tokens: impl IntoIterator<IntoIter = I>,
        tail_start: Option<usize>,
    ) -> Self {
        Self {
            option_map,
            tokens: tokens.into_iter(),
            tail_start,
            state: State::ExpectingOption { last_switch: None },
            positionals: 0,
            pending: VecDeque::default(),
            done: false,
        }
    }

    fn step(&mut self) -> Result<(), MatchError> {
        let token = match self.tokens.next() {
            Some(token) => token,
            None => {
                self.done = true;
                return self.finish();
            }
        };
        let state = std::mem::replace(
            &mut self.state,
            State::ExpectingOption { last_switch: None },
        );

        match state {
            State::ExpectingNamedValue { key, spelling } => match token.kind() {
                TokenKind::NamedValue | TokenKind::PositionalValue => {
                    self.pending.push_back(Descriptor::named(
                        key,
                        Payload::Text(token.text().to_string()),
                        spelling,
                    ));
                    Ok(())
                }
                TokenKind::NamedExpression | TokenKind::PositionalExpression => {
                    self.pending.push_back(Descriptor::named(
                        key,
                        Payload::Deferred(token.text().to_string()),
                        spelling,
                    ));
                    Ok(())
                }
                TokenKind::Name | TokenKind::Operator => Err(MatchError::MissingValue(spelling)),
            },
            State::ExpectingOptionalValue {
                key,
                spelling,
                implied,
            } => match token.kind() {
                TokenKind::NamedValue => {
                    self.pending.push_back(Descriptor::named(
                        key,
                        Payload::Text(token.text().to_string()),
                        spelling,
                    ));
                    Ok(())
                }
                TokenKind::NamedExpression => {
                    self.pending.push_back(Descriptor::named(
                        key,
                        Payload::Deferred(token.text().to_string()),
                        spelling,
                    ));
                    Ok(())
                }
                _ => {
                    self.pending.push_back(Descriptor::named(
                        key,
                        Payload::Instantiated(implied),
                        spelling,
                    ));
                    self.dispatch(token)
                }
            },
            State::ExpectingOption { last_switch } => match (token.kind(), last_switch) {
                (TokenKind::NamedValue | TokenKind::NamedExpression, Some(spelling)) => {
                    Err(MatchError::UnexpectedValue(spelling))
                }
                _ => self.dispatch(token),
            },
        }
    }

    fn finish(&mut self) -> Result<(), MatchError> {
        let state = std::mem::replace(
            &mut self.state,
            State::ExpectingOption { last_switch: None },
        );

        match state {
            State::ExpectingNamedValue { spelling, .. } => Err(MatchError::MissingValue(spelling)),
            State::ExpectingOptionalValue {
                key,
                spelling,
                implied,
            } => {
                self.pending.push_back(Descriptor::named(
                    key,
                    Payload::Instantiated(implied),
                    spelling,
                ));
                Ok(())
            }
            State::ExpectingOption { .. } => Ok(()),
        }
    }

    fn dispatch(&mut self, token: Token) -> Result<(), MatchError> {
        match token.kind() {
            TokenKind::Name | TokenKind::Operator => {
                let text = token.text().to_string();

                if let Some(long) = text.strip_prefix("--") {
                    self.match_long(split_equals_delimiter(long))
                } else if let Some(short) = text.strip_prefix('-').filter(|s| !s.is_empty()) {
                    self.match_short(short)
                } else {
                    let payload = Payload::Text(text.clone());
                    self.match_positional(token, payload)
                }
            }
            TokenKind::PositionalValue | TokenKind::NamedValue => {
                let payload = Payload::Text(token.text().to_string());
                self.match_positional(token, payload)
            }
            TokenKind::PositionalExpression | TokenKind::NamedExpression => {
                let payload = Payload::Deferred(token.text().to_string());
                self.match_positional(token, payload)
            }
        }
    }

    fn match_positional(&mut self, token: Token, payload: Payload) -> Result<(), MatchError> {
        if self.tail_start == Some(self.positionals) {
            let tail: Vec<Token> = std::iter::once(token).chain(self.tokens.by_ref()).collect();

            #[cfg(feature = "tracing_debug")]
            {
                debug!(
                    "Capturing tail of {} token(s) at positional {}.",
                    tail.len(),
                    self.positionals
                );
            }

            self.pending.push_back(Descriptor::tail(tail));
            self.done = true;
            return Ok(());
        }

        self.pending
            .push_back(Descriptor::positional(self.positionals, payload));
        self.positionals += 1;
        Ok(())
    }

    fn match_long(&mut self, (name, attached): (&str, Option<&str>)) -> Result<(), MatchError> {
        let spelling = format!("--{name}");
        let option_map = self.option_map;
        let cli_option = option_map
            .get(&spelling)
            .ok_or_else(|| MatchError::UnknownOption(spelling.clone()))?;
        let key = cli_option.key().to_string();

        match (cli_option.arity(), attached) {
            (Arity::None, Some(_)) => Err(MatchError::UnexpectedValue(spelling)),
            (Arity::Required | Arity::Optional, Some(value)) => {
                self.pending.push_back(Descriptor::named(
                    key,
                    Payload::Text(value.to_string()),
                    spelling,
                ));
                Ok(())
            }
            (Arity::Required, None) => {
                self.state = State::ExpectingNamedValue { key, spelling };
                Ok(())
            }
            (Arity::None | Arity::Optional, None) => {
                let implied = implied_value(cli_option.implied_value());

                if cli_option.arity() == Arity::Optional {
                    self.state = State::ExpectingOptionalValue {
                        key,
                        spelling,
                        implied,
                    };
                } else {
                    self.pending.push_back(Descriptor::named(
                        key,
                        Payload::Instantiated(implied),
                        spelling.clone(),
                    ));
                    self.state = State::ExpectingOption {
                        last_switch: Some(spelling),
                    };
                }

                Ok(())
            }
        }
    }

    // Stacked short options: `-vvv`, `-sFILE`, `-j=3`.
    fn match_short(&mut self, stack: &str) -> Result<(), MatchError> {
        let mut previous: Option<String> = None;

        for (index, single) in stack.char_indices() {
            if single == '=' {
                // Only reached after a switch that takes no value.
                let spelling = previous.unwrap_or_else(|| format!("-{stack}"));
                return Err(MatchError::UnexpectedValue(spelling));
            }

            let spelling = format!("-{single}");
            let option_map = self.option_map;
            let cli_option = option_map
                .get(&spelling)
                .ok_or_else(|| MatchError::UnknownOption(spelling.clone()))?;
            let key = cli_option.key().to_string();
            let remainder = &stack[index + single.len_utf8()..];
            let attached = remainder.strip_prefix('=').unwrap_or(remainder);

            #[cfg(feature = "tracing_debug")]
            {
                debug!("Short option {spelling} resolved to '{key}', remainder '{remainder}'.");
            }

            match cli_option.arity() {
                Arity::None => {
                    self.pending.push_back(Descriptor::named(
                        key,
                        Payload::Instantiated(implied_value(cli_option.implied_value())),
                        spelling.clone(),
                    ));
                    previous.replace(spelling);
                }
                Arity::Required | Arity::Optional if !attached.is_empty() => {
                    self.pending.push_back(Descriptor::named(
                        key,
                        Payload::Text(attached.to_string()),
                        spelling,
                    ));
                    return Ok(());
                }
                Arity::Required => {
                    self.state = State::ExpectingNamedValue { key, spelling };
                    return Ok(());
                }
                Arity::Optional => {
                    self.state = State::ExpectingOptionalValue {
                        key,
                        spelling,
                        implied: implied_value(cli_option.implied_value()),
                    };
                    return Ok(());
                }
            }
        }

        self.state = State::ExpectingOption {
            last_switch: previous,
        };
        Ok(())
    }
}

impl<'m, I> Iterator for CliParser<'m, I>
where
    I: Iterator<Item = Token>,
{
    type Item = Result<Descriptor, MatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(descriptor) = self.pending.pop_front() {
                return Some(Ok(descriptor));
            }

            if self.done {
                return None;
            }

            if let Err(error) = self.step() {
                self.done = true;
                self.pending.clear();
                return Some(Err(error));
            }
        }
    }
}

fn implied_value(value: Option<&Value>) -> Value {
    value.cloned().unwrap_or(Value::Boolean(true))
}

fn split_equals_delimiter(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => (token, None),
    }
}
