use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::constant::NEGATION_PREFIX;
use crate::cursor::SourceCursor;
use crate::grammar::ast::*;
use crate::grammar::GrammarError;
use crate::types::{type_name_from_identifier, TypeRef, TypeRegistry};

macro_rules! pattern {
    ($name:ident, $regex:literal) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($regex).unwrap());
    };
}

pattern!(LITERAL, r"^[a-z][a-z0-9_-]*");
pattern!(TYPE_WORD, r"^[A-Z][A-Za-z0-9_]*");
pattern!(OPTION_WORD, r"^--?[A-Za-z0-9][A-Za-z0-9_-]*");
pattern!(LONG_OPTION, r"^--[a-z][a-z0-9]*(-[a-z0-9]+)*$");
pattern!(SHORT_OPTION, r"^-[A-Za-z0-9]$");
pattern!(NAMED_OPTIONAL, r"^\[\s*-");
pattern!(NAMED_MANDATORY, r"^\(\s*-");
pattern!(PIPE, r"^\|");
pattern!(OPEN_PAREN, r"^\(");
pattern!(CLOSE_PAREN, r"^\)");
pattern!(OPEN_BRACKET, r"^\[");
pattern!(CLOSE_BRACKET, r"^\]");
pattern!(EQUALS, r"^=");
pattern!(OPTIONAL_VALUE, r"^\[=");
pattern!(ELLIPSIS, r"^\.\.\.");
pattern!(BOUNDARY, r"^(?:\s|[|)\]]|$)");
pattern!(ANNOTATION, r"^[ \t]+--[ \t]+([^\r\n]*)");

/// Compile `text` into its syntax tree, resolving every type reference through `registry`.
pub(crate) fn parse(text: &str, registry: &TypeRegistry) -> Result<UsageAst, GrammarError> {
    GrammarParser::new(text, registry).usage()
}

/// The key and polarity of a long or short spelling: `--no-dry-run` is `("dry_run", true)`.
pub(crate) fn option_key(spelling: &str) -> (String, bool) {
    let name = spelling.trim_start_matches('-');

    match name.strip_prefix(NEGATION_PREFIX) {
        Some(base) if spelling.starts_with("--") && !base.is_empty() => {
            (base.replace('-', "_"), true)
        }
        _ => (name.replace('-', "_"), false),
    }
}

enum Alternatives {
    Enum(Vec<String>),
    Variant(Vec<String>),
}

struct GrammarParser<'s, 'r> {
    cursor: SourceCursor<'s>,
    registry: &'r TypeRegistry,
    suffixed: HashMap<String, usize>,
}

impl<'s, 'r> GrammarParser<'s, 'r> {
    fn new(text: &'s str, registry: &'r TypeRegistry) -> Self {
        Self {
            cursor: SourceCursor::new(text),
            registry,
            suffixed: HashMap::default(),
        }
    }

    fn syntax(&self, message: impl Into<String>, start: Option<usize>) -> GrammarError {
        GrammarError::Syntax(self.cursor.error(message, start, None))
    }

    fn usage(mut self) -> Result<UsageAst, GrammarError> {
        let mut literals = Vec::default();
        let mut mandatory = Vec::default();
        let mut optional = Vec::default();
        self.cursor.trim_leading_whitespace();

        while self.cursor.starts_with(&LITERAL) {
            let start = self.cursor.offset();
            let literal = self.cursor.matches(&LITERAL);

            if !self.cursor.starts_with(&BOUNDARY) {
                // Not a command word after all (ex: `abcDEF`); let the positional sequence reject it.
                self.cursor.rollback(start);
                break;
            }

            literals.push(literal.to_string());
            self.cursor.trim_leading_whitespace();
        }

        loop {
            self.cursor.trim_leading_whitespace();

            if self.cursor.starts_with(&NAMED_OPTIONAL) {
                let declarations = self.named_group(&OPEN_BRACKET, &CLOSE_BRACKET, "]")?;
                optional.extend(declarations);
            } else if self.cursor.starts_with(&NAMED_MANDATORY) {
                let declarations = self.named_group(&OPEN_PAREN, &CLOSE_PAREN, ")")?;
                mandatory.extend(declarations);
            } else if self.cursor.starts_with(&OPTION_WORD) {
                let declarations = self.bare_option()?;
                mandatory.extend(declarations);
            } else {
                break;
            }
        }

        let positionals = self.elidable_tail(0)?;
        self.cursor.trim_leading_whitespace();

        if !self.cursor.at_end() {
            let start = self.cursor.offset();
            return Err(self.syntax("Unexpected input.", Some(start)));
        }

        Ok(UsageAst {
            literals,
            mandatory,
            optional,
            positionals,
        })
    }

    fn named_group(
        &mut self,
        opener: &Regex,
        closer: &Regex,
        closer_text: &str,
    ) -> Result<Vec<NamedOptionNode>, GrammarError> {
        let start = self.cursor.offset();
        self.cursor.matches_trimmed(opener);
        let spellings = self.spellings()?;
        self.cursor.trim_leading_whitespace();
        let (value, metavar) = self.option_value()?;
        self.cursor.trim_leading_whitespace();

        if self.cursor.matches(closer).is_empty() {
            return Err(self.syntax(format!("Expected '{closer_text}'."), Some(start)));
        }

        let recurs = !self.cursor.matches(&ELLIPSIS).is_empty();
        let annotation = self.annotation();
        self.declarations(spellings, value, metavar, recurs, annotation)
    }

    fn bare_option(&mut self) -> Result<Vec<NamedOptionNode>, GrammarError> {
        let spelling = self.spelling()?;
        let (value, metavar) = self.option_value()?;
        let recurs = !self.cursor.matches(&ELLIPSIS).is_empty();
        self.expect_boundary()?;
        let annotation = self.annotation();
        self.declarations(vec![spelling], value, metavar, recurs, annotation)
    }

    fn spelling(&mut self) -> Result<(String, usize), GrammarError> {
        let start = self.cursor.offset();
        let word = self.cursor.matches(&OPTION_WORD);

        if word.is_empty() {
            return Err(self.syntax(
                "Expected an option (ex: '--name' or '-n').",
                Some(start),
            ));
        }

        if !LONG_OPTION.is_match(word) && !SHORT_OPTION.is_match(word) {
            return Err(self.syntax(
                format!("Invalid option '{word}' (expected kebab-case, ex: '--dry-run' or '-d')."),
                Some(start),
            ));
        }

        Ok((word.to_string(), start))
    }

    fn spellings(&mut self) -> Result<Vec<(String, usize)>, GrammarError> {
        let mut spellings = Vec::default();

        loop {
            spellings.push(self.spelling()?);
            self.cursor.trim_leading_whitespace();

            if self.cursor.matches_trimmed(&PIPE).is_empty() {
                break;
            }
        }

        Ok(spellings)
    }

    fn option_value(&mut self) -> Result<(OptionValue, Option<String>), GrammarError> {
        if !self.cursor.matches(&EQUALS).is_empty() {
            let (type_ref, metavar) = self.type_ref()?;
            Ok((OptionValue::Required(type_ref), Some(metavar)))
        } else if !self.cursor.matches(&OPTIONAL_VALUE).is_empty() {
            let start = self.cursor.last_match();
            let (type_ref, metavar) = self.type_ref()?;

            if self.cursor.matches(&CLOSE_BRACKET).is_empty() {
                return Err(self.syntax("Expected ']'.", Some(start)));
            }

            Ok((OptionValue::Optional(type_ref), Some(metavar)))
        } else {
            Ok((OptionValue::Flag, None))
        }
    }

    fn declarations(
        &self,
        spellings: Vec<(String, usize)>,
        value: OptionValue,
        metavar: Option<String>,
        recurs: bool,
        annotation: Option<String>,
    ) -> Result<Vec<NamedOptionNode>, GrammarError> {
        let mut declarations: Vec<NamedOptionNode> = Vec::default();
        let mut affirmative: Option<usize> = None;
        let mut short: Option<(String, usize)> = None;
        let mut seen: Vec<&str> = Vec::default();

        for (spelling, start) in &spellings {
            if seen.contains(&spelling.as_str()) {
                return Err(GrammarError::Duplicate(self.cursor.error(
                    format!("The option '{spelling}' is listed more than once."),
                    Some(*start),
                    Some(*start + spelling.len()),
                )));
            }

            seen.push(spelling);
        }

        for (spelling, start) in spellings {
            if !spelling.starts_with("--") {
                if short.is_some() {
                    return Err(self.syntax("At most one short alias per option.", Some(start)));
                }

                short.replace((spelling, start));
                continue;
            }

            let (key, negated) = option_key(&spelling);

            if negated && value != OptionValue::Flag {
                return Err(self.syntax(
                    format!("The negated option '{spelling}' cannot take a value."),
                    Some(start),
                ));
            }

            match affirmative {
                Some(index) if !negated => {
                    declarations[index].switch_spellings.push(spelling);
                }
                _ => {
                    if !negated {
                        affirmative.replace(declarations.len());
                    }

                    declarations.push(NamedOptionNode {
                        key,
                        switch_spellings: vec![spelling],
                        short_alias: None,
                        negated,
                        value: value.clone(),
                        metavar: metavar.clone(),
                        recurs,
                        annotation: annotation.clone(),
                    });
                }
            }
        }

        if let Some((spelling, _)) = short {
            let alias = spelling.chars().nth(1);

            match declarations.first_mut() {
                Some(first) => {
                    first.short_alias = alias;
                    first.switch_spellings.push(spelling);
                }
                None => {
                    let (key, _) = option_key(&spelling);
                    declarations.push(NamedOptionNode {
                        key,
                        switch_spellings: vec![spelling],
                        short_alias: None,
                        negated: false,
                        value,
                        metavar,
                        recurs,
                        annotation,
                    });
                }
            }
        }

        Ok(declarations)
    }

    fn type_ref(&mut self) -> Result<(TypeRef, String), GrammarError> {
        let start = self.cursor.offset();

        if self.cursor.starts_with(&OPEN_PAREN) {
            let type_ref = match self.alternatives()? {
                Alternatives::Enum(values) => {
                    let values: Vec<&str> = values.iter().map(|v| v.as_str()).collect();
                    self.registry.enumeration(&values)
                }
                Alternatives::Variant(names) => {
                    let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
                    self.registry.union(&names).map_err(|error| {
                        GrammarError::Type(self.cursor.error(error.to_string(), Some(start), None))
                    })?
                }
            };
            let metavar = self.cursor.text()[start..self.cursor.offset()].to_string();
            return Ok((type_ref, metavar));
        }

        let word = self.cursor.matches(&TYPE_WORD);

        if word.is_empty() {
            return Err(self.syntax("Expected a type (ex: 'INT').", Some(start)));
        }

        let (name, _) = type_name_from_identifier(word).map_err(|error| {
            GrammarError::Type(self.cursor.error(error.to_string(), Some(start), None))
        })?;
        let type_ref = self.registry.resolve(&name).map_err(|error| {
            GrammarError::Type(self.cursor.error(error.to_string(), Some(start), None))
        })?;
        Ok((type_ref, word.to_string()))
    }

    fn alternatives(&mut self) -> Result<Alternatives, GrammarError> {
        let start = self.cursor.offset();
        self.cursor.matches_trimmed(&OPEN_PAREN);
        let mut literals: Vec<String> = Vec::default();
        let mut identifiers: Vec<(String, usize)> = Vec::default();

        loop {
            let item_start = self.cursor.offset();
            let identifier = self.cursor.matches(&TYPE_WORD);

            if !identifier.is_empty() {
                identifiers.push((identifier.to_string(), item_start));
            } else {
                let literal = self.cursor.matches(&LITERAL);

                if literal.is_empty() {
                    return Err(self.syntax(
                        "Expected a literal or a type (ex: 'fast' or 'INT').",
                        Some(item_start),
                    ));
                }

                if literals.iter().any(|l| l == literal) {
                    return Err(GrammarError::Duplicate(self.cursor.error(
                        format!("The alternative '{literal}' is listed more than once."),
                        Some(item_start),
                        None,
                    )));
                }

                literals.push(literal.to_string());
            }

            self.cursor.trim_leading_whitespace();

            if self.cursor.matches_trimmed(&PIPE).is_empty() {
                break;
            }
        }

        if self.cursor.matches(&CLOSE_PAREN).is_empty() {
            return Err(self.syntax("Expected ')'.", Some(start)));
        }

        if !literals.is_empty() && !identifiers.is_empty() {
            return Err(self.syntax("Cannot mix literals and types in one group.", Some(start)));
        }

        if literals.len() + identifiers.len() < 2 {
            return Err(self.syntax("A group needs at least two alternatives.", Some(start)));
        }

        if literals.is_empty() {
            let mut names = Vec::default();

            for (identifier, item_start) in identifiers {
                let (name, _) = type_name_from_identifier(&identifier).map_err(|error| {
                    GrammarError::Type(self.cursor.error(error.to_string(), Some(item_start), None))
                })?;
                names.push(name);
            }

            Ok(Alternatives::Variant(names))
        } else {
            Ok(Alternatives::Enum(literals))
        }
    }

    fn annotation(&mut self) -> Option<String> {
        self.cursor
            .captures(&ANNOTATION)
            .map(|captures| captures[1].trim_end().to_string())
            .filter(|text| !text.is_empty())
    }

    fn reject_annotation(&self) -> Result<(), GrammarError> {
        if self.cursor.starts_with(&ANNOTATION) {
            let start = self.cursor.offset();
            return Err(self.syntax(
                "Annotations may only follow an option or a list.",
                Some(start),
            ));
        }

        Ok(())
    }

    fn expect_boundary(&self) -> Result<(), GrammarError> {
        if !self.cursor.starts_with(&BOUNDARY) {
            let start = self.cursor.offset();
            return Err(self.syntax("Unexpected input.", Some(start)));
        }

        Ok(())
    }

    /// Read one nesting level of the positional sequence.
    ///
    /// A level holds at most one bracketed (elidable) segment; the segment's content is the next level.
    fn elidable_tail(&mut self, depth: usize) -> Result<Vec<Node>, GrammarError> {
        let mut nodes = Vec::default();
        let mut optional_seen = false;

        loop {
            self.cursor.trim_leading_whitespace();

            if self.cursor.at_end() || self.cursor.starts_with(&CLOSE_BRACKET) {
                break;
            }

            let start = self.cursor.offset();

            if self.cursor.starts_with(&OPEN_BRACKET) {
                self.cursor.matches(&OPEN_BRACKET);
                let inner = self.elidable_tail(depth + 1)?;
                self.cursor.trim_leading_whitespace();

                if self.cursor.matches(&CLOSE_BRACKET).is_empty() {
                    return Err(self.syntax("Expected ']'.", Some(start)));
                }

                if !self.cursor.matches(&ELLIPSIS).is_empty() {
                    let list = self.repeated_segment(inner, start)?;
                    nodes.push(list);
                } else {
                    if optional_seen {
                        return Err(GrammarError::Ambiguous(self.cursor.error(
                            "Only one optional segment allowed per nesting level.",
                            Some(start),
                            None,
                        )));
                    }

                    if inner.is_empty() {
                        return Err(self.syntax("Empty optional segment.", Some(start)));
                    }

                    self.reject_annotation()?;
                    optional_seen = true;
                    nodes.push(Node::Optional(inner));
                }
            } else if self.cursor.starts_with(&ELLIPSIS) {
                self.cursor.matches(&ELLIPSIS);
                self.cursor.trim_leading_whitespace();

                if depth > 0 || !self.cursor.at_end() {
                    return Err(self.syntax(
                        "A trailing capture '...' must be the final term.",
                        Some(start),
                    ));
                }

                nodes.push(Node::Rest);
                break;
            } else if self.cursor.starts_with(&OPEN_PAREN) {
                let node = match self.alternatives()? {
                    Alternatives::Enum(literal_values) => {
                        let values: Vec<&str> = literal_values.iter().map(|v| v.as_str()).collect();
                        Node::Enum {
                            type_ref: self.registry.enumeration(&values),
                            literal_values,
                        }
                    }
                    Alternatives::Variant(type_names) => {
                        let names: Vec<&str> = type_names.iter().map(|n| n.as_str()).collect();
                        let type_ref = self.registry.union(&names).map_err(|error| {
                            GrammarError::Type(self.cursor.error(
                                error.to_string(),
                                Some(start),
                                None,
                            ))
                        })?;
                        Node::PositionalVariant {
                            type_ref,
                            type_names,
                        }
                    }
                };
                let node = self.maybe_list(node)?;
                nodes.push(node);
            } else if self.cursor.starts_with(&TYPE_WORD) {
                let node = self.typed_positional()?;
                let node = self.maybe_list(node)?;
                nodes.push(node);
            } else if self.cursor.starts_with(&LITERAL) {
                let literal = self.cursor.matches(&LITERAL);
                self.expect_boundary()?;
                self.reject_annotation()?;
                nodes.push(Node::Literal(literal.to_string()));
            } else if self.cursor.starts_with(&OPTION_WORD) {
                self.cursor.matches(&OPTION_WORD);
                return Err(self.syntax(
                    "Options must precede positional arguments.",
                    Some(start),
                ));
            } else {
                return Err(self.syntax("Unexpected input.", Some(start)));
            }
        }

        Ok(nodes)
    }

    fn typed_positional(&mut self) -> Result<Node, GrammarError> {
        let start = self.cursor.offset();
        let identifier = self.cursor.matches(&TYPE_WORD);
        let (name, suffix) = type_name_from_identifier(identifier).map_err(|error| {
            GrammarError::Type(self.cursor.error(error.to_string(), Some(start), None))
        })?;
        let type_ref = self.registry.resolve(&name).map_err(|error| {
            GrammarError::Type(self.cursor.error(error.to_string(), Some(start), None))
        })?;

        match suffix {
            Some(suffix) => {
                if self.suffixed.insert(identifier.to_string(), start).is_some() {
                    return Err(GrammarError::Duplicate(self.cursor.error(
                        format!("The positional '{identifier}' is declared more than once."),
                        Some(start),
                        None,
                    )));
                }

                Ok(Node::PositionalWithSuffix {
                    type_ref,
                    suffix,
                    source_identifier: identifier.to_string(),
                })
            }
            None => Ok(Node::Positional {
                type_ref,
                source_identifier: identifier.to_string(),
            }),
        }
    }

    /// Wrap `node` into a list when directly followed by `...`.
    fn maybe_list(&mut self, node: Node) -> Result<Node, GrammarError> {
        if !self.cursor.matches(&ELLIPSIS).is_empty() {
            self.expect_boundary()?;
            let annotation = self.annotation();
            Ok(Node::List {
                inner: Box::new(node),
                min_occurs: 1,
                annotation,
            })
        } else {
            self.expect_boundary()?;
            self.reject_annotation()?;
            Ok(node)
        }
    }

    fn repeated_segment(
        &mut self,
        mut inner: Vec<Node>,
        start: usize,
    ) -> Result<Node, GrammarError> {
        if inner.iter().any(|n| n.contains_list()) {
            return Err(GrammarError::Ambiguous(self.cursor.error(
                "'...' cannot follow a segment that already repeats.",
                Some(start),
                None,
            )));
        }

        let node = match (inner.pop(), inner.is_empty()) {
            (Some(node), true) => node,
            _ => {
                return Err(self.syntax(
                    "A repeated optional segment must hold exactly one positional.",
                    Some(start),
                ))
            }
        };

        if matches!(node, Node::Optional(_) | Node::Rest) {
            return Err(self.syntax(
                "A repeated optional segment must hold exactly one positional.",
                Some(start),
            ));
        }

        self.expect_boundary()?;
        let annotation = self.annotation();
        Ok(Node::List {
            inner: Box::new(node),
            min_occurs: 0,
            annotation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDescriptor;
    use crate::Value;
    use rstest::rstest;

    fn registry() -> TypeRegistry {
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

    fn describe(nodes: &[Node]) -> String {
        let parts: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
        parts.join(" ")
    }

    #[rstest]
    #[case("--verbose", ("verbose", false))]
    #[case("--no-verbose", ("verbose", true))]
    #[case("--dry-run", ("dry_run", false))]
    #[case("--no-dry-run", ("dry_run", true))]
    #[case("--no", ("no", false))]
    #[case("-v", ("v", false))]
    #[case("dry-run", ("dry_run", false))]
    fn option_keys(#[case] spelling: &str, #[case] expected: (&str, bool)) {
        assert_eq!(option_key(spelling), (expected.0.to_string(), expected.1));
    }

    #[test]
    fn empty() {
        let ast = parse("", &registry()).unwrap();

        assert_eq!(
            ast,
            UsageAst {
                literals: vec![],
                mandatory: vec![],
                optional: vec![],
                positionals: vec![],
            }
        );
    }

    #[test]
    fn literals_options_positionals() {
        // Setup
        let registry = registry();

        // Execute
        let ast = parse(
            "git commit --message=STR [--amend] [--jobs|-j=INT] FILE...",
            &registry,
        )
        .unwrap();

        // Verify
        assert_eq!(ast.literals, vec!["git", "commit"]);
        assert_eq!(ast.mandatory.len(), 1);
        assert_eq!(ast.mandatory[0].key, "message");
        assert_matches!(&ast.mandatory[0].value, OptionValue::Required(t) if t.name() == "String");
        assert_eq!(ast.mandatory[0].metavar, Some("STR".to_string()));
        assert_eq!(ast.optional.len(), 2);
        assert_eq!(ast.optional[0].key, "amend");
        assert_eq!(ast.optional[0].value, OptionValue::Flag);
        assert_eq!(ast.optional[1].key, "jobs");
        assert_eq!(ast.optional[1].short_alias, Some('j'));
        assert_eq!(ast.optional[1].switch_spellings, vec!["--jobs", "-j"]);
        assert_matches!(&ast.optional[1].value, OptionValue::Required(t) if t.name() == "Int");
        assert_eq!(describe(&ast.positionals), "FILE...");
        assert_matches!(&ast.positionals[0], Node::List { min_occurs: 1, .. });
    }

    #[test]
    fn boolean_pair_group() {
        let ast = parse("(--color|--no-color|-c)", &registry()).unwrap();

        assert_eq!(ast.mandatory.len(), 2);
        assert_eq!(ast.mandatory[0].key, "color");
        assert!(!ast.mandatory[0].negated);
        assert_eq!(ast.mandatory[0].short_alias, Some('c'));
        assert_eq!(ast.mandatory[1].key, "color");
        assert!(ast.mandatory[1].negated);
        assert_eq!(ast.mandatory[1].switch_spellings, vec!["--no-color"]);
    }

    #[test]
    fn negated_first_short() {
        let ast = parse("[--no-color|-C]", &registry()).unwrap();

        assert_eq!(ast.optional.len(), 1);
        assert!(ast.optional[0].negated);
        assert_eq!(ast.optional[0].short_alias, Some('C'));
    }

    #[test]
    fn short_only() {
        let ast = parse("[-v]...", &registry()).unwrap();

        assert_eq!(ast.optional[0].key, "v");
        assert_eq!(ast.optional[0].switch_spellings, vec!["-v"]);
        assert!(ast.optional[0].recurs);
    }

    #[test]
    fn recurring_value_option() {
        let ast = parse("[--value=STR]...", &registry()).unwrap();

        assert!(ast.optional[0].recurs);
        assert_eq!(ast.optional[0].to_string(), "--value=STR");
    }

    #[test]
    fn optional_value_option() {
        let ast = parse("[--color[=(always|never)]]", &registry()).unwrap();

        assert_matches!(&ast.optional[0].value, OptionValue::Optional(t) if t.is_enum());
        assert_eq!(ast.optional[0].to_string(), "--color[=(always|never)]");
    }

    #[test]
    fn annotations() {
        // Setup
        let text = "build [--verbose|-v]   -- print more\n      [--jobs=INT] -- parallelism\n      FILE...  -- inputs";

        // Execute
        let ast = parse(text, &registry()).unwrap();

        // Verify
        assert_eq!(ast.optional[0].annotation, Some("print more".to_string()));
        assert_eq!(ast.optional[1].annotation, Some("parallelism".to_string()));
        assert_matches!(
            &ast.positionals[0],
            Node::List { annotation: Some(a), .. } if a == "inputs"
        );
    }

    #[test]
    fn annotation_positional_rejected() {
        let error = parse("FILE -- the file", &registry()).unwrap_err();

        assert_matches!(error, GrammarError::Syntax(_));
        assert_eq!(
            error.source_error().message(),
            "Annotations may only follow an option or a list."
        );
    }

    #[test]
    fn nested_optional() {
        let ast = parse("INT1 [INT2 [INT3] INT4] INT5", &registry()).unwrap();

        assert_eq!(describe(&ast.positionals), "INT1 [INT2 [INT3] INT4] INT5");
        assert_matches!(
            &ast.positionals[0],
            Node::PositionalWithSuffix { suffix, .. } if suffix == "1"
        );
    }

    #[test]
    fn optional_list() {
        let ast = parse("FILE [INT]...", &registry()).unwrap();

        assert_eq!(describe(&ast.positionals), "FILE [INT]...");
        assert_matches!(&ast.positionals[1], Node::List { min_occurs: 0, .. });
    }

    #[test]
    fn enum_and_variant() {
        // Setup
        let registry = registry();

        // Execute
        let ast = parse("(fast|slow) (ICO_FILE|PNG_FILE)", &registry).unwrap();

        // Verify
        assert_matches!(
            &ast.positionals[0],
            Node::Enum { literal_values, .. } if literal_values == &["fast", "slow"]
        );
        assert_matches!(
            &ast.positionals[1],
            Node::PositionalVariant { type_ref, .. } if type_ref.name() == "(IcoFile|PngFile)"
        );
        assert_eq!(describe(&ast.positionals), "(fast|slow) (ICO_FILE|PNG_FILE)");
    }

    #[test]
    fn literal_positional() {
        let ast = parse("tool [--x] run FILE", &registry()).unwrap();

        assert_eq!(ast.literals, vec!["tool"]);
        assert_eq!(describe(&ast.positionals), "run FILE");
    }

    #[test]
    fn rest() {
        let error = parse("exec [--quiet] CMD ...", &registry()).unwrap_err();
        assert_matches!(error, GrammarError::Type(_));

        let ast = parse("exec [--quiet] STR ...", &registry()).unwrap();
        assert_eq!(ast.positionals.last(), Some(&Node::Rest));
    }

    #[rstest]
    #[case("[INT] [INT] INT", 6)]
    #[case("INT [STR [INT] [INT]]", 15)]
    #[case("[INT...]...", 0)]
    fn ambiguous(#[case] text: &str, #[case] offset: usize) {
        let error = parse(text, &registry()).unwrap_err();

        assert_matches!(error, GrammarError::Ambiguous(_));
        assert_eq!(error.source_error().start(), offset);
    }

    #[test]
    fn ambiguous_message() {
        let error = parse("[INT] [INT] INT", &registry()).unwrap_err();

        assert_eq!(
            error.to_string(),
            "Ambiguous grammar: Only one optional segment allowed per nesting level.\n[INT] [INT] INT\n      ^^^^^"
        );
    }

    #[rstest]
    #[case("INT1 INT1")]
    #[case("INT1 [INT1]")]
    #[case("(fast|fast)")]
    #[case("[--x|--x]")]
    #[case("[--no-x|--no-x]")]
    #[case("[-x|--x|-x]")]
    fn duplicate(#[case] text: &str) {
        assert_matches!(parse(text, &registry()), Err(GrammarError::Duplicate(_)));
    }

    #[rstest]
    #[case("abcDEF", "Unexpected input.")]
    #[case("FILE --verbose", "Options must precede positional arguments.")]
    #[case(
        "[--Verbose]",
        "Invalid option '--Verbose' (expected kebab-case, ex: '--dry-run' or '-d')."
    )]
    #[case(
        "[--dry_run]",
        "Invalid option '--dry_run' (expected kebab-case, ex: '--dry-run' or '-d')."
    )]
    #[case("[--verbose", "Expected ']'.")]
    #[case("[--x|-a|-b]", "At most one short alias per option.")]
    #[case("[--no-x=INT]", "The negated option '--no-x' cannot take a value.")]
    #[case("(fast)", "A group needs at least two alternatives.")]
    #[case("(fast|INT)", "Cannot mix literals and types in one group.")]
    #[case("[]", "Empty optional segment.")]
    #[case("[INT FILE]...", "A repeated optional segment must hold exactly one positional.")]
    #[case("INT ... FILE", "A trailing capture '...' must be the final term.")]
    #[case("[INT ...]", "A trailing capture '...' must be the final term.")]
    #[case("FILE]", "Unexpected input.")]
    #[case("INT FILE -- x", "Annotations may only follow an option or a list.")]
    fn syntax(#[case] text: &str, #[case] message: &str) {
        let error = parse(text, &registry()).unwrap_err();

        assert_matches!(error, GrammarError::Syntax(_));
        assert_eq!(error.source_error().message(), message);
    }

    #[rstest]
    #[case("WIDGET")]
    #[case("Int")]
    #[case("[--x=WIDGET]")]
    #[case("(INT|STR)")]
    #[case("A_B_C")]
    fn type_errors(#[case] text: &str) {
        assert_matches!(parse(text, &registry()), Err(GrammarError::Type(_)));
    }

    #[test]
    fn syntax_offset() {
        let error = parse("cmd [--x] FILE --y", &registry()).unwrap_err();

        assert_eq!(error.source_error().start(), 15);
        assert_eq!(error.source_error().end(), 18);
    }
}
