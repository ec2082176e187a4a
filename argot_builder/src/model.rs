use crate::matcher::Token;

/// A value bound into a [`LexicalEnvironment`](crate::LexicalEnvironment).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Free text.
    Text(String),
    /// A signed integer.
    Integer(i64),
    /// A finite floating point number.
    Number(f64),
    /// A boolean switch.
    Boolean(bool),
    /// A non-negative count (also the binding of a repeated boolean switch).
    Count(u64),
    /// A sequence, bound from a repeated option or positional list.
    List(Vec<Value>),
    /// The file topic: "read from the implicit pipeline input".
    Topic,
    /// Raw tokens captured verbatim for delegation to a nested invocation.
    Tail(Vec<Token>),
}

impl Value {
    /// The elements of a `Value::List`, or `None` for any other value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{text}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Count(value) => write!(f, "{value}"),
            Value::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Topic => write!(f, "-"),
            Value::Tail(tokens) => {
                let parts: Vec<&str> = tokens.iter().map(|t| t.text()).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

/// A default for a named option.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Text that is type coerced exactly like user input.
    Raw(String),
    /// An already constructed value, bound as-is.
    Instantiated(Value),
}
