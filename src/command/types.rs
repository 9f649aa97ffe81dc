//! Command model
//!
//! The canonical `{name, args}` form every request encoding is normalized to.
//! Dispatch stays string-keyed: nothing here knows what a command does.

use std::fmt;

use serde_json::Value;

/// A single command argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// Opaque bytes, only produced by programmatic callers
    Bytes(Vec<u8>),
}

impl Arg {
    /// Create a text argument
    pub fn text(s: impl Into<String>) -> Self {
        Arg::Text(s.into())
    }

    /// Encode the argument the way it is sent to the store
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Arg::Text(s) => s.as_bytes().to_vec(),
            Arg::Int(n) => n.to_string().into_bytes(),
            Arg::Float(f) => f.to_string().into_bytes(),
            Arg::Bool(b) => b.to_string().into_bytes(),
            Arg::Null => Vec::new(),
            Arg::Bytes(b) => b.clone(),
        }
    }

    /// Render the argument as a JSON value
    pub fn to_json(&self) -> Value {
        match self {
            Arg::Text(s) => Value::String(s.clone()),
            Arg::Int(n) => Value::from(*n),
            Arg::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Arg::Bool(b) => Value::Bool(*b),
            Arg::Null => Value::Null,
            Arg::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Text(s)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(b: Vec<u8>) -> Self {
        Arg::Bytes(b)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_bytes()))
    }
}

/// Canonical command: upper-cased name plus ordered arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Vec<Arg>,
}

impl Command {
    /// Create a command, upper-casing the name
    pub fn new(name: impl AsRef<str>, args: Vec<Arg>) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            args,
        }
    }

    /// Render as the canonical JSON array form `[name, ...args]`
    pub fn to_json(&self) -> Value {
        let mut items = Vec::with_capacity(self.args.len() + 1);
        items.push(Value::String(self.name.clone()));
        items.extend(self.args.iter().map(Arg::to_json));
        Value::Array(items)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What the caller asked the coordinator to run
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionRequest {
    /// One command
    Single(Command),
    /// An ordered batch; `atomic` selects transaction over pipeline
    Batch { commands: Vec<Command>, atomic: bool },
}

impl ExecutionRequest {
    /// Number of commands carried by the request
    pub fn len(&self) -> usize {
        match self {
            ExecutionRequest::Single(_) => 1,
            ExecutionRequest::Batch { commands, .. } => commands.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_name_is_uppercased() {
        let cmd = Command::new("hget", vec!["h".into(), "f".into()]);
        assert_eq!(cmd.name, "HGET");
    }

    #[test]
    fn test_to_json_canonical_form() {
        let cmd = Command::new("SET", vec!["key".into(), Arg::Int(5)]);
        assert_eq!(cmd.to_json(), serde_json::json!(["SET", "key", 5]));
    }

    #[test]
    fn test_arg_encoding() {
        assert_eq!(Arg::Int(-4).to_bytes(), b"-4".to_vec());
        assert_eq!(Arg::Null.to_bytes(), Vec::<u8>::new());
        assert_eq!(Arg::Bytes(vec![0xff, 0x00]).to_bytes(), vec![0xff, 0x00]);
    }

    #[test]
    fn test_display() {
        let cmd = Command::new("set", vec!["k".into(), "v".into()]);
        assert_eq!(cmd.to_string(), "SET k v");
    }
}
