//! # Command Parser
//!
//! Normalizes the accepted request encodings into a canonical [`Command`]:
//!
//! - path segments: `/set/my%20key/value`
//! - JSON array body: `["SET", "key", "value"]`
//! - JSON object body: `{"command": "SET", "args": ["key", "value"]}`
//! - hybrid: command in the path, arguments as a bare JSON array body
//! - batch: an array of array/object commands
//!
//! The body-array and hybrid forms coerce arguments with different rules.
//! A `null` body element becomes the JSON text `"null"` in the body-array
//! form and an empty string in the hybrid form. Both rules are kept as-is
//! because existing clients rely on each of them.

use serde_json::{Map, Value};

use super::errors::{ParseError, ParseResult};
use super::types::{Arg, Command};

/// Parse a command from already-split URL path segments
pub fn parse_path_command<S: AsRef<str>>(segments: &[S]) -> ParseResult<Command> {
    let mut decoded = segments.iter().map(|s| decode_segment(s.as_ref()));

    let name = match decoded.next() {
        Some(name) => name?,
        None => return Err(ParseError::NoCommandProvided),
    };
    if name.is_empty() {
        return Err(ParseError::NoCommandProvided);
    }

    let args = decoded
        .map(|seg| seg.map(Arg::Text))
        .collect::<ParseResult<Vec<_>>>()?;

    Ok(Command::new(name, args))
}

/// Parse a command from a JSON body (array or object form)
pub fn parse_body_command(body: &Value) -> ParseResult<Command> {
    match body {
        Value::Array(items) => parse_array(items),
        Value::Object(map) => parse_object(map),
        Value::Null => Err(ParseError::NoCommandProvided),
        _ => Err(ParseError::invalid_format(
            "expected a JSON array or object",
        )),
    }
}

/// Parse a command whose name (and leading args) come from the path and
/// whose remaining args come from a bare JSON array body
pub fn parse_hybrid_command<S: AsRef<str>>(segments: &[S], body: &Value) -> ParseResult<Command> {
    let mut command = parse_path_command(segments)?;

    match body {
        Value::Null => {}
        Value::Array(items) => command.args.extend(items.iter().map(coerce_hybrid_arg)),
        _ => {
            return Err(ParseError::invalid_format(
                "body arguments must be a JSON array",
            ))
        }
    }

    Ok(command)
}

/// Parse a batch of commands. Any failing element rejects the whole batch.
pub fn parse_batch(body: &Value) -> ParseResult<Vec<Command>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Null => return Err(ParseError::NoCommandProvided),
        _ => {
            return Err(ParseError::invalid_format(
                "batch must be an array of commands",
            ))
        }
    };

    if items.is_empty() {
        return Err(ParseError::EmptyCommandArray);
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            parse_body_command(item).map_err(|e| ParseError::at_index(index, &e))
        })
        .collect()
}

fn parse_array(items: &[Value]) -> ParseResult<Command> {
    let (first, rest) = items.split_first().ok_or(ParseError::EmptyCommandArray)?;

    let name = match first {
        Value::String(s) if !s.is_empty() => s,
        Value::String(_) => return Err(ParseError::NoCommandProvided),
        _ => {
            return Err(ParseError::invalid_format(
                "command name must be a string",
            ))
        }
    };

    Ok(Command::new(name, rest.iter().map(coerce_body_arg).collect()))
}

fn parse_object(map: &Map<String, Value>) -> ParseResult<Command> {
    let name = match map.get("command") {
        None | Some(Value::Null) => return Err(ParseError::NoCommandProvided),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(ParseError::invalid_format(
                "`command` must be a string",
            ))
        }
    };

    let mut items = vec![Value::String(name)];
    match map.get("args") {
        None | Some(Value::Null) => {}
        Some(Value::Array(args)) => items.extend(args.iter().cloned()),
        Some(_) => return Err(ParseError::invalid_format("`args` must be an array")),
    }

    parse_array(&items)
}

/// Body-array rule: strings and numbers pass through, everything else is
/// serialized to JSON text
fn coerce_body_arg(value: &Value) -> Arg {
    match value {
        Value::String(s) => Arg::Text(s.clone()),
        Value::Number(n) => number_arg(n),
        other => Arg::Text(other.to_string()),
    }
}

/// Hybrid rule: like the body-array rule except `null` becomes an empty string
fn coerce_hybrid_arg(value: &Value) -> Arg {
    match value {
        Value::Null => Arg::Text(String::new()),
        other => coerce_body_arg(other),
    }
}

fn number_arg(n: &serde_json::Number) -> Arg {
    if let Some(i) = n.as_i64() {
        Arg::Int(i)
    } else if let Some(f) = n.as_f64() {
        Arg::Float(f)
    } else {
        Arg::Text(n.to_string())
    }
}

fn decode_segment(segment: &str) -> ParseResult<String> {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|_| ParseError::invalid_format(format!("malformed path segment: {}", segment)))
}
