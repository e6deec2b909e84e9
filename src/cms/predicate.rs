//! Query predicates in the CMS query language
//!
//! A query is a list of predicates, each rendered as `[name(path, value)]`
//! and the list wrapped as `[...]`:
//!
//! ```ignore
//! Predicate::at("document.type", "posts").to_string() // -> [at(document.type, "posts")]
//! ```

use std::fmt;

/// Right-hand side of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    List(Vec<Value>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        _ => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
            Value::Int(n) => write!(f, "{}", n),
            Value::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    name: &'static str,
    path: String,
    value: Value,
}

impl Predicate {
    /// Field equals value
    pub fn at(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: "at",
            path: path.into(),
            value: value.into(),
        }
    }

    /// Field differs from value
    pub fn not(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: "not",
            path: path.into(),
            value: value.into(),
        }
    }

    /// Field equals any of the values
    pub fn any<V: Into<Value>>(path: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            name: "any",
            path: path.into(),
            value: Value::List(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Documents of the given custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// Document of the given type with the given uid
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", doc_type), uid)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}({}, {})]", self.name, self.path, self.value)
    }
}

/// Render the `q` parameter for a list of predicates
pub fn query_string(predicates: &[Predicate]) -> String {
    let mut q = String::from("[");
    for p in predicates {
        q.push_str(&p.to_string());
    }
    q.push(']');
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_predicate() {
        assert_eq!(
            Predicate::document_type("posts").to_string(),
            r#"[at(document.type, "posts")]"#
        );
    }

    #[test]
    fn test_uid_predicate_escapes_quotes() {
        assert_eq!(
            Predicate::uid("posts", r#"a"b"#).to_string(),
            r#"[at(my.posts.uid, "a\"b")]"#
        );
    }

    #[test]
    fn test_any_predicate() {
        let p = Predicate::any("document.tags", ["rust", "web"]);
        assert_eq!(p.to_string(), r#"[any(document.tags, ["rust", "web"])]"#);
    }

    #[test]
    fn test_query_string() {
        let q = query_string(&[
            Predicate::document_type("posts"),
            Predicate::not("document.id", "X1"),
        ]);
        assert_eq!(q, r#"[[at(document.type, "posts")][not(document.id, "X1")]]"#);
    }
}
