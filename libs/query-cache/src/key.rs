use std::{borrow::Cow, fmt};

use serde::Serialize;
use serde_json::Value;

/// One level of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
    Name(Cow<'static, str>),
    Id(i64),
    /// Canonical JSON of a parameter object.
    Params(String),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{id}"),
            Self::Params(json) => f.write_str(json),
        }
    }
}

/// Hierarchical cache key.
///
/// Prefix matching is segment-wise, so `posts:author:1` is a prefix of
/// `posts:author:1:{..}` but never of `posts:author:12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    segments: Vec<KeySegment>,
}

impl QueryKey {
    pub fn root(name: &'static str) -> Self {
        Self {
            segments: vec![KeySegment::Name(Cow::Borrowed(name))],
        }
    }

    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.segments.push(KeySegment::Name(name.into()));
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.segments.push(KeySegment::Id(id));
        self
    }

    /// Appends a parameter object. Object keys are sorted and `null`
    /// members dropped, so logically equal objects yield equal keys.
    pub fn params<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        let value = serde_json::to_value(params).unwrap_or(Value::Null);
        let mut json = String::new();
        write_canonical(&value, &mut json);
        self.segments.push(KeySegment::Params(json));
        self
    }

    pub fn segments(&self) -> &[KeySegment] { &self.segments }

    pub fn len(&self) -> usize { self.segments.len() }

    pub fn is_empty(&self) -> bool { self.segments.is_empty() }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut members: Vec<(&String, &Value)> =
                map.iter().filter(|(_, v)| !v.is_null()).collect();
            members.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (name, member)) in members.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(member, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
