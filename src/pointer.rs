//! JSON pointers (RFC 6901) with get and create-on-set semantics.

use crate::error::{Result, VstoreError};
use serde_json::{Map, Value};
use std::fmt;

/// A parsed `/`-delimited pointer into a JSON document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    raw: String,
    tokens: Vec<String>,
}

impl JsonPointer {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self {
                raw: String::new(),
                tokens: Vec::new(),
            });
        }
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(VstoreError::PointerInvalid(format!(
                "{raw} (must start with '/')"
            )));
        };

        let tokens = rest
            .split('/')
            .map(|token| unescape(token).ok_or_else(|| VstoreError::PointerInvalid(raw.into())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: raw.to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolve the pointer against `document`
    pub fn get<'v>(&self, document: &'v Value) -> Result<&'v Value> {
        let mut current = document;
        for token in &self.tokens {
            current = match current {
                Value::Object(map) => map.get(token),
                Value::Array(items) => parse_index(token).and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(|| self.not_found())?;
        }
        Ok(current)
    }

    /// Assign `value` at the pointer, creating missing intermediate objects
    pub fn set(&self, document: &mut Value, value: Value) -> Result<()> {
        let Some((last, parents)) = self.tokens.split_last() else {
            return Err(VstoreError::PointerInvalid(
                "the document root can't be replaced".into(),
            ));
        };

        let mut current = document;
        for token in parents {
            current = match current {
                Value::Object(map) => map
                    .entry(token.clone())
                    .or_insert_with(|| Value::Object(Map::new())),
                Value::Array(items) => {
                    let index = self.array_slot(token, items.len())?;
                    if index == items.len() {
                        items.push(Value::Object(Map::new()));
                    }
                    &mut items[index]
                }
                other => return Err(self.container_expected(other)),
            };
        }

        match current {
            Value::Object(map) => {
                map.insert(last.clone(), value);
            }
            Value::Array(items) => {
                let index = self.array_slot(last, items.len())?;
                if index == items.len() {
                    items.push(value);
                } else {
                    items[index] = value;
                }
            }
            other => return Err(self.container_expected(other)),
        }
        Ok(())
    }

    fn array_slot(&self, token: &str, len: usize) -> Result<usize> {
        if token == "-" {
            return Ok(len);
        }
        match parse_index(token) {
            Some(index) if index <= len => Ok(index),
            _ => Err(self.not_found()),
        }
    }

    fn not_found(&self) -> VstoreError {
        VstoreError::PointerNotFound(self.raw.clone())
    }

    fn container_expected(&self, found: &Value) -> VstoreError {
        VstoreError::TypeMismatch {
            pointer: self.raw.clone(),
            expected: "object or array",
            found: type_name(found),
        }
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Render a scalar as the string handed back to the user
pub fn scalar_to_string(pointer: &JsonPointer, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(VstoreError::TypeMismatch {
            pointer: pointer.to_string(),
            expected: "string, number or boolean",
            found: type_name(other),
        }),
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

// RFC 6901: no sign, no leading zeros
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ptr(raw: &str) -> JsonPointer {
        JsonPointer::parse(raw).unwrap()
    }

    #[test]
    fn parse_splits_and_unescapes() {
        assert_eq!(ptr("/a/b").tokens(), ["a", "b"]);
        assert_eq!(ptr("/a~1b/c~0d").tokens(), ["a/b", "c~d"]);
        assert_eq!(ptr("/").tokens(), [""]);
        assert!(ptr("").is_root());
    }

    #[test]
    fn parse_rejects_invalid_pointers() {
        assert!(matches!(
            JsonPointer::parse("username"),
            Err(VstoreError::PointerInvalid(_))
        ));
        assert!(matches!(
            JsonPointer::parse("/bad~2escape"),
            Err(VstoreError::PointerInvalid(_))
        ));
        assert!(matches!(
            JsonPointer::parse("/trailing~"),
            Err(VstoreError::PointerInvalid(_))
        ));
    }

    #[test]
    fn get_walks_objects_and_arrays() {
        let doc = json!({"db": {"hosts": ["a", "b"], "port": 5432}});
        assert_eq!(ptr("/db/hosts/1").get(&doc).unwrap(), "b");
        assert_eq!(ptr("/db/port").get(&doc).unwrap(), 5432);
        assert_eq!(ptr("").get(&doc).unwrap(), &doc);
    }

    #[test]
    fn get_missing_is_not_found() {
        let doc = json!({"db": {"hosts": ["a"]}});
        for raw in ["/nope", "/db/hosts/1", "/db/hosts/01", "/db/hosts/-", "/db/hosts/0/x"] {
            assert!(
                matches!(ptr(raw).get(&doc), Err(VstoreError::PointerNotFound(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut doc = json!({});
        ptr("/nested/field").set(&mut doc, json!("v")).unwrap();
        assert_eq!(doc, json!({"nested": {"field": "v"}}));
    }

    #[test]
    fn set_overwrites_existing_value() {
        let mut doc = json!({"password": "old", "user": "alice"});
        ptr("/password").set(&mut doc, json!("new")).unwrap();
        assert_eq!(doc, json!({"password": "new", "user": "alice"}));
    }

    #[test]
    fn set_in_arrays() {
        let mut doc = json!({"tags": ["a"]});
        ptr("/tags/0").set(&mut doc, json!("z")).unwrap();
        ptr("/tags/-").set(&mut doc, json!("b")).unwrap();
        ptr("/tags/2").set(&mut doc, json!("c")).unwrap();
        assert_eq!(doc, json!({"tags": ["z", "b", "c"]}));

        let result = ptr("/tags/9").set(&mut doc, json!("x"));
        assert!(matches!(result, Err(VstoreError::PointerNotFound(_))));
    }

    #[test]
    fn set_through_scalar_is_type_mismatch() {
        let mut doc = json!({"user": "alice"});
        let result = ptr("/user/name").set(&mut doc, json!("x"));
        assert!(matches!(result, Err(VstoreError::TypeMismatch { .. })));
        assert_eq!(doc, json!({"user": "alice"}));
    }

    #[test]
    fn set_root_is_rejected() {
        let mut doc = json!({});
        assert!(matches!(
            ptr("").set(&mut doc, json!("x")),
            Err(VstoreError::PointerInvalid(_))
        ));
    }

    #[test]
    fn scalars_render_as_strings() {
        let p = ptr("/x");
        assert_eq!(scalar_to_string(&p, &json!("s")).unwrap(), "s");
        assert_eq!(scalar_to_string(&p, &json!(42)).unwrap(), "42");
        assert_eq!(scalar_to_string(&p, &json!(true)).unwrap(), "true");
        for v in [json!(null), json!({}), json!([1])] {
            assert!(matches!(
                scalar_to_string(&p, &v),
                Err(VstoreError::TypeMismatch { .. })
            ));
        }
    }
}
