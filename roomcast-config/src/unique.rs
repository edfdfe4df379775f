//! Duplicate key detection
//!
//! `serde_json` keeps the last of two equal object keys, which would make a
//! repeated entity id silently replace the first definition. The document
//! is walked once before it is parsed, and the first repeated key is
//! reported with the section it appeared in.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::{ConfigError, Result};

/// Fail with `ConfigError::DuplicateId` if any object repeats a key
pub(crate) fn reject_duplicate_keys(text: &str) -> Result<()> {
    let duplicate = RefCell::new(None);
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let walk = KeyCheck {
        path: String::new(),
        duplicate: &duplicate,
    }
    .deserialize(&mut deserializer)
    .and_then(|()| deserializer.end());

    match (walk, duplicate.into_inner()) {
        (_, Some((section, id))) => Err(ConfigError::DuplicateId { section, id }),
        (Err(e), None) => Err(ConfigError::Parse(e)),
        (Ok(()), None) => Ok(()),
    }
}

struct KeyCheck<'a> {
    path: String,
    duplicate: &'a RefCell<Option<(String, String)>>,
}

impl KeyCheck<'_> {
    fn child(&self, key: &str) -> Self {
        let path = if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        };
        KeyCheck {
            path,
            duplicate: self.duplicate,
        }
    }
}

impl<'de> DeserializeSeed<'de> for KeyCheck<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for KeyCheck<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let mut seen = BTreeSet::new();
        while let Some(key) = map.next_key::<String>()? {
            if seen.contains(&key) {
                let section = if self.path.is_empty() {
                    "document".to_string()
                } else {
                    self.path.clone()
                };
                let message = format!("duplicate key '{}' in {}", key, section);
                *self.duplicate.borrow_mut() = Some((section, key));
                return Err(de::Error::custom(message));
            }
            map.next_value_seed(self.child(&key))?;
            seen.insert(key);
        }
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        let mut index = 0usize;
        while seq.next_element_seed(self.child(&index.to_string()))?.is_some() {
            index += 1;
        }
        Ok(())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<(), E> {
        Ok(())
    }
}
