use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::utils::error::{TocError, TocResult};

lazy_static! {
    // tag, then any number of #id / .class / [attr="value"] parts
    static ref PART_REGEX: Regex = Regex::new(
        r#"^([a-zA-Z][a-zA-Z0-9-]*)?((?:#[\w-]+|\.[\w-]+|\[[\w-]+(?:=["']?[^"'\]]*["']?)?\])*)$"#
    ).unwrap();

    static ref QUALIFIER_REGEX: Regex = Regex::new(
        r#"#([\w-]+)|\.([\w-]+)|\[([\w-]+)(?:=["']?([^"'\]]*)["']?)?\]"#
    ).unwrap();
}

/// A compound simple selector: `tag#id.class[attr="value"]`.
///
/// Only the forms needed to locate main-content containers are supported;
/// combinators and pseudo-classes are rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Attribute name and optional required value
    pub attributes: Vec<(String, Option<String>)>,
    source: String,
}

impl Selector {
    /// Parse a selector string
    pub fn parse(input: &str) -> TocResult<Self> {
        let trimmed = input.trim();
        let caps = PART_REGEX
            .captures(trimmed)
            .filter(|_| !trimmed.is_empty())
            .ok_or_else(|| TocError::Config(format!("Unsupported selector: {}", input)))?;

        let mut selector = Selector {
            tag: caps.get(1).map(|m| m.as_str().to_lowercase()),
            source: trimmed.to_string(),
            ..Default::default()
        };

        if let Some(rest) = caps.get(2) {
            for part in QUALIFIER_REGEX.captures_iter(rest.as_str()) {
                if let Some(id) = part.get(1) {
                    selector.id = Some(id.as_str().to_string());
                } else if let Some(class) = part.get(2) {
                    selector.classes.push(class.as_str().to_string());
                } else if let Some(name) = part.get(3) {
                    selector.attributes.push((
                        name.as_str().to_lowercase(),
                        part.get(4).map(|v| v.as_str().to_string()),
                    ));
                }
            }
        }

        Ok(selector)
    }

    /// Check an element, given its tag and attributes
    pub fn matches(&self, tag: &str, attrs: &HashMap<String, String>) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if attrs.get("id") != Some(id) {
                return false;
            }
        }

        if !self.classes.is_empty() {
            let class_attr = attrs.get("class").map(String::as_str).unwrap_or("");
            let present: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }

        self.attributes.iter().all(|(name, value)| match (attrs.get(name), value) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
