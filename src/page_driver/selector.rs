//! Minimal CSS selector probe over a serialized DOM.
//!
//! The command-line browser driver only gets a DOM dump back, so selector
//! waits are answered by scanning the opening tags of that dump. Supported:
//! type (`form`, `*`), `#id`, `.class`, attribute tests (`[a]`, `[a=v]`,
//! `[a*=v]`, `[a^=v]`, `[a$=v]`), compounds of those and comma-separated
//! groups. For descendant/child combinators only the right-most compound is
//! checked.

use std::collections::HashMap;

use regex::Regex;

use crate::error_handling::types::DriverError;

#[derive(Debug, Clone, PartialEq)]
enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
}

/// A parsed selector group.
#[derive(Debug)]
pub struct SelectorProbe {
    alternatives: Vec<Compound>,
    tag_re: Regex,
    attr_re: Regex,
}

impl SelectorProbe {
    pub fn parse(selector: &str) -> Result<Self, DriverError> {
        let part_re = Regex::new(r#"(#[\w-]+)|(\.[\w-]+)|\[\s*([\w:-]+)\s*(?:([*^$]?=)\s*(?:"([^"]*)"|'([^']*)'|([^\]\s]+)))?\s*\]"#)
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        let tag_name_re = Regex::new(r"^([a-zA-Z][a-zA-Z0-9-]*|\*)")
            .map_err(|e| DriverError::Navigation(e.to_string()))?;

        let mut alternatives = Vec::new();
        for group in selector.split(',') {
            let last = group
                .split(|c: char| c.is_whitespace() || c == '>' || c == '+' || c == '~')
                .filter(|s| !s.is_empty())
                .last()
                .ok_or_else(|| invalid(selector))?;

            let mut compound = Compound::default();
            let mut rest = last;
            if let Some(m) = tag_name_re.find(rest) {
                if m.as_str() != "*" {
                    compound.tag = Some(m.as_str().to_ascii_lowercase());
                }
                rest = &rest[m.end()..];
            }

            let mut consumed = 0;
            for caps in part_re.captures_iter(rest) {
                let whole = caps.get(0).ok_or_else(|| invalid(selector))?;
                if whole.start() != consumed {
                    return Err(invalid(selector));
                }
                consumed = whole.end();

                if let Some(id) = caps.get(1) {
                    compound.id = Some(id.as_str()[1..].to_string());
                } else if let Some(class) = caps.get(2) {
                    compound.classes.push(class.as_str()[1..].to_string());
                } else if let Some(name) = caps.get(3) {
                    let value = caps
                        .get(5)
                        .or_else(|| caps.get(6))
                        .or_else(|| caps.get(7))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    let op = match caps.get(4).map(|m| m.as_str()) {
                        None => AttrOp::Exists,
                        Some("=") => AttrOp::Equals(value),
                        Some("*=") => AttrOp::Contains(value),
                        Some("^=") => AttrOp::Prefix(value),
                        Some("$=") => AttrOp::Suffix(value),
                        Some(_) => return Err(invalid(selector)),
                    };
                    compound
                        .attrs
                        .push((name.as_str().to_ascii_lowercase(), op));
                }
            }
            if consumed != rest.len() {
                return Err(invalid(selector));
            }
            alternatives.push(compound);
        }

        Ok(Self {
            alternatives,
            tag_re: Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>")
                .map_err(|e| DriverError::Navigation(e.to_string()))?,
            attr_re: Regex::new(
                r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+)))?"#,
            )
            .map_err(|e| DriverError::Navigation(e.to_string()))?,
        })
    }

    /// True when some element of `document` matches one of the alternatives.
    pub fn matches(&self, document: &str) -> bool {
        for caps in self.tag_re.captures_iter(document) {
            let tag = caps[1].to_ascii_lowercase();
            let attrs = self.parse_attributes(caps.get(2).map_or("", |m| m.as_str()));
            if self
                .alternatives
                .iter()
                .any(|compound| compound_matches(compound, &tag, &attrs))
            {
                return true;
            }
        }
        false
    }

    fn parse_attributes(&self, raw: &str) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        for caps in self.attr_re.captures_iter(raw) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            attrs.insert(caps[1].to_ascii_lowercase(), value);
        }
        attrs
    }
}

fn compound_matches(compound: &Compound, tag: &str, attrs: &HashMap<String, String>) -> bool {
    if let Some(ref expected) = compound.tag {
        if expected != tag {
            return false;
        }
    }
    if let Some(ref id) = compound.id {
        if attrs.get("id") != Some(id) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let present: Vec<&str> = attrs
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        if !compound.classes.iter().all(|c| present.contains(&c.as_str())) {
            return false;
        }
    }
    compound.attrs.iter().all(|(name, op)| match attrs.get(name) {
        None => false,
        Some(value) => match op {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            AttrOp::Contains(v) => value.contains(v.as_str()),
            AttrOp::Prefix(v) => value.starts_with(v.as_str()),
            AttrOp::Suffix(v) => value.ends_with(v.as_str()),
        },
    })
}

fn invalid(selector: &str) -> DriverError {
    DriverError::Navigation(format!("unsupported selector `{}`", selector))
}
