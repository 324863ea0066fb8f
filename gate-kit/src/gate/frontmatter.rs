//! Line-oriented front matter parser for Markdown records
//!
//! Only the subset used by elicitation records is understood: scalar
//! `key: value` pairs, booleans, `[]`, and `- item` lists under a bare
//! `key:` line. Anything else is skipped.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterValue {
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

impl FrontMatterValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

pub type FrontMatter = BTreeMap<String, FrontMatterValue>;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("missing front matter (expected leading ---)")]
    MissingOpening,

    #[error("front matter not terminated (missing ---)")]
    Unterminated,
}

pub fn parse_front_matter(text: &str) -> Result<FrontMatter, FrontMatterError> {
    let mut lines = text.lines();
    match lines.next() {
        Some(first) if first.trim() == "---" => {}
        _ => return Err(FrontMatterError::MissingOpening),
    }

    let mut body = Vec::new();
    let mut terminated = false;
    for line in lines {
        if line.trim() == "---" {
            terminated = true;
            break;
        }
        body.push(line);
    }
    if !terminated {
        return Err(FrontMatterError::Unterminated);
    }

    let mut data = FrontMatter::new();
    let mut list_key: Option<String> = None;

    for raw in body {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(item) = line.strip_prefix('-') {
            let item = item.trim_start_matches('-').trim();
            if let Some(key) = &list_key
                && !item.is_empty()
                && let Some(FrontMatterValue::List(items)) = data.get_mut(key)
            {
                items.push(item.to_string());
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();
        list_key = None;

        let parsed = if value.is_empty() {
            list_key = Some(key.clone());
            FrontMatterValue::List(Vec::new())
        } else if value == "[]" || value == "[ ]" {
            FrontMatterValue::List(Vec::new())
        } else if value.eq_ignore_ascii_case("true") {
            FrontMatterValue::Flag(true)
        } else if value.eq_ignore_ascii_case("false") {
            FrontMatterValue::Flag(false)
        } else {
            FrontMatterValue::Text(value.trim_matches(|c| c == '"' || c == '\'').to_string())
        };
        data.insert(key, parsed);
    }

    Ok(data)
}
