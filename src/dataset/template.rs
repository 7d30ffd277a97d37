// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parameterised path templates
//!
//! Placeholders: `{taxonomy}`, `{sample}`, `{view}` and `{number}` (the
//! trailing digits of the sample id, so `scan12` gives `12`). Each accepts a
//! zero-pad width, e.g. `{view:02}` or `{number:03}`.

use crate::error::{Result, VoxsetError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Taxonomy,
    Sample,
    View,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { field: Field, width: usize },
}

/// A parsed path pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let err = |reason: String| VoxsetError::Template {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => return Err(err("unclosed '{'".to_string())),
                            Some(ch) => placeholder.push(ch),
                        }
                    }

                    let (name, width) = match placeholder.split_once(':') {
                        Some((name, width)) => {
                            let width = width.parse::<usize>().map_err(|_| {
                                err(format!("invalid width in '{{{}}}'", placeholder))
                            })?;
                            (name, width)
                        }
                        None => (placeholder.as_str(), 0),
                    };

                    let field = match name {
                        "taxonomy" => Field::Taxonomy,
                        "sample" => Field::Sample,
                        "view" => Field::View,
                        "number" => Field::Number,
                        other => return Err(err(format!("unknown placeholder '{}'", other))),
                    };

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field { field, width });
                }
                '}' => return Err(err("unmatched '}'".to_string())),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the template references `{view}`
    pub fn uses_view(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Field { field: Field::View, .. }))
    }

    /// Render the template for one sample, and a view index when it has one
    pub fn render(&self, taxonomy: &str, sample: &str, view: Option<usize>) -> Result<PathBuf> {
        let mut out = String::with_capacity(self.raw.len() + 16);

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { field, width } => {
                    let value = match field {
                        Field::Taxonomy => taxonomy.to_string(),
                        Field::Sample => sample.to_string(),
                        Field::View => view
                            .ok_or_else(|| self.error("template needs a view index"))?
                            .to_string(),
                        Field::Number => sample_number(sample)
                            .ok_or_else(|| {
                                self.error(&format!("sample '{}' has no trailing number", sample))
                            })?
                            .to_string(),
                    };
                    out.push_str(&pad(&value, *width));
                }
            }
        }

        Ok(PathBuf::from(out))
    }

    fn error(&self, reason: &str) -> VoxsetError {
        VoxsetError::Template {
            template: self.raw.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Trailing digits of a sample id, e.g. `scan7` -> 7
pub fn sample_number(sample: &str) -> Option<u64> {
    let digits = sample.len() - sample.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    sample[sample.len() - digits..].parse().ok()
}

fn pad(value: &str, width: usize) -> String {
    if value.len() >= width {
        value.to_string()
    } else {
        format!("{}{}", "0".repeat(width - value.len()), value)
    }
}

impl TryFrom<String> for PathTemplate {
    type Error = VoxsetError;

    fn try_from(value: String) -> Result<Self> {
        PathTemplate::parse(&value)
    }
}

impl From<PathTemplate> for String {
    fn from(template: PathTemplate) -> Self {
        template.raw
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
