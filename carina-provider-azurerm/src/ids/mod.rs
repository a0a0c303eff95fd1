//! Azure resource IDs
//!
//! Two parsing styles exist side by side. `ParsedResourceId` splits an ID
//! into key/value pairs and lets callers pop the segments they expect, which
//! tolerates any segment order. `SegmentTemplate` matches an ID against a
//! fixed sequence of literal and user-supplied segments.

pub mod pricing;
pub mod web_app_extension;

pub use pricing::PricingId;
pub use web_app_extension::WebAppExtensionId;

use thiserror::Error;

/// Resource ID parsing errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("the number of path segments is not divisible by 2 in {0:?}")]
    OddSegments(String),

    #[error("key/value cannot be empty strings (key: {key:?}, value: {value:?})")]
    EmptySegment { key: String, value: String },

    #[error("no subscription ID found in {0:?}")]
    MissingSubscription(String),

    #[error("ID was missing the '{0}' element")]
    MissingSegment(String),

    #[error("ID contained more segments than required: {input:?}, {remaining}")]
    ExtraSegments { input: String, remaining: String },

    #[error("parsing {input:?} as a {kind} ID: expected an ID in the format {expected:?}")]
    Malformed {
        kind: &'static str,
        input: String,
        expected: String,
    },

    #[error("parsing {input:?} as a {kind} ID: {reason}")]
    Invalid {
        kind: &'static str,
        input: String,
        reason: Box<IdError>,
    },
}

impl IdError {
    pub(crate) fn invalid(kind: &'static str, input: &str, reason: IdError) -> Self {
        IdError::Invalid {
            kind,
            input: input.to_string(),
            reason: Box::new(reason),
        }
    }
}

/// An ARM ID split into its well-known parts plus the remaining key/value path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: String,
    path: Vec<(String, String)>,
}

impl ParsedResourceId {
    pub fn parse(input: &str) -> Result<Self, IdError> {
        let trimmed = input.trim_matches('/');
        if trimmed.is_empty() {
            return Err(IdError::MissingSubscription(input.to_string()));
        }

        let components: Vec<&str> = trimmed.split('/').collect();
        if components.len() % 2 != 0 {
            return Err(IdError::OddSegments(input.to_string()));
        }

        let mut id = ParsedResourceId {
            subscription_id: String::new(),
            resource_group: String::new(),
            provider: String::new(),
            path: Vec::new(),
        };

        for pair in components.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() || value.is_empty() {
                return Err(IdError::EmptySegment {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }

            match key {
                "subscriptions" => id.subscription_id = value.to_string(),
                "resourceGroups" | "resourcegroups" => id.resource_group = value.to_string(),
                "providers" => id.provider = value.to_string(),
                _ => id.path.push((key.to_string(), value.to_string())),
            }
        }

        if id.subscription_id.is_empty() {
            return Err(IdError::MissingSubscription(input.to_string()));
        }

        Ok(id)
    }

    /// Remove and return the value stored under `key`
    pub fn pop_segment(&mut self, key: &str) -> Result<String, IdError> {
        let index = self
            .path
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| IdError::MissingSegment(key.to_string()))?;
        Ok(self.path.remove(index).1)
    }

    /// Fail if any segment was left unconsumed
    pub fn validate_no_empty_segments(&self, input: &str) -> Result<(), IdError> {
        if self.path.is_empty() {
            return Ok(());
        }
        let remaining = self
            .path
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        Err(IdError::ExtraSegments {
            input: input.to_string(),
            remaining,
        })
    }
}

/// One segment of a fixed-shape resource ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Literal text that must appear verbatim
    Static(&'static str),
    /// A value chosen by the user, named for error messages
    User(&'static str),
}

/// A fixed sequence of segments
pub struct SegmentTemplate {
    pub kind: &'static str,
    pub segments: &'static [Segment],
}

impl SegmentTemplate {
    /// Example rendering such as `/subscriptions/{subscriptionId}/...`
    pub fn example(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(text) => format!("/{}", text),
                Segment::User(name) => format!("/{{{}}}", name),
            })
            .collect()
    }

    /// Match `input` and return the user-supplied values in template order
    pub fn match_input(&self, input: &str, insensitively: bool) -> Result<Vec<String>, IdError> {
        let malformed = || IdError::Malformed {
            kind: self.kind,
            input: input.to_string(),
            expected: self.example(),
        };

        let parts: Vec<&str> = input.trim_matches('/').split('/').collect();
        if !input.starts_with('/') || parts.len() != self.segments.len() {
            return Err(malformed());
        }

        let mut values = Vec::new();
        for (part, segment) in parts.iter().zip(self.segments) {
            match segment {
                Segment::Static(text) => {
                    let matches = if insensitively {
                        part.eq_ignore_ascii_case(text)
                    } else {
                        part == text
                    };
                    if !matches {
                        return Err(malformed());
                    }
                }
                Segment::User(_) => {
                    if part.is_empty() {
                        return Err(malformed());
                    }
                    values.push(part.to_string());
                }
            }
        }
        Ok(values)
    }
}
