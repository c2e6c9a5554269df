//! Route pattern parsing and matching.
//!
//! Patterns are plain path templates: static segments, `{name}` parameters
//! with optional `{name:constraint}` validation, and a trailing `*name`
//! catch-all.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutePatternError {
    #[error("Invalid pattern syntax: {0}")]
    InvalidSyntax(String),
    #[error("Multiple catch-all segments not allowed")]
    MultipleCatchAll,
    #[error("Catch-all must be the last segment")]
    CatchAllNotLast,
    #[error("Invalid constraint syntax: {0}")]
    InvalidConstraint(String),
    #[error("Duplicate parameter name: {0}")]
    DuplicateParameter(String),
}

/// Parameter constraints for validation.
#[derive(Debug, Clone)]
pub enum ParamConstraint {
    /// Any non-empty string.
    None,
    Int,
    Uuid,
    Alpha,
    /// Alphanumeric plus hyphens/underscores.
    Slug,
    Custom(Regex),
}

impl PartialEq for ParamConstraint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamConstraint::None, ParamConstraint::None) => true,
            (ParamConstraint::Int, ParamConstraint::Int) => true,
            (ParamConstraint::Uuid, ParamConstraint::Uuid) => true,
            (ParamConstraint::Alpha, ParamConstraint::Alpha) => true,
            (ParamConstraint::Slug, ParamConstraint::Slug) => true,
            (ParamConstraint::Custom(a), ParamConstraint::Custom(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl ParamConstraint {
    pub fn parse(s: &str) -> Result<Self, RoutePatternError> {
        match s {
            "int" => Ok(ParamConstraint::Int),
            "uuid" => Ok(ParamConstraint::Uuid),
            "alpha" => Ok(ParamConstraint::Alpha),
            "slug" => Ok(ParamConstraint::Slug),
            _ => match Regex::new(s) {
                Ok(regex) => Ok(ParamConstraint::Custom(regex)),
                Err(e) => Err(RoutePatternError::InvalidConstraint(format!(
                    "Invalid regex pattern '{}': {}",
                    s, e
                ))),
            },
        }
    }

    pub fn validate(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }

        match self {
            ParamConstraint::None => true,
            ParamConstraint::Int => value.parse::<i64>().is_ok(),
            ParamConstraint::Uuid => uuid::Uuid::parse_str(value).is_ok(),
            ParamConstraint::Alpha => value.chars().all(|c| c.is_alphabetic()),
            ParamConstraint::Slug => value
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_'),
            ParamConstraint::Custom(regex) => regex.is_match(value),
        }
    }
}

/// A single path segment in a route pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Static(String),
    Parameter {
        name: String,
        constraint: ParamConstraint,
    },
    CatchAll {
        name: String,
    },
}

/// Parsed route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    pub original_path: String,
    pub segments: Vec<PathSegment>,
    pub param_names: Vec<String>,
    pub has_catch_all: bool,
    pub static_segments: usize,
}

impl RoutePattern {
    pub fn parse(path: &str) -> Result<Self, RoutePatternError> {
        let mut segments = Vec::new();
        let mut param_names = Vec::new();
        let mut has_catch_all = false;
        let mut static_segments = 0;
        let mut seen_params = std::collections::HashSet::new();

        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        for (index, segment) in path_segments.iter().enumerate() {
            let segment = segment.trim();

            if segment.starts_with('{') && segment.ends_with('}') {
                let param_def = &segment[1..segment.len() - 1];
                let (name, constraint) = Self::parse_parameter_definition(param_def)?;

                if !seen_params.insert(name.clone()) {
                    return Err(RoutePatternError::DuplicateParameter(name));
                }

                segments.push(PathSegment::Parameter {
                    name: name.clone(),
                    constraint,
                });
                param_names.push(name);
            } else if let Some(name) = segment.strip_prefix('*') {
                if has_catch_all {
                    return Err(RoutePatternError::MultipleCatchAll);
                }
                if index != path_segments.len() - 1 {
                    return Err(RoutePatternError::CatchAllNotLast);
                }
                if name.is_empty() {
                    return Err(RoutePatternError::InvalidSyntax(
                        "Catch-all segment must have a name".to_string(),
                    ));
                }
                if !seen_params.insert(name.to_string()) {
                    return Err(RoutePatternError::DuplicateParameter(name.to_string()));
                }

                has_catch_all = true;
                segments.push(PathSegment::CatchAll {
                    name: name.to_string(),
                });
                param_names.push(name.to_string());
            } else {
                static_segments += 1;
                segments.push(PathSegment::Static(segment.to_string()));
            }
        }

        Ok(Self {
            original_path: path.to_string(),
            segments,
            param_names,
            has_catch_all,
            static_segments,
        })
    }

    fn parse_parameter_definition(
        def: &str,
    ) -> Result<(String, ParamConstraint), RoutePatternError> {
        if def.is_empty() {
            return Err(RoutePatternError::InvalidSyntax(
                "Parameter must have a name".to_string(),
            ));
        }

        match def.split_once(':') {
            Some((name, constraint)) => {
                if name.is_empty() {
                    return Err(RoutePatternError::InvalidSyntax(
                        "Parameter must have a name".to_string(),
                    ));
                }
                Ok((name.to_string(), ParamConstraint::parse(constraint)?))
            }
            None => Ok((def.to_string(), ParamConstraint::None)),
        }
    }

    /// Whether the pattern has no dynamic segments.
    pub fn is_static(&self) -> bool {
        !self.has_catch_all && self.param_names.is_empty()
    }

    /// Priority for matching order. Lower value wins.
    pub fn priority(&self) -> i32 {
        let mut priority = 0;
        for segment in &self.segments {
            priority += match segment {
                PathSegment::Static(_) => 0,
                PathSegment::Parameter { .. } => 10,
                PathSegment::CatchAll { .. } => 1000,
            };
        }
        priority - self.static_segments as i32
    }

    /// Match a request path, returning extracted parameters on success.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = HashMap::new();

        let mut segment_index = 0;
        for segment in &self.segments {
            match segment {
                PathSegment::Static(expected) => {
                    if path_segments.get(segment_index) != Some(&expected.as_str()) {
                        return None;
                    }
                    segment_index += 1;
                }
                PathSegment::Parameter { name, constraint } => {
                    let value = path_segments.get(segment_index)?;
                    if !constraint.validate(value) {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                    segment_index += 1;
                }
                PathSegment::CatchAll { name } => {
                    let rest = path_segments[segment_index..].join("/");
                    params.insert(name.clone(), rest);
                    segment_index = path_segments.len();
                }
            }
        }

        if segment_index == path_segments.len() {
            Some(params)
        } else {
            None
        }
    }
}
