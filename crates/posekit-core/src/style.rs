//! Style properties, selectors and sheet resolution
//!
//! A sheet is a base property set plus a rule list. Selectors follow the
//! CSS-like grammar of the drawing layer: `.` matches a part's class name,
//! `#` its exact name, `~` a regex over the name (anchored at the start).

use std::fmt;
use std::str::FromStr;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Flat drawing properties; unset fields inherit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linewidth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linestyle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markersize: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zorder: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw_subparts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw_pose: Option<bool>,
}

impl Style {
    /// Overlay `over` on top of this style; set fields on the right win
    pub fn merge(&self, over: &Style) -> Style {
        Style {
            color: over.color.clone().or_else(|| self.color.clone()),
            linewidth: over.linewidth.or(self.linewidth),
            linestyle: over.linestyle.clone().or_else(|| self.linestyle.clone()),
            marker: over.marker.clone().or_else(|| self.marker.clone()),
            markersize: over.markersize.or(self.markersize),
            alpha: over.alpha.or(self.alpha),
            label: over.label.clone().or_else(|| self.label.clone()),
            zorder: over.zorder.or(self.zorder),
            visible: over.visible.or(self.visible),
            draw_subparts: over.draw_subparts.or(self.draw_subparts),
            draw_pose: over.draw_pose.or(self.draw_pose),
        }
    }

    /// Whether the part is drawn at all (default true)
    pub fn visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    /// Whether traversal descends into sub-parts (default true)
    pub fn draw_subparts(&self) -> bool {
        self.draw_subparts.unwrap_or(true)
    }

    /// Whether a pose marker is emitted for a grouping part (default false)
    pub fn draw_pose(&self) -> bool {
        self.draw_pose.unwrap_or(false)
    }
}

/// A style rule selector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
    /// `.Name` — matches the part's class name exactly
    Class(String),
    /// `#name` — matches the part's name exactly
    Name(String),
    /// `~pattern` — regex over the part's name, anchored at the start
    Pattern(Regex),
}

impl Selector {
    /// Test the selector against a part's class name and optional name
    pub fn matches(&self, class_name: &str, name: Option<&str>) -> bool {
        match self {
            Selector::Class(class) => class_name == class,
            Selector::Name(exact) => name == Some(exact.as_str()),
            Selector::Pattern(regex) => name
                .and_then(|n| regex.find(n))
                .is_some_and(|m| m.start() == 0),
        }
    }
}

impl FromStr for Selector {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let prefix = chars
            .next()
            .ok_or_else(|| StyleError::InvalidSelector("empty selector".into()))?;
        let body = chars.as_str();
        if body.is_empty() {
            return Err(StyleError::InvalidSelector(format!(
                "selector '{s}' has no body"
            )));
        }
        match prefix {
            '.' => Ok(Selector::Class(body.to_string())),
            '#' => Ok(Selector::Name(body.to_string())),
            '~' => Regex::new(body)
                .map(Selector::Pattern)
                .map_err(|e| StyleError::InvalidSelector(format!("bad pattern '{body}': {e}"))),
            _ => Err(StyleError::InvalidSelector(format!(
                "selector '{s}' must start with '.', '#' or '~'"
            ))),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Class(class) => write!(f, ".{class}"),
            Selector::Name(name) => write!(f, "#{name}"),
            Selector::Pattern(regex) => write!(f, "~{}", regex.as_str()),
        }
    }
}

impl TryFrom<String> for Selector {
    type Error = StyleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> String {
        selector.to_string()
    }
}

/// A selector with the properties it applies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleRule {
    pub selector: Selector,
    pub style: Style,
}

/// Base properties plus an ordered rule list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSheet {
    pub base: Style,
    pub rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn new(base: Style) -> Self {
        Self {
            base,
            rules: Vec::new(),
        }
    }

    /// Append a rule; later rules override earlier ones
    pub fn rule(mut self, selector: Selector, style: Style) -> Self {
        self.rules.push(StyleRule { selector, style });
        self
    }

    /// Resolve the effective style for a part's class name and name
    pub fn resolve(&self, class_name: &str, name: Option<&str>) -> Style {
        self.rules
            .iter()
            .filter(|rule| rule.selector.matches(class_name, name))
            .fold(self.base.clone(), |acc, rule| acc.merge(&rule.style))
    }

    /// Parse a sheet from a RON string
    pub fn from_ron(content: &str) -> Result<Self, StyleError> {
        ron::from_str(content).map_err(|e| StyleError::Deserialize(e.to_string()))
    }
}

/// Style-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StyleError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    #[error("style sheet error: {0}")]
    Deserialize(String),
}
