use crate::error::FixError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Line range reported by the findings service (1-indexed, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line: u32,
    pub end_line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub text_range: Option<TextRange>,
    #[serde(default)]
    pub msg: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default)]
    pub locations: Vec<Location>,
}

/// Issue as returned by `/api/issues/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawIssue {
    #[serde(default)]
    pub key: String,
    pub component: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub flows: Vec<Flow>,
}

#[derive(Debug, Deserialize)]
pub struct IssuesResponse {
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

/// Hotspot as returned by `/api/hotspots/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHotspot {
    #[serde(default)]
    pub key: String,
    pub component: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub text_range: Option<TextRange>,
}

#[derive(Debug, Deserialize)]
pub struct HotspotsResponse {
    #[serde(default)]
    pub hotspots: Vec<RawHotspot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: u32,
}

impl From<TextRange> for LineRange {
    fn from(range: TextRange) -> Self {
        Self {
            start_line: range.start_line,
            end_line: range.end_line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    Issue,
    Hotspot,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::Issue => write!(f, "issue"),
            FindingKind::Hotspot => write!(f, "hotspot"),
        }
    }
}

/// A located quality defect, either an issue or a security hotspot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    Issue {
        key: String,
        component: String,
        message: String,
        range: LineRange,
    },
    Hotspot {
        key: String,
        component: String,
        message: String,
        range: LineRange,
    },
}

impl Finding {
    /// Locate an issue by its first flow's first location
    pub fn from_issue(issue: RawIssue) -> Result<Self, FixError> {
        let range = issue
            .flows
            .first()
            .and_then(|flow| flow.locations.first())
            .and_then(|location| location.text_range)
            .ok_or_else(|| FixError::MalformedResponse {
                key: issue.key.clone(),
                reason: "issue has no located flow".to_string(),
            })?;

        Ok(Self::Issue {
            key: issue.key,
            component: issue.component,
            message: issue.message,
            range: range.into(),
        })
    }

    pub fn from_hotspot(hotspot: RawHotspot) -> Result<Self, FixError> {
        let range = hotspot
            .text_range
            .ok_or_else(|| FixError::MalformedResponse {
                key: hotspot.key.clone(),
                reason: "hotspot has no text range".to_string(),
            })?;

        Ok(Self::Hotspot {
            key: hotspot.key,
            component: hotspot.component,
            message: hotspot.message,
            range: range.into(),
        })
    }

    pub fn kind(&self) -> FindingKind {
        match self {
            Self::Issue { .. } => FindingKind::Issue,
            Self::Hotspot { .. } => FindingKind::Hotspot,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Issue { key, .. } | Self::Hotspot { key, .. } => key,
        }
    }

    pub fn component(&self) -> &str {
        match self {
            Self::Issue { component, .. } | Self::Hotspot { component, .. } => component,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Issue { message, .. } | Self::Hotspot { message, .. } => message,
        }
    }

    pub fn line_range(&self) -> LineRange {
        match self {
            Self::Issue { range, .. } | Self::Hotspot { range, .. } => *range,
        }
    }

    /// File path relative to the project root
    pub fn path(&self) -> Result<&str, FixError> {
        component_path(self.component())
    }
}

/// Extract the file path from a component key (`project:path/to/file`)
///
/// Splits on the first colon only, so paths containing colons survive.
pub fn component_path(component: &str) -> Result<&str, FixError> {
    component
        .split_once(':')
        .map(|(_, path)| path)
        .ok_or_else(|| FixError::InvalidComponent(component.to_string()))
}
