use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the analysis service should focus on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    General,
    Collectibles,
    Stamps,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::General => "general",
            AnalysisMode::Collectibles => "collectibles",
            AnalysisMode::Stamps => "stamps",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "general" => Ok(AnalysisMode::General),
            "collectibles" => Ok(AnalysisMode::Collectibles),
            "stamps" => Ok(AnalysisMode::Stamps),
            other => Err(format!("unknown analysis mode: {other}")),
        }
    }
}

/// Collectible-specific fields, present in collectibles and stamps mode
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectibleDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notable_features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Structured response from the analysis service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAnalysis {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    /// 0-100
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collectible_details: Option<CollectibleDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value_range: Option<ValueRange>,
}

impl ParsedAnalysis {
    /// True when the response carried at least one recognised field.
    pub fn has_content(&self) -> bool {
        !self.description.trim().is_empty()
            || !self.objects.is_empty()
            || !self.categories.is_empty()
    }

    /// Clamp confidence into 0-100 and order the value range.
    pub fn normalized(mut self) -> Self {
        self.confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 100.0)
        } else {
            0.0
        };
        if let Some(range) = self.estimated_value_range.as_mut() {
            if range.min > range.max {
                std::mem::swap(&mut range.min, &mut range.max);
            }
        }
        self
    }
}

/// Analysis outcome. A body that cannot be parsed degrades to raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisResult {
    Parsed(ParsedAnalysis),
    RawText { description: String },
}

impl AnalysisResult {
    pub fn description(&self) -> &str {
        match self {
            AnalysisResult::Parsed(p) => &p.description,
            AnalysisResult::RawText { description } => description,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            AnalysisResult::Parsed(p) => Some(p.confidence),
            AnalysisResult::RawText { .. } => None,
        }
    }

    /// First category, falling back to the first detected object.
    pub fn label(&self) -> Option<&str> {
        match self {
            AnalysisResult::Parsed(p) => p
                .categories
                .iter()
                .chain(p.objects.iter())
                .map(|s| s.trim())
                .find(|s| !s.is_empty()),
            AnalysisResult::RawText { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            AnalysisResult::Parsed(_) => "parsed",
            AnalysisResult::RawText { .. } => "raw_text",
        }
    }
}
