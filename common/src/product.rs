//! Product and question records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Product category, inferred from the product name when parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    Serum,
    Cream,
    Lotion,
    Oil,
    Skincare,
}

impl ProductCategory {
    /// Infer a category from keywords in the product name
    pub fn infer(product_name: &str) -> Self {
        let name = product_name.to_lowercase();
        if name.contains("serum") {
            ProductCategory::Serum
        } else if name.contains("cream") {
            ProductCategory::Cream
        } else if name.contains("lotion") {
            ProductCategory::Lotion
        } else if name.contains("oil") {
            ProductCategory::Oil
        } else {
            ProductCategory::Skincare
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Serum => "Serum",
            ProductCategory::Cream => "Cream",
            ProductCategory::Lotion => "Lotion",
            ProductCategory::Oil => "Oil",
            ProductCategory::Skincare => "Skincare",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured product record shared by the parser, generators and templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub concentration: String,
    pub category: ProductCategory,
    pub skin_types: Vec<String>,
    pub key_ingredients: Vec<String>,
    pub benefits: Vec<String>,
    pub usage_instructions: String,
    pub side_effects: String,
    pub price: String,
}

/// FAQ question category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionCategory {
    Informational,
    Safety,
    Usage,
    Benefits,
    Purchase,
    Comparison,
    Results,
}

impl QuestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::Informational => "Informational",
            QuestionCategory::Safety => "Safety",
            QuestionCategory::Usage => "Usage",
            QuestionCategory::Benefits => "Benefits",
            QuestionCategory::Purchase => "Purchase",
            QuestionCategory::Comparison => "Comparison",
            QuestionCategory::Results => "Results",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single question/answer pair for the FAQ page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionEntry {
    pub category: QuestionCategory,
    pub question: String,
    pub answer: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    1
}

impl QuestionEntry {
    pub fn new(category: QuestionCategory, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            category,
            question: question.into(),
            answer: answer.into(),
            priority: default_priority(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_inference() {
        assert_eq!(ProductCategory::infer("GlowBoost Vitamin C Serum"), ProductCategory::Serum);
        assert_eq!(ProductCategory::infer("Night Repair CREAM"), ProductCategory::Cream);
        assert_eq!(ProductCategory::infer("Body Lotion"), ProductCategory::Lotion);
        assert_eq!(ProductCategory::infer("Rosehip Oil"), ProductCategory::Oil);
        assert_eq!(ProductCategory::infer("Clay Mask"), ProductCategory::Skincare);
    }

    #[test]
    fn test_question_entry_default_priority() {
        let json = r#"{"category":"Usage","question":"How?","answer":"Like so."}"#;
        let entry: QuestionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.category, QuestionCategory::Usage);
        assert_eq!(entry.priority, 1);
    }
}
