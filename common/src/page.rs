//! Page documents produced by the page assembler

use crate::product::{ProductRecord, QuestionEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Declared page type; also drives the output file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    #[serde(rename = "FAQ")]
    Faq,
    Product,
    Comparison,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Faq => "FAQ",
            PageType::Product => "Product",
            PageType::Comparison => "Comparison",
        }
    }

    /// File name used when persisting a page, e.g. `faq_page.json`
    pub fn file_name(&self) -> String {
        format!("{}_page.json", self.as_str().to_lowercase())
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened product view used by the product and comparison pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub product_id: String,
    pub name: String,
    pub concentration: String,
    pub category: String,
    pub price: String,
    pub skin_types: Vec<String>,
    pub key_ingredients: Vec<String>,
    pub benefits: Vec<String>,
    pub usage: String,
    pub side_effects: String,
}

impl From<&ProductRecord> for ProductInfo {
    fn from(product: &ProductRecord) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            concentration: product.concentration.clone(),
            category: product.category.to_string(),
            price: product.price.clone(),
            skin_types: product.skin_types.clone(),
            key_ingredients: product.key_ingredients.clone(),
            benefits: product.benefits.clone(),
            usage: product.usage_instructions.clone(),
            side_effects: product.side_effects.clone(),
        }
    }
}

/// Questions of one category, in generation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqGroup {
    pub category: String,
    pub questions: Vec<QuestionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqPage {
    pub title: String,
    pub product_name: String,
    pub introduction: String,
    pub faq_items: Vec<QuestionEntry>,
    /// Largest category first
    pub faq_by_category: Vec<FaqGroup>,
    pub categories: Vec<String>,
    pub total_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub title: String,
    pub product_info: ProductInfo,
    pub product_highlights: Vec<String>,
    /// Rendered content blocks keyed by block name
    pub sections: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub aspect: String,
    pub product_a: String,
    pub product_b: String,
    pub analysis: String,
    pub winner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPage {
    pub title: String,
    pub product_a: ProductInfo,
    pub product_b: ProductInfo,
    pub comparison_points: Vec<ComparisonPoint>,
    pub summary: String,
    pub recommendation: String,
}

/// A finished page document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "page_type")]
pub enum Page {
    #[serde(rename = "FAQ")]
    Faq(FaqPage),
    Product(ProductPage),
    Comparison(ComparisonPage),
}

impl Page {
    pub fn page_type(&self) -> PageType {
        match self {
            Page::Faq(_) => PageType::Faq,
            Page::Product(_) => PageType::Product,
            Page::Comparison(_) => PageType::Comparison,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Faq(page) => &page.title,
            Page::Product(page) => &page.title,
            Page::Comparison(page) => &page.title,
        }
    }

    /// Top-level key/value view of the page, `page_type` included
    pub fn to_document(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => {
                let mut map = Map::new();
                map.insert("page".to_string(), other);
                Ok(map)
            }
        }
    }
}
