//! Page templates and the processor that renders them by name

use super::blocks::ContentBlocks;
use super::leading_number;
use crate::error::{CoordinationError, Result};
use common::{
    ComparisonPage, ComparisonPoint, FaqGroup, FaqPage, Page, ProductInfo, ProductPage,
    ProductRecord, QuestionEntry,
};
use serde_json::{json, Map, Value};

/// Everything a template may draw from
#[derive(Debug, Clone, Copy)]
pub struct PageInput<'a> {
    pub product: &'a ProductRecord,
    pub competitor: Option<&'a ProductRecord>,
    pub questions: &'a [QuestionEntry],
}

pub trait PageTemplate: Send + Sync {
    fn name(&self) -> &'static str;

    /// JSON-schema style description of the input the template reads
    fn schema(&self) -> Value;

    fn render(&self, input: &PageInput<'_>) -> Result<Page>;
}

pub struct FaqTemplate;

impl FaqTemplate {
    fn group(questions: &[QuestionEntry]) -> Vec<FaqGroup> {
        let mut groups: Vec<FaqGroup> = Vec::new();
        for question in questions {
            let category = question.category.as_str();
            match groups.iter_mut().find(|g| g.category == category) {
                Some(group) => group.questions.push(question.clone()),
                None => groups.push(FaqGroup {
                    category: category.to_string(),
                    questions: vec![question.clone()],
                }),
            }
        }
        // stable, so equal-sized categories keep first-seen order
        groups.sort_by(|a, b| b.questions.len().cmp(&a.questions.len()));
        groups
    }
}

impl PageTemplate for FaqTemplate {
    fn name(&self) -> &'static str {
        "faq"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": {"type": "string"},
                            "answer": {"type": "string"},
                            "category": {"type": "string"},
                            "priority": {"type": "integer"}
                        }
                    }
                },
                "product_name": {"type": "string"}
            },
            "required": ["questions", "product_name"]
        })
    }

    fn render(&self, input: &PageInput<'_>) -> Result<Page> {
        let name = &input.product.name;
        let faq_by_category = Self::group(input.questions);

        Ok(Page::Faq(FaqPage {
            title: format!("Frequently Asked Questions - {}", name),
            product_name: name.clone(),
            introduction: format!("Find answers to common questions about {}.", name),
            faq_items: input.questions.to_vec(),
            categories: faq_by_category.iter().map(|g| g.category.clone()).collect(),
            faq_by_category,
            total_questions: input.questions.len(),
        }))
    }
}

pub struct ProductTemplate {
    blocks: ContentBlocks,
}

impl Default for ProductTemplate {
    fn default() -> Self {
        Self {
            blocks: ContentBlocks::default(),
        }
    }
}

impl ProductTemplate {
    const SECTIONS: [&'static str; 4] = ["benefits", "usage", "ingredients", "safety"];

    fn highlights(product: &ProductRecord) -> Vec<String> {
        let mut highlights = Vec::new();
        if !product.benefits.is_empty() {
            let top: Vec<&str> = product.benefits.iter().take(2).map(String::as_str).collect();
            highlights.push(format!("Key benefits: {}", top.join(", ")));
        }
        if let Some(first) = product.key_ingredients.first() {
            highlights.push(format!("Formulated with {}", first));
        }
        if !product.skin_types.is_empty() {
            highlights.push(format!("Suitable for {} skin", product.skin_types.join(", ")));
        }
        highlights
    }
}

impl PageTemplate for ProductTemplate {
    fn name(&self) -> &'static str {
        "product"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"},
                        "concentration": {"type": "string"},
                        "category": {"type": "string"},
                        "price": {"type": "string"},
                        "skin_types": {"type": "array"},
                        "key_ingredients": {"type": "array"},
                        "benefits": {"type": "array"},
                        "usage_instructions": {"type": "string"},
                        "side_effects": {"type": "string"}
                    }
                }
            },
            "required": ["product"]
        })
    }

    fn render(&self, input: &PageInput<'_>) -> Result<Page> {
        let product = input.product;
        let data = serde_json::to_value(product)?;

        let mut sections = Map::new();
        for section in Self::SECTIONS {
            sections.insert(section.to_string(), self.blocks.render(section, &data)?);
        }

        Ok(Page::Product(ProductPage {
            title: product.name.clone(),
            product_info: ProductInfo::from(product),
            product_highlights: Self::highlights(product),
            sections,
        }))
    }
}

pub struct ComparisonTemplate;

impl ComparisonTemplate {
    fn price_point(a: &str, b: &str) -> ComparisonPoint {
        let (analysis, winner) = match (leading_number(a), leading_number(b)) {
            (Some(x), Some(y)) if x < y => (format!("Product A is ₹{} cheaper", y - x), "Product A"),
            (Some(x), Some(y)) if y < x => (format!("Product B is ₹{} cheaper", x - y), "Product B"),
            (Some(_), Some(_)) => ("Both products have the same price".to_string(), "Same price"),
            _ => ("Price comparison not available".to_string(), "Unable to determine"),
        };
        ComparisonPoint {
            aspect: "Price".to_string(),
            product_a: a.to_string(),
            product_b: b.to_string(),
            analysis,
            winner: winner.to_string(),
        }
    }

    fn concentration_point(a: &str, b: &str) -> ComparisonPoint {
        let analysis = if a.contains("10%") && b.contains("15%") {
            "Product B has 50% higher concentration"
        } else if a.contains("15%") && b.contains("10%") {
            "Product A has 50% higher concentration"
        } else {
            "Similar concentration levels"
        };
        let winner = if a.contains("15%") {
            "Product A (stronger)"
        } else if b.contains("15%") {
            "Product B (stronger)"
        } else {
            "Similar"
        };
        ComparisonPoint {
            aspect: "Concentration".to_string(),
            product_a: a.to_string(),
            product_b: b.to_string(),
            analysis: analysis.to_string(),
            winner: winner.to_string(),
        }
    }

    fn skin_type_point(a: &[String], b: &[String]) -> ComparisonPoint {
        let all = |types: &[String]| types.iter().any(|t| t == "All Skin Types");
        let analysis = if all(b) {
            "Product B is suitable for all skin types"
        } else if all(a) {
            "Product A is suitable for all skin types"
        } else {
            "Both products target specific skin types"
        };
        ComparisonPoint {
            aspect: "Skin Types".to_string(),
            product_a: a.join(", "),
            product_b: b.join(", "),
            analysis: analysis.to_string(),
            winner: "Depends on your skin type".to_string(),
        }
    }

    fn benefits_point(a: &[String], b: &[String]) -> ComparisonPoint {
        let shared: Vec<&str> = a.iter().filter(|x| b.contains(*x)).map(String::as_str).collect();
        let only_a: Vec<&str> = a.iter().filter(|x| !b.contains(*x)).map(String::as_str).collect();
        let only_b: Vec<&str> = b.iter().filter(|x| !a.contains(*x)).map(String::as_str).collect();

        let mut analysis = if shared.is_empty() {
            "Shared benefits: None.".to_string()
        } else {
            format!("Shared benefits: {}.", shared.join(", "))
        };
        if !only_a.is_empty() {
            analysis.push_str(&format!(" Unique to Product A: {}.", only_a.join(", ")));
        }
        if !only_b.is_empty() {
            analysis.push_str(&format!(" Unique to Product B: {}.", only_b.join(", ")));
        }

        let winner = match a.len().cmp(&b.len()) {
            std::cmp::Ordering::Greater => "Product A (more benefits)",
            std::cmp::Ordering::Less => "Product B (more benefits)",
            std::cmp::Ordering::Equal => "Similar benefits",
        };

        ComparisonPoint {
            aspect: "Benefits".to_string(),
            product_a: a.join(", "),
            product_b: b.join(", "),
            analysis,
            winner: winner.to_string(),
        }
    }
}

impl PageTemplate for ComparisonTemplate {
    fn name(&self) -> &'static str {
        "comparison"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_a": {"type": "object"},
                "product_b": {"type": "object"}
            },
            "required": ["product_a", "product_b"]
        })
    }

    fn render(&self, input: &PageInput<'_>) -> Result<Page> {
        let a = input.product;
        let b = input
            .competitor
            .ok_or_else(|| CoordinationError::MissingField("competitor".to_string()))?;

        Ok(Page::Comparison(ComparisonPage {
            title: format!("{} vs {}", a.name, b.name),
            product_a: ProductInfo::from(a),
            product_b: ProductInfo::from(b),
            comparison_points: vec![
                Self::price_point(&a.price, &b.price),
                Self::concentration_point(&a.concentration, &b.concentration),
                Self::skin_type_point(&a.skin_types, &b.skin_types),
                Self::benefits_point(&a.benefits, &b.benefits),
            ],
            summary: format!(
                "{} offers a gentler formulation suitable for beginners and sensitive skin. \
                 {} provides a stronger concentration for those seeking more potent results. \
                 Your choice should depend on your skin sensitivity and experience level with active ingredients.",
                a.name, b.name
            ),
            recommendation: "Choose Product A if you're new to vitamin C or have sensitive skin. \
                Choose Product B if you have experience with active ingredients and want maximum potency."
                .to_string(),
        }))
    }
}

/// Named template registry
pub struct TemplateProcessor {
    templates: Vec<Box<dyn PageTemplate>>,
}

impl Default for TemplateProcessor {
    /// FAQ, Product and Comparison, in that order
    fn default() -> Self {
        let mut processor = Self::empty();
        processor.register(Box::new(FaqTemplate));
        processor.register(Box::new(ProductTemplate::default()));
        processor.register(Box::new(ComparisonTemplate));
        processor
    }
}

impl TemplateProcessor {
    pub fn empty() -> Self {
        Self { templates: Vec::new() }
    }

    /// Add a template, replacing any with the same name
    pub fn register(&mut self, template: Box<dyn PageTemplate>) {
        match self.templates.iter().position(|t| t.name() == template.name()) {
            Some(index) => self.templates[index] = template,
            None => self.templates.push(template),
        }
    }

    fn get(&self, name: &str) -> Result<&dyn PageTemplate> {
        self.templates
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
            .ok_or_else(|| CoordinationError::UnknownTemplate(name.to_string()))
    }

    pub fn render(&self, name: &str, input: &PageInput<'_>) -> Result<Page> {
        self.get(name)?.render(input)
    }

    pub fn schema(&self, name: &str) -> Result<Value> {
        Ok(self.get(name)?.schema())
    }

    pub fn list(&self) -> Vec<&'static str> {
        self.templates.iter().map(|t| t.name()).collect()
    }

    /// Render every registered template in registration order
    pub fn render_all(&self, input: &PageInput<'_>) -> Result<Vec<Page>> {
        self.templates.iter().map(|t| t.render(input)).collect()
    }
}
