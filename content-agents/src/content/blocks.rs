//! Reusable content blocks
//!
//! Each block turns a product-shaped JSON object into one structured section.
//! Blocks declare the fields they need; `ContentBlocks::render` checks them
//! before generating.

use crate::error::{CoordinationError, Result};
use serde_json::{json, Value};

pub trait ContentBlock: Send + Sync {
    fn name(&self) -> &'static str;

    /// Keys that must be present in the input object
    fn required_fields(&self) -> &'static [&'static str];

    fn generate(&self, data: &Value) -> Value;

    /// First missing required field, if any
    fn missing_field(&self, data: &Value) -> Option<&'static str> {
        self.required_fields()
            .iter()
            .copied()
            .find(|field| data.get(*field).is_none())
    }
}

fn text<'a>(data: &'a Value, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn list(data: &Value, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn first_n(items: &[String], n: usize) -> String {
    items.iter().take(n).cloned().collect::<Vec<_>>().join(", ")
}

pub struct BenefitsBlock;

impl BenefitsBlock {
    fn describe(benefit: &str) -> String {
        match benefit {
            "Brightening" => "Helps to brighten and even out skin tone".to_string(),
            "Fades dark spots" => "Reduces the appearance of dark spots and hyperpigmentation".to_string(),
            "Anti-aging" => "Helps to reduce signs of aging".to_string(),
            "Hydration" => "Provides deep hydration to the skin".to_string(),
            "Firming" => "Helps to improve skin firmness and elasticity".to_string(),
            other => format!("Provides {} benefits", other.to_lowercase()),
        }
    }
}

impl ContentBlock for BenefitsBlock {
    fn name(&self) -> &'static str {
        "benefits"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["benefits"]
    }

    fn generate(&self, data: &Value) -> Value {
        let benefits = list(data, "benefits");
        if benefits.is_empty() {
            return json!({
                "type": "benefits",
                "content": "No specific benefits information available.",
                "main_benefits": [],
            });
        }

        let detailed: Vec<Value> = benefits
            .iter()
            .map(|b| json!({"benefit": b, "description": Self::describe(b)}))
            .collect();

        json!({
            "type": "benefits",
            "main_benefits": benefits,
            "detailed_benefits": detailed,
            "benefits_summary": format!("This product provides {}.", first_n(&benefits, 3)),
        })
    }
}

pub struct UsageBlock;

impl UsageBlock {
    fn tips(skin_types: &[String]) -> Vec<&'static str> {
        let mut tips = Vec::new();
        let has = |t: &str| skin_types.iter().any(|s| s == t);
        if has("Oily") {
            tips.push("Use sparingly on oily areas");
        }
        if has("Sensitive") {
            tips.push("Patch test before full application");
        }
        if has("Combination") {
            tips.push("Focus on drier areas of the face");
        }
        if tips.is_empty() {
            tips.push("Apply to clean, dry skin");
        }
        tips
    }

    fn frequency(instructions: &str) -> &'static str {
        let lower = instructions.to_lowercase();
        match (lower.contains("morning"), lower.contains("evening")) {
            (true, true) => "Twice daily",
            (true, false) => "Once daily (morning)",
            (false, true) => "Once daily (evening)",
            (false, false) => "As needed",
        }
    }
}

impl ContentBlock for UsageBlock {
    fn name(&self) -> &'static str {
        "usage"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["usage_instructions"]
    }

    fn generate(&self, data: &Value) -> Value {
        let instructions = text(data, "usage_instructions");
        if instructions.is_empty() {
            return json!({
                "type": "usage",
                "content": "No specific usage instructions available.",
                "instructions": "",
            });
        }

        let skin_types = list(data, "skin_types");
        json!({
            "type": "usage",
            "instructions": instructions,
            "suitable_for": skin_types,
            "usage_tips": Self::tips(&skin_types),
            "frequency": Self::frequency(instructions),
        })
    }
}

pub struct IngredientsBlock;

impl IngredientsBlock {
    fn describe(ingredient: &str) -> &'static str {
        match ingredient {
            "Vitamin C" => "Powerful antioxidant that brightens skin and fights free radicals",
            "Hyaluronic Acid" => "Provides intense hydration and plumps the skin",
            "Vitamin E" => "Antioxidant that protects and nourishes the skin",
            "Niacinamide" => "Helps to even out skin tone and reduce inflammation",
            "Retinol" => "Promotes cell turnover and reduces signs of aging",
            "Peptides" => "Help to firm and rejuvenate the skin",
            "Antioxidants" => "Protect skin from environmental damage",
            _ => "Beneficial ingredient for skin health",
        }
    }
}

impl ContentBlock for IngredientsBlock {
    fn name(&self) -> &'static str {
        "ingredients"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["key_ingredients"]
    }

    fn generate(&self, data: &Value) -> Value {
        let ingredients = list(data, "key_ingredients");
        if ingredients.is_empty() {
            return json!({
                "type": "ingredients",
                "content": "No specific ingredients information available.",
                "key_ingredients": [],
            });
        }

        let details: Vec<Value> = ingredients
            .iter()
            .map(|i| json!({"ingredient": i, "benefit": Self::describe(i)}))
            .collect();

        json!({
            "type": "ingredients",
            "key_ingredients": ingredients,
            "concentration": text(data, "concentration"),
            "ingredient_details": details,
            "ingredient_summary": format!("Key ingredients include {}.", first_n(&ingredients, 2)),
        })
    }
}

pub struct SafetyBlock;

impl SafetyBlock {
    fn precautions(side_effects: &str) -> Vec<&'static str> {
        let lower = side_effects.to_lowercase();
        let mut precautions = vec![
            "Keep out of reach of children",
            "Store in a cool, dry place",
            "Avoid contact with eyes",
        ];
        if lower.contains("tingling") {
            precautions.push("May cause mild tingling sensation initially");
            precautions.push("Discontinue use if irritation persists");
        }
        if lower.contains("sensitive") {
            precautions.push("Suitable for most skin types but caution for sensitive skin");
        }
        precautions
    }

    fn rating(side_effects: &str) -> &'static str {
        if side_effects.is_empty() {
            "Generally safe for most users"
        } else if side_effects.to_lowercase().contains("mild") {
            "Safe with mild potential side effects"
        } else {
            "Use with caution - consult dermatologist if concerned"
        }
    }
}

impl ContentBlock for SafetyBlock {
    fn name(&self) -> &'static str {
        "safety"
    }

    // side effects are optional
    fn required_fields(&self) -> &'static [&'static str] {
        &[]
    }

    fn generate(&self, data: &Value) -> Value {
        let side_effects = text(data, "side_effects");
        json!({
            "type": "safety",
            "side_effects": side_effects,
            "precautions": Self::precautions(side_effects),
            "patch_test_advice": "Always perform a patch test before using new products",
            "safety_rating": Self::rating(side_effects),
        })
    }
}

/// Side-by-side summary of `product_a` and `product_b`
pub struct ComparisonBlock;

impl ComparisonBlock {
    fn stronger(conc_a: &str, conc_b: &str) -> String {
        if conc_a.contains("10%") && conc_b.contains("15%") {
            format!("{} is stronger", conc_b)
        } else if conc_a.contains("15%") && conc_b.contains("10%") {
            format!("{} is stronger", conc_a)
        } else {
            "Similar concentration levels".to_string()
        }
    }
}

impl ContentBlock for ComparisonBlock {
    fn name(&self) -> &'static str {
        "comparison"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["product_a", "product_b"]
    }

    fn generate(&self, data: &Value) -> Value {
        let a = data.get("product_a").cloned().unwrap_or(Value::Null);
        let b = data.get("product_b").cloned().unwrap_or(Value::Null);
        let name_a = a.get("name").and_then(Value::as_str).unwrap_or("Product A");
        let name_b = b.get("name").and_then(Value::as_str).unwrap_or("Product B");

        let price_a = text(&a, "price");
        let price_b = text(&b, "price");
        let price_winner = match (super::leading_number(price_a), super::leading_number(price_b)) {
            (Some(x), Some(y)) if x < y => format!("{} is more affordable", price_a),
            (Some(x), Some(y)) if y < x => format!("{} is more affordable", price_b),
            (Some(_), Some(_)) => "Same price point".to_string(),
            _ => "Unable to compare prices".to_string(),
        };

        let conc_a = text(&a, "concentration");
        let conc_b = text(&b, "concentration");

        json!({
            "type": "comparison",
            "product_a_name": name_a,
            "product_b_name": name_b,
            "comparison_points": [
                {"aspect": "Price", "product_a": price_a, "product_b": price_b, "winner": price_winner},
                {"aspect": "Concentration", "product_a": conc_a, "product_b": conc_b, "winner": Self::stronger(conc_a, conc_b)},
                {
                    "aspect": "Skin Types",
                    "product_a": list(&a, "skin_types").join(", "),
                    "product_b": list(&b, "skin_types").join(", "),
                    "winner": "Depends on your skin type",
                },
            ],
            "winner_analysis": format!(
                "{} is better for sensitive skin and beginners due to its milder formulation. \
                 {} offers stronger concentration for those looking for more potent results. \
                 Choose based on your skin sensitivity and desired strength.",
                name_a, name_b
            ),
            "recommendation": "For beginners or those with sensitive skin, start with the milder option. \
                For experienced users looking for maximum results, the stronger concentration may be preferable.",
        })
    }
}

/// Registry of content blocks looked up by name
pub struct ContentBlocks {
    blocks: Vec<Box<dyn ContentBlock>>,
}

impl Default for ContentBlocks {
    fn default() -> Self {
        Self {
            blocks: vec![
                Box::new(BenefitsBlock),
                Box::new(UsageBlock),
                Box::new(IngredientsBlock),
                Box::new(SafetyBlock),
                Box::new(ComparisonBlock),
            ],
        }
    }
}

impl ContentBlocks {
    pub fn get(&self, name: &str) -> Result<&dyn ContentBlock> {
        self.blocks
            .iter()
            .find(|block| block.name() == name)
            .map(|block| block.as_ref())
            .ok_or_else(|| CoordinationError::UnknownContentBlock(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.blocks.iter().map(|block| block.name()).collect()
    }

    /// Validate and generate one block
    pub fn render(&self, name: &str, data: &Value) -> Result<Value> {
        let block = self.get(name)?;
        if let Some(field) = block.missing_field(data) {
            return Err(CoordinationError::MissingField(format!("{}.{}", name, field)));
        }
        Ok(block.generate(data))
    }
}
