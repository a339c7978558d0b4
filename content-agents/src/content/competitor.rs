//! Fictional competitor synthesis

use common::{ProductCategory, ProductRecord};
use std::sync::{Mutex, PoisonError};

const NAME_POOL: [&str; 4] = ["RadiancePlus", "VitaGlow", "Luminex", "BrightenUp"];
const INGREDIENT_POOL: [&str; 4] = ["Vitamin E", "Niacinamide", "Retinol", "Peptides"];

/// Builds a competitor record to compare against the parsed product
pub struct RivalFactory {
    rng: Mutex<fastrand::Rng>,
}

impl Default for RivalFactory {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RivalFactory {
    /// A fixed seed makes the name and extra ingredient reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self { rng: Mutex::new(rng) }
    }

    pub fn synthesize(&self, reference: &ProductRecord) -> ProductRecord {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        let name = NAME_POOL[rng.usize(..NAME_POOL.len())];

        // prefer an ingredient the reference product does not already list
        let fresh: Vec<&str> = INGREDIENT_POOL
            .iter()
            .copied()
            .filter(|i| !reference.key_ingredients.iter().any(|k| k == i))
            .collect();
        let pool: &[&str] = if fresh.is_empty() { &INGREDIENT_POOL } else { &fresh };
        let extra = pool[rng.usize(..pool.len())];

        ProductRecord {
            id: "competitor_1".to_string(),
            name: format!("{} Vitamin C Serum", name),
            concentration: "15% Vitamin C".to_string(),
            category: ProductCategory::Serum,
            skin_types: vec!["All Skin Types".to_string()],
            key_ingredients: vec![
                "Vitamin C".to_string(),
                extra.to_string(),
                "Antioxidants".to_string(),
            ],
            benefits: vec![
                "Anti-aging".to_string(),
                "Brightening".to_string(),
                "Hydration".to_string(),
            ],
            usage_instructions: "Apply 4-5 drops in the evening before moisturizer".to_string(),
            side_effects: "May cause sensitivity for first-time users".to_string(),
            price: "₹899".to_string(),
        }
    }
}
