//! Categorized FAQ question sets

use common::{ProductRecord, QuestionCategory, QuestionEntry};

fn entry(category: QuestionCategory, priority: u8, question: String, answer: String) -> QuestionEntry {
    QuestionEntry {
        priority,
        ..QuestionEntry::new(category, question, answer)
    }
}

/// Build the full question set for a product, grouped in category order:
/// informational, usage, safety, benefits (one per benefit), purchase,
/// results and comparison.
pub fn generate_questions(product: &ProductRecord) -> Vec<QuestionEntry> {
    use QuestionCategory::*;

    let name = &product.name;
    let skin_types = product.skin_types.join(", ");
    let ingredients = product.key_ingredients.join(", ");
    let mut questions = Vec::new();

    questions.push(entry(
        Informational,
        1,
        format!("What is {}?", name),
        format!("{} is a {} with {}.", name, product.category, product.concentration),
    ));
    questions.push(entry(
        Informational,
        1,
        format!("What are the key ingredients in {}?", name),
        format!("The key ingredients in {} include {}.", name, ingredients),
    ));
    questions.push(entry(
        Informational,
        2,
        format!("What type of product is {}?", name),
        format!(
            "{} is a {} designed for daily use.",
            name,
            product.category.as_str().to_lowercase()
        ),
    ));

    questions.push(entry(
        Usage,
        1,
        format!("How do I use {}?", name),
        product.usage_instructions.clone(),
    ));
    questions.push(entry(
        Usage,
        1,
        format!("Is {} suitable for {} skin?", name, skin_types),
        format!("Yes, {} is formulated for {} skin types.", name, skin_types),
    ));
    questions.push(entry(
        Usage,
        2,
        format!("When should I apply {}?", name),
        format!("Apply {} in the morning before sunscreen for best results.", name),
    ));
    questions.push(entry(
        Usage,
        2,
        format!("How many drops of {} should I use?", name),
        "Use 2-3 drops and gently massage into your face.".to_string(),
    ));

    questions.push(entry(
        Safety,
        1,
        format!("What are the side effects of {}?", name),
        product.side_effects.clone(),
    ));
    questions.push(entry(
        Safety,
        1,
        format!("Is {} safe for sensitive skin?", name),
        format!(
            "{} may cause mild tingling for sensitive skin, but is generally safe for most skin types.",
            name
        ),
    ));
    questions.push(entry(
        Safety,
        2,
        format!("Can I use {} with other skincare products?", name),
        format!(
            "Yes, {} can be used with other skincare products, but apply it before heavier creams.",
            name
        ),
    ));

    for benefit in &product.benefits {
        questions.push(entry(
            Benefits,
            1,
            format!("How does {} help with {}?", name, benefit.to_lowercase()),
            format!(
                "The key ingredients in {} work together to provide {} benefits.",
                name,
                benefit.to_lowercase()
            ),
        ));
    }

    questions.push(entry(
        Purchase,
        2,
        format!("Where can I buy {}?", name),
        format!("{} is available for {}.", name, product.price),
    ));
    questions.push(entry(
        Purchase,
        2,
        format!("Is {} worth the price?", name),
        format!("At {}, {} offers good value for its benefits.", product.price, name),
    ));
    questions.push(entry(
        Purchase,
        3,
        format!("How long does one bottle of {} last?", name),
        format!("One bottle of {} typically lasts 1-2 months with daily use.", name),
    ));

    questions.push(entry(
        Results,
        2,
        format!("How soon will I see results from {}?", name),
        "Most users notice a visible difference within 4-6 weeks of consistent daily use.".to_string(),
    ));
    questions.push(entry(
        Results,
        3,
        format!("Will the results of {} last if I stop using it?", name),
        "Improvements fade gradually without continued use, so keep it in your routine.".to_string(),
    ));

    questions.push(entry(
        Comparison,
        3,
        format!("How does {} compare to other {} products?", name, product.category.as_str().to_lowercase()),
        format!(
            "{} pairs {} with {}, which suits {} skin.",
            name, product.concentration, ingredients, skin_types
        ),
    ));

    questions
}
