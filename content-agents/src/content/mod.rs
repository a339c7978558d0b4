//! Content collaborator - question sets, competitor synthesis, content blocks
//! and page templates
//!
//! Everything here is synchronous and side-effect free apart from the
//! competitor's random choice. Agents call into it with structured records
//! and get structured results back.

pub mod blocks;
pub mod competitor;
pub mod questions;
pub mod templates;

pub use blocks::{ContentBlock, ContentBlocks};
pub use competitor::RivalFactory;
pub use questions::generate_questions;
pub use templates::{PageInput, PageTemplate, TemplateProcessor};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"\d+").unwrap();
}

/// First run of digits in a price-like string, e.g. `₹699` -> 699
pub(crate) fn leading_number(text: &str) -> Option<u64> {
    NUMBER.find(text).and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("₹699"), Some(699));
        assert_eq!(leading_number("Rs. 1299 only"), Some(1299));
        assert_eq!(leading_number("free"), None);
    }
}
