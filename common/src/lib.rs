//! Shared domain types for the content pipeline.
//!
//! Product records, FAQ entries and the three page documents travel between
//! agents as message payloads, so everything here is plain serde data.

pub mod page;
pub mod product;

pub use page::{
    ComparisonPage, ComparisonPoint, FaqGroup, FaqPage, Page, PageType, ProductInfo, ProductPage,
};
pub use product::{ProductCategory, ProductRecord, QuestionCategory, QuestionEntry};
