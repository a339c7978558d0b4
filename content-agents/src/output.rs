//! Writing generated pages and the message log to disk

use crate::bus::MailboxHub;
use crate::error::Result;
use crate::message::MessageRecord;
use common::{Page, PageType};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write each page as pretty JSON named after its page type, creating `dir`
/// if needed. A later page of the same type overwrites an earlier one.
pub fn save_pages(pages: &[Page], dir: impl AsRef<Path>) -> Result<HashMap<PageType, PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = HashMap::new();
    for page in pages {
        let page_type = page.page_type();
        let path = dir.join(page_type.file_name());
        let json = serde_json::to_string_pretty(&page.to_document()?)?;
        fs::write(&path, json)?;
        info!("Saved {} page to {}", page_type, path.display());
        written.insert(page_type, path);
    }
    Ok(written)
}

/// Dump the full message log as a JSON array
pub fn export_message_log(hub: &MailboxHub, path: impl AsRef<Path>) -> Result<usize> {
    let log: Vec<MessageRecord> = hub
        .message_log()
        .iter()
        .map(|m| MessageRecord::from(m.as_ref()))
        .collect();
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path.as_ref(), serde_json::to_string_pretty(&log)?)?;
    Ok(log.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{generate_questions, PageInput, RivalFactory, TemplateProcessor};
    use crate::message::{Message, MessageType, Payload};
    use crate::workers::parse_product;
    use serde_json::{json, Value};

    fn pages() -> Vec<Page> {
        let product = parse_product(
            &json!({"Product Name": "GlowBoost Vitamin C Serum", "Price": "₹699"}),
            "product_1",
        )
        .unwrap();
        let rival = RivalFactory::default().synthesize(&product);
        let questions = generate_questions(&product);
        TemplateProcessor::default()
            .render_all(&PageInput {
                product: &product,
                competitor: Some(&rival),
                questions: &questions,
            })
            .unwrap()
    }

    #[test]
    fn test_save_pages_names_files_by_type() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("outputs");
        let written = save_pages(&pages(), &out).unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(written[&PageType::Faq], out.join("faq_page.json"));
        assert!(out.join("product_page.json").exists());
        assert!(out.join("comparison_page.json").exists());

        let faq: Value = serde_json::from_str(&fs::read_to_string(out.join("faq_page.json")).unwrap()).unwrap();
        assert_eq!(faq["page_type"], json!("FAQ"));
        assert!(faq["faq_items"].as_array().unwrap().len() >= 15);
    }

    #[test]
    fn test_export_message_log() {
        let hub = MailboxHub::new();
        hub.send(Message::new("a", "b", MessageType::StatusUpdate, Payload::new()));
        hub.send(Message::new("b", "a", MessageType::TaskResponse, Payload::new()));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("messages.json");
        assert_eq!(export_message_log(&hub, &path).unwrap(), 2);

        let records: Vec<MessageRecord> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(records[0].sender, "a");
        assert_eq!(records[1].message_type, MessageType::TaskResponse);
        assert_eq!(records[0].id, hub.message_log()[0].id());
    }
}
