//! Static knowledge tables: FAQ entries, retailers, offers, and names.
//!
//! Loaded once at startup and shared read-only behind an `Arc`. The tables
//! compiled into the binary are used unless a JSON file is configured.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

const EMBEDDED: &str = include_str!("../data/knowledge.json");

/// One FAQ or product entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaqEntry {
    pub id: String,
    pub title: String,
    pub question: String,
    pub answer: String,
    pub source_url: String,
    /// Entry category (faq, product, program).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FaqEntry {
    /// Case-insensitive substring match over question, answer, and tags.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.question.to_lowercase().contains(needle)
            || self.answer.to_lowercase().contains(needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle))
    }
}

/// A retailer shown on the store map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Store {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub distance_miles: f64,
    pub lat: f64,
    pub lon: f64,
    pub phone: String,
}

/// A coupon or promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Offer {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// `YYYY-MM-DD`, or null for open-ended offers.
    pub expires: Option<String>,
    pub source_url: String,
}

/// Every table the handlers read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub faqs: Vec<FaqEntry>,
    #[serde(default)]
    pub stores: Vec<Store>,
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub names: Vec<String>,
}

impl KnowledgeBase {
    /// Tables compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED).context("Embedded knowledge tables are invalid")
    }

    /// Load from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge file {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse knowledge file {}", path.display()))
    }

    /// Configured file if given, embedded tables otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let kb = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::embedded()?,
        };
        tracing::info!(
            source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "embedded".to_string()),
            faqs = kb.faqs.len(),
            stores = kb.stores.len(),
            offers = kb.offers.len(),
            names = kb.names.len(),
            "Knowledge tables loaded"
        );
        Ok(kb)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn find_faq(&self, id: &str) -> Option<&FaqEntry> {
        self.faqs.iter().find(|entry| entry.id == id)
    }
}
