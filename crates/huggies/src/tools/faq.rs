//! FAQ search, listing, and lookup.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use skybridge::schema_helpers::optional_positive_u32_schema;
use skybridge::{InvocationResult, McpError, ToolDescriptor};
use std::sync::Arc;

use super::{tool, NoArguments};
use crate::knowledge::{FaqEntry, KnowledgeBase};
use crate::widgets;

/// Answers in lookup summaries are cut to this many characters.
const SUMMARY_CHARS: usize = 300;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetFaqRequest {
    /// Words to look for in FAQ questions, answers, and tags
    #[schemars(description = "Search text (matched case-insensitively)")]
    pub query: String,

    #[schemars(description = "Max results (default: all matches)")]
    #[schemars(schema_with = "optional_positive_u32_schema")]
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetItemRequest {
    #[schemars(description = "FAQ entry id, e.g. faq-001")]
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct FaqResult {
    pub id: String,
    pub title: String,
    pub answer: String,
    pub source_url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub tags: Vec<String>,
}

impl From<&FaqEntry> for FaqResult {
    fn from(entry: &FaqEntry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            answer: entry.answer.clone(),
            source_url: entry.source_url.clone(),
            kind: entry.kind.clone(),
            tags: entry.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CardMeta {
    pub id: String,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Card {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub text: String,
    pub meta: CardMeta,
}

impl From<&FaqResult> for Card {
    fn from(result: &FaqResult) -> Self {
        Self {
            kind: "card".to_string(),
            title: result.title.clone(),
            text: result.answer.clone(),
            meta: CardMeta {
                id: result.id.clone(),
                source_url: result.source_url.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CardsWidget {
    pub widget_type: String,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct GetFaqOutput {
    pub text: String,
    pub results: Vec<FaqResult>,
    pub widget: CardsWidget,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct FaqSummary {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ListFaqsOutput {
    pub text: String,
    pub results: Vec<FaqSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct GetItemOutput {
    pub text: String,
    pub item: FaqEntry,
}

/// Entries whose question, answer, or any tag contains the trimmed query,
/// in table order. A blank query matches nothing.
pub fn search<'a>(kb: &'a KnowledgeBase, query: &str, limit: Option<u32>) -> Vec<&'a FaqEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);
    kb.faqs
        .iter()
        .filter(|entry| entry.matches(&needle))
        .take(limit)
        .collect()
}

pub fn run_get_faq(kb: &KnowledgeBase, request: &GetFaqRequest) -> GetFaqOutput {
    let query = request.query.trim();
    let results: Vec<FaqResult> = search(kb, query, request.limit)
        .into_iter()
        .map(FaqResult::from)
        .collect();

    let text = if query.is_empty() {
        "Query is required".to_string()
    } else if let Some(top) = results.first() {
        format!("{}: {}", top.title, top.answer)
    } else {
        format!("No matching FAQ found for \"{}\".", query)
    };

    let cards = results.iter().map(Card::from).collect();
    GetFaqOutput {
        text,
        results,
        widget: CardsWidget {
            widget_type: "cards".to_string(),
            cards,
        },
    }
}

pub fn run_list_faqs(kb: &KnowledgeBase) -> ListFaqsOutput {
    let results: Vec<FaqSummary> = kb
        .faqs
        .iter()
        .map(|entry| FaqSummary {
            id: entry.id.clone(),
            title: entry.title.clone(),
            kind: entry.kind.clone(),
        })
        .collect();
    ListFaqsOutput {
        text: format!("{} FAQs available.", results.len()),
        results,
    }
}

pub fn run_get_item(kb: &KnowledgeBase, item_id: &str) -> Result<GetItemOutput, McpError> {
    let item = kb
        .find_faq(item_id)
        .ok_or_else(|| McpError::not_found(format!("Item with id={} not found", item_id)))?;
    let summary: String = item.answer.chars().take(SUMMARY_CHARS).collect();
    Ok(GetItemOutput {
        text: format!("{}: {}...", item.title, summary),
        item: item.clone(),
    })
}

pub fn get_faq(kb: Arc<KnowledgeBase>) -> ToolDescriptor {
    ToolDescriptor::typed(
        tool::<GetFaqRequest, GetFaqOutput>(
            "get_faq",
            "Search FAQs",
            "Search FAQs and return results with widget cards.",
        ),
        move |request: GetFaqRequest| {
            let output = run_get_faq(&kb, &request);
            tracing::debug!(query = %request.query, results = output.results.len(), "FAQ search");
            Ok(InvocationResult::with_output(output.text.clone(), &output))
        },
    )
    .with_output_template(widgets::CARDS)
}

pub fn list_faqs(kb: Arc<KnowledgeBase>) -> ToolDescriptor {
    ToolDescriptor::typed(
        tool::<NoArguments, ListFaqsOutput>("list_faqs", "List FAQs", "List all available FAQs."),
        move |_: NoArguments| {
            let output = run_list_faqs(&kb);
            Ok(InvocationResult::with_output(output.text.clone(), &output))
        },
    )
    .with_output_template(widgets::CARDS)
}

pub fn get_item_by_id(kb: Arc<KnowledgeBase>) -> ToolDescriptor {
    ToolDescriptor::typed(
        tool::<GetItemRequest, GetItemOutput>(
            "get_item_by_id",
            "Get FAQ Item",
            "Get a specific FAQ item by ID.",
        ),
        move |request: GetItemRequest| {
            let output = run_get_item(&kb, &request.item_id)?;
            Ok(InvocationResult::with_output(output.text.clone(), &output))
        },
    )
    .with_output_template(widgets::CARDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, question: &str, answer: &str, tags: &[&str]) -> FaqEntry {
        FaqEntry {
            id: id.to_string(),
            title: format!("Title {}", id),
            question: question.to_string(),
            answer: answer.to_string(),
            source_url: format!("https://example.com/{}", id),
            kind: "faq".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn kb() -> KnowledgeBase {
        KnowledgeBase {
            faqs: vec![
                entry("a", "How do I stop LEAKS?", "Fasten snugly.", &["fit"]),
                entry("b", "What size?", "Check the weight range.", &["size"]),
                entry("c", "Rash care", "Barrier cream helps with leaks.", &[]),
                entry("d", "Swimming", "Use swim diapers.", &["Leaks", "pool"]),
            ],
            ..Default::default()
        }
    }

    fn ids(entries: &[&FaqEntry]) -> Vec<String> {
        entries.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn search_matches_question_answer_and_tags_in_table_order() {
        let kb = kb();
        assert_eq!(ids(&search(&kb, "leaks", None)), vec!["a", "c", "d"]);
    }

    #[test]
    fn search_trims_and_ignores_case() {
        let kb = kb();
        assert_eq!(ids(&search(&kb, "  WEIGHT ", None)), vec!["b"]);
    }

    #[test]
    fn search_respects_limit() {
        let kb = kb();
        assert_eq!(ids(&search(&kb, "leaks", Some(2))), vec!["a", "c"]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let output = run_get_faq(
            &kb(),
            &GetFaqRequest {
                query: "teething".to_string(),
                limit: None,
            },
        );
        assert!(output.results.is_empty());
        assert!(output.widget.cards.is_empty());
        assert_eq!(output.text, "No matching FAQ found for \"teething\".");
    }

    #[test]
    fn blank_query_asks_for_one() {
        let output = run_get_faq(
            &kb(),
            &GetFaqRequest {
                query: "   ".to_string(),
                limit: None,
            },
        );
        assert_eq!(output.text, "Query is required");
        assert!(output.results.is_empty());
    }

    #[test]
    fn cards_mirror_results() {
        let output = run_get_faq(
            &kb(),
            &GetFaqRequest {
                query: "size".to_string(),
                limit: None,
            },
        );
        assert_eq!(output.text, "Title b: Check the weight range.");
        assert_eq!(output.widget.widget_type, "cards");
        let card = &output.widget.cards[0];
        assert_eq!(card.kind, "card");
        assert_eq!(card.meta.id, "b");
        assert_eq!(card.meta.source_url, "https://example.com/b");
    }

    #[test]
    fn list_reports_every_entry() {
        let output = run_list_faqs(&kb());
        assert_eq!(output.text, "4 FAQs available.");
        assert_eq!(output.results[3].id, "d");
    }

    #[test]
    fn get_item_truncates_long_answers() {
        let mut kb = kb();
        kb.faqs[0].answer = "x".repeat(400);
        let output = run_get_item(&kb, "a").unwrap();
        assert_eq!(output.text, format!("Title a: {}...", "x".repeat(300)));
        assert_eq!(output.item.answer.len(), 400);
    }

    #[test]
    fn get_item_unknown_is_not_found() {
        let err = run_get_item(&kb(), "zzz").unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn serialized_output_uses_wire_names() {
        let output = run_get_faq(
            &kb(),
            &GetFaqRequest {
                query: "pool".to_string(),
                limit: None,
            },
        );
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["results"][0]["type"], "faq");
        assert_eq!(value["widget"]["cards"][0]["type"], "card");
    }
}
