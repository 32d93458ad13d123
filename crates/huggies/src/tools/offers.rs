//! Current coupons and offers.

use schemars::JsonSchema;
use serde::Serialize;
use skybridge::{InvocationResult, ToolDescriptor};
use std::sync::Arc;

use super::{tool, NoArguments};
use crate::knowledge::{KnowledgeBase, Offer};
use crate::widgets;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct OfferList {
    pub offers: Vec<Offer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct OffersWidget {
    pub widget_type: String,
    pub offers: Vec<Offer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CouponsOutput {
    pub text: String,
    pub backend: OfferList,
    pub widget: OffersWidget,
}

/// The offer table, verbatim.
pub fn current(kb: &KnowledgeBase) -> CouponsOutput {
    CouponsOutput {
        text: format!("{} current offers available.", kb.offers.len()),
        backend: OfferList {
            offers: kb.offers.clone(),
        },
        widget: OffersWidget {
            widget_type: "offers_list".to_string(),
            offers: kb.offers.clone(),
        },
    }
}

pub fn coupons(kb: Arc<KnowledgeBase>) -> ToolDescriptor {
    ToolDescriptor::typed(
        tool::<NoArguments, CouponsOutput>(
            "coupons",
            "Coupons & Offers",
            "Get current Huggies coupons and offers.",
        ),
        move |_: NoArguments| {
            let output = current(&kb);
            Ok(InvocationResult::with_output(output.text.clone(), &output))
        },
    )
    .with_output_template(widgets::OFFERS)
}
