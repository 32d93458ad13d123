//! Widget catalog and resolver wiring.

use skybridge::{BundleDir, StaticFragments, WidgetResolver, WidgetTemplate};
use std::path::Path;

pub const CARDS: &str = "huggies-cards";
pub const SIZE_CALC: &str = "huggies-size-calc";
pub const MAP: &str = "huggies-map";
pub const OFFERS: &str = "huggies-offers";
pub const NAMES: &str = "huggies-names";
pub const GENDER: &str = "huggies-gender";

/// The six widgets, in advertised order.
pub fn catalog() -> Vec<WidgetTemplate> {
    vec![
        WidgetTemplate::new(CARDS, "Show FAQ Cards", "Searching FAQs", "Found FAQ results"),
        WidgetTemplate::new(
            SIZE_CALC,
            "Diaper Size Calculator",
            "Calculating diaper size",
            "Size recommendation ready",
        ),
        WidgetTemplate::new(MAP, "Store Locator Map", "Finding nearby stores", "Store locations found"),
        WidgetTemplate::new(OFFERS, "Coupons & Offers", "Loading current offers", "Offers displayed"),
        WidgetTemplate::new(
            NAMES,
            "Baby Name Suggestions",
            "Generating name suggestions",
            "Name suggestions ready",
        ),
        WidgetTemplate::new(GENDER, "Gender Predictor", "Predicting gender", "Prediction complete"),
    ]
}

/// HTML shell that mounts the bundled script for a widget. Served when the
/// bundle directory has no built markup for it.
pub fn shell_html(template: &WidgetTemplate, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!(
        "<div id=\"{id}-root\"></div>\n\
         <link rel=\"stylesheet\" href=\"{base}/assets/{id}.css\">\n\
         <script type=\"module\" src=\"{base}/assets/{id}.js\"></script>\n",
        id = template.id,
        base = base,
    )
}

/// Shells for every catalog entry.
pub fn static_fragments(templates: &[WidgetTemplate], base_url: &str) -> StaticFragments {
    templates.iter().fold(StaticFragments::new(), |fragments, template| {
        fragments.with(template.id.clone(), shell_html(template, base_url))
    })
}

/// Bundle directory first, generated shells as fallback.
pub fn resolver(assets_dir: &Path, base_url: &str) -> WidgetResolver {
    let templates = catalog();
    let fallback = static_fragments(&templates, base_url);
    WidgetResolver::new(templates, BundleDir::new(assets_dir), base_url).with_fallback(fallback)
}
