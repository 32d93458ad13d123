//! Diaper size calculator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use skybridge::{InvocationResult, McpError, ToolDescriptor};

use super::{round2, tool};
use crate::widgets;

/// International avoirdupois pound.
pub const KG_PER_LB: f64 = 0.45359237;

const ADVICE: &str = "If you see red marks around the legs, frequent leaks, or difficulty \
                      closing tabs, consider sizing up.";

/// Upper bounds in pounds, paired with size and range description. Checked
/// in order after conversion to kilograms.
const SIZE_TABLE: [(f64, &str, &str); 6] = [
    (10.0, "N (Newborn)", "up to 10 lbs"),
    (14.0, "1", "8–14 lbs"),
    (18.0, "2", "12–18 lbs"),
    (28.0, "3", "16–28 lbs"),
    (37.0, "4", "22–37 lbs"),
    (40.0, "5", "27+ lbs (varies by product)"),
];

const LARGEST: (&str, &str) = ("6", "35+ lbs");

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DiaperSizeRequest {
    #[schemars(description = "Baby's weight in kilograms (give this or weight_lb)")]
    #[serde(default)]
    pub weight_kg: Option<f64>,

    #[schemars(description = "Baby's weight in pounds (give this or weight_kg)")]
    #[serde(default)]
    pub weight_lb: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SizeRecommendation {
    pub weight_kg: f64,
    pub weight_lb: f64,
    pub recommended_size: String,
    pub weight_range_description: String,
    pub advice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct InfoCardWidget {
    pub widget_type: String,
    pub data: SizeRecommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct DiaperSizeOutput {
    pub text: String,
    pub backend: SizeRecommendation,
    pub widget: InfoCardWidget,
}

/// Weight in kilograms from exactly one of the two inputs.
pub fn weight_in_kg(request: &DiaperSizeRequest) -> Result<f64, McpError> {
    let kg = match (request.weight_kg, request.weight_lb) {
        (Some(kg), None) => kg,
        (None, Some(lb)) => lb * KG_PER_LB,
        (Some(_), Some(_)) => {
            return Err(McpError::invalid_argument(
                "Provide weight_kg or weight_lb, not both",
            ))
        }
        (None, None) => {
            return Err(McpError::invalid_argument("Please provide weight_kg or weight_lb."))
        }
    };

    if !kg.is_finite() || kg <= 0.0 {
        return Err(McpError::invalid_argument("Weight must be a positive number"));
    }
    Ok(kg)
}

/// Size and range description for a weight. A weight exactly on a bound
/// takes the smaller size.
pub fn size_for_kg(kg: f64) -> (&'static str, &'static str) {
    SIZE_TABLE
        .iter()
        .find(|(bound_lb, _, _)| kg <= bound_lb * KG_PER_LB)
        .map(|(_, size, range)| (*size, *range))
        .unwrap_or(LARGEST)
}

pub fn recommend(request: &DiaperSizeRequest) -> Result<DiaperSizeOutput, McpError> {
    let kg = weight_in_kg(request)?;
    let (size, range) = size_for_kg(kg);

    let backend = SizeRecommendation {
        weight_kg: round2(kg),
        weight_lb: round2(kg / KG_PER_LB),
        recommended_size: size.to_string(),
        weight_range_description: range.to_string(),
        advice: ADVICE.to_string(),
    };
    let text = format!(
        "For approx {} lbs ({} kg), recommended size: {} ({}). {}",
        backend.weight_lb, backend.weight_kg, size, range, ADVICE
    );

    Ok(DiaperSizeOutput {
        text,
        widget: InfoCardWidget {
            widget_type: "info_card".to_string(),
            data: backend.clone(),
        },
        backend,
    })
}

pub fn diaper_size_calc() -> ToolDescriptor {
    ToolDescriptor::typed(
        tool::<DiaperSizeRequest, DiaperSizeOutput>(
            "diaper_size_calc",
            "Diaper Size Calculator",
            "Calculate recommended diaper size based on baby's weight.",
        ),
        |request: DiaperSizeRequest| {
            let output = recommend(&request)?;
            Ok(InvocationResult::with_output(output.text.clone(), &output))
        },
    )
    .with_output_template(widgets::SIZE_CALC)
}
