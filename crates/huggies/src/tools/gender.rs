//! Playful gender prediction. Deterministic, not medical.

use chrono::{Datelike, Duration, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use skybridge::{InvocationResult, McpError, ToolDescriptor};

use super::tool;
use crate::widgets;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Conception to due date.
const GESTATION_DAYS: i64 = 266;

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PredictGenderRequest {
    #[schemars(description = "Due date, YYYY-MM-DD")]
    #[serde(default)]
    pub due_date: Option<String>,

    #[schemars(description = "Conception date, YYYY-MM-DD (used when no due_date is given)")]
    #[serde(default)]
    pub conception_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Prediction {
    /// "boy" or "girl"
    pub prediction: String,
    /// Effective due date the prediction was made from.
    pub due_date: String,
    /// True when the due date was derived from the conception date.
    pub due_date_estimated: bool,
    pub conception_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct GenderWidget {
    pub widget_type: String,
    pub prediction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PredictGenderOutput {
    pub text: String,
    pub backend: Prediction,
    pub widget: GenderWidget,
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, McpError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        McpError::invalid_argument(format!("{} must be YYYY-MM-DD, got {:?}: {}", field, value, e))
    })
}

/// The due date, or conception date plus 266 days.
pub fn effective_due_date(request: &PredictGenderRequest) -> Result<(NaiveDate, bool), McpError> {
    match (&request.due_date, &request.conception_date) {
        (Some(due), _) => Ok((parse_date("due_date", due)?, false)),
        (None, Some(conception)) => {
            let conceived = parse_date("conception_date", conception)?;
            let due = conceived
                .checked_add_signed(Duration::days(GESTATION_DAYS))
                .ok_or_else(|| McpError::invalid_argument("conception_date is out of range"))?;
            Ok((due, true))
        }
        (None, None) => Err(McpError::invalid_argument(
            "Provide due_date or conception_date",
        )),
    }
}

/// Odd day of month is a boy, even is a girl.
pub fn predict_for(due: NaiveDate) -> &'static str {
    if due.day() % 2 == 1 {
        "boy"
    } else {
        "girl"
    }
}

pub fn predict(request: &PredictGenderRequest) -> Result<PredictGenderOutput, McpError> {
    let (due, estimated) = effective_due_date(request)?;
    let prediction = predict_for(due).to_string();

    Ok(PredictGenderOutput {
        text: format!("Playful prediction: {} (not medical).", prediction),
        widget: GenderWidget {
            widget_type: "gender_predictor".to_string(),
            prediction: prediction.clone(),
        },
        backend: Prediction {
            prediction,
            due_date: due.format(DATE_FORMAT).to_string(),
            due_date_estimated: estimated,
            conception_date: request.conception_date.clone(),
        },
    })
}

pub fn predict_gender() -> ToolDescriptor {
    ToolDescriptor::typed(
        tool::<PredictGenderRequest, PredictGenderOutput>(
            "predict_gender",
            "Gender Predictor",
            "Playful gender prediction (not medical).",
        ),
        |request: PredictGenderRequest| {
            let output = predict(&request)?;
            Ok(InvocationResult::with_output(output.text.clone(), &output))
        },
    )
    .with_output_template(widgets::GENDER)
}
