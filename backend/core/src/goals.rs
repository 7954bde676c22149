//! Extraction goals: the instruction text and result schema attached to
//! every task sent to the task API.

use serde_json::{json, Value};

use crate::types::CreateTaskRequest;

/// Proxy location requested for every task unless configured otherwise.
pub const DEFAULT_PROXY_LOCATION: &str = "RESIDENTIAL";

const WIDGET_CHECK_GOAL: &str = "Check if an accessibility widget exists on the homepage by \
identifying common accessibility widget elements or their distinctive features. If there is no \
clear and immediate indication of an accessibility widget upon entering the site, extract all of \
the links available on the homepage.";

/// Schema of the widget-check result (`WidgetCheck`).
pub fn widget_check_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "has_widget": { "type": "boolean" },
            "reasoning": { "type": "string" },
            "links": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["has_widget", "reasoning"]
    })
}

/// Schema of a criteria-evaluation result (`Evaluation`).
pub fn evaluation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "compliance": { "type": "boolean" },
            "issues": { "type": "array", "items": { "type": "string" } },
            "passed": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["compliance", "issues", "passed"]
    })
}

/// Goal text for evaluating a page. Criteria are passed through verbatim.
pub fn evaluation_goal(criteria: &[String]) -> String {
    format!(
        "Evaluate the website based on the following criteria: {}.",
        criteria.join(", ")
    )
}

/// Build the widget-check task for a site's homepage.
pub fn widget_check_task(url: &str, proxy_location: &str) -> CreateTaskRequest {
    CreateTaskRequest {
        url: url.to_string(),
        data_extraction_goal: WIDGET_CHECK_GOAL.to_string(),
        proxy_location: proxy_location.to_string(),
        extracted_information_schema: widget_check_schema(),
    }
}

/// Build the evaluation task for a single page.
pub fn evaluation_task(url: &str, criteria: &[String], proxy_location: &str) -> CreateTaskRequest {
    CreateTaskRequest {
        url: url.to_string(),
        data_extraction_goal: evaluation_goal(criteria),
        proxy_location: proxy_location.to_string(),
        extracted_information_schema: evaluation_schema(),
    }
}
