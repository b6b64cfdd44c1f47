//! Typed view of the built-in frontend tools.
//!
//! Incoming arguments are untyped JSON; this module narrows them per tool
//! id and keeps an explicit `Unknown` variant for ids the client has no
//! treatment for.

use crate::catalogue::names;
use crate::dispatch::InvocationState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Danger,
}

/// A button value; `false` means cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ButtonValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl ButtonValue {
    pub fn to_json(&self) -> Value {
        match self {
            ButtonValue::Bool(b) => Value::Bool(*b),
            ButtonValue::Number(n) => Value::Number(n.clone()),
            ButtonValue::Text(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonSpec {
    pub label: String,
    pub value: ButtonValue,
    #[serde(default)]
    pub style: Option<ButtonStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationArgs {
    #[serde(default)]
    pub title: Option<String>,
    pub question_text: String,
    #[serde(default)]
    pub confirmation_context: Option<String>,
    #[serde(default)]
    pub buttons: Option<Vec<ButtonSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCardArgs {
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfoArgs {
    pub tool_name: String,
    pub tool_description: String,
    #[serde(default)]
    pub tool_id: Option<String>,
    #[serde(default)]
    pub tool_parameters: Option<Value>,
    pub tool_status: InvocationState,
    #[serde(default)]
    pub tool_output: Option<Value>,
    #[serde(default)]
    pub tool_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundColorArgs {
    #[serde(rename = "colorHexCode")]
    pub color_hex_code: String,
}

/// An invocation's arguments narrowed by tool id.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontendToolCall {
    AskUserConfirmation(ConfirmationArgs),
    DisplayProductCard(ProductCardArgs),
    DisplayToolInfo(ToolInfoArgs),
    ChangeBackgroundColor(BackgroundColorArgs),
    Unknown { name: String, arguments: Value },
}

impl FrontendToolCall {
    /// Narrow `arguments` for `tool_id`.
    ///
    /// Ids without a typed shape decode to `Unknown`; a known id whose
    /// arguments do not fit returns the serde message.
    pub fn decode(tool_id: &str, arguments: &Value) -> Result<Self, String> {
        fn typed<T: serde::de::DeserializeOwned>(arguments: &Value) -> Result<T, String> {
            serde_json::from_value(arguments.clone()).map_err(|e| e.to_string())
        }

        Ok(match tool_id {
            names::ASK_USER_CONFIRMATION => Self::AskUserConfirmation(typed(arguments)?),
            names::DISPLAY_PRODUCT_CARD => Self::DisplayProductCard(typed(arguments)?),
            names::DISPLAY_TOOL_INFO => Self::DisplayToolInfo(typed(arguments)?),
            names::CHANGE_BACKGROUND_COLOR => Self::ChangeBackgroundColor(typed(arguments)?),
            other => Self::Unknown {
                name: other.to_string(),
                arguments: arguments.clone(),
            },
        })
    }

    pub fn tool_name(&self) -> &str {
        match self {
            Self::AskUserConfirmation(_) => names::ASK_USER_CONFIRMATION,
            Self::DisplayProductCard(_) => names::DISPLAY_PRODUCT_CARD,
            Self::DisplayToolInfo(_) => names::DISPLAY_TOOL_INFO,
            Self::ChangeBackgroundColor(_) => names::CHANGE_BACKGROUND_COLOR,
            Self::Unknown { name, .. } => name,
        }
    }
}
