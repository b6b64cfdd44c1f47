//! Human-in-the-loop confirmation prompt.
//!
//! One prompt per confirmation invocation. The prompt only produces a result
//! value; sending it (once) is the dispatcher's job.

use crate::dispatch::tools::{ButtonSpec, ButtonStyle, ButtonValue, ConfirmationArgs};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("Confirmation already resolved")]
    AlreadyResolved,

    #[error("No option at index {0}")]
    NoSuchOption(usize),

    #[error("Prompt is not in free-text mode")]
    NotInTextMode,

    #[error("Free-text answer is empty")]
    EmptyText,

    #[error("No active confirmation for call '{call_id}'")]
    NotActive { call_id: String },

    #[error("Unknown call '{call_id}'")]
    UnknownCall { call_id: String },
}

/// Where the prompt is in its interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptMode {
    Choosing,
    /// Free-text entry after choosing an "other" option; holds the draft.
    FreeText(String),
    Resolved(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationPrompt {
    pub title: Option<String>,
    pub question: String,
    pub context: Option<String>,
    pub options: Vec<ButtonSpec>,
    mode: PromptMode,
}

/// What happened after an interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The prompt resolved with this result value.
    Resolved(Value),
    /// The prompt switched to free-text entry.
    AwaitingText,
}

fn default_options() -> Vec<ButtonSpec> {
    vec![
        ButtonSpec {
            label: "Confirm".to_string(),
            value: ButtonValue::Bool(true),
            style: Some(ButtonStyle::Primary),
        },
        ButtonSpec {
            label: "Cancel".to_string(),
            value: ButtonValue::Bool(false),
            style: Some(ButtonStyle::Secondary),
        },
    ]
}

fn is_other_label(label: &str) -> bool {
    matches!(label.trim().to_ascii_lowercase().as_str(), "other" | "others")
}

impl ConfirmationPrompt {
    pub fn new(args: &ConfirmationArgs) -> Self {
        let options = match &args.buttons {
            Some(buttons) if !buttons.is_empty() => buttons.clone(),
            _ => default_options(),
        };
        Self {
            title: args.title.clone(),
            question: args.question_text.clone(),
            context: args.confirmation_context.clone(),
            options,
            mode: PromptMode::Choosing,
        }
    }

    pub fn mode(&self) -> &PromptMode {
        &self.mode
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.mode, PromptMode::Resolved(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.mode {
            PromptMode::Resolved(v) => Some(v),
            _ => None,
        }
    }

    pub fn select(&mut self, index: usize) -> Result<Selection, PromptError> {
        if self.is_resolved() {
            return Err(PromptError::AlreadyResolved);
        }
        let option = self
            .options
            .get(index)
            .ok_or(PromptError::NoSuchOption(index))?;

        if is_other_label(&option.label) {
            self.mode = PromptMode::FreeText(String::new());
            return Ok(Selection::AwaitingText);
        }

        // `false` is cancellation; it still resolves with `{confirmed: false}`.
        let result = json!({ "confirmed": option.value.to_json() });
        self.mode = PromptMode::Resolved(result.clone());
        Ok(Selection::Resolved(result))
    }

    /// Select the first option whose label matches, ignoring case.
    pub fn select_label(&mut self, label: &str) -> Result<Selection, PromptError> {
        let index = self
            .options
            .iter()
            .position(|o| o.label.eq_ignore_ascii_case(label.trim()))
            .ok_or(PromptError::NoSuchOption(self.options.len()))?;
        self.select(index)
    }

    /// Replace the free-text draft. Nothing is sent until `submit_text`.
    pub fn update_text(&mut self, text: impl Into<String>) -> Result<(), PromptError> {
        match &mut self.mode {
            PromptMode::FreeText(draft) => {
                *draft = text.into();
                Ok(())
            }
            PromptMode::Resolved(_) => Err(PromptError::AlreadyResolved),
            PromptMode::Choosing => Err(PromptError::NotInTextMode),
        }
    }

    pub fn submit_text(&mut self) -> Result<Value, PromptError> {
        let draft = match &self.mode {
            PromptMode::FreeText(draft) => draft.trim().to_string(),
            PromptMode::Resolved(_) => return Err(PromptError::AlreadyResolved),
            PromptMode::Choosing => return Err(PromptError::NotInTextMode),
        };
        if draft.is_empty() {
            return Err(PromptError::EmptyText);
        }
        let result = json!({ "confirmed": draft });
        self.mode = PromptMode::Resolved(result.clone());
        Ok(result)
    }

    /// Leave free-text entry and go back to the option list.
    pub fn back_to_options(&mut self) -> Result<(), PromptError> {
        match self.mode {
            PromptMode::FreeText(_) => {
                self.mode = PromptMode::Choosing;
                Ok(())
            }
            PromptMode::Resolved(_) => Err(PromptError::AlreadyResolved),
            PromptMode::Choosing => Err(PromptError::NotInTextMode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(buttons: Value) -> ConfirmationPrompt {
        let args: ConfirmationArgs = serde_json::from_value(json!({
            "question_text": "Book the flight?",
            "buttons": buttons,
        }))
        .unwrap();
        ConfirmationPrompt::new(&args)
    }

    #[test]
    fn test_default_options() {
        let p = prompt(Value::Null);
        let labels: Vec<&str> = p.options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["Confirm", "Cancel"]);
    }

    #[test]
    fn test_yes_no_selection() {
        let buttons = json!([{"label": "Yes", "value": true}, {"label": "No", "value": false}]);

        let mut yes = prompt(buttons.clone());
        assert_eq!(yes.select(0).unwrap(), Selection::Resolved(json!({"confirmed": true})));
        assert_eq!(yes.select(1), Err(PromptError::AlreadyResolved));

        let mut no = prompt(buttons);
        assert_eq!(
            no.select_label("no").unwrap(),
            Selection::Resolved(json!({"confirmed": false}))
        );
    }

    #[test]
    fn test_literal_value_is_result() {
        let mut p = prompt(json!([{"label": "Window", "value": "window"}, {"label": "Aisle", "value": "aisle"}]));
        assert_eq!(p.select(1).unwrap(), Selection::Resolved(json!({"confirmed": "aisle"})));
    }

    #[test]
    fn test_other_switches_to_free_text() {
        let mut p = prompt(json!([{"label": "Yes", "value": true}, {"label": "Others", "value": "other"}]));
        assert_eq!(p.select(1).unwrap(), Selection::AwaitingText);
        assert_eq!(p.submit_text(), Err(PromptError::EmptyText));

        p.update_text("next tuesday").unwrap();
        assert!(!p.is_resolved());
        assert_eq!(p.submit_text().unwrap(), json!({"confirmed": "next tuesday"}));
        assert_eq!(p.update_text("again"), Err(PromptError::AlreadyResolved));
    }

    #[test]
    fn test_back_to_options() {
        let mut p = prompt(json!([{"label": "Other", "value": "x"}, {"label": "No", "value": false}]));
        assert_eq!(p.back_to_options(), Err(PromptError::NotInTextMode));
        p.select(0).unwrap();
        p.back_to_options().unwrap();
        assert_eq!(p.mode(), &PromptMode::Choosing);
        assert_eq!(p.select(3), Err(PromptError::NoSuchOption(3)));
    }
}
