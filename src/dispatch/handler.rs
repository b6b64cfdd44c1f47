//! Local handlers for tools the client resolves itself.
//!
//! A handler never fails with an `Err`: malformed arguments and failed
//! side-effect checks become `{success: false, error}` results that are
//! sent back to the agent like any other result. The exception is a
//! dependency that could not be reached at all; such a result is marked
//! [`HandlerResult::unreachable`] and held back so the user can retry.

use crate::dispatch::tools::ProductCardArgs;
use crate::transport::{ImageCheck, ImageProbe};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use url::Url;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("hex color pattern is valid")
});

pub const INVALID_COLOR_MESSAGE: &str =
    "Invalid color format. Please use a valid hex color code (e.g. #FF5733)";
pub const PRICE_NOT_NUMBER_MESSAGE: &str = "Price must be a number";
pub const PRICE_NOT_POSITIVE_MESSAGE: &str = "Price must be a positive number";

/// UI change requested by a successful handler.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SetBackground(String),
    ShowProductCard(ProductCardArgs),
}

/// Result payload plus the UI change to apply if it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResult {
    pub value: Value,
    pub effect: Option<UiAction>,
    /// Set when the result reflects a transport failure rather than an
    /// answer; the dispatcher does not send such results.
    pub unreachable: Option<String>,
}

impl HandlerResult {
    pub fn success(value: Value) -> Self {
        Self {
            value,
            effect: None,
            unreachable: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            value: json!({ "success": false, "error": error.into() }),
            effect: None,
            unreachable: None,
        }
    }

    /// A failure caused by a dependency that could not be reached.
    pub fn unreachable(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            unreachable: Some(error.clone()),
            ..Self::failure(error)
        }
    }

    pub fn with_effect(mut self, effect: UiAction) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn is_success(&self) -> bool {
        self.value.get("success").and_then(Value::as_bool) == Some(true)
    }

    pub fn is_retryable(&self) -> bool {
        self.unreachable.is_some()
    }
}

#[async_trait]
pub trait LocalHandler: Send + Sync {
    /// Field-level checks on the fields that are present.
    ///
    /// Runs before required-field presence is checked, so a bad value is
    /// reported even when another field is missing.
    fn validate(&self, _arguments: &Value) -> Result<(), String> {
        Ok(())
    }

    /// Compute the result. Only called after validation passed.
    async fn handle(&self, arguments: &Value) -> HandlerResult;
}

/// Handles `change_background_color`.
#[derive(Debug, Default, Clone)]
pub struct BackgroundColorHandler;

impl BackgroundColorHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocalHandler for BackgroundColorHandler {
    fn validate(&self, arguments: &Value) -> Result<(), String> {
        match arguments.get("colorHexCode") {
            None | Some(Value::Null) => Ok(()),
            Some(Value::String(c)) if HEX_COLOR.is_match(c) => Ok(()),
            Some(_) => Err(INVALID_COLOR_MESSAGE.to_string()),
        }
    }

    async fn handle(&self, arguments: &Value) -> HandlerResult {
        let Some(color) = arguments.get("colorHexCode").and_then(Value::as_str) else {
            return HandlerResult::failure(INVALID_COLOR_MESSAGE);
        };
        if !HEX_COLOR.is_match(color) {
            return HandlerResult::failure(INVALID_COLOR_MESSAGE);
        }
        HandlerResult::success(json!({
            "success": true,
            "message": format!("Background color changed to {}", color),
        }))
        .with_effect(UiAction::SetBackground(color.to_string()))
    }
}

/// Handles `display_product_card`; checks the price and that the image loads.
pub struct ProductCardHandler {
    probe: Arc<dyn ImageProbe>,
}

impl ProductCardHandler {
    pub fn new(probe: Arc<dyn ImageProbe>) -> Self {
        Self { probe }
    }

    async fn check_image(&self, raw: &str) -> Result<(), HandlerResult> {
        let url = Url::parse(raw)
            .map_err(|e| HandlerResult::failure(format!("Image failed to load: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HandlerResult::failure(format!(
                "Image failed to load: unsupported URL scheme '{}'",
                url.scheme()
            )));
        }
        match self.probe.probe(&url).await {
            ImageCheck::Loadable => Ok(()),
            ImageCheck::NotLoadable(reason) => Err(HandlerResult::failure(format!(
                "Image failed to load: {}",
                reason
            ))),
            ImageCheck::Unreachable(reason) => Err(HandlerResult::unreachable(format!(
                "Image failed to load: {}",
                reason
            ))),
        }
    }
}

#[async_trait]
impl LocalHandler for ProductCardHandler {
    fn validate(&self, arguments: &Value) -> Result<(), String> {
        match arguments.get("price") {
            None | Some(Value::Null) => Ok(()),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(p) if p > 0.0 => Ok(()),
                _ => Err(PRICE_NOT_POSITIVE_MESSAGE.to_string()),
            },
            Some(_) => Err(PRICE_NOT_NUMBER_MESSAGE.to_string()),
        }
    }

    async fn handle(&self, arguments: &Value) -> HandlerResult {
        let args: ProductCardArgs = match serde_json::from_value(arguments.clone()) {
            Ok(a) => a,
            Err(e) => return HandlerResult::failure(format!("Invalid product card arguments: {}", e)),
        };
        if args.price <= 0.0 {
            return HandlerResult::failure(PRICE_NOT_POSITIVE_MESSAGE);
        }

        if let Some(raw) = args.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
            if let Err(rejected) = self.check_image(raw).await {
                debug!(product_id = %args.product_id, result = %rejected.value, "product image rejected");
                return rejected;
            }
        }

        HandlerResult::success(json!({
            "success": true,
            "product_id": args.product_id,
            "message": "Product card displayed",
        }))
        .with_effect(UiAction::ShowProductCard(args))
    }
}
