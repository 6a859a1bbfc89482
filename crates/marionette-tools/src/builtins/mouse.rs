//! Mouse actions - move, click, scroll, position

use crate::driver::{InputDriver, MouseButton};
use crate::error::{Error, Result};
use crate::registry::{
    opt_f64, opt_i64, opt_str, req_i64, Action, ActionCategory, ActionDefinition, ParamKind,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default pointer travel time
const DEFAULT_MOVE_SECS: f64 = 0.15;

/// Longest pointer travel time
const MAX_MOVE_SECS: f64 = 5.0;

/// Upper bound on repeated clicks in one action
const MAX_CLICKS: i64 = 10;

/// Upper bound on wheel clicks in either direction
const MAX_SCROLL_CLICKS: i64 = 100;

// ============================================================================
// mouse.move
// ============================================================================

/// Move the pointer to an absolute position
pub struct MouseMoveAction {
    definition: ActionDefinition,
    driver: Arc<dyn InputDriver>,
}

impl MouseMoveAction {
    /// Create a new move action
    #[must_use]
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        let definition = ActionDefinition::new(
            "mouse.move",
            "Move the mouse pointer to absolute screen coordinates (x, y)",
        )
        .with_category(ActionCategory::Mouse)
        .with_required("x", ParamKind::Integer)
        .with_required("y", ParamKind::Integer)
        .with_optional("duration", ParamKind::Number)
        .paced();

        Self { definition, driver }
    }
}

#[async_trait::async_trait]
impl Action for MouseMoveAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let x = req_i64(params, "x")?;
        let y = req_i64(params, "y")?;
        let duration = opt_f64(params, "duration")?.unwrap_or(DEFAULT_MOVE_SECS);
        if !(0.0..=MAX_MOVE_SECS).contains(&duration) {
            return Err(Error::InvalidInput(format!(
                "duration must be between 0 and {MAX_MOVE_SECS} seconds, got {duration}"
            )));
        }
        let duration = Duration::from_secs_f64(duration);

        self.driver.screen_size().await?.check(x, y)?;
        debug!(x, y, "Moving pointer");
        self.driver.move_to(x, y, duration).await?;

        Ok(json!({"x": x, "y": y, "message": format!("Moved to ({x}, {y})")}))
    }
}

// ============================================================================
// mouse.click / mouse.double_click
// ============================================================================

/// Click a button, optionally after moving to (x, y)
pub struct MouseClickAction {
    definition: ActionDefinition,
    driver: Arc<dyn InputDriver>,
    default_clicks: i64,
}

impl MouseClickAction {
    /// Create the single-click action
    #[must_use]
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        let definition = ActionDefinition::new(
            "mouse.click",
            "Click a mouse button (left/right/middle, default left), optionally at (x, y)",
        )
        .with_category(ActionCategory::Mouse)
        .with_optional("button", ParamKind::String)
        .with_optional("x", ParamKind::Integer)
        .with_optional("y", ParamKind::Integer)
        .with_optional("clicks", ParamKind::Integer)
        .paced();

        Self {
            definition,
            driver,
            default_clicks: 1,
        }
    }

    /// Create the double-click action
    #[must_use]
    pub fn double(driver: Arc<dyn InputDriver>) -> Self {
        let definition = ActionDefinition::new(
            "mouse.double_click",
            "Double-click a mouse button, optionally at (x, y)",
        )
        .with_category(ActionCategory::Mouse)
        .with_optional("button", ParamKind::String)
        .with_optional("x", ParamKind::Integer)
        .with_optional("y", ParamKind::Integer)
        .paced();

        Self {
            definition,
            driver,
            default_clicks: 2,
        }
    }
}

#[async_trait::async_trait]
impl Action for MouseClickAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let button: MouseButton = opt_str(params, "button")?.unwrap_or("left").parse()?;
        let clicks = opt_i64(params, "clicks")?.unwrap_or(self.default_clicks);
        if !(1..=MAX_CLICKS).contains(&clicks) {
            return Err(Error::InvalidInput(format!(
                "clicks must be between 1 and {MAX_CLICKS}, got {clicks}"
            )));
        }

        let target = match (opt_i64(params, "x")?, opt_i64(params, "y")?) {
            (Some(x), Some(y)) => Some((x, y)),
            (None, None) => None,
            _ => {
                return Err(Error::InvalidInput(
                    "x and y must be given together".to_string(),
                ))
            }
        };

        if let Some((x, y)) = target {
            self.driver.screen_size().await?.check(x, y)?;
            self.driver.move_to(x, y, Duration::ZERO).await?;
        }

        // clicks is within 1..=MAX_CLICKS here
        let count = u32::try_from(clicks).unwrap_or(1);
        debug!(button = button.as_str(), clicks = count, "Clicking");
        self.driver.click(button, count).await?;

        let position = self.driver.cursor_position().await?;
        Ok(json!({
            "button": button.as_str(),
            "clicks": count,
            "x": position.x,
            "y": position.y,
            "message": format!("Clicked {} ({}x) at ({}, {})", button.as_str(), count, position.x, position.y)
        }))
    }
}

// ============================================================================
// mouse.scroll
// ============================================================================

/// Scroll the wheel
pub struct MouseScrollAction {
    definition: ActionDefinition,
    driver: Arc<dyn InputDriver>,
}

impl MouseScrollAction {
    /// Create a new scroll action
    #[must_use]
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        let definition = ActionDefinition::new(
            "mouse.scroll",
            "Scroll the mouse wheel by clicks (positive = up, negative = down)",
        )
        .with_category(ActionCategory::Mouse)
        .with_required("clicks", ParamKind::Integer)
        .paced();

        Self { definition, driver }
    }
}

#[async_trait::async_trait]
impl Action for MouseScrollAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let clicks = req_i64(params, "clicks")?;
        if !(-MAX_SCROLL_CLICKS..=MAX_SCROLL_CLICKS).contains(&clicks) {
            return Err(Error::InvalidInput(format!(
                "clicks must be between -{MAX_SCROLL_CLICKS} and {MAX_SCROLL_CLICKS}, got {clicks}"
            )));
        }
        self.driver.scroll(clicks).await?;
        Ok(json!({"clicks": clicks, "message": format!("Scrolled {clicks} clicks")}))
    }
}

// ============================================================================
// mouse.position
// ============================================================================

/// Report the pointer position
pub struct MousePositionAction {
    definition: ActionDefinition,
    driver: Arc<dyn InputDriver>,
}

impl MousePositionAction {
    /// Create a new position action
    #[must_use]
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        let definition =
            ActionDefinition::new("mouse.position", "Get the current mouse pointer position")
                .with_category(ActionCategory::Mouse);

        Self { definition, driver }
    }
}

#[async_trait::async_trait]
impl Action for MousePositionAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, _params: &Map<String, Value>) -> Result<Value> {
        let position = self.driver.cursor_position().await?;
        Ok(json!({"x": position.x, "y": position.y}))
    }
}
