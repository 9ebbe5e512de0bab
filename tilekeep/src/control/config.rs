//! Save control configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::BoxFuture;
use crate::coord::LatLngBounds;

use super::events::SaveStatus;

/// Default highest zoom saved in save-what-you-see mode.
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Lowest zoom from which save-what-you-see is allowed.
pub const DEFAULT_MIN_ZOOM: u8 = 5;

/// Capacity of the control event broadcast.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Corner of the map the control is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlPosition {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl fmt::Display for ControlPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlPosition::TopLeft => "topleft",
            ControlPosition::TopRight => "topright",
            ControlPosition::BottomLeft => "bottomleft",
            ControlPosition::BottomRight => "bottomright",
        };
        f.write_str(name)
    }
}

impl FromStr for ControlPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topleft" => Ok(ControlPosition::TopLeft),
            "topright" => Ok(ControlPosition::TopRight),
            "bottomleft" => Ok(ControlPosition::BottomLeft),
            "bottomright" => Ok(ControlPosition::BottomRight),
            other => Err(format!(
                "unknown position '{}', expected topleft, topright, bottomleft or bottomright",
                other
            )),
        }
    }
}

/// Asks for approval before a save or a removal proceeds.
///
/// Receives the status the operation would start from. Closures of the
/// form `Fn(&SaveStatus) -> bool` implement this directly.
pub trait ConfirmationHook: Send + Sync {
    fn confirm<'a>(&'a self, status: &'a SaveStatus) -> BoxFuture<'a, bool>;
}

impl<F> ConfirmationHook for F
where
    F: Fn(&SaveStatus) -> bool + Send + Sync,
{
    fn confirm<'a>(&'a self, status: &'a SaveStatus) -> BoxFuture<'a, bool> {
        let answer = self(status);
        Box::pin(async move { answer })
    }
}

/// Map state the save operates on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: LatLngBounds,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(bounds: LatLngBounds, zoom: u8) -> Self {
        Self { bounds, zoom }
    }
}

/// Options of the save/remove control.
///
/// Built once and never mutated; a control with different options is a
/// new control.
#[derive(Clone)]
pub struct SaveControlConfig {
    pub position: ControlPosition,
    pub save_text: String,
    pub remove_text: String,
    /// Highest zoom saved in save-what-you-see mode
    pub max_zoom: u8,
    /// Save the viewport from its zoom up to `max_zoom`
    pub save_what_you_see: bool,
    /// Explicit zoom levels; the viewport zoom when `None`
    pub zoom_levels: Option<Vec<u8>>,
    /// Explicit area; the viewport bounds when `None`
    pub bounds: Option<LatLngBounds>,
    /// Lowest zoom accepted in save-what-you-see mode
    pub min_zoom: u8,
    pub confirm: Option<Arc<dyn ConfirmationHook>>,
    pub confirm_removal: Option<Arc<dyn ConfirmationHook>>,
    pub event_capacity: usize,
}

impl Default for SaveControlConfig {
    fn default() -> Self {
        Self {
            position: ControlPosition::default(),
            save_text: "+".to_string(),
            remove_text: "-".to_string(),
            max_zoom: DEFAULT_MAX_ZOOM,
            save_what_you_see: false,
            zoom_levels: None,
            bounds: None,
            min_zoom: DEFAULT_MIN_ZOOM,
            confirm: None,
            confirm_removal: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SaveControlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: ControlPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_labels(mut self, save_text: impl Into<String>, remove_text: impl Into<String>) -> Self {
        self.save_text = save_text.into();
        self.remove_text = remove_text.into();
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_zoom(mut self, min_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self
    }

    pub fn with_save_what_you_see(mut self, enabled: bool) -> Self {
        self.save_what_you_see = enabled;
        self
    }

    pub fn with_zoom_levels(mut self, zoom_levels: Vec<u8>) -> Self {
        self.zoom_levels = Some(zoom_levels);
        self
    }

    pub fn with_bounds(mut self, bounds: LatLngBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_confirm(mut self, hook: impl ConfirmationHook + 'static) -> Self {
        self.confirm = Some(Arc::new(hook));
        self
    }

    pub fn with_confirm_removal(mut self, hook: impl ConfirmationHook + 'static) -> Self {
        self.confirm_removal = Some(Arc::new(hook));
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

impl fmt::Debug for SaveControlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveControlConfig")
            .field("position", &self.position)
            .field("save_text", &self.save_text)
            .field("remove_text", &self.remove_text)
            .field("max_zoom", &self.max_zoom)
            .field("save_what_you_see", &self.save_what_you_see)
            .field("zoom_levels", &self.zoom_levels)
            .field("bounds", &self.bounds)
            .field("min_zoom", &self.min_zoom)
            .field("confirm", &self.confirm.is_some())
            .field("confirm_removal", &self.confirm_removal.is_some())
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}
