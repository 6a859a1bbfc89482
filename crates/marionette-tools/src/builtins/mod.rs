//! Builtins - the host automation catalog
//!
//! - Mouse: move, click, double_click, scroll, position
//! - Keyboard: type, press, hotkey
//! - File (workspace sandboxed): read, write, list, exists, delete
//! - System: sleep, screen_size, info, usage

mod file;
mod keyboard;
mod mouse;
mod system;

pub use file::{
    FileDeleteAction, FileExistsAction, FileListAction, FileReadAction, FileWriteAction, Workspace,
};
pub use keyboard::{KeyboardHotkeyAction, KeyboardPressAction, KeyboardTypeAction};
pub use mouse::{MouseClickAction, MouseMoveAction, MousePositionAction, MouseScrollAction};
pub use system::{ScreenSizeAction, SystemInfoAction, SystemSleepAction, SystemUsageAction};

use crate::driver::InputDriver;
use crate::registry::ActionRegistry;
use std::sync::Arc;

/// Collaborators the built-in actions act on
#[derive(Clone)]
pub struct BuiltinsConfig {
    /// Pointer, keyboard and display primitives
    pub driver: Arc<dyn InputDriver>,
    /// Sandbox for file actions
    pub workspace: Arc<Workspace>,
}

/// Register every built-in action
pub fn register_builtins(registry: &mut ActionRegistry, config: &BuiltinsConfig) {
    let driver = &config.driver;
    let workspace = &config.workspace;

    // Mouse
    registry.register(Arc::new(MouseMoveAction::new(driver.clone())));
    registry.register(Arc::new(MouseClickAction::new(driver.clone())));
    registry.register(Arc::new(MouseClickAction::double(driver.clone())));
    registry.register(Arc::new(MouseScrollAction::new(driver.clone())));
    registry.register(Arc::new(MousePositionAction::new(driver.clone())));

    // Keyboard
    registry.register(Arc::new(KeyboardTypeAction::new(driver.clone())));
    registry.register(Arc::new(KeyboardPressAction::new(driver.clone())));
    registry.register(Arc::new(KeyboardHotkeyAction::new(driver.clone())));

    // File
    registry.register(Arc::new(FileReadAction::new(workspace.clone())));
    registry.register(Arc::new(FileWriteAction::new(workspace.clone())));
    registry.register(Arc::new(FileListAction::new(workspace.clone())));
    registry.register(Arc::new(FileExistsAction::new(workspace.clone())));
    registry.register(Arc::new(FileDeleteAction::new(workspace.clone())));

    // System
    registry.register(Arc::new(SystemSleepAction::new()));
    registry.register(Arc::new(ScreenSizeAction::new(driver.clone())));
    registry.register(Arc::new(SystemInfoAction::new()));
    registry.register(Arc::new(SystemUsageAction::new()));
}
