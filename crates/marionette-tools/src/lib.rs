//! Marionette Tools - Action Catalog and Executor
//!
//! This crate provides the host automation layer:
//! - Registry: action registration, parameter schemas, catalog listing
//! - Runner: strictly sequential execution with per-intent isolation
//! - Driver: pointer/keyboard/display primitives behind a trait
//! - Builtins: mouse, keyboard, sandboxed file and system actions

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod driver;
pub mod error;
pub mod intent;
pub mod registry;
pub mod runner;

pub use builtins::{register_builtins, BuiltinsConfig, Workspace};
pub use driver::{
    DriverEvent, InputDriver, MouseButton, Point, RecordingDriver, ScreenSize, XdotoolDriver,
};
pub use error::{Error, Result};
pub use intent::{ActionResult, ActionStatus, Intent};
pub use registry::{Action, ActionCategory, ActionDefinition, ActionRegistry, ParamKind, ParamSpec};
pub use runner::{ActionRunner, RunnerConfig, UNKNOWN_ACTION};
