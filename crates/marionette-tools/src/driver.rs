//! Input drivers - pointer, keyboard and display primitives
//!
//! Actions never talk to the display server directly; they go through an
//! [`InputDriver`]. [`XdotoolDriver`] shells out to `xdotool` on X11 hosts,
//! [`RecordingDriver`] keeps everything in memory.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Pause between interpolated pointer steps
const MOTION_STEP: Duration = Duration::from_millis(15);

/// Upper bound on interpolated pointer steps in one move
const MAX_MOTION_STEPS: u32 = 60;

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Wheel button
    Middle,
}

impl MouseButton {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

impl FromStr for MouseButton {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "middle" => Ok(Self::Middle),
            other => Err(Error::InvalidInput(format!("invalid button: {other}"))),
        }
    }
}

/// Display dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    /// Width
    pub width: i64,
    /// Height
    pub height: i64,
}

impl ScreenSize {
    /// Reject coordinates outside `[0, width) x [0, height)`
    pub fn check(&self, x: i64, y: i64) -> Result<()> {
        if (0..self.width).contains(&x) && (0..self.height).contains(&y) {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "coordinates ({x}, {y}) out of bounds, display is {}x{}",
                self.width, self.height
            )))
        }
    }
}

/// Pointer position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position
    pub x: i64,
    /// Vertical position
    pub y: i64,
}

/// Host input primitives
#[async_trait::async_trait]
pub trait InputDriver: Send + Sync {
    /// Driver name
    fn name(&self) -> &str;

    /// Current display size
    async fn screen_size(&self) -> Result<ScreenSize>;

    /// Current pointer position
    async fn cursor_position(&self) -> Result<Point>;

    /// Move the pointer to an absolute position
    async fn move_to(&self, x: i64, y: i64, duration: Duration) -> Result<()>;

    /// Click at the current position
    async fn click(&self, button: MouseButton, clicks: u32) -> Result<()>;

    /// Scroll the wheel; positive is up
    async fn scroll(&self, clicks: i64) -> Result<()>;

    /// Type a string
    async fn type_text(&self, text: &str) -> Result<()>;

    /// Press and release one key
    async fn press_key(&self, key: &str) -> Result<()>;

    /// Press a key combination
    async fn hotkey(&self, keys: &[String]) -> Result<()>;
}

// ============================================================================
// xdotool
// ============================================================================

/// Driver backed by the `xdotool` binary
#[derive(Debug, Clone)]
pub struct XdotoolDriver {
    program: String,
}

impl Default for XdotoolDriver {
    fn default() -> Self {
        Self::new("xdotool")
    }
}

impl XdotoolDriver {
    /// Create a driver invoking `program`
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[String]) -> Result<String> {
        debug!(program = %self.program, ?args, "Running input command");

        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Execution(format!("failed to run {}: {}", self.program, e)))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(Error::Execution(format!(
                "{} exited with {}: {}",
                self.program, output.status, stderr
            )))
        }
    }

    async fn mouse_move(&self, to: Point) -> Result<()> {
        self.run(&["mousemove".to_string(), to.x.to_string(), to.y.to_string()])
            .await
            .map(|_| ())
    }
}

/// Number of pointer steps for a move lasting `duration`
fn motion_steps(duration: Duration) -> u32 {
    let steps = duration.as_millis() / MOTION_STEP.as_millis();
    u32::try_from(steps)
        .unwrap_or(MAX_MOTION_STEPS)
        .clamp(1, MAX_MOTION_STEPS)
}

/// Evenly spaced points from `from` (exclusive) to `to` (inclusive)
fn motion_path(from: Point, to: Point, steps: u32) -> Vec<Point> {
    let steps = i64::from(steps.max(1));
    (1..=steps)
        .map(|i| Point {
            x: from.x + (to.x - from.x) * i / steps,
            y: from.y + (to.y - from.y) * i / steps,
        })
        .collect()
}

/// Map common key names onto X keysyms
fn keysym(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "enter" | "return" => "Return".to_string(),
        "esc" | "escape" => "Escape".to_string(),
        "tab" => "Tab".to_string(),
        "space" => "space".to_string(),
        "backspace" => "BackSpace".to_string(),
        "delete" | "del" => "Delete".to_string(),
        "up" => "Up".to_string(),
        "down" => "Down".to_string(),
        "left" => "Left".to_string(),
        "right" => "Right".to_string(),
        "home" => "Home".to_string(),
        "end" => "End".to_string(),
        "pageup" => "Page_Up".to_string(),
        "pagedown" => "Page_Down".to_string(),
        "ctrl" | "control" => "ctrl".to_string(),
        "alt" => "alt".to_string(),
        "shift" => "shift".to_string(),
        "win" | "super" | "cmd" | "command" => "super".to_string(),
        _ => key.to_string(),
    }
}

fn parse_pair(text: &str) -> Option<(i64, i64)> {
    let mut parts = text.split_whitespace();
    let a = parts.next()?.parse().ok()?;
    let b = parts.next()?.parse().ok()?;
    Some((a, b))
}

#[async_trait::async_trait]
impl InputDriver for XdotoolDriver {
    fn name(&self) -> &str {
        "xdotool"
    }

    async fn screen_size(&self) -> Result<ScreenSize> {
        let out = self.run(&["getdisplaygeometry".to_string()]).await?;
        let (width, height) = parse_pair(&out)
            .ok_or_else(|| Error::Execution(format!("unexpected display geometry: {out}")))?;
        Ok(ScreenSize { width, height })
    }

    async fn cursor_position(&self) -> Result<Point> {
        let out = self
            .run(&["getmouselocation".to_string(), "--shell".to_string()])
            .await?;
        let field = |name: &str| {
            out.lines()
                .find_map(|line| line.strip_prefix(name)?.strip_prefix('='))
                .and_then(|v| v.trim().parse::<i64>().ok())
        };
        match (field("X"), field("Y")) {
            (Some(x), Some(y)) => Ok(Point { x, y }),
            _ => Err(Error::Execution(format!("unexpected mouse location: {out}"))),
        }
    }

    async fn move_to(&self, x: i64, y: i64, duration: Duration) -> Result<()> {
        let target = Point { x, y };
        let steps = motion_steps(duration);
        if steps == 1 {
            return self.mouse_move(target).await;
        }

        let from = self.cursor_position().await?;
        let pause = duration / steps;
        for (i, point) in motion_path(from, target, steps).into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(pause).await;
            }
            self.mouse_move(point).await?;
        }
        Ok(())
    }

    async fn click(&self, button: MouseButton, clicks: u32) -> Result<()> {
        let id = match button {
            MouseButton::Left => "1",
            MouseButton::Middle => "2",
            MouseButton::Right => "3",
        };
        self.run(&[
            "click".to_string(),
            "--repeat".to_string(),
            clicks.max(1).to_string(),
            id.to_string(),
        ])
        .await
        .map(|_| ())
    }

    async fn scroll(&self, clicks: i64) -> Result<()> {
        if clicks == 0 {
            return Ok(());
        }
        let id = if clicks > 0 { "4" } else { "5" };
        self.run(&[
            "click".to_string(),
            "--repeat".to_string(),
            clicks.unsigned_abs().to_string(),
            id.to_string(),
        ])
        .await
        .map(|_| ())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.run(&[
            "type".to_string(),
            "--delay".to_string(),
            "20".to_string(),
            "--".to_string(),
            text.to_string(),
        ])
        .await
        .map(|_| ())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.run(&["key".to_string(), "--".to_string(), keysym(key)])
            .await
            .map(|_| ())
    }

    async fn hotkey(&self, keys: &[String]) -> Result<()> {
        let combo: Vec<String> = keys.iter().map(|k| keysym(k)).collect();
        self.run(&["key".to_string(), "--".to_string(), combo.join("+")])
            .await
            .map(|_| ())
    }
}

// ============================================================================
// Recording driver
// ============================================================================

/// One primitive call seen by [`RecordingDriver`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DriverEvent {
    /// Pointer moved
    Move {
        /// Target x
        x: i64,
        /// Target y
        y: i64,
    },
    /// Button clicked
    Click {
        /// Button
        button: MouseButton,
        /// Click count
        clicks: u32,
    },
    /// Wheel scrolled
    Scroll {
        /// Amount
        clicks: i64,
    },
    /// Text typed
    Type {
        /// Text
        text: String,
    },
    /// Key pressed
    Press {
        /// Key name
        key: String,
    },
    /// Combination pressed
    Hotkey {
        /// Key names
        keys: Vec<String>,
    },
}

/// In-memory driver for headless hosts and tests
#[derive(Debug)]
pub struct RecordingDriver {
    screen: ScreenSize,
    position: Mutex<Point>,
    events: Mutex<Vec<DriverEvent>>,
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl RecordingDriver {
    /// Create a driver simulating a `width` x `height` display
    #[must_use]
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            screen: ScreenSize { width, height },
            position: Mutex::new(Point::default()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Events recorded so far
    #[must_use]
    pub fn events(&self) -> Vec<DriverEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, event: DriverEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

#[async_trait::async_trait]
impl InputDriver for RecordingDriver {
    fn name(&self) -> &str {
        "recording"
    }

    async fn screen_size(&self) -> Result<ScreenSize> {
        Ok(self.screen)
    }

    async fn cursor_position(&self) -> Result<Point> {
        Ok(*self.position.lock().unwrap_or_else(|e| e.into_inner()))
    }

    async fn move_to(&self, x: i64, y: i64, _duration: Duration) -> Result<()> {
        *self.position.lock().unwrap_or_else(|e| e.into_inner()) = Point { x, y };
        self.record(DriverEvent::Move { x, y });
        Ok(())
    }

    async fn click(&self, button: MouseButton, clicks: u32) -> Result<()> {
        self.record(DriverEvent::Click { button, clicks });
        Ok(())
    }

    async fn scroll(&self, clicks: i64) -> Result<()> {
        self.record(DriverEvent::Scroll { clicks });
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.record(DriverEvent::Type {
            text: text.to_string(),
        });
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.record(DriverEvent::Press {
            key: key.to_string(),
        });
        Ok(())
    }

    async fn hotkey(&self, keys: &[String]) -> Result<()> {
        self.record(DriverEvent::Hotkey {
            keys: keys.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_button_parse() {
        assert_eq!("left".parse::<MouseButton>().unwrap(), MouseButton::Left);
        assert_eq!(" Right ".parse::<MouseButton>().unwrap(), MouseButton::Right);
        assert_eq!("middle".parse::<MouseButton>().unwrap(), MouseButton::Middle);
        assert!("thumb".parse::<MouseButton>().is_err());
    }

    #[test]
    fn test_screen_bounds() {
        let screen = ScreenSize {
            width: 800,
            height: 600,
        };
        assert!(screen.check(0, 0).is_ok());
        assert!(screen.check(799, 599).is_ok());
        assert!(screen.check(800, 10).is_err());
        assert!(screen.check(10, -1).is_err());
    }

    #[test]
    fn test_keysym_mapping() {
        assert_eq!(keysym("enter"), "Return");
        assert_eq!(keysym("ESC"), "Escape");
        assert_eq!(keysym("ctrl"), "ctrl");
        assert_eq!(keysym("a"), "a");
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("1920 1080"), Some((1920, 1080)));
        assert_eq!(parse_pair("garbage"), None);
    }

    #[tokio::test]
    async fn test_recording_driver_tracks_position() {
        let driver = RecordingDriver::new(100, 100);
        driver.move_to(10, 20, Duration::ZERO).await.unwrap();
        driver.click(MouseButton::Left, 2).await.unwrap();

        assert_eq!(driver.cursor_position().await.unwrap(), Point { x: 10, y: 20 });
        assert_eq!(
            driver.events(),
            vec![
                DriverEvent::Move { x: 10, y: 20 },
                DriverEvent::Click {
                    button: MouseButton::Left,
                    clicks: 2
                },
            ]
        );
    }

    #[test]
    fn test_motion_path_ends_on_target() {
        let path = motion_path(Point { x: 0, y: 100 }, Point { x: 30, y: 40 }, 3);
        assert_eq!(
            path,
            vec![
                Point { x: 10, y: 80 },
                Point { x: 20, y: 60 },
                Point { x: 30, y: 40 },
            ]
        );
        assert_eq!(motion_steps(Duration::ZERO), 1);
        assert_eq!(motion_steps(Duration::from_millis(150)), 10);
        assert_eq!(motion_steps(Duration::from_secs(3600)), MAX_MOTION_STEPS);
    }

    /// Write an executable shell script standing in for `xdotool`
    #[cfg(unix)]
    fn fake_xdotool(dir: &std::path::Path, body: &str) -> String {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-xdotool");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{body}").unwrap();
        file.sync_all().unwrap();
        drop(file);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_xdotool_move_with_duration_interpolates() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let program = fake_xdotool(
            dir.path(),
            &format!(
                "echo \"$@\" >> '{}'\nif [ \"$1\" = getmouselocation ]; then printf 'X=0\\nY=0\\n'; fi",
                log.display()
            ),
        );
        let driver = XdotoolDriver::new(program);

        driver
            .move_to(100, 40, Duration::from_millis(60))
            .await
            .unwrap();
        let calls = std::fs::read_to_string(&log).unwrap();
        let calls: Vec<&str> = calls.lines().collect();
        assert_eq!(
            calls,
            vec![
                "getmouselocation --shell",
                "mousemove 25 10",
                "mousemove 50 20",
                "mousemove 75 30",
                "mousemove 100 40",
            ]
        );

        std::fs::remove_file(&log).unwrap();
        driver.move_to(7, 8, Duration::ZERO).await.unwrap();
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "mousemove 7 8\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_xdotool_child_killed_when_action_times_out() {
        use crate::builtins::MouseScrollAction;
        use crate::intent::Intent;
        use crate::registry::ActionRegistry;
        use crate::runner::{ActionRunner, RunnerConfig};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let program = fake_xdotool(
            dir.path(),
            &format!("sleep 2\ntouch '{}'", marker.display()),
        );

        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(MouseScrollAction::new(Arc::new(
            XdotoolDriver::new(program),
        ))));
        let runner = ActionRunner::new(
            Arc::new(registry),
            RunnerConfig::default()
                .with_timeout(Duration::from_millis(300))
                .with_interval(Duration::ZERO),
        );

        let result = runner
            .execute(&Intent::new("mouse.scroll").with_param("clicks", 3))
            .await;
        assert_eq!(result.message.as_deref(), Some("timeout after 300ms"));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists(), "input command outlived its action");
    }

    #[tokio::test]
    async fn test_xdotool_missing_binary_is_execution_error() {
        let driver = XdotoolDriver::new("marionette-no-such-binary");
        let err = driver.screen_size().await.unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
    }
}
