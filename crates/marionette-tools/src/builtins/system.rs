//! System actions - sleep, display size, host info and usage

use crate::driver::InputDriver;
use crate::error::{Error, Result};
use crate::registry::{req_f64, Action, ActionCategory, ActionDefinition, ParamKind};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Disks, System};

/// Longest pause `system.sleep` accepts
const MAX_SLEEP_SECS: f64 = 300.0;

/// Handler budget for `system.sleep`, above [`MAX_SLEEP_SECS`]
const SLEEP_TIMEOUT: Duration = Duration::from_secs(305);

const BYTES_PER_MIB: u64 = 1024 * 1024;

// ============================================================================
// system.sleep
// ============================================================================

/// Pause between steps
pub struct SystemSleepAction {
    definition: ActionDefinition,
}

impl SystemSleepAction {
    /// Create a new sleep action
    #[must_use]
    pub fn new() -> Self {
        let definition = ActionDefinition::new("system.sleep", "Wait for a number of seconds")
            .with_category(ActionCategory::System)
            .with_required("seconds", ParamKind::Number)
            .with_min_timeout(SLEEP_TIMEOUT);

        Self { definition }
    }
}

impl Default for SystemSleepAction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Action for SystemSleepAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, params: &Map<String, Value>) -> Result<Value> {
        let seconds = req_f64(params, "seconds")?;
        if !(0.0..=MAX_SLEEP_SECS).contains(&seconds) {
            return Err(Error::InvalidInput(format!(
                "seconds must be between 0 and {MAX_SLEEP_SECS}, got {seconds}"
            )));
        }
        tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
        Ok(json!({"seconds": seconds, "message": format!("Slept {seconds}s")}))
    }
}

// ============================================================================
// system.screen_size
// ============================================================================

/// Report display dimensions
pub struct ScreenSizeAction {
    definition: ActionDefinition,
    driver: Arc<dyn InputDriver>,
}

impl ScreenSizeAction {
    /// Create a new screen size action
    #[must_use]
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        let definition =
            ActionDefinition::new("system.screen_size", "Get the display width and height")
                .with_category(ActionCategory::System);

        Self { definition, driver }
    }
}

#[async_trait::async_trait]
impl Action for ScreenSizeAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, _params: &Map<String, Value>) -> Result<Value> {
        let size = self.driver.screen_size().await?;
        Ok(json!({
            "width": size.width,
            "height": size.height,
            "message": format!("Display: {}x{}", size.width, size.height)
        }))
    }
}

// ============================================================================
// system.info
// ============================================================================

/// Report platform information
pub struct SystemInfoAction {
    definition: ActionDefinition,
}

impl SystemInfoAction {
    /// Create a new info action
    #[must_use]
    pub fn new() -> Self {
        let definition = ActionDefinition::new(
            "system.info",
            "Get host platform information (OS, version, hostname, CPU, memory)",
        )
        .with_category(ActionCategory::System);

        Self { definition }
    }
}

impl Default for SystemInfoAction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Action for SystemInfoAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, _params: &Map<String, Value>) -> Result<Value> {
        let info = tokio::task::spawn_blocking(|| {
            let mut system = System::new();
            system.refresh_memory();
            system.refresh_cpu();

            json!({
                "os": std::env::consts::OS,
                "os_version": System::long_os_version()
                    .or_else(System::os_version)
                    .unwrap_or_else(|| "unknown".to_string()),
                "kernel": System::kernel_version(),
                "hostname": System::host_name(),
                "arch": std::env::consts::ARCH,
                "cpu_count": system.cpus().len(),
                "total_memory_mb": system.total_memory() / BYTES_PER_MIB,
                "uptime_secs": System::uptime(),
            })
        })
        .await
        .map_err(|e| Error::Execution(format!("system info task failed: {e}")))?;

        Ok(info)
    }
}

// ============================================================================
// system.usage
// ============================================================================

/// Report CPU, memory and disk utilisation
pub struct SystemUsageAction {
    definition: ActionDefinition,
}

impl SystemUsageAction {
    /// Create a new usage action
    #[must_use]
    pub fn new() -> Self {
        let definition = ActionDefinition::new(
            "system.usage",
            "Get current CPU, RAM and root-disk usage percentages",
        )
        .with_category(ActionCategory::System);

        Self { definition }
    }
}

impl Default for SystemUsageAction {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = used as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

fn root_disk_percent() -> f64 {
    let disks = Disks::new_with_refreshed_list();
    let root = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first());
    root.map_or(0.0, |d| {
        percent(d.total_space().saturating_sub(d.available_space()), d.total_space())
    })
}

#[async_trait::async_trait]
impl Action for SystemUsageAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    async fn execute(&self, _params: &Map<String, Value>) -> Result<Value> {
        let mut system = System::new();
        system.refresh_cpu();
        // CPU usage is a delta between two refreshes
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        system.refresh_cpu();
        system.refresh_memory();

        let cpu = (f64::from(system.global_cpu_info().cpu_usage()) * 10.0).round() / 10.0;
        let ram = percent(system.used_memory(), system.total_memory());
        let disk = tokio::task::spawn_blocking(root_disk_percent)
            .await
            .map_err(|e| Error::Execution(format!("disk usage task failed: {e}")))?;

        Ok(json!({
            "cpu_percent": cpu,
            "ram_percent": ram,
            "disk_percent": disk,
            "message": format!("CPU: {cpu}%, RAM: {ram}%, Disk: {disk}%")
        }))
    }
}
