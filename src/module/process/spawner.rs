//! Module process spawning and management
//!
//! `ProcessModule` runs an extension executable as a child process: spawned
//! on `start()`, killed and reaped on `stop()`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::{Child, Command};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::module::traits::{HealthStatus, Module, ModuleError};

/// Grace period after spawn before the process is considered started
const STARTUP_WAIT: Duration = Duration::from_millis(100);

/// Extension module backed by a child process
pub struct ProcessModule {
    name: String,
    binary_path: PathBuf,
    data_dir: PathBuf,
    config: HashMap<String, String>,
    instance_id: String,
    child: Mutex<Option<Child>>,
}

impl ProcessModule {
    pub fn new<P: AsRef<Path>, D: AsRef<Path>>(
        name: &str,
        binary_path: P,
        data_dir: D,
        config: HashMap<String, String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            binary_path: binary_path.as_ref().to_path_buf(),
            data_dir: data_dir.as_ref().to_path_buf(),
            config,
            instance_id: format!("{}_{}", name, uuid::Uuid::new_v4()),
            child: Mutex::new(None),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Process ID while running
    pub fn id(&self) -> Option<u32> {
        self.child
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(Child::id))
    }

    /// Whether the child process is still alive
    pub fn is_running(&self) -> bool {
        match self.child.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(child) => matches!(child.try_wait(), Ok(None)),
                None => false,
            },
            Err(_) => false,
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("--module-name")
            .arg(&self.name)
            .arg("--data-dir")
            .arg(&self.data_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .env("MODOS_MODULE_NAME", &self.name)
            .env("MODOS_INSTANCE_ID", &self.instance_id);

        for (key, value) in &self.config {
            let key = key.replace('.', "_").to_uppercase();
            command.env(format!("MODOS_MODULE_CONFIG_{}", key), value);
        }
        command
    }

    fn lock_child(&self) -> Result<std::sync::MutexGuard<'_, Option<Child>>, ModuleError> {
        self.child
            .lock()
            .map_err(|_| ModuleError::OperationError(format!("process state of {} poisoned", self.name)))
    }
}

#[async_trait]
impl Module for ProcessModule {
    async fn initialize(&mut self) -> Result<(), ModuleError> {
        if !self.binary_path.exists() {
            return Err(ModuleError::ModuleNotFound(format!(
                "Module binary not found: {:?}",
                self.binary_path
            )));
        }
        tokio::fs::create_dir_all(&self.data_dir).await.map_err(|e| {
            ModuleError::InitializationError(format!(
                "Failed to create module data directory: {}",
                e
            ))
        })?;
        Ok(())
    }

    async fn start(&mut self) -> Result<(), ModuleError> {
        if self.is_running() {
            return Ok(());
        }

        info!("Spawning module process: {}", self.name);
        debug!("Spawning process: {:?}", self.binary_path);
        let child = self.command().spawn().map_err(|e| {
            ModuleError::InitializationError(format!("Failed to spawn module process: {}", e))
        })?;
        *self.lock_child()? = Some(child);

        tokio::time::sleep(STARTUP_WAIT).await;

        let exited = {
            let mut guard = self.lock_child()?;
            let status = match guard.as_mut() {
                Some(child) => child.try_wait().ok().flatten(),
                None => None,
            };
            if status.is_some() {
                guard.take();
            }
            status
        };
        if let Some(status) = exited {
            return Err(ModuleError::InitializationError(format!(
                "Module process {} exited during startup ({})",
                self.name, status
            )));
        }

        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ModuleError> {
        let child = self.lock_child()?.take();
        let Some(mut child) = child else {
            return Ok(());
        };

        debug!("Killing module process: {}", self.name);
        if let Err(e) = child.kill().await {
            warn!("Failed to kill module process {}: {}", self.name, e);
        }
        let _ = child.wait().await;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, ModuleError> {
        if self.is_running() {
            Ok(HealthStatus::healthy())
        } else {
            Ok(HealthStatus::unhealthy(format!("process for {} is not running", self.name)))
        }
    }
}
