//! Managed process for the system under test.
//!
//! Acceptance suites launch the service under test, wait until it answers a
//! health probe, and kill it once the scenario is over. `ManagedProcess` owns
//! the child handle for that whole lifetime.

use crate::siri::{CheckStatusClient, DEFAULT_CHECK_STATUS_TIMEOUT};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to spawn '{0}': {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("'{program}' exited before becoming healthy ({status})")]
    Exited { program: String, status: String },
    #[error("Health check on {url} did not succeed within {waited:?}")]
    HealthCheckTimeout { url: String, waited: Duration },
    #[error("Failed to terminate process {0}: {1}")]
    Terminate(u32, #[source] std::io::Error),
}

/// How readiness of the process is probed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthProbe {
    /// `GET url` answers with a 2xx status
    Http { url: String },
    /// SIRI CheckStatus on `url` answers `Status=true`
    SiriCheckStatus { url: String, requestor_ref: String },
}

impl HealthProbe {
    pub fn url(&self) -> &str {
        match self {
            HealthProbe::Http { url } | HealthProbe::SiriCheckStatus { url, .. } => url,
        }
    }

    async fn is_healthy(&self) -> bool {
        match self {
            HealthProbe::Http { url } => {
                let Ok(client) = reqwest::Client::builder()
                    .timeout(Duration::from_secs(2))
                    .build()
                else {
                    return false;
                };
                match client.get(url).send().await {
                    Ok(response) => response.status().is_success(),
                    Err(e) => {
                        debug!("Health check on {} failed: {}", url, e);
                        false
                    }
                }
            }
            HealthProbe::SiriCheckStatus { url, requestor_ref } => {
                let client =
                    match CheckStatusClient::new(requestor_ref.as_str(), DEFAULT_CHECK_STATUS_TIMEOUT) {
                        Ok(client) => client,
                        Err(e) => {
                            warn!("Cannot build CheckStatus client: {}", e);
                            return false;
                        }
                    };
                match client.check_status(url).await {
                    Ok(response) => response.status,
                    Err(e) => {
                        debug!("CheckStatus on {} failed: {}", url, e);
                        false
                    }
                }
            }
        }
    }
}

/// Launch parameters of a managed process
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub health: HealthProbe,
    /// Deadline for the first successful probe
    pub startup_timeout: Duration,
    /// Delay before each probe
    pub poll_interval: Duration,
    /// Forward the child's stdout/stderr instead of discarding them
    pub inherit_output: bool,
}

impl ProcessConfig {
    pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    pub fn new(program: impl Into<String>, health: HealthProbe) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
            health,
            startup_timeout: Self::DEFAULT_STARTUP_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            inherit_output: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// A running process under test
#[derive(Debug)]
pub struct ManagedProcess {
    config: ProcessConfig,
    child: Child,
}

impl ManagedProcess {
    /// Spawn the process. It is killed if the handle is dropped.
    pub fn spawn(config: ProcessConfig) -> Result<Self, ProcessError> {
        let mut command = Command::new(&config.program);
        command.args(&config.args).kill_on_drop(true);
        if let Some(ref dir) = config.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in &config.env {
            command.env(key, value);
        }
        if !config.inherit_output {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let child = command
            .spawn()
            .map_err(|e| ProcessError::Spawn(config.program.clone(), e))?;
        info!(
            "Spawned '{}' (pid {:?})",
            config.program,
            child.id()
        );

        Ok(Self { config, child })
    }

    /// Spawn the process and wait until it is healthy
    pub async fn start(config: ProcessConfig) -> Result<Self, ProcessError> {
        let mut process = Self::spawn(config)?;
        if let Err(e) = process.wait_until_healthy().await {
            // Leave nothing running behind a failed start
            let _ = process.terminate().await;
            return Err(e);
        }
        Ok(process)
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Probe health every `poll_interval` until success or `startup_timeout`.
    pub async fn wait_until_healthy(&mut self) -> Result<(), ProcessError> {
        let started = Instant::now();
        let url = self.config.health.url().to_string();

        loop {
            tokio::time::sleep(self.config.poll_interval).await;

            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(ProcessError::Exited {
                    program: self.config.program.clone(),
                    status: status.to_string(),
                });
            }

            if self.config.health.is_healthy().await {
                info!(
                    "'{}' healthy on {} after {:?}",
                    self.config.program,
                    url,
                    started.elapsed()
                );
                return Ok(());
            }

            if started.elapsed() > self.config.startup_timeout {
                return Err(ProcessError::HealthCheckTimeout {
                    url,
                    waited: started.elapsed(),
                });
            }
        }
    }

    /// Kill the process and reap it
    pub async fn terminate(&mut self) -> Result<(), ProcessError> {
        let pid = self.child.id().unwrap_or_default();
        if let Ok(Some(_)) = self.child.try_wait() {
            return Ok(());
        }
        self.child
            .kill()
            .await
            .map_err(|e| ProcessError::Terminate(pid, e))?;
        info!("Terminated '{}' (pid {})", self.config.program, pid);
        Ok(())
    }
}
