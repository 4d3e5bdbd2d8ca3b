//! Shared utilities for integration testing.

// Each test binary uses a subset of these helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vpnwatch::fetcher::{
    ExecOutput, MetricFetcher, ShellEndpoint, ShellTransport, TransportError,
};
use vpnwatch::poller::{PollCycle, PollScheduler};
use vpnwatch::store::{RosterStore, ServerEntry};

/// One scripted result for a fetch attempt.
#[derive(Debug, Clone)]
pub enum Attempt {
    /// Session succeeded with the given output streams.
    Output { stdout: String, stderr: String },
    /// Connection failed outright.
    Fail(String),
}

pub fn ok(stdout: &str) -> Attempt {
    Attempt::Output {
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn fail(message: &str) -> Attempt {
    Attempt::Fail(message.to_string())
}

struct HostScript {
    attempts: Vec<Attempt>,
    cursor: usize,
}

/// Shell transport with per-host scripted outcomes. Once a host's script is
/// exhausted its last entry repeats; unscripted hosts refuse to connect.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, HostScript>>,
    pub exec_count: AtomicUsize,
    pub commands: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, host: &str, attempts: Vec<Attempt>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(host.to_string(), HostScript { attempts, cursor: 0 });
    }

    pub fn execs(&self) -> usize {
        self.exec_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShellTransport for ScriptedTransport {
    async fn exec(
        &self,
        endpoint: ShellEndpoint<'_>,
        command: &str,
    ) -> Result<ExecOutput, TransportError> {
        self.exec_count.fetch_add(1, Ordering::SeqCst);
        self.commands.lock().unwrap().push(command.to_string());

        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(endpoint.host)
            .ok_or_else(|| TransportError::Connect("no route to host".to_string()))?;

        let index = script.cursor.min(script.attempts.len().saturating_sub(1));
        script.cursor += 1;

        match script.attempts[index].clone() {
            Attempt::Output { stdout, stderr } => Ok(ExecOutput { stdout, stderr }),
            Attempt::Fail(message) => Err(TransportError::Connect(message)),
        }
    }
}

pub fn entry(hostname: &str, ip: &str) -> ServerEntry {
    ServerEntry {
        hostname: hostname.to_string(),
        ip: ip.to_string(),
        country: "NL".to_string(),
        city: "Amsterdam".to_string(),
        username: "monitor".to_string(),
        password: "secret".to_string(),
    }
}

pub struct Stack {
    pub store: RosterStore,
    pub transport: Arc<ScriptedTransport>,
    pub cycle: Arc<PollCycle>,
}

/// Build a poll stack over an in-memory store and a scripted transport.
pub async fn build_stack(max_attempts: u32, base_delay: Duration) -> Stack {
    let store = RosterStore::in_memory().await.unwrap();
    let transport = Arc::new(ScriptedTransport::new());
    let fetcher = Arc::new(MetricFetcher::new(transport.clone(), base_delay));
    let cycle = Arc::new(PollCycle::new(store.clone(), fetcher, max_attempts, 10));
    Stack {
        store,
        transport,
        cycle,
    }
}

#[allow(dead_code)]
pub fn scheduler(stack: &Stack, interval: Duration, enabled: bool) -> Arc<PollScheduler> {
    Arc::new(PollScheduler::new(stack.cycle.clone(), interval, enabled))
}
