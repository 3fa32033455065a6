//! In-memory [`MediaEngine`] for orchestrator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};
use vs_av::{MediaEngine, ProgressSender};
use vs_core::{Error, Result};

/// One recorded `exec` call, decoded from trim arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub input: String,
    pub start: u64,
    pub length: u64,
    pub output: String,
}

/// Engine that "cuts" by writing `"{input}@{start}+{length}"` to the output
/// file. Reports progress 0.5 then 1.0 per call.
pub struct ScriptedEngine {
    ready: AtomicBool,
    files: Mutex<HashMap<String, Bytes>>,
    staged: Mutex<Vec<String>>,
    calls: Mutex<Vec<ExecCall>>,
    fail_on: Option<usize>,
    skip_output_on: Option<usize>,
    gate: Option<Semaphore>,
    exec_started: Notify,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            files: Mutex::new(HashMap::new()),
            staged: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            fail_on: None,
            skip_output_on: None,
            gate: None,
            exec_started: Notify::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Fail the `call`-th exec (0-based, counted across runs).
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }

    /// Let the `call`-th exec succeed without producing its output file.
    pub fn skip_output_on_call(mut self, call: usize) -> Self {
        self.skip_output_on = Some(call);
        self
    }

    /// Block every exec until [`open_gate`](Self::open_gate) releases it.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn open_gate(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    /// Resolves once an exec has started.
    pub async fn wait_for_exec_start(&self) {
        self.exec_started.notified().await;
    }

    pub fn exec_calls(&self) -> Vec<ExecCall> {
        self.calls.lock().clone()
    }

    pub fn staged_inputs(&self) -> Vec<String> {
        self.staged.lock().clone()
    }

    pub fn remaining_files(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::EngineNotReady)
        }
    }
}

fn decode(args: &[String]) -> Result<ExecCall> {
    let value = |flag: &str| -> Result<&String> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .ok_or_else(|| Error::tool("scripted", format!("missing {flag}")))
    };
    let number = |flag: &str| -> Result<u64> {
        value(flag)?
            .parse()
            .map_err(|_| Error::tool("scripted", format!("bad {flag}")))
    };
    Ok(ExecCall {
        input: value("-i")?.clone(),
        start: number("-ss")?,
        length: number("-t")?,
        output: args
            .last()
            .cloned()
            .ok_or_else(|| Error::tool("scripted", "no output"))?,
    })
}

#[async_trait]
impl MediaEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn load(&self) -> Result<()> {
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn write_input(&self, name: &str, data: Bytes) -> Result<()> {
        self.ensure_ready()?;
        self.staged.lock().push(name.to_string());
        self.files.lock().insert(name.to_string(), data);
        Ok(())
    }

    async fn exec(&self, args: &[String], progress: &ProgressSender) -> Result<()> {
        self.ensure_ready()?;
        let call = decode(args)?;
        let number = {
            let mut calls = self.calls.lock();
            calls.push(call.clone());
            calls.len() - 1
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.exec_started.notify_one();

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on == Some(number) {
            return Err(Error::tool("scripted", "scripted failure"));
        }
        if !self.files.lock().contains_key(&call.input) {
            return Err(Error::tool("scripted", format!("{}: no such file", call.input)));
        }

        progress.send(0.5);
        progress.send(1.0);

        if self.skip_output_on != Some(number) {
            let data = format!("{}@{}+{}", call.input, call.start, call.length);
            self.files.lock().insert(call.output, Bytes::from(data));
        }
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Bytes> {
        self.ensure_ready()?;
        self.files
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::tool("scripted", format!("{name}: no such file")))
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        self.files.lock().remove(name);
        Ok(())
    }
}
