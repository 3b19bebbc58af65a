use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use gridleaser_core::backoff::{RetryDelay, DEFAULT_CEILING_MS, DEFAULT_FLOOR_MS};
use gridleaser_core::types::{CachedTask, LeaseReply, TaskEnvelope, TaskId, TaskResult, TaskState};

use crate::compute::Compute;
use crate::messages::{AgentControl, AgentMessage};
use crate::now_ms;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Results accumulated locally before a single POST drains them all
    pub max_buffer: usize,
    /// Renewal deadline on `progress` cache entries; past it the task is
    /// considered stalled and re-offered within the pool
    pub max_compute_time_ms: u64,
    pub retry_floor_ms: u64,
    pub retry_ceiling_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_buffer: 1,
            max_compute_time_ms: 60_000,
            retry_floor_ms: DEFAULT_FLOOR_MS,
            retry_ceiling_ms: DEFAULT_CEILING_MS,
        }
    }
}

/// What a work-acquisition step produced.
enum Fetched {
    Tasks(Vec<TaskEnvelope>),
    /// Paused, terminal status, or unauthorized; back to waiting for control
    Idle,
    /// Control channel closed; terminate without draining
    Shutdown,
}

/// One isolated worker: pulls leases (local cache first, then network),
/// runs the plugged-in compute function, and reports results — buffering
/// several before flushing to save round-trips.
///
/// All interaction with the coordinator is message passing; the agent
/// never blocks on a cache write succeeding.
pub struct ComputeAgent {
    id: usize,
    transport: Arc<dyn Transport>,
    compute: Arc<dyn Compute>,
    outbox: mpsc::UnboundedSender<AgentMessage>,
    control: mpsc::Receiver<AgentControl>,
    config: AgentConfig,
    active: bool,
    check_local: bool,
    force_flush: bool,
    buffer: Vec<TaskResult>,
    delay: RetryDelay,
}

impl ComputeAgent {
    pub fn new(
        id: usize,
        transport: Arc<dyn Transport>,
        compute: Arc<dyn Compute>,
        outbox: mpsc::UnboundedSender<AgentMessage>,
        control: mpsc::Receiver<AgentControl>,
        config: AgentConfig,
    ) -> Self {
        let delay = RetryDelay::new(config.retry_floor_ms, config.retry_ceiling_ms);
        Self {
            id,
            transport,
            compute,
            outbox,
            control,
            config,
            active: false,
            check_local: true,
            force_flush: false,
            buffer: Vec::new(),
            delay,
        }
    }

    /// Drives cycles until the control channel closes. Within one agent,
    /// leases are requested strictly after the previous batch's results
    /// are marked complete; never two outstanding network requests.
    pub async fn run(mut self) {
        loop {
            if !self.active {
                match self.control.recv().await {
                    None => return,
                    Some(ctl) => {
                        self.apply_control(ctl);
                        continue;
                    }
                }
            }
            self.drain_control();
            if !self.active {
                continue;
            }

            match self.next_tasks().await {
                Fetched::Tasks(tasks) => {
                    for task in tasks {
                        // A pause lets the current unit finish but stops
                        // starting new ones
                        self.drain_control();
                        if !self.active {
                            break;
                        }
                        self.run_task(task).await;
                    }
                }
                Fetched::Idle => {}
                Fetched::Shutdown => return,
            }
        }
    }

    fn apply_control(&mut self, ctl: AgentControl) {
        match ctl {
            AgentControl::Start => {
                self.active = true;
                self.log("started");
            }
            AgentControl::Pause => {
                self.active = false;
                self.log("paused");
            }
            AgentControl::UnsentTasks(results) => {
                self.log(&format!("started via {} unsent results", results.len()));
                self.buffer.extend(results);
                self.force_flush = true;
                self.active = true;
            }
        }
    }

    fn drain_control(&mut self) {
        while let Ok(ctl) = self.control.try_recv() {
            self.apply_control(ctl);
        }
    }

    /// Obtain the next batch: flush first when the buffer says so, then
    /// try the coordinator's local cache, then the network.
    async fn next_tasks(&mut self) -> Fetched {
        if !self.buffer.is_empty()
            && (self.force_flush || self.buffer.len() >= self.config.max_buffer)
        {
            return self.flush().await;
        }

        if self.check_local {
            let tasks = self.local_tasks().await;
            if !tasks.is_empty() {
                self.log(&format!("got {} local task(s)", tasks.len()));
                return Fetched::Tasks(tasks);
            }
            // No more local tasks for the remainder of this run
            self.check_local = false;
        }

        self.fetch_remote().await
    }

    async fn local_tasks(&mut self) -> Vec<TaskEnvelope> {
        let (tx, rx) = oneshot::channel();
        self.send(AgentMessage::GetTasks {
            agent_id: self.id,
            reply: tx,
        });
        match rx.await {
            Ok(tasks) => tasks
                .into_iter()
                .map(|t: CachedTask| TaskEnvelope {
                    id: t.id,
                    data: t.data,
                    expires: t.expires,
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn fetch_remote(&mut self) -> Fetched {
        loop {
            match self.transport.fetch_tasks().await {
                Ok(LeaseReply::Ok { tasks }) => {
                    self.delay.reset();
                    return Fetched::Tasks(tasks);
                }
                Ok(_) => return self.stop_no_tasks(),
                Err(err) if !err.is_retryable() => return self.stop_unauthorized(),
                Err(err) => {
                    self.log(&format!("error ({err}) on get task, retry..."));
                    if !self.backoff().await {
                        return Fetched::Shutdown;
                    }
                    if !self.active {
                        return Fetched::Idle;
                    }
                }
            }
        }
    }

    /// POST the entire buffer. At-least-once: the buffer is cleared only
    /// after the server acknowledged it; a failed flush keeps it intact
    /// and retries.
    async fn flush(&mut self) -> Fetched {
        loop {
            match self.transport.submit_results(&self.buffer).await {
                Ok(reply) => {
                    self.delay.reset();
                    let ids: Vec<TaskId> = self.buffer.iter().map(|r| r.id).collect();
                    self.buffer.clear();
                    self.force_flush = false;
                    self.send(AgentMessage::CleanupTasks(Some(ids)));
                    return match reply {
                        LeaseReply::Ok { tasks } => {
                            self.log("got new tasks after post");
                            Fetched::Tasks(tasks)
                        }
                        _ => self.stop_no_tasks(),
                    };
                }
                Err(err) if !err.is_retryable() => return self.stop_unauthorized(),
                Err(err) => {
                    self.log(&format!("error ({err}) on post tasks, retry..."));
                    if !self.backoff().await {
                        return Fetched::Shutdown;
                    }
                    if !self.active {
                        return Fetched::Idle;
                    }
                }
            }
        }
    }

    async fn run_task(&mut self, task: TaskEnvelope) {
        let now = now_ms();
        let mut entry = CachedTask {
            id: task.id,
            state: TaskState::Progress,
            time: now + self.config.max_compute_time_ms,
            expires: task.expires,
            data: task.data.clone(),
            result: None,
        };
        self.send(AgentMessage::UpdateTask(entry.clone()));

        let data = self.compute.compute(task.id, task.data).await;
        let result = TaskResult { id: task.id, data };

        entry.state = TaskState::Complete;
        entry.result = Some(result.clone());
        self.send(AgentMessage::UpdateTask(entry));
        self.buffer.push(result);
    }

    /// Sleep out the bumped retry delay while staying responsive to
    /// control. Returns false once the control channel is closed.
    async fn backoff(&mut self) -> bool {
        let sleep = tokio::time::sleep(Duration::from_millis(self.delay.bump()));
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                ctl = self.control.recv() => match ctl {
                    None => return false,
                    Some(ctl) => self.apply_control(ctl),
                },
            }
        }
    }

    fn stop_no_tasks(&mut self) -> Fetched {
        self.send(AgentMessage::NoTasks { agent_id: self.id });
        self.active = false;
        Fetched::Idle
    }

    fn stop_unauthorized(&mut self) -> Fetched {
        self.send(AgentMessage::Unauthorized { agent_id: self.id });
        self.active = false;
        Fetched::Idle
    }

    fn send(&self, msg: AgentMessage) {
        let _ = self.outbox.send(msg);
    }

    fn log(&self, line: &str) {
        let _ = self.outbox.send(AgentMessage::Log {
            agent_id: self.id,
            line: line.to_string(),
        });
    }
}
