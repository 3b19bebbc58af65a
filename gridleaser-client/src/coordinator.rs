use std::sync::Arc;
use std::time::Duration;

use nanoid::nanoid;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use gridleaser_core::cache::{CacheStore, TaskCache};
use gridleaser_core::lock::{LockStore, LockTransition, TabLock};
use gridleaser_core::types::TaskResult;

use crate::agent::{AgentConfig, ComputeAgent};
use crate::compute::Compute;
use crate::messages::{AgentControl, AgentMessage, CoordinatorEvent};
use crate::now_ms;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Compute agents in the pool
    pub agents: usize,
    pub agent: AgentConfig,
    /// Tab-lock record TTL; must exceed the heartbeat interval
    pub lock_ttl_ms: u64,
    /// Fixed lock heartbeat interval
    pub heartbeat_ms: u64,
    /// Begin computing as soon as the lock is held
    pub autostart: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            agents: 1,
            agent: AgentConfig::default(),
            lock_ttl_ms: 15_000,
            heartbeat_ms: 5_000,
            autostart: true,
        }
    }
}

enum Command {
    Start,
    Pause,
    Shutdown,
}

/// Handle to a running coordinator task.
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<CoordinatorEvent>,
    join: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// Resume computing (subject to holding the tab-lock).
    pub async fn start(&self) {
        let _ = self.commands.send(Command::Start).await;
    }

    /// Stop requesting new work; in-flight units finish.
    pub async fn pause(&self) {
        let _ = self.commands.send(Command::Pause).await;
    }

    /// Terminate the coordinator and its pool, discarding in-flight calls.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        let _ = self.join.await;
    }

    pub fn events(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }
}

/// Supervises the agent pool; sole owner of the durable task cache and
/// the cross-instance lock. Agents never touch storage directly.
pub struct ClientCoordinator<C: CacheStore, L: LockStore> {
    cache: TaskCache<C>,
    lock_store: L,
    lock: TabLock,
    agent_controls: Vec<mpsc::Sender<AgentControl>>,
    from_agents: mpsc::UnboundedReceiver<AgentMessage>,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<CoordinatorEvent>,
    config: CoordinatorConfig,
    /// Whether the embedding application wants agents running; the lock
    /// decides whether they actually do
    desired_active: bool,
}

impl<C, L> ClientCoordinator<C, L>
where
    C: CacheStore + Send + Sync + 'static,
    L: LockStore + Send + Sync + 'static,
{
    /// Spawn the coordinator task and its pool of agent tasks.
    pub fn spawn(
        transport: Arc<dyn Transport>,
        compute: Arc<dyn Compute>,
        cache_store: C,
        lock_store: L,
        config: CoordinatorConfig,
    ) -> CoordinatorHandle {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        let mut agent_controls = Vec::new();
        for id in 0..config.agents.max(1) {
            let (ctl_tx, ctl_rx) = mpsc::channel(16);
            let agent = ComputeAgent::new(
                id,
                transport.clone(),
                compute.clone(),
                msg_tx.clone(),
                ctl_rx,
                config.agent.clone(),
            );
            tokio::spawn(agent.run());
            agent_controls.push(ctl_tx);
        }
        drop(msg_tx);

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, _) = broadcast::channel(64);

        let desired_active = config.autostart;
        let coordinator = Self {
            cache: TaskCache::new(cache_store),
            lock_store,
            lock: TabLock::new(nanoid!(), config.lock_ttl_ms),
            agent_controls,
            from_agents: msg_rx,
            commands: cmd_rx,
            events: event_tx.clone(),
            config,
            desired_active,
        };
        let join = tokio::spawn(coordinator.run());

        CoordinatorHandle {
            commands: cmd_tx,
            events: event_tx,
            join,
        }
    }

    async fn run(mut self) {
        let now = now_ms();
        // Startup sweep, then hand computed-but-unflushed results from a
        // previous run to one agent so they are not lost
        self.cache.cleanup(None, now);
        self.check_unsent_tasks(now).await;

        let mut heartbeat =
            tokio::time::interval(Duration::from_millis(self.config.heartbeat_ms.max(1)));

        loop {
            tokio::select! {
                _ = heartbeat.tick() => self.on_heartbeat().await,
                Some(msg) = self.from_agents.recv() => self.on_agent_message(msg).await,
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Start) => {
                        self.desired_active = true;
                        if !self.lock.is_locked_out() {
                            self.broadcast(AgentControl::Start).await;
                        }
                    }
                    Some(Command::Pause) => {
                        self.desired_active = false;
                        self.broadcast(AgentControl::Pause).await;
                    }
                    Some(Command::Shutdown) | None => return,
                },
            }
        }
    }

    async fn check_unsent_tasks(&mut self, now: u64) {
        let results: Vec<TaskResult> = self
            .cache
            .unsent(now)
            .into_iter()
            .filter_map(|t| t.result)
            .collect();
        if results.is_empty() {
            return;
        }
        tracing::info!(count = results.len(), "recovered unsent results");
        if let Some(ctl) = self.agent_controls.first() {
            let _ = ctl.send(AgentControl::UnsentTasks(results)).await;
        }
    }

    async fn on_heartbeat(&mut self) {
        match self.lock.heartbeat(&mut self.lock_store, now_ms()) {
            LockTransition::Locked => {
                tracing::info!("another instance holds the lock; pausing agents");
                self.broadcast(AgentControl::Pause).await;
                let _ = self.events.send(CoordinatorEvent::Locked);
            }
            LockTransition::Unlocked => {
                tracing::debug!("lock acquired");
                if self.desired_active {
                    self.broadcast(AgentControl::Start).await;
                }
                let _ = self.events.send(CoordinatorEvent::Unlocked);
            }
            LockTransition::Unchanged => {}
        }
    }

    async fn on_agent_message(&mut self, msg: AgentMessage) {
        let now = now_ms();
        match msg {
            AgentMessage::Log { agent_id, line } => {
                tracing::debug!(agent = agent_id, "{line}");
            }
            AgentMessage::UpdateTask(task) => self.cache.update(&task),
            AgentMessage::CleanupTasks(ids) => self.cache.cleanup(ids.as_deref(), now),
            AgentMessage::GetTasks { agent_id, reply } => {
                let tasks: Vec<_> = self
                    .cache
                    .take_stalled(now, self.config.agent.max_compute_time_ms)
                    .into_iter()
                    .collect();
                tracing::debug!(agent = agent_id, found = tasks.len(), "local task request");
                let _ = reply.send(tasks);
            }
            AgentMessage::Unauthorized { agent_id } => {
                tracing::warn!(agent = agent_id, "unauthorized; stopping the pool");
                self.desired_active = false;
                self.broadcast(AgentControl::Pause).await;
                let _ = self.events.send(CoordinatorEvent::Unauthorized);
            }
            AgentMessage::NoTasks { agent_id } => {
                tracing::info!(agent = agent_id, "no more work available");
                self.desired_active = false;
                self.broadcast(AgentControl::Pause).await;
                let _ = self.events.send(CoordinatorEvent::NoTasks);
            }
        }
    }

    async fn broadcast(&self, ctl: AgentControl) {
        for control in &self.agent_controls {
            let _ = control.send(ctl.clone()).await;
        }
    }
}
