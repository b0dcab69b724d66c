//! Per-session agent registry.
//!
//! Each `(session, user)` pair gets one set of agents sharing one buffered
//! chat context. The set is built on first use and cached; every operation
//! on a session runs under that session's async mutex, so at most one
//! request mutates a session's plan at a time.
//!
//! The cache holds at most `max_sessions` entries. When full, the least
//! recently used entry that no request is holding is dropped; its agents are
//! rebuilt from the store on the next request.

use crate::use_cases::chat_context::BufferedChatContext;
use crate::use_cases::domain_agent::DomainAgent;
use crate::use_cases::group_chat_manager::GroupChatManager;
use crate::use_cases::human_agent::HumanAgent;
use crate::use_cases::planner::PlannerAgent;
use crate::use_cases::shared::{AgentDeps, SessionScope};
use crate::use_cases::types::WorkflowError;
use agentflow_domain::{AgentType, SessionId, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tracing::{debug, info};

/// The agents serving one session.
pub struct SessionAgents {
    pub scope: SessionScope,
    pub context: Arc<BufferedChatContext>,
    pub planner: Arc<PlannerAgent>,
    pub human: Arc<HumanAgent>,
    pub group_chat_manager: Arc<GroupChatManager>,
    lock: Mutex<()>,
    loaded: OnceCell<()>,
}

impl SessionAgents {
    fn build(deps: &AgentDeps, scope: SessionScope) -> Self {
        let context = Arc::new(BufferedChatContext::new(
            deps.store.clone(),
            scope.clone(),
            deps.params.history_buffer_size,
        ));
        let planner = Arc::new(PlannerAgent::new(deps.clone(), scope.clone(), context.clone()));
        let human = Arc::new(HumanAgent::new(deps.clone(), scope.clone()));
        let domain_agents = AgentType::ALL
            .into_iter()
            .filter(AgentType::is_domain_agent)
            .map(|agent| {
                Arc::new(DomainAgent::new(
                    agent,
                    deps.clone(),
                    scope.clone(),
                    context.clone(),
                ))
            });
        let group_chat_manager = Arc::new(GroupChatManager::new(
            deps.clone(),
            scope.clone(),
            planner.clone(),
            human.clone(),
            domain_agents,
        ));
        Self {
            scope,
            context,
            planner,
            human,
            group_chat_manager,
            lock: Mutex::new(()),
            loaded: OnceCell::new(),
        }
    }

    /// Rehydrate the chat context from the store once. A failed load is
    /// retried by the next caller.
    async fn ensure_loaded(&self) -> Result<(), WorkflowError> {
        self.loaded
            .get_or_try_init(|| async {
                self.context.load().await?;
                debug!(
                    "Loaded session {} ({} context messages)",
                    self.scope.session_id,
                    self.context.len().await
                );
                Ok::<_, WorkflowError>(())
            })
            .await?;
        Ok(())
    }

    /// Hold the session exclusively until the guard is dropped.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

type SessionKey = (SessionId, UserId);

struct CachedAgents {
    agents: Arc<SessionAgents>,
    last_used: u64,
}

#[derive(Default)]
struct Registry {
    entries: HashMap<SessionKey, CachedAgents>,
    clock: u64,
}

impl Registry {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Drop least recently used entries nobody holds until there is room
    /// for one more.
    fn make_room(&mut self, capacity: usize) {
        while capacity > 0 && self.entries.len() >= capacity {
            let idle = self
                .entries
                .iter()
                .filter(|(_, cached)| Arc::strong_count(&cached.agents) == 1)
                .min_by_key(|(_, cached)| cached.last_used)
                .map(|(key, _)| key.clone());
            let Some(key) = idle else {
                debug!("Session cache over capacity; every entry is in use");
                return;
            };
            self.entries.remove(&key);
            debug!("Evicted idle session {} for user {}", key.0, key.1);
        }
    }
}

pub struct SessionRuntime {
    deps: AgentDeps,
    sessions: Mutex<Registry>,
}

impl SessionRuntime {
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            deps,
            sessions: Mutex::new(Registry::default()),
        }
    }

    pub fn deps(&self) -> &AgentDeps {
        &self.deps
    }

    /// Agents for the session, created and rehydrated on first use.
    ///
    /// Only the cache lookup runs under the registry lock; the context is
    /// loaded afterwards so first requests of different sessions do not
    /// wait on each other's store reads.
    pub async fn get_agents(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<Arc<SessionAgents>, WorkflowError> {
        let agents = {
            let key = (session_id.clone(), user_id.clone());
            let mut registry = self.sessions.lock().await;
            let now = registry.tick();
            match registry.entries.get_mut(&key) {
                Some(cached) => {
                    cached.last_used = now;
                    cached.agents.clone()
                }
                None => {
                    registry.make_room(self.deps.params.max_sessions);
                    let scope = SessionScope::new(session_id.clone(), user_id.clone());
                    let agents = Arc::new(SessionAgents::build(&self.deps, scope));
                    registry.entries.insert(
                        key,
                        CachedAgents {
                            agents: agents.clone(),
                            last_used: now,
                        },
                    );
                    agents
                }
            }
        };
        agents.ensure_loaded().await?;
        Ok(agents)
    }

    /// Resolve the session for a request, generating a session id when the
    /// caller has none yet.
    pub async fn initialize_runtime_and_context(
        &self,
        session_id: Option<SessionId>,
        user_id: &UserId,
    ) -> Result<Arc<SessionAgents>, WorkflowError> {
        if user_id.is_empty() {
            return Err(WorkflowError::MissingUser);
        }
        let session_id = match session_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = SessionId::generate();
                info!("Generated new session id {id}");
                id
            }
        };
        self.get_agents(&session_id, user_id).await
    }

    /// Run `f` with the session's agents while holding the session lock.
    pub async fn with_session<F, Fut, T>(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        f: F,
    ) -> Result<T, WorkflowError>
    where
        F: FnOnce(Arc<SessionAgents>) -> Fut,
        Fut: Future<Output = Result<T, WorkflowError>>,
    {
        if user_id.is_empty() {
            return Err(WorkflowError::MissingUser);
        }
        let agents = self.get_agents(session_id, user_id).await?;
        let _guard = agents.lock().await;
        f(agents.clone()).await
    }

    pub async fn evict(&self, session_id: &SessionId, user_id: &UserId) -> bool {
        self.sessions
            .lock()
            .await
            .entries
            .remove(&(session_id.clone(), user_id.clone()))
            .is_some()
    }

    /// Drop every cached session of the user. Returns how many were dropped.
    pub async fn evict_user(&self, user_id: &UserId) -> usize {
        let mut registry = self.sessions.lock().await;
        let before = registry.entries.len();
        registry.entries.retain(|(_, user), _| user != user_id);
        before - registry.entries.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.entries.len()
    }

    pub async fn contains(&self, session_id: &SessionId, user_id: &UserId) -> bool {
        self.sessions
            .lock()
            .await
            .entries
            .contains_key(&(session_id.clone(), user_id.clone()))
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
