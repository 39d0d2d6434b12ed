// Task store: the ordered task collection mirrored into a key-value backend

use crate::error::TaskError;
use crate::kv::KeyValueStore;
use crate::models::{Task, TaskFields, TaskId};
use chrono::NaiveDate;
use eyre::Context;
use tracing::{debug, info, warn};

/// Key the collection is stored under unless configured otherwise
pub const DEFAULT_KEY: &str = "todos";

type Clock = Box<dyn Fn() -> NaiveDate>;

/// Owns the task collection and keeps the backend in step with it
///
/// Every mutation writes the whole collection before returning. A mutation
/// whose write fails leaves the in-memory collection untouched.
pub struct TaskStore<B: KeyValueStore> {
    backend: B,
    key: String,
    tasks: Vec<Task>,
    today: Clock,
}

impl<B: KeyValueStore> TaskStore<B> {
    /// Create an empty store over `backend`; call [`TaskStore::load`] to hydrate
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            key: DEFAULT_KEY.to_string(),
            tasks: Vec::new(),
            today: Box::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Use a different storage key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Replace the clock used to decide what "today" is
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current date according to the store clock
    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Hydrate the collection from the backend
    ///
    /// Missing or unreadable data is treated as "no prior state" and leaves
    /// an empty collection.
    pub fn load(&mut self) {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No saved tasks, starting empty");
                self.tasks.clear();
                return;
            }
            Err(e) => {
                warn!(key = %self.key, error = ?e, "Failed to read saved tasks, starting empty");
                self.tasks.clear();
                return;
            }
        };

        self.tasks = match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(key = %self.key, error = ?e, "Saved tasks are malformed, starting empty");
                Vec::new()
            }
        };

        info!(key = %self.key, count = self.tasks.len(), "Loaded tasks");
    }

    /// Write the full collection to the backend
    pub fn save(&mut self) -> Result<(), TaskError> {
        Self::write(&mut self.backend, &self.key, &self.tasks)
    }

    fn write(backend: &mut B, key: &str, tasks: &[Task]) -> Result<(), TaskError> {
        let json = serde_json::to_string(tasks)
            .context("Failed to serialize tasks")
            .map_err(TaskError::Storage)?;
        backend
            .set(key, &json)
            .wrap_err_with(|| format!("Failed to write key '{}'", key))
            .map_err(TaskError::Storage)?;
        debug!(key, count = tasks.len(), "Saved tasks");
        Ok(())
    }

    /// Persist `next` and only then make it the current collection
    fn commit(&mut self, next: Vec<Task>) -> Result<(), TaskError> {
        Self::write(&mut self.backend, &self.key, &next)?;
        self.tasks = next;
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// All tasks in insertion order
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resolve a full id or a unique id prefix
    pub fn resolve(&self, prefix: &str) -> Result<TaskId, TaskError> {
        let needle = prefix.trim().replace('-', "").to_ascii_lowercase();
        if needle.is_empty() {
            return Err(TaskError::NotFound(prefix.to_string()));
        }

        let matches: Vec<TaskId> = self
            .tasks
            .iter()
            .map(|t| t.id)
            .filter(|id| id.to_string().starts_with(&needle))
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(TaskError::NotFound(prefix.to_string())),
            _ => Err(TaskError::AmbiguousId {
                prefix: prefix.to_string(),
                matches: matches.len(),
            }),
        }
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == *id)
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.position(&id).is_none() {
                return id;
            }
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Validate `fields` and append a new pending task
    pub fn create(&mut self, fields: TaskFields) -> Result<Task, TaskError> {
        let fields = fields.validate(self.today())?;
        let task = Task::new(self.fresh_id(), fields);

        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;

        debug!(id = %task.id, "Created task");
        Ok(task)
    }

    /// Validate `fields` and replace the mutable fields of task `id` in place
    pub fn edit(&mut self, id: &TaskId, fields: TaskFields) -> Result<Task, TaskError> {
        let fields = fields.validate(self.today())?;
        let pos = self.position(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        let mut next = self.tasks.clone();
        next[pos].apply(fields);
        let task = next[pos].clone();
        self.commit(next)?;

        debug!(id = %task.id, "Edited task");
        Ok(task)
    }

    /// Flip the editing flag of task `id`; no-op if it does not exist
    pub fn toggle_editing(&mut self, id: &TaskId) -> Result<(), TaskError> {
        self.update_in_place(id, "toggle_editing", |task| task.is_editing = !task.is_editing)
    }

    /// Flip the completion flag of task `id`; no-op if it does not exist
    pub fn toggle_complete(&mut self, id: &TaskId) -> Result<(), TaskError> {
        self.update_in_place(id, "toggle_complete", |task| task.is_completed = !task.is_completed)
    }

    /// Remove task `id`; no-op if it does not exist
    ///
    /// Removal is unconditional. Ask for confirmation first, see
    /// [`crate::DeleteGate`].
    pub fn delete(&mut self, id: &TaskId) -> Result<(), TaskError> {
        let Some(pos) = self.position(id) else {
            debug!(%id, "delete: task not found, ignoring");
            return Ok(());
        };

        let mut next = self.tasks.clone();
        next.remove(pos);
        self.commit(next)?;

        debug!(%id, "Deleted task");
        Ok(())
    }

    fn update_in_place(&mut self, id: &TaskId, op: &str, change: impl FnOnce(&mut Task)) -> Result<(), TaskError> {
        let Some(pos) = self.position(id) else {
            debug!(%id, op, "task not found, ignoring");
            return Ok(());
        };

        let mut next = self.tasks.clone();
        change(&mut next[pos]);
        self.commit(next)
    }
}
