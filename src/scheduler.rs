use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::rc::Rc;
use std::time::Instant;

use crate::core::{Dynamic, TaskId};
use crate::diagnostics::Diagnostics;
use crate::engine::{Arguments, Callable, Handle, Task, TaskNode};
use crate::error::SchedulerError;

enum State {
    Pending,
    /// Set for the duration of an execution. Seeing it again while the task
    /// is on the active stack means the graph has a cycle.
    Running,
    Done(Dynamic),
}

pub(crate) struct Slot {
    pub(crate) task: Rc<dyn Task>,
    state: State,
}

/// The lazy task-graph evaluator.
///
/// A `Scheduler` owns a collection of tasks indexed by [`TaskId`]. Tasks are
/// registered with [`add`](Self::add); nothing runs until a result is
/// demanded with [`get_result`](Self::get_result) or
/// [`execute_all`](Self::execute_all). Demanding a result executes the
/// minimal set of pending tasks it transitively depends on, depth first and
/// left to right, and memoizes every value along the way. Each callable runs
/// at most once per successful execution.
///
/// # Example
///
/// ```rust
/// use lazydag::Scheduler;
///
/// let mut scheduler = Scheduler::new();
/// let base = scheduler.add(|| 3, ());
/// let left = scheduler.add(|v: i32| v + 1, scheduler.future_result::<i32>(base));
/// let right = scheduler.add(|v: i32| v - 1, scheduler.future_result::<i32>(base));
/// let sum = scheduler.add(
///     |l: i32, r: i32| l + r,
///     (scheduler.future_result::<i32>(left), scheduler.future_result::<i32>(right)),
/// );
///
/// assert_eq!(scheduler.get_result::<i32>(sum).unwrap(), 6);
/// ```
#[derive(Default)]
pub struct Scheduler {
    pub(crate) tasks: Vec<Option<Slot>>,
    active: Vec<TaskId>,
    diagnostics: Diagnostics,
}

impl Scheduler {
    /// Creates a new, empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty scheduler with room for `capacity` tasks.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// The entry point for registering a named task.
    pub fn task(&mut self) -> TaskDef<'_> {
        TaskDef {
            scheduler: self,
            name: None,
        }
    }

    /// Registers a task and returns its identifier. Nothing is executed.
    ///
    /// `arguments` is `()`, a single [`Argument`](crate::Argument), or a tuple
    /// of them; each slot is either an immediate value or a [`Handle`] to
    /// another task's result. Handles are late-bound, so the referenced task
    /// only needs to exist once this task is executed.
    pub fn add<F, D>(&mut self, callable: F, arguments: D) -> TaskId
    where
        D: Arguments,
        F: Callable<D::Values>,
        F::Output: 'static,
    {
        self.task().run(callable, arguments)
    }

    /// Registers a task whose callable may fail.
    ///
    /// An `Err` returned by the callable is reported as
    /// [`SchedulerError::Task`] by the call that demanded the value. The task
    /// stays pending, so a later demand invokes the callable again.
    pub fn try_add<F, D, R>(&mut self, callable: F, arguments: D) -> TaskId
    where
        D: Arguments,
        F: Callable<D::Values, Output = anyhow::Result<R>>,
        R: 'static,
    {
        self.task().try_run(callable, arguments)
    }

    fn register<D, F, R>(&mut self, name: Cow<'static, str>, arguments: D, callback: F) -> TaskId
    where
        D: Arguments,
        F: Fn(D::Values) -> anyhow::Result<R> + 'static,
        R: 'static,
    {
        let id = self.next_id();

        tracing::trace!(%id, %name, "registering task");

        self.tasks.push(Some(Slot {
            task: Rc::new(TaskNode {
                id,
                name,
                arguments,
                callback,
                _phantom: PhantomData,
            }),
            state: State::Pending,
        }));

        id
    }

    /// The identifier the next registered task will receive.
    pub fn next_id(&self) -> TaskId {
        TaskId(self.tasks.len())
    }

    /// Constructs a forward reference to the eventual result of task `id`.
    ///
    /// The identifier is not validated here; a task may be referenced before
    /// it is registered, as long as it exists when the reference is resolved.
    pub fn future_result<T>(&self, id: TaskId) -> Handle<T> {
        Handle::new(id)
    }

    /// Returns the result of task `id`, executing it and any pending
    /// dependencies first.
    ///
    /// The requested type must be exactly the task's output type. This is
    /// checked before anything runs.
    pub fn get_result<T>(&mut self, id: TaskId) -> Result<T, SchedulerError>
    where
        T: Clone + 'static,
    {
        self.demand(id)
    }

    /// Executes every task that has not run yet, in ascending identifier
    /// order. Stops at the first error.
    pub fn execute_all(&mut self) -> Result<(), SchedulerError> {
        let span = tracing::info_span!("execute_all", tasks = self.len());
        let _enter = span.enter();

        let before = self.diagnostics.execution_times.len();

        for index in 0..self.tasks.len() {
            let pending = self.tasks[index]
                .as_ref()
                .is_some_and(|slot| !matches!(slot.state, State::Done(_)));

            if pending {
                self.execute(TaskId(index))?;
            }
        }

        let executed = self.diagnostics.execution_times.len() - before;
        tracing::info!("executed {} tasks", executed);
        Ok(())
    }

    /// Removes task `id`. Its identifier is never issued again, and any
    /// [`Handle`] to it fails with [`SchedulerError::InvalidId`] when
    /// resolved.
    pub fn remove_task(&mut self, id: TaskId) -> Result<(), SchedulerError> {
        match self.tasks.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                self.diagnostics.execution_times.remove(&id);
                tracing::debug!(%id, "removed task");
                Ok(())
            }
            _ => Err(SchedulerError::InvalidId(id)),
        }
    }

    /// Returns whether `id` refers to a registered task that was not removed.
    pub fn has_task(&self, id: TaskId) -> bool {
        self.slot(id).is_ok()
    }

    /// Returns whether task `id` has produced its value.
    pub fn is_executed(&self, id: TaskId) -> Result<bool, SchedulerError> {
        Ok(matches!(self.slot(id)?.state, State::Done(_)))
    }

    /// Number of registered tasks that have not been removed.
    pub fn len(&self) -> usize {
        self.tasks.iter().flatten().count()
    }

    /// Returns `true` if no live tasks remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every task and restarts identifier issuance from zero.
    ///
    /// Identifiers and handles obtained before the call refer to the new
    /// epoch afterwards and must not be reused.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.active.clear();
        self.diagnostics = Diagnostics::default();
    }

    /// Timing of every successful execution so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Iterates over the tasks that have not been removed.
    pub(crate) fn live(&self) -> impl Iterator<Item = (TaskId, &Slot)> {
        self.tasks
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|slot| (TaskId(index), slot)))
    }

    pub(crate) fn slot(&self, id: TaskId) -> Result<&Slot, SchedulerError> {
        self.tasks
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(SchedulerError::InvalidId(id))
    }

    /// Resolves the value of task `id` on behalf of a dependent task.
    pub(crate) fn demand<T>(&mut self, id: TaskId) -> Result<T, SchedulerError>
    where
        T: Clone + 'static,
    {
        let task = &self.slot(id)?.task;

        if task.output_type_id() != TypeId::of::<T>() {
            return Err(SchedulerError::TypeMismatch {
                id,
                expected: type_name::<T>(),
                found: task.output_type_name(),
            });
        }

        self.execute(id)?;

        let State::Done(output) = &self.slot(id)?.state else {
            unreachable!("task {id} is not done after executing")
        };

        output
            .downcast_ref::<T>()
            .cloned()
            .ok_or(SchedulerError::TypeMismatch {
                id,
                expected: type_name::<T>(),
                found: "<unknown>",
            })
    }

    /// Runs task `id` unless it has already produced its value.
    fn execute(&mut self, id: TaskId) -> Result<(), SchedulerError> {
        let slot = self
            .tasks
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SchedulerError::InvalidId(id))?;

        let task = match slot.state {
            State::Done(_) => return Ok(()),
            State::Running => {
                return Err(SchedulerError::Cycle(cycle_path(&self.active, id)));
            }
            State::Pending => {
                slot.state = State::Running;
                Rc::clone(&slot.task)
            }
        };

        let span = tracing::debug_span!("task", %id, name = task.get_name());
        let _enter = span.enter();

        let start = Instant::now();

        let result = {
            let mut frame = Frame::enter(self, id);
            task.execute(&mut *frame.scheduler)
        };

        let slot = self
            .tasks
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SchedulerError::InvalidId(id))?;

        match result {
            Ok(output) => {
                slot.state = State::Done(output);
                self.diagnostics.record(id, start);
                tracing::debug!(elapsed = ?start.elapsed(), "task finished");
                Ok(())
            }
            Err(err) => {
                match &err {
                    SchedulerError::Task { id: origin, .. } if *origin == id => {
                        tracing::warn!("task failed: {}", err);
                    }
                    _ => tracing::debug!("dependency failed: {}", err),
                }

                Err(err)
            }
        }
    }
}

/// A task on the active stack. Dropping the frame pops the stack and puts
/// the task back to `Pending` unless it produced a value, which also covers a
/// callable unwinding through it.
struct Frame<'a> {
    scheduler: &'a mut Scheduler,
    id: TaskId,
}

impl<'a> Frame<'a> {
    fn enter(scheduler: &'a mut Scheduler, id: TaskId) -> Self {
        scheduler.active.push(id);
        Self { scheduler, id }
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.scheduler.active.pop();

        if let Some(Some(slot)) = self.scheduler.tasks.get_mut(self.id.0) {
            if matches!(slot.state, State::Running) {
                slot.state = State::Pending;
            }
        }
    }
}

/// The cycle closed by demanding `id` again, starting and ending at `id`.
fn cycle_path(active: &[TaskId], id: TaskId) -> Vec<TaskId> {
    let start = active.iter().position(|item| *item == id).unwrap_or(0);
    let mut path = active[start..].to_vec();
    path.push(id);
    path
}

/// Builder for a task with a custom name, returned by [`Scheduler::task`].
pub struct TaskDef<'a> {
    scheduler: &'a mut Scheduler,
    name: Option<Cow<'static, str>>,
}

impl TaskDef<'_> {
    /// Sets the name shown in logs, errors and the rendered graph. Defaults
    /// to the type name of the callable.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Registers an infallible callable. See [`Scheduler::add`].
    pub fn run<F, D>(self, callable: F, arguments: D) -> TaskId
    where
        D: Arguments,
        F: Callable<D::Values>,
        F::Output: 'static,
    {
        let name = self.name.unwrap_or(type_name::<F>().into());

        self.scheduler
            .register(name, arguments, move |values: D::Values| {
                Ok(callable.call(values))
            })
    }

    /// Registers a fallible callable. See [`Scheduler::try_add`].
    pub fn try_run<F, D, R>(self, callable: F, arguments: D) -> TaskId
    where
        D: Arguments,
        F: Callable<D::Values, Output = anyhow::Result<R>>,
        R: 'static,
    {
        let name = self.name.unwrap_or(type_name::<F>().into());

        self.scheduler
            .register(name, arguments, move |values: D::Values| callable.call(values))
    }
}
