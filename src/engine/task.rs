use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::marker::PhantomData;

use crate::Scheduler;
use crate::core::{Dynamic, TaskId};
use crate::engine::{Arguments, Dependency};
use crate::error::SchedulerError;

pub(crate) trait TypedTask: 'static {
    /// The concrete output type of this task.
    type Output: 'static;

    fn get_name(&self) -> &str;

    fn dependencies(&self) -> Vec<Dependency>;

    fn execute(&self, scheduler: &mut Scheduler) -> Result<Self::Output, SchedulerError>;
}

/// The type-erased form of a task, which lets a single collection hold tasks
/// with different output types. The output type is kept around as a
/// [`TypeId`] so that every retrieval can be checked before downcasting.
pub(crate) trait Task {
    fn get_name(&self) -> &str;

    fn output_type_id(&self) -> TypeId;

    fn output_type_name(&self) -> &'static str;

    fn dependencies(&self) -> Vec<Dependency>;

    fn execute(&self, scheduler: &mut Scheduler) -> Result<Dynamic, SchedulerError>;
}

// A blanket implementation to automatically bridge the two. This is where the
// type erasure actually happens.
impl<T> Task for T
where
    T: TypedTask,
{
    fn get_name(&self) -> &str {
        T::get_name(self)
    }

    fn output_type_id(&self) -> TypeId {
        TypeId::of::<T::Output>()
    }

    fn output_type_name(&self) -> &'static str {
        type_name::<T::Output>()
    }

    fn dependencies(&self) -> Vec<Dependency> {
        T::dependencies(self)
    }

    fn execute(&self, scheduler: &mut Scheduler) -> Result<Dynamic, SchedulerError> {
        // Call the typed method, then erase the result.
        Ok(Box::new(T::execute(self, scheduler)?))
    }
}

pub(crate) struct TaskNode<D, F, R>
where
    D: Arguments,
    F: Fn(D::Values) -> anyhow::Result<R>,
{
    pub id: TaskId,
    pub name: Cow<'static, str>,
    pub arguments: D,
    pub callback: F,
    pub _phantom: PhantomData<fn() -> R>,
}

impl<D, F, R> TypedTask for TaskNode<D, F, R>
where
    D: Arguments,
    F: Fn(D::Values) -> anyhow::Result<R> + 'static,
    R: 'static,
{
    type Output = R;

    fn get_name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.arguments.dependencies()
    }

    fn execute(&self, scheduler: &mut Scheduler) -> Result<R, SchedulerError> {
        let values = self.arguments.resolve_all(scheduler)?;

        (self.callback)(values).map_err(|error| SchedulerError::Task {
            id: self.id,
            name: self.name.to_string(),
            error,
        })
    }
}
