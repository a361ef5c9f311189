use std::marker::PhantomData;

use crate::core::TaskId;

/// A type-safe reference to the eventual result of a task.
///
/// A `Handle<T>` is a lightweight, copyable token that represents a *future*
/// result of type `T`. It carries no value and does not own the task; it is a
/// named edge in the dependency graph. Binding a handle as an argument of
/// another task makes that task depend on the referenced one, and resolving
/// it at execution time forces the referenced task if it is still pending.
///
/// A handle may be created before the task it names is registered. It only
/// has to exist by the time the handle is resolved.
///
/// # Diamond dependencies
///
/// If tasks L and R both hold a handle to task B, and task S depends on L and
/// R, task B is executed *once* and its result is shared by both paths.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Handle<T> {
    pub(crate) id: TaskId,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(id: TaskId) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Returns the identifier of the referenced task.
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

/// An argument slot that is resolved only when its task executes.
///
/// Either an immediate value bound at registration, or a [`Handle`] to the
/// result of another task. The type `T` is fixed at construction and must
/// match the referenced task's output type.
#[derive(Debug, Clone)]
pub enum Deferred<T> {
    Value(T),
    Future(Handle<T>),
}

impl<T> From<Handle<T>> for Deferred<T> {
    fn from(handle: Handle<T>) -> Self {
        Deferred::Future(handle)
    }
}

/// Binds an immediate value of any cloneable type as a task argument.
///
/// Built-in scalars and strings can be passed directly; everything else goes
/// through this helper.
///
/// ```rust
/// use lazydag::{Scheduler, value};
///
/// #[derive(Clone)]
/// struct Point { x: i32, y: i32 }
///
/// let mut scheduler = Scheduler::new();
/// let id = scheduler.add(|p: Point| p.x + p.y, value(Point { x: 3, y: 7 }));
/// assert_eq!(scheduler.get_result::<i32>(id).unwrap(), 10);
/// ```
pub fn value<T>(value: T) -> Deferred<T> {
    Deferred::Value(value)
}
