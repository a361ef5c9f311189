mod handle;
mod task;

use std::any::{TypeId, type_name};

use crate::Scheduler;
use crate::core::TaskId;
use crate::error::SchedulerError;

pub use crate::engine::handle::{Deferred, Handle, value};
pub(crate) use crate::engine::task::{Task, TaskNode};

/// A future reference embedded in a task's arguments, as seen by the graph
/// tooling. Carries the identity of the type the reference was created with.
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
pub struct Dependency {
    pub(crate) id: TaskId,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
}

impl Dependency {
    fn of<T: 'static>(id: TaskId) -> Self {
        Self {
            id,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A single argument slot of a task.
///
/// Implemented for [`Handle<T>`], [`Deferred<T>`], and the built-in scalar
/// and string types, which can be passed as immediates without wrapping. Any
/// other immediate value is bound with [`value`].
pub trait Argument: sealed::Sealed + 'static {
    /// The type the callable receives once the slot is resolved.
    type Value: 'static;

    #[doc(hidden)]
    fn dependency(&self) -> Option<Dependency>;

    #[doc(hidden)]
    fn resolve(&self, scheduler: &mut Scheduler) -> Result<Self::Value, SchedulerError>;
}

impl<T> sealed::Sealed for Handle<T> {}

impl<T> Argument for Handle<T>
where
    T: Clone + 'static,
{
    type Value = T;

    fn dependency(&self) -> Option<Dependency> {
        Some(Dependency::of::<T>(self.id))
    }

    fn resolve(&self, scheduler: &mut Scheduler) -> Result<T, SchedulerError> {
        scheduler.demand(self.id)
    }
}

impl<T> sealed::Sealed for Deferred<T> {}

impl<T> Argument for Deferred<T>
where
    T: Clone + 'static,
{
    type Value = T;

    fn dependency(&self) -> Option<Dependency> {
        match self {
            Deferred::Value(_) => None,
            Deferred::Future(handle) => handle.dependency(),
        }
    }

    fn resolve(&self, scheduler: &mut Scheduler) -> Result<T, SchedulerError> {
        match self {
            Deferred::Value(value) => Ok(value.clone()),
            Deferred::Future(handle) => handle.resolve(scheduler),
        }
    }
}

macro_rules! impl_immediate {
    ($($T:ty),*) => {
        $(
            impl sealed::Sealed for $T {}

            impl Argument for $T {
                type Value = $T;

                fn dependency(&self) -> Option<Dependency> {
                    None
                }

                fn resolve(&self, _: &mut Scheduler) -> Result<$T, SchedulerError> {
                    Ok(self.clone())
                }
            }
        )*
    };
}

impl_immediate!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String,
    &'static str
);

/// The complete argument list of a task.
///
/// This trait is implemented for `()`, for any single [`Argument`], for
/// tuples of up to twelve [`Argument`]s, and for `Vec<A>`. It collapses every
/// combination of arity and immediate-or-future position into one rule: the
/// slots are resolved left to right, and the resolved values are handed to
/// the callable as a tuple of parameters.
///
/// A `Vec<A>` is passed to the callable as a single `Vec<A::Value>`
/// parameter, which allows an arbitrary number of homogeneous arguments.
pub trait Arguments: 'static {
    /// The parameter list of the callable, as a tuple.
    type Values: 'static;

    #[doc(hidden)]
    fn dependencies(&self) -> Vec<Dependency>;

    #[doc(hidden)]
    fn resolve_all(&self, scheduler: &mut Scheduler) -> Result<Self::Values, SchedulerError>;
}

impl Arguments for () {
    type Values = ();

    fn dependencies(&self) -> Vec<Dependency> {
        vec![]
    }

    fn resolve_all(&self, _: &mut Scheduler) -> Result<(), SchedulerError> {
        Ok(())
    }
}

impl<A> Arguments for A
where
    A: Argument,
{
    type Values = (A::Value,);

    fn dependencies(&self) -> Vec<Dependency> {
        self.dependency().into_iter().collect()
    }

    fn resolve_all(&self, scheduler: &mut Scheduler) -> Result<Self::Values, SchedulerError> {
        Ok((self.resolve(scheduler)?,))
    }
}

impl<A> Arguments for Vec<A>
where
    A: Argument,
{
    type Values = (Vec<A::Value>,);

    fn dependencies(&self) -> Vec<Dependency> {
        self.iter().filter_map(Argument::dependency).collect()
    }

    fn resolve_all(&self, scheduler: &mut Scheduler) -> Result<Self::Values, SchedulerError> {
        let mut values = Vec::with_capacity(self.len());

        for argument in self {
            values.push(argument.resolve(scheduler)?);
        }

        Ok((values,))
    }
}

macro_rules! impl_arguments {
    ($($A:ident),*) => {
        #[allow(non_snake_case)]
        impl<$($A),*> Arguments for ($($A,)*)
        where
            $($A: Argument),*
        {
            type Values = ($($A::Value,)*);

            fn dependencies(&self) -> Vec<Dependency> {
                let ($($A,)*) = self;
                [$($A.dependency()),*].into_iter().flatten().collect()
            }

            fn resolve_all(&self, scheduler: &mut Scheduler) -> Result<Self::Values, SchedulerError> {
                let ($($A,)*) = self;
                // tuple expressions evaluate left to right
                Ok(($($A.resolve(scheduler)?,)*))
            }
        }
    };
}

impl_arguments!(A);
impl_arguments!(A, B);
impl_arguments!(A, B, C);
impl_arguments!(A, B, C, D);
impl_arguments!(A, B, C, D, E);
impl_arguments!(A, B, C, D, E, F);
impl_arguments!(A, B, C, D, E, F, G);
impl_arguments!(A, B, C, D, E, F, G, H);
impl_arguments!(A, B, C, D, E, F, G, H, I);
impl_arguments!(A, B, C, D, E, F, G, H, I, J);
impl_arguments!(A, B, C, D, E, F, G, H, I, J, K);
impl_arguments!(A, B, C, D, E, F, G, H, I, J, K, L);

/// A function that can be registered as a task, taking its parameters as a
/// tuple.
///
/// Implemented for every `Fn(A1, ..., An) -> R` with up to twelve
/// parameters, so plain closures and function items can be passed to
/// [`Scheduler::add`]. The parameter types must match the resolved types of
/// the bound [`Arguments`] exactly.
pub trait Callable<Args>: 'static {
    type Output;

    fn call(&self, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($A:ident),*) => {
        #[allow(non_snake_case)]
        impl<Func, Ret, $($A),*> Callable<($($A,)*)> for Func
        where
            Func: Fn($($A),*) -> Ret + 'static,
        {
            type Output = Ret;

            fn call(&self, ($($A,)*): ($($A,)*)) -> Ret {
                (self)($($A),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A);
impl_callable!(A, B);
impl_callable!(A, B, C);
impl_callable!(A, B, C, D);
impl_callable!(A, B, C, D, E);
impl_callable!(A, B, C, D, E, F);
impl_callable!(A, B, C, D, E, F, G);
impl_callable!(A, B, C, D, E, F, G, H);
impl_callable!(A, B, C, D, E, F, G, H, I);
impl_callable!(A, B, C, D, E, F, G, H, I, J);
impl_callable!(A, B, C, D, E, F, G, H, I, J, K);
impl_callable!(A, B, C, D, E, F, G, H, I, J, K, L);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_dependencies() {
        let handle = Handle::<i32>::new(TaskId(4));
        let deferred = Deferred::<String>::from(Handle::new(TaskId(2)));
        let args = (handle, 1.5f64, deferred, value(7u8));

        let ids: Vec<_> = args.dependencies().iter().map(|dep| dep.id).collect();
        assert_eq!(ids, vec![TaskId(4), TaskId(2)]);
    }

    #[test]
    fn test_dependency_type() {
        let dependencies = Handle::<f32>::new(TaskId(0)).dependencies();
        assert_eq!(dependencies.len(), 1);
        assert_eq!(dependencies[0].type_id, TypeId::of::<f32>());
        assert_eq!(dependencies[0].type_name, "f32");
    }

    #[test]
    fn test_vec_dependencies() {
        let args = vec![
            Deferred::Future(Handle::<i32>::new(TaskId(0))),
            value(5),
            Deferred::Future(Handle::new(TaskId(1))),
        ];

        assert_eq!(args.dependencies().len(), 2);
    }

    #[test]
    fn test_immediates_resolve() {
        let mut scheduler = Scheduler::new();
        let args = (3i32, "x", String::from("y"), value(vec![1, 2]));

        let (a, b, c, d) = args.resolve_all(&mut scheduler).unwrap();
        assert_eq!((a, b, c.as_str(), d), (3, "x", "y", vec![1, 2]));
    }

    #[test]
    fn test_callable_spreads_tuple() {
        let add = |a: i32, b: i32| a + b;
        assert_eq!(Callable::call(&add, (2, 3)), 5);

        let constant = || "ok";
        assert_eq!(Callable::call(&constant, ()), "ok");
    }
}
