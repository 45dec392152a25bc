//! Native function storage and call context.
//!
//! A [`NativeFn`] is whatever the code generator (or the host) hands back for
//! a function: a shared, type-erased callable receiving a [`CallContext`].
//! The bound object, when present, is passed before the positional
//! arguments.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{FunctionError, TypeHash, VariableStorage};

/// Type-erased native function.
pub struct NativeFn {
    /// Identity of the callable, usually the signature hash.
    pub id: TypeHash,
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self {
            id: TypeHash::EMPTY,
            inner: Arc::new(f),
        }
    }

    /// Wrap a closure. The closure's signature is inferred from this bound,
    /// so no parameter annotations are needed.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<(), FunctionError> + Send + Sync + 'static,
    {
        Self::new(f)
    }

    pub fn with_id(mut self, id: TypeHash) -> Self {
        self.id = id;
        self
    }

    /// Shortcut for a native function that always returns `value`.
    pub fn constant(value: VariableStorage) -> Self {
        Self::from_fn(move |ctx| {
            ctx.set_return(value);
            Ok(())
        })
    }

    #[inline]
    pub fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), FunctionError> {
        self.inner.call(ctx)
    }

    /// Whether both handles share the same callable.
    pub fn ptr_eq(&self, other: &NativeFn) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Clone for NativeFn {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Trait for callable native functions.
pub trait NativeCallable {
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), FunctionError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> Result<(), FunctionError>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), FunctionError> {
        (self)(ctx)
    }
}

// Host object handles

/// Generation checked reference to a host object registered with the global
/// scope.
///
/// All clones share one liveness flag, so deregistering the object
/// invalidates every function bound to it.
#[derive(Clone)]
pub struct ObjectHandle {
    pub index: u32,
    pub generation: u32,
    alive: Arc<AtomicBool>,
}

impl ObjectHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Mark the object as deleted for every holder of this handle.
    pub fn invalidate(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl Eq for ObjectHandle {}

impl std::hash::Hash for ObjectHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .field("alive", &self.is_alive())
            .finish()
    }
}

// Call context

/// Arguments and return slot of one native call.
pub struct CallContext<'a> {
    object: Option<&'a ObjectHandle>,
    this_data: Option<&'a mut [u8]>,
    args: &'a [VariableStorage],
    return_value: VariableStorage,
}

impl<'a> CallContext<'a> {
    pub fn new(args: &'a [VariableStorage]) -> Self {
        Self {
            object: None,
            this_data: None,
            args,
            return_value: VariableStorage::Void,
        }
    }

    pub fn with_object(mut self, object: &'a ObjectHandle) -> Self {
        self.object = Some(object);
        self
    }

    /// Attach the memory of the struct a member function is called on.
    pub fn with_this_data(mut self, data: &'a mut [u8]) -> Self {
        self.this_data = Some(data);
        self
    }

    /// The bound host object.
    pub fn object(&self) -> Option<&ObjectHandle> {
        self.object
    }

    pub fn this_data(&mut self) -> Option<&mut [u8]> {
        self.this_data.as_deref_mut()
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn arg(&self, index: usize) -> Result<VariableStorage, FunctionError> {
        self.args.get(index).copied().ok_or_else(|| {
            FunctionError::Native(format!(
                "argument {index} out of bounds ({} arguments)",
                self.args.len()
            ))
        })
    }

    pub fn args(&self) -> &[VariableStorage] {
        self.args
    }

    pub fn set_return(&mut self, value: VariableStorage) {
        self.return_value = value;
    }

    pub fn return_value(&self) -> VariableStorage {
        self.return_value
    }

    pub fn into_return_value(self) -> VariableStorage {
        self.return_value
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("arg_count", &self.args.len())
            .field("has_object", &self.object.is_some())
            .finish()
    }
}
