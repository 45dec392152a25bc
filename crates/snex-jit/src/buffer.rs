//! External data buffers.
//!
//! Lookup tables and audio files are owned by the host and handed to
//! compiled code as `block` values. A [`SharedBuffer`] keeps its length
//! fixed after creation so the address stored in a [`Block`] stays valid for
//! as long as any clone of the buffer is alive.

use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;
use snex_core::{Block, Identifier};

/// Reference counted sample buffer with a fixed length.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    data: Arc<RwLock<Vec<f32>>>,
}

impl SharedBuffer {
    pub fn new(size: usize) -> Self {
        Self::from_vec(vec![0.0; size])
    }

    pub fn from_vec(data: Vec<f32>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    pub fn len(&self) -> usize {
        self.read(|d| d.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read<R>(&self, f: impl FnOnce(&[f32]) -> R) -> R {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut [f32]) -> R) -> R {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// A `block` pointing at the samples.
    pub fn to_block(&self) -> Block {
        self.read(|d| Block::new(d.as_ptr() as usize as u64, d.len() as i32))
    }

    pub fn ptr_eq(&self, other: &SharedBuffer) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Registry of the buffers visible to compiled code.
///
/// Named buffers are created on demand. Tables and audio files are
/// registered by the host at a fixed index.
#[derive(Debug, Clone, Default)]
pub struct BufferHandler {
    named: FxHashMap<Identifier, SharedBuffer>,
    tables: FxHashMap<usize, SharedBuffer>,
    audio_files: FxHashMap<usize, SharedBuffer>,
}

impl BufferHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffer called `name`, created with `size` samples if it doesn't
    /// exist yet. An existing buffer is returned unchanged.
    pub fn create(&mut self, name: impl Into<Identifier>, size: usize) -> SharedBuffer {
        let name = name.into();
        self.named
            .entry(name.clone())
            .or_insert_with(|| {
                tracing::debug!(target: "snex::jit", name = %name, size, "created buffer");
                SharedBuffer::new(size)
            })
            .clone()
    }

    pub fn get(&self, name: &Identifier) -> Option<SharedBuffer> {
        self.named.get(name).cloned()
    }

    pub fn register_table(&mut self, index: usize, buffer: SharedBuffer) {
        self.tables.insert(index, buffer);
    }

    pub fn get_table(&self, index: usize) -> Option<SharedBuffer> {
        self.tables.get(&index).cloned()
    }

    pub fn register_audio_file(&mut self, index: usize, buffer: SharedBuffer) {
        self.audio_files.insert(index, buffer);
    }

    pub fn get_audio_file(&self, index: usize) -> Option<SharedBuffer> {
        self.audio_files.get(&index).cloned()
    }

    pub fn clear(&mut self) {
        self.named.clear();
        self.tables.clear();
        self.audio_files.clear();
    }
}
