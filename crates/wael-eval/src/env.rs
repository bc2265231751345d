//! Scope frames for the WAEL evaluator.
//!
//! Frames live in an arena and are addressed by [`ScopeId`]. A frame's
//! `parent` is the frame that was current when it was pushed (the call or
//! import site), not the frame the code was written in. Closures get one
//! extra level of lexical lookup through the `captured` list.
//!
//! Frames are never freed while the arena lives: a closure may hold on to
//! any frame and plain reassignment through it must stay visible to every
//! other holder.

use indexmap::IndexMap;

use crate::value::{ModuleFields, Value};

/// Handle to a frame in a [`Scopes`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    /// Position of the frame in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    public: bool,
}

/// A single binding frame.
#[derive(Debug, Clone, Default)]
struct Frame {
    bindings: IndexMap<String, Binding>,
    captured: Vec<ScopeId>,
    parent: Option<ScopeId>,
    level: usize,
    /// Exports staged by the last child frame that was popped.
    available: ModuleFields,
}

/// Arena of binding frames with push/pop semantics.
///
/// Lookup from a frame checks, in order:
/// 1. the frame's own bindings;
/// 2. the own bindings of each captured frame, in capture order;
/// 3. the same two steps on the parent, up to the global frame.
#[derive(Debug, Clone)]
pub struct Scopes {
    frames: Vec<Frame>,
}

impl Scopes {
    /// Create an arena holding one empty global frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// The global frame.
    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.frames[id.0].parent
    }

    pub fn level(&self, id: ScopeId) -> usize {
        self.frames[id.0].level
    }

    /// Number of frames ever allocated.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    // ── Push / Pop ────────────────────────────────────────────────────────

    /// Allocate a child of `parent`, pre-populated with `bindings`.
    pub fn push(
        &mut self,
        parent: ScopeId,
        bindings: impl IntoIterator<Item = (String, Value)>,
    ) -> ScopeId {
        let level = self.frames[parent.0].level + 1;
        let frame = Frame {
            bindings: bindings
                .into_iter()
                .map(|(name, value)| (name, Binding { value, public: false }))
                .collect(),
            parent: Some(parent),
            level,
            ..Frame::default()
        };
        self.frames.push(frame);
        tracing::trace!(frame = self.frames.len() - 1, level, "push scope");
        ScopeId(self.frames.len() - 1)
    }

    /// Leave `id`: stage its public bindings (plus `additional`) into the
    /// parent's `available` map and return the parent.
    pub fn pop(&mut self, id: ScopeId, additional: ModuleFields) -> Option<ScopeId> {
        let parent = self.frames[id.0].parent;
        if let Some(parent) = parent {
            self.pop_into(id, parent, additional);
        }
        parent
    }

    /// Like [`Scopes::pop`], but stage into `target` instead of the parent.
    pub fn pop_into(&mut self, id: ScopeId, target: ScopeId, additional: ModuleFields) {
        let mut staged = self.exports(id);
        staged.extend(additional);
        tracing::trace!(
            frame = id.0,
            target = target.0,
            exports = staged.len(),
            "pop scope"
        );
        self.frames[target.0].available = staged;
    }

    /// The public bindings of a frame, in declaration order.
    pub fn exports(&self, id: ScopeId) -> ModuleFields {
        self.frames[id.0]
            .bindings
            .iter()
            .filter(|(_, b)| b.public)
            .map(|(name, b)| (name.clone(), b.value.clone()))
            .collect()
    }

    /// Replace what is staged in a frame's `available` map.
    pub fn stage(&mut self, id: ScopeId, fields: ModuleFields) {
        self.frames[id.0].available = fields;
    }

    // ── Capture ───────────────────────────────────────────────────────────

    /// Make `other`'s own bindings visible from `id`.
    pub fn capture(&mut self, id: ScopeId, other: ScopeId) {
        self.frames[id.0].captured.push(other);
    }

    /// Drop the most recent capture of `id`.
    pub fn release(&mut self, id: ScopeId) {
        self.frames[id.0].captured.pop();
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    /// The frame in which `name` is visible from `id`.
    pub fn resolve_scope(&self, id: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(id);
        while let Some(frame_id) = current {
            let frame = &self.frames[frame_id.0];
            if frame.bindings.contains_key(name) {
                return Some(frame_id);
            }
            if let Some(captured) = frame
                .captured
                .iter()
                .find(|c| self.frames[c.0].bindings.contains_key(name))
            {
                return Some(*captured);
            }
            current = frame.parent;
        }
        None
    }

    /// The value bound to `name` as seen from `id`, or `Unit`.
    pub fn resolve(&self, id: ScopeId, name: &str) -> Value {
        self.resolve_scope(id, name)
            .and_then(|frame| self.frames[frame.0].bindings.get(name))
            .map(|b| b.value.clone())
            .unwrap_or(Value::Unit)
    }

    /// Returns `true` if `name` is bound directly in `id`.
    pub fn has_own(&self, id: ScopeId, name: &str) -> bool {
        self.frames[id.0].bindings.contains_key(name)
    }

    // ── Store ─────────────────────────────────────────────────────────────

    /// Bind `name`.
    ///
    /// With `search`, an existing binding visible from `id` is overwritten
    /// in the frame that holds it; otherwise (or when none exists) the
    /// binding goes into `id` itself. `public` sets the export flag;
    /// `None` keeps the flag of an existing binding.
    pub fn store(
        &mut self,
        id: ScopeId,
        name: &str,
        value: Value,
        public: Option<bool>,
        search: bool,
    ) {
        let target = if search {
            self.resolve_scope(id, name).unwrap_or(id)
        } else {
            id
        };
        let bindings = &mut self.frames[target.0].bindings;
        match bindings.get_mut(name) {
            Some(binding) => {
                binding.value = value;
                if let Some(public) = public {
                    binding.public = public;
                }
            }
            None => {
                bindings.insert(
                    name.to_string(),
                    Binding {
                        value,
                        public: public.unwrap_or(false),
                    },
                );
            }
        }
    }

    /// Define a private binding directly in `id`.
    pub fn define(&mut self, id: ScopeId, name: &str, value: Value) {
        self.store(id, name, value, Some(false), false);
    }

    // ── Imports ───────────────────────────────────────────────────────────

    /// Drain staged exports: all of them, or only `names`.
    pub fn consume_available(&mut self, id: ScopeId, names: Option<&[String]>) -> ModuleFields {
        let available = &mut self.frames[id.0].available;
        match names {
            None => std::mem::take(available),
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    available
                        .shift_remove(name)
                        .map(|value| (name.clone(), value))
                })
                .collect(),
        }
    }

    /// Drain staged exports and bind them as private names in `id`.
    pub fn use_available(&mut self, id: ScopeId, names: Option<&[String]>) -> ModuleFields {
        let drained = self.consume_available(id, names);
        for (name, value) in &drained {
            self.define(id, name, value.clone());
        }
        drained
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}
