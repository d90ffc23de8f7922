#![forbid(unsafe_code)]

//! Ambient models context and its provider.
//!
//! A [`ModelsContext`] carries the models map a subtree of components reads
//! when it is not handed one explicitly. [`ModelsProvider`] scopes a map to
//! its single child: while the child renders, [`ModelsContext::current`]
//! returns the provider's map; when the scope guard drops, the enclosing value
//! is restored.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use modelview_core::{ConnectError, ModelsMap, Result};

thread_local! {
    static GLOBAL_CONTEXT: ModelsContext = ModelsContext::new();
}

/// Scoped ambient models map. Clones share the same scope stack.
#[derive(Clone, Default)]
pub struct ModelsContext {
    scopes: Rc<RefCell<Vec<Option<ModelsMap>>>>,
}

impl ModelsContext {
    /// Context with nothing provided.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the thread-local context.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_CONTEXT.with(Clone::clone)
    }

    /// The innermost provided map, if any.
    ///
    /// A scope opened with `None` hides the maps of enclosing scopes.
    #[must_use]
    pub fn current(&self) -> Option<ModelsMap> {
        self.scopes.borrow().last().cloned().flatten()
    }

    /// Number of open scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.borrow().len()
    }

    /// Open a scope providing `models`. Dropping the guard closes it.
    #[must_use = "dropping this guard closes the models scope"]
    pub fn provide(&self, models: impl Into<Option<ModelsMap>>) -> ModelsScope {
        let mut scopes = self.scopes.borrow_mut();
        scopes.push(models.into());
        ModelsScope {
            scopes: Rc::clone(&self.scopes),
            depth: scopes.len(),
        }
    }
}

impl fmt::Debug for ModelsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelsContext")
            .field("depth", &self.depth())
            .field("current", &self.current())
            .finish()
    }
}

/// RAII guard for a provided models scope.
#[must_use = "dropping this guard closes the models scope"]
pub struct ModelsScope {
    scopes: Rc<RefCell<Vec<Option<ModelsMap>>>>,
    depth: usize,
}

impl Drop for ModelsScope {
    fn drop(&mut self) {
        let mut scopes = self.scopes.borrow_mut();
        if scopes.len() != self.depth {
            tracing::warn!(
                depth = self.depth,
                open = scopes.len(),
                "models scope closed out of order; closing the scopes it encloses"
            );
        }
        // Closes this scope and anything opened inside it, never an outer one.
        scopes.truncate(self.depth.saturating_sub(1));
    }
}

impl fmt::Debug for ModelsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelsScope")
            .field("depth", &self.depth)
            .finish()
    }
}

/// Makes a models map ambient for exactly one child element.
#[derive(Debug)]
pub struct ModelsProvider<E> {
    models: Option<ModelsMap>,
    child: E,
}

impl<E> ModelsProvider<E> {
    /// Build a provider.
    ///
    /// # Errors
    ///
    /// [`ConnectError::ChildCount`] unless `children` yields exactly one element.
    pub fn new(models: Option<ModelsMap>, children: impl IntoIterator<Item = E>) -> Result<Self> {
        let mut children: Vec<E> = children.into_iter().collect();
        let found = children.len();
        match children.pop() {
            Some(child) if found == 1 => Ok(Self { models, child }),
            _ => Err(ConnectError::ChildCount { found }),
        }
    }

    #[must_use]
    pub fn models(&self) -> Option<&ModelsMap> {
        self.models.as_ref()
    }

    #[must_use]
    pub fn child(&self) -> &E {
        &self.child
    }

    /// Render the child with the provider's map in scope on `context`.
    pub fn render<R>(&self, context: &ModelsContext, f: impl FnOnce(&E, &ModelsContext) -> R) -> R {
        let _scope = context.provide(self.models.clone());
        f(&self.child, context)
    }
}
