//! The component side of a connection.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use modelview_core::Props;
use serde_json::Value;

/// Declared static metadata of a component (name → value), forwarded
/// unchanged by wrappers.
pub type Statics = BTreeMap<String, Value>;

/// A UI component: a pure function of props.
pub trait Component {
    type Output;

    fn render(&self, props: &Props) -> Self::Output;

    /// Human-readable name used in diagnostics and wrapper names.
    fn display_name(&self) -> Option<&str> {
        None
    }

    fn statics(&self) -> Statics {
        Statics::new()
    }
}

/// A closure adapted into a [`Component`].
pub struct FnComponent<F, O> {
    name: Option<String>,
    statics: Statics,
    render: F,
    _output: PhantomData<fn() -> O>,
}

impl<F, O> FnComponent<F, O>
where
    F: Fn(&Props) -> O,
{
    pub fn new(render: F) -> Self {
        Self {
            name: None,
            statics: Statics::new(),
            render,
            _output: PhantomData,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_static(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.statics.insert(key.into(), value.into());
        self
    }
}

impl<F, O> Component for FnComponent<F, O>
where
    F: Fn(&Props) -> O,
{
    type Output = O;

    fn render(&self, props: &Props) -> O {
        (self.render)(props)
    }

    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn statics(&self) -> Statics {
        self.statics.clone()
    }
}

impl<F, O> fmt::Debug for FnComponent<F, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComponent")
            .field("name", &self.name)
            .field("statics", &self.statics)
            .finish_non_exhaustive()
    }
}

/// Shorthand for [`FnComponent::new`].
pub fn component_fn<F, O>(render: F) -> FnComponent<F, O>
where
    F: Fn(&Props) -> O,
{
    FnComponent::new(render)
}
