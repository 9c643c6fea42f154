//! Relation specifications accepted by the hydrator.

use std::fmt;

use crate::request::{FetchRequest, QueryHook, hook};

/// A relation to hydrate, optionally with a custom query hook.
#[derive(Clone)]
pub enum RelationSpec {
    /// Hydrate the relation as declared.
    Name(String),
    /// Hydrate the relation, narrowing the fetch with a hook.
    WithQuery(String, QueryHook),
}

impl RelationSpec {
    /// Create a spec for a bare relation name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Create a spec with a custom query hook.
    pub fn with_query<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(FetchRequest) -> FetchRequest + Send + Sync + 'static,
    {
        Self::WithQuery(name.into(), hook(f))
    }

    /// The relation name.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::WithQuery(name, _) => name,
        }
    }

    /// The custom query hook, if any.
    pub fn custom_query(&self) -> Option<&QueryHook> {
        match self {
            Self::Name(_) => None,
            Self::WithQuery(_, hook) => Some(hook),
        }
    }
}

impl fmt::Debug for RelationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::WithQuery(name, _) => f.debug_tuple("WithQuery").field(name).field(&"<hook>").finish(),
        }
    }
}

impl From<&str> for RelationSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RelationSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<F> From<(&str, F)> for RelationSpec
where
    F: Fn(FetchRequest) -> FetchRequest + Send + Sync + 'static,
{
    fn from((name, f): (&str, F)) -> Self {
        Self::with_query(name, f)
    }
}

/// Anything that names one or more relations to hydrate, in order.
pub trait IntoRelationSpecs {
    /// Convert into an ordered list of specs.
    fn into_specs(self) -> Vec<RelationSpec>;
}

impl IntoRelationSpecs for RelationSpec {
    fn into_specs(self) -> Vec<RelationSpec> {
        vec![self]
    }
}

impl IntoRelationSpecs for &str {
    fn into_specs(self) -> Vec<RelationSpec> {
        vec![self.into()]
    }
}

impl IntoRelationSpecs for String {
    fn into_specs(self) -> Vec<RelationSpec> {
        vec![self.into()]
    }
}

impl<F> IntoRelationSpecs for (&str, F)
where
    F: Fn(FetchRequest) -> FetchRequest + Send + Sync + 'static,
{
    fn into_specs(self) -> Vec<RelationSpec> {
        vec![self.into()]
    }
}

impl<T: Into<RelationSpec>> IntoRelationSpecs for Vec<T> {
    fn into_specs(self) -> Vec<RelationSpec> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<RelationSpec>, const N: usize> IntoRelationSpecs for [T; N] {
    fn into_specs(self) -> Vec<RelationSpec> {
        self.into_iter().map(Into::into).collect()
    }
}
