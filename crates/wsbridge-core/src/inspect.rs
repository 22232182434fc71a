//! Shared debug rendering for entities.
//!
//! Entities list their public state through [`Inspect`] and route their
//! `Debug` impl through [`fmt`], so every entity renders as
//! `Name { field: value, .. }` with collaborators and native handles left out.

use std::fmt;

/// Public state of an entity, as shown in logs.
pub trait Inspect {
    /// Type name printed before the field list.
    const NAME: &'static str;

    fn inspect_fields(&self, fields: &mut Fields<'_, '_>);
}

/// Field collector handed to [`Inspect::inspect_fields`].
pub struct Fields<'a, 'b: 'a> {
    inner: fmt::DebugStruct<'a, 'b>,
}

impl<'a, 'b: 'a> Fields<'a, 'b> {
    pub fn field(&mut self, name: &str, value: &dyn fmt::Debug) -> &mut Self {
        self.inner.field(name, value);
        self
    }
}

/// Render `value` in the shared entity format.
pub fn fmt<T: Inspect + ?Sized>(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut fields = Fields {
        inner: f.debug_struct(T::NAME),
    };
    value.inspect_fields(&mut fields);
    fields.inner.finish_non_exhaustive()
}
