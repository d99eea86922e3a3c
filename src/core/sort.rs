//! Sort specifications: the total order pages are cut from
//!
//! A [`SortSpecification`] is an ordered list of typed field accessors, each
//! with a direction. The last field must be unique per entity so that two
//! distinct entities never compare equal; this is what lets a cursor resume
//! exactly where the previous page stopped.
//!
//! # Example
//!
//! ```rust,ignore
//! let sort = SortSpecification::<Brand>::builder()
//!     .ascending("name", FieldKind::String, |b| b.name.clone().into())
//!     .tie_breaker("id", FieldKind::Integer, SortDirection::Ascending, |b| b.id.into())
//!     .build()?;
//! ```

use crate::core::cursor::CursorKey;
use crate::core::error::SortError;
use crate::core::field::{FieldKind, FieldValue};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Typed accessor projecting an entity onto one sort-key value
pub type FieldAccessor<T> = Arc<dyn Fn(&T) -> FieldValue + Send + Sync>;

/// Direction of a single sort field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Apply this direction to a natural value ordering
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

/// One field of a sort specification
pub struct SortField<T> {
    name: String,
    kind: FieldKind,
    direction: SortDirection,
    unique: bool,
    accessor: FieldAccessor<T>,
}

impl<T> SortField<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Whether this field identifies an entity on its own
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Project an entity onto this field's value
    pub fn value_of(&self, item: &T) -> FieldValue {
        (self.accessor)(item)
    }
}

impl<T> Clone for SortField<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            direction: self.direction,
            unique: self.unique,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T> fmt::Debug for SortField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortField")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("direction", &self.direction)
            .field("unique", &self.unique)
            .finish_non_exhaustive()
    }
}

/// Name and direction of a sort field, as reported to query observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortFieldDescription {
    pub name: String,
    pub direction: SortDirection,
}

impl fmt::Display for SortFieldDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.direction)
    }
}

/// Immutable total order over entities of type `T`
pub struct SortSpecification<T> {
    fields: Vec<SortField<T>>,
}

impl<T> SortSpecification<T> {
    /// Start building a sort specification
    pub fn builder() -> SortSpecificationBuilder<T> {
        SortSpecificationBuilder { fields: Vec::new() }
    }

    /// Number of fields, which is also the arity of every cursor
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false` for a built specification
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[SortField<T>] {
        &self.fields
    }

    /// Project an entity onto its full cursor key
    pub fn key_of(&self, item: &T) -> CursorKey {
        CursorKey::new(self.fields.iter().map(|f| f.value_of(item)).collect())
    }

    /// Compare two entities in traversal order
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.fields
            .iter()
            .map(|f| f.direction.apply(f.value_of(a).cmp(&f.value_of(b))))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Compare an entity against a decoded cursor key in traversal order
    pub fn compare_to_key(&self, item: &T, key: &CursorKey) -> Ordering {
        self.fields
            .iter()
            .zip(key.values())
            .map(|(f, value)| f.direction.apply(f.value_of(item).cmp(value)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Compare two cursor keys in traversal order
    pub fn compare_keys(&self, a: &CursorKey, b: &CursorKey) -> Ordering {
        self.fields
            .iter()
            .zip(a.values().iter().zip(b.values()))
            .map(|(f, (x, y))| f.direction.apply(x.cmp(y)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    pub fn describe(&self) -> Vec<SortFieldDescription> {
        self.fields
            .iter()
            .map(|f| SortFieldDescription {
                name: f.name.clone(),
                direction: f.direction,
            })
            .collect()
    }
}

impl<T> Clone for SortSpecification<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
        }
    }
}

impl<T> fmt::Debug for SortSpecification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.fields).finish()
    }
}

/// Builder for [`SortSpecification`]
pub struct SortSpecificationBuilder<T> {
    fields: Vec<SortField<T>>,
}

impl<T> SortSpecificationBuilder<T> {
    /// Append an ascending field
    pub fn ascending<F>(self, name: impl Into<String>, kind: FieldKind, accessor: F) -> Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.push(name, kind, SortDirection::Ascending, false, accessor)
    }

    /// Append a descending field
    pub fn descending<F>(self, name: impl Into<String>, kind: FieldKind, accessor: F) -> Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.push(name, kind, SortDirection::Descending, false, accessor)
    }

    /// Append a field whose value is unique per entity
    pub fn tie_breaker<F>(
        self,
        name: impl Into<String>,
        kind: FieldKind,
        direction: SortDirection,
        accessor: F,
    ) -> Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.push(name, kind, direction, true, accessor)
    }

    fn push<F>(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        direction: SortDirection,
        unique: bool,
        accessor: F,
    ) -> Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.fields.push(SortField {
            name: name.into(),
            kind,
            direction,
            unique,
            accessor: Arc::new(accessor),
        });
        self
    }

    /// Validate and freeze the specification
    pub fn build(self) -> Result<SortSpecification<T>, SortError> {
        let Some(last) = self.fields.last() else {
            return Err(SortError::Empty);
        };

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SortError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }

        if !last.unique {
            return Err(SortError::MissingTieBreaker {
                field: last.name.clone(),
            });
        }

        Ok(SortSpecification {
            fields: self.fields,
        })
    }
}
