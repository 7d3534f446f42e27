use super::{types::shape_string, value::Value};
use crate::{
    codec::npz::NpzArchive,
    error::{Error, Result},
};
use log::info;

/// A named-field document ready for serialization. Field order is insertion
/// order and is what every serializer emits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}
impl Record {
    pub fn new() -> Self {
        Self::default()
    }
    /// Appends a field, replacing the value in place if the name already
    /// exists so the original position is kept
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name.to_string(), value));
        }
    }
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
    /// Checks that every field is something a serializer can write. Non-finite
    /// floats are rejected as well when ``finite_only`` is set since text
    /// formats have no spelling for them.
    /// # Errors
    /// Will return an ``Encoding`` error naming the first offending field
    pub fn check_encodable(&self, finite_only: bool) -> Result<()> {
        for (name, value) in &self.fields {
            match value {
                Value::Array(arr) => {
                    if finite_only {
                        if let Some(idx) = arr.first_non_finite() {
                            return Err(Error::Encoding {
                                field: name.clone(),
                                reason: format!("has a non-finite number at index {idx:?}"),
                            });
                        }
                    }
                }
                Value::Text(_) => {}
                Value::Unsupported { descr, .. } => {
                    return Err(Error::Encoding {
                        field: name.clone(),
                        reason: format!("has unsupported dtype {descr}"),
                    });
                }
            }
        }
        Ok(())
    }
    /// Logs ``name: shape`` for every field
    pub fn log_shapes(&self) {
        for (name, value) in &self.fields {
            info!("{name}: {}", shape_string(value.shape()));
        }
    }
}
impl<'a> IntoIterator for &'a Record {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;
    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Assembles an output [`Record`] from an archive: fields are either carried
/// over untouched or supplied by a converter, in the order they are added
pub struct ArchiveRecordBuilder<'a> {
    archive: &'a NpzArchive,
    archive_kind: &'static str,
    record: Record,
}
impl<'a> ArchiveRecordBuilder<'a> {
    pub fn new(archive: &'a NpzArchive, archive_kind: &'static str) -> Self {
        Self {
            archive,
            archive_kind,
            record: Record::new(),
        }
    }
    /// Copies ``field`` from the archive, whatever its kind
    /// # Errors
    /// Will return a ``MissingField`` error if the archive lacks ``field``
    pub fn passthrough(mut self, field: &str) -> Result<Self> {
        let value = self.archive.require(self.archive_kind, field)?.clone();
        self.record.insert(field, value);
        Ok(self)
    }
    /// Copies ``field`` from the archive, which has to be a numeric array
    /// # Errors
    /// Will return an error if ``field`` is missing or not numeric
    pub fn passthrough_numeric(mut self, field: &str) -> Result<Self> {
        let value = self.archive.require_numeric(self.archive_kind, field)?.clone();
        self.record.insert(field, value);
        Ok(self)
    }
    /// Copies every archive entry, in archive order
    #[must_use]
    pub fn passthrough_all(mut self) -> Self {
        for (name, value) in self.archive.entries.iter() {
            self.record.insert(name, value.clone());
        }
        self
    }
    #[must_use]
    pub fn derived(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.record.insert(field, value);
        self
    }
    pub fn build(self) -> Record {
        self.record
    }
}
