use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use mime::Mime;
use tracing::debug;

use crate::protocol::BodyError;

/// The value half of a [`FormEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A UTF-8 field value
    Text(String),
    /// An opaque byte payload, emitted as-is
    Binary { data: Bytes, filename: Option<String>, content_type: Option<Mime> },
}

impl FormValue {
    /// Builds a text value from raw bytes, failing if they are not valid UTF-8.
    pub fn try_text(bytes: impl Into<Bytes>) -> Result<Self, BodyError> {
        let bytes = bytes.into();
        match String::from_utf8(bytes.into()) {
            Ok(s) => Ok(FormValue::Text(s)),
            Err(e) => Err(BodyError::encoding(format!("text value is not utf8: {}", e.utf8_error()))),
        }
    }

    /// Builds a binary value without a filename or content type.
    pub fn binary(data: impl Into<Bytes>) -> Self {
        FormValue::Binary { data: data.into(), filename: None, content_type: None }
    }

    /// Builds a binary value carrying a filename.
    pub fn file(data: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        FormValue::Binary { data: data.into(), filename: Some(filename.into()), content_type: None }
    }

    /// Sets the content type of a binary value; text values are returned unchanged.
    #[must_use]
    pub fn with_content_type(self, mime: Mime) -> Self {
        match self {
            FormValue::Binary { data, filename, .. } => FormValue::Binary { data, filename, content_type: Some(mime) },
            text @ FormValue::Text(_) => text,
        }
    }

    /// Returns the filename of a binary value
    pub fn filename(&self) -> Option<&str> {
        match self {
            FormValue::Binary { filename, .. } => filename.as_deref(),
            FormValue::Text(_) => None,
        }
    }

    /// Returns the value bytes as they appear on the wire
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FormValue::Text(s) => s.as_bytes(),
            FormValue::Binary { data, .. } => data.as_ref(),
        }
    }

    /// Returns the text if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s.as_str()),
            FormValue::Binary { .. } => None,
        }
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_owned())
    }
}

impl From<Bytes> for FormValue {
    fn from(value: Bytes) -> Self {
        FormValue::binary(value)
    }
}

impl From<Vec<u8>> for FormValue {
    fn from(value: Vec<u8>) -> Self {
        FormValue::binary(value)
    }
}

/// One named contribution to a [`FormBody`]. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormEntry {
    name: String,
    value: FormValue,
}

impl FormEntry {
    pub fn new(name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &FormValue {
        &self.value
    }
}

enum FormState {
    Open(Vec<FormEntry>),
    Sealed(Arc<[FormEntry]>),
}

impl FormState {
    fn entries(&self) -> &[FormEntry] {
        match self {
            FormState::Open(entries) => entries.as_slice(),
            FormState::Sealed(entries) => entries.as_ref(),
        }
    }

    fn open_mut(&mut self) -> Result<&mut Vec<FormEntry>, BodyError> {
        match self {
            FormState::Open(entries) => Ok(entries),
            FormState::Sealed(_) => Err(BodyError::invalid_state("body already being consumed")),
        }
    }
}

/// An ordered multipart form body.
///
/// `FormBody` is a handle: cloning it yields another handle to the same entry
/// sequence, the way every request built from one form observes the same
/// entries. Entries may be added, replaced or removed until the first cursor
/// over the body starts reading. At that point the sequence is sealed into an
/// `Arc<[FormEntry]>` that all later readers share without locking, and every
/// further mutation fails with [`BodyError::InvalidState`].
#[derive(Clone, Default)]
pub struct FormBody {
    inner: Arc<Mutex<FormState>>,
}

impl Default for FormState {
    fn default() -> Self {
        FormState::Open(Vec::new())
    }
}

impl FormBody {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        // entries are only ever pushed or swapped whole, a poisoned guard is still consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry, keeping any existing entries with the same name.
    pub fn append(&self, name: impl Into<String>, value: impl Into<FormValue>) -> Result<(), BodyError> {
        let mut state = self.lock();
        state.open_mut()?.push(FormEntry::new(name, value));
        Ok(())
    }

    pub fn append_text(&self, name: impl Into<String>, value: impl Into<String>) -> Result<(), BodyError> {
        self.append(name, FormValue::Text(value.into()))
    }

    pub fn append_binary(
        &self,
        name: impl Into<String>,
        data: impl Into<Bytes>,
        filename: Option<String>,
    ) -> Result<(), BodyError> {
        self.append(name, FormValue::Binary { data: data.into(), filename, content_type: None })
    }

    /// Replaces the first entry called `name` and drops the rest, or appends if none exist.
    pub fn set(&self, name: impl Into<String>, value: impl Into<FormValue>) -> Result<(), BodyError> {
        let entry = FormEntry::new(name, value);
        let mut state = self.lock();
        let entries = state.open_mut()?;

        match entries.iter().position(|e| e.name == entry.name) {
            Some(index) => {
                let name = entry.name.clone();
                entries[index] = entry;
                let mut i = 0;
                entries.retain(|e| {
                    let keep = i <= index || e.name != name;
                    i += 1;
                    keep
                });
            }
            None => entries.push(entry),
        }
        Ok(())
    }

    /// Removes every entry called `name`.
    pub fn delete(&self, name: &str) -> Result<(), BodyError> {
        let mut state = self.lock();
        state.open_mut()?.retain(|e| e.name != name);
        Ok(())
    }

    /// Returns the first value called `name`
    pub fn get(&self, name: &str) -> Option<FormValue> {
        self.lock().entries().iter().find(|e| e.name == name).map(|e| e.value.clone())
    }

    /// Returns every value called `name`, in insertion order
    pub fn get_all(&self, name: &str) -> Vec<FormValue> {
        self.lock().entries().iter().filter(|e| e.name == name).map(|e| e.value.clone()).collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.lock().entries().iter().any(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.lock().entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the entries in insertion order
    pub fn entries(&self) -> Vec<FormEntry> {
        self.lock().entries().to_vec()
    }

    /// Returns true once a reader has started consuming this body
    pub fn is_sealed(&self) -> bool {
        matches!(*self.lock(), FormState::Sealed(_))
    }

    /// Freezes the entry sequence and returns the shared, immutable view of it.
    ///
    /// Sealing is idempotent: every cursor over this body receives the same slice.
    pub(crate) fn seal(&self) -> Arc<[FormEntry]> {
        let mut state = self.lock();
        let entries: Arc<[FormEntry]> = match &mut *state {
            FormState::Sealed(entries) => return Arc::clone(entries),
            FormState::Open(entries) => std::mem::take(entries).into(),
        };

        debug!(entries = entries.len(), "seal form body");
        *state = FormState::Sealed(Arc::clone(&entries));
        entries
    }
}

impl fmt::Debug for FormBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("FormBody")
            .field("entries", &state.entries())
            .field("sealed", &matches!(*state, FormState::Sealed(_)))
            .finish()
    }
}
