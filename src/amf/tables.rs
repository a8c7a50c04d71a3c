//! AMF3 reference tables
//!
//! One decoder owns three append-only tables: strings, objects and class
//! traits. They live as long as the decoder, so every top-level value read
//! from the same stream shares one reference scope. Entries are never removed
//! or compacted.

use crate::error::{AmfError, TableKind};

use super::value::{Complex, ObjectRef};

/// Append-only, index-addressed table
#[derive(Debug, Clone)]
pub struct ReferenceTable<T> {
    kind: TableKind,
    entries: Vec<T>,
    max_len: usize,
}

impl<T> ReferenceTable<T> {
    pub fn new(kind: TableKind, max_len: usize) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            max_len,
        }
    }

    /// Append an entry and return its index
    pub fn push(&mut self, entry: T) -> Result<usize, AmfError> {
        if self.entries.len() >= self.max_len {
            return Err(AmfError::TableOverflow {
                table: self.kind,
                max: self.max_len,
            });
        }
        let index = self.entries.len();
        self.entries.push(entry);
        Ok(index)
    }

    /// Look up an entry; an index past the end is a decode error
    pub fn get(&self, index: usize) -> Result<&T, AmfError> {
        self.entries.get(index).ok_or(AmfError::InvalidReference {
            table: self.kind,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

/// State of an object table slot
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<O> {
    /// Registered, contents still being decoded
    UnderConstruction,
    /// Fully decoded value
    Finalized(Complex<O>),
}

/// Object reference table
///
/// Arrays and objects are registered before their contents are read so that
/// nested values can point back at them. Once the body is decoded the slot is
/// overwritten with the finished value.
#[derive(Debug, Clone)]
pub struct ObjectTable<O> {
    slots: ReferenceTable<Slot<O>>,
}

impl<O> ObjectTable<O> {
    pub fn new(max_len: usize) -> Self {
        Self {
            slots: ReferenceTable::new(TableKind::Object, max_len),
        }
    }

    /// Register a value whose contents are about to be decoded
    pub fn reserve(&mut self) -> Result<ObjectRef, AmfError> {
        self.slots.push(Slot::UnderConstruction).map(ObjectRef)
    }

    /// Register a value that is already complete
    pub fn insert(&mut self, value: Complex<O>) -> Result<ObjectRef, AmfError> {
        self.slots.push(Slot::Finalized(value)).map(ObjectRef)
    }

    /// Overwrite a slot with its finished value
    pub fn finalize(&mut self, r: ObjectRef, value: Complex<O>) {
        if let Some(slot) = self.slots.entries.get_mut(r.0) {
            *slot = Slot::Finalized(value);
        }
    }

    /// Resolve a wire back-reference to a handle
    pub fn reference(&self, index: usize) -> Result<ObjectRef, AmfError> {
        self.slots.get(index).map(|_| ObjectRef(index))
    }

    /// Look up a slot by wire index
    pub fn slot(&self, index: usize) -> Result<&Slot<O>, AmfError> {
        self.slots.get(index)
    }

    /// Finished value behind a handle, `None` while it is under construction
    pub fn get(&self, r: ObjectRef) -> Option<&Complex<O>> {
        match self.slots.entries.get(r.0)? {
            Slot::Finalized(value) => Some(value),
            Slot::UnderConstruction => None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over finished values with their handles
    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &Complex<O>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Finalized(value) => Some((ObjectRef(i), value)),
                Slot::UnderConstruction => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_table_push_get() {
        let mut table = ReferenceTable::new(TableKind::String, 16);
        assert_eq!(table.push("a").unwrap(), 0);
        assert_eq!(table.push("b").unwrap(), 1);
        assert_eq!(*table.get(1).unwrap(), "b");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut table = ReferenceTable::new(TableKind::Traits, 16);
        table.push(1u8).unwrap();
        match table.get(1) {
            Err(AmfError::InvalidReference { table, index }) => {
                assert_eq!(table, TableKind::Traits);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_table_overflow() {
        let mut table = ReferenceTable::new(TableKind::Object, 1);
        table.push(()).unwrap();
        assert!(matches!(
            table.push(()),
            Err(AmfError::TableOverflow { max: 1, .. })
        ));
    }

    #[test]
    fn test_object_slot_lifecycle() {
        let mut objects: ObjectTable<()> = ObjectTable::new(16);
        let r = objects.reserve().unwrap();
        assert!(matches!(objects.slot(0).unwrap(), Slot::UnderConstruction));
        assert!(objects.get(r).is_none());
        assert_eq!(objects.reference(0).unwrap(), r);

        objects.finalize(r, Complex::Date(5.0));
        assert_eq!(objects.get(r).and_then(Complex::as_date), Some(5.0));

        let r2 = objects.insert(Complex::Array(Vec::new())).unwrap();
        assert_eq!(r2.index(), 1);
        assert_eq!(objects.iter().count(), 2);
        assert!(objects.reference(2).is_err());
    }
}
