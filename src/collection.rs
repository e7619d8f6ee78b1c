/// A record that can be looked up by key.
pub trait Keyed {
    type Key: PartialEq;

    fn key(&self) -> &Self::Key;
}

/// Whether an upsert added a new record or replaced an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Replaced,
}

/// An ordered list of records. Lookups are linear scans; keys are
/// unique only because `upsert` replaces instead of appending when the
/// key is already present.
#[derive(Clone, Debug)]
pub struct Collection<R> {
    records: Vec<R>,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Collection { records: vec![] }
    }
}

impl<R: Keyed + Clone> Collection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the record with the same key in place, or appends it.
    pub fn upsert(&mut self, record: R) -> Upserted {
        match self.position(record.key()) {
            Some(index) => {
                self.records[index] = record;
                Upserted::Replaced
            }
            None => {
                self.records.push(record);
                Upserted::Created
            }
        }
    }

    /// Removes the record with the given key, leaving the others in
    /// their original order.
    pub fn remove(&mut self, key: &R::Key) -> Option<R> {
        self.position(key).map(|index| self.records.remove(index))
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.records.iter().find(|r| r.key() == key)
    }

    pub fn get_mut(&mut self, key: &R::Key) -> Option<&mut R> {
        self.records.iter_mut().find(|r| r.key() == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_vec(&self) -> Vec<R> {
        self.records.clone()
    }

    fn position(&self, key: &R::Key) -> Option<usize> {
        self.records.iter().position(|r| r.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::{Collection, Keyed, Upserted};

    #[derive(Clone, Debug, PartialEq)]
    struct Entry(u32, &'static str);

    impl Keyed for Entry {
        type Key = u32;

        fn key(&self) -> &u32 {
            &self.0
        }
    }

    fn sample() -> Collection<Entry> {
        let mut collection = Collection::new();

        for entry in vec![Entry(1, "one"), Entry(2, "two"), Entry(3, "three")] {
            assert_eq!(collection.upsert(entry), Upserted::Created);
        }

        collection
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut collection = sample();

        assert_eq!(collection.upsert(Entry(2, "deux")), Upserted::Replaced);
        assert_eq!(
            collection.to_vec(),
            vec![Entry(1, "one"), Entry(2, "deux"), Entry(3, "three")]
        );
    }

    #[test]
    fn upsert_appends_new_keys() {
        let mut collection = sample();

        assert_eq!(collection.upsert(Entry(4, "four")), Upserted::Created);
        assert_eq!(collection.len(), 4);
        assert_eq!(collection.iter().last(), Some(&Entry(4, "four")));
    }

    #[test]
    fn remove_takes_exactly_one() {
        let mut collection = sample();

        assert_eq!(collection.remove(&2), Some(Entry(2, "two")));
        assert_eq!(collection.remove(&2), None);
        assert_eq!(collection.to_vec(), vec![Entry(1, "one"), Entry(3, "three")]);
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut collection = sample();

        collection.get_mut(&3).expect("find entry 3").1 = "drei";

        assert_eq!(collection.get(&3), Some(&Entry(3, "drei")));
        assert!(collection.get(&9).is_none());
    }
}
