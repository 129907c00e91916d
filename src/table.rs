use std::rc::Rc;

use super::value::ObjString;

const TABLE_MAX_LOAD: f64 = 0.75;

/// The three logical states a bucket can be in. The reference packs
/// these into the same `Value` slot it stores for live entries (empty =
/// key-absent/value-nil, tombstone = key-absent/value-true); here they
/// are a real enum instead of an in-band sentinel, which is observably
/// identical but doesn't require `V: PartialEq` with a magic value.
#[derive(Clone)]
enum Entry<V> {
    Empty,
    Tombstone,
    Live(Rc<ObjString>, V),
}

/// Open-addressed hash table with linear probing and tombstones. Used
/// both as the VM's globals environment (`Table<Value>`) and, with `V =
/// ()`, as the string intern set.
pub struct Table<V> {
    entries: Vec<Entry<V>>,
    count: usize,
}

impl<V> Table<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            count: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Probe linearly from `key.hash % capacity`, remembering the first
    /// tombstone seen. A live entry with matching identity terminates
    /// the probe with a hit; an empty slot terminates it with the
    /// remembered tombstone (if any) or itself.
    fn find_entry(entries: &[Entry<V>], key: &Rc<ObjString>) -> usize {
        let capacity = entries.len();
        let mut index = (key.hash as usize) % capacity;
        let mut tombstone: Option<usize> = None;

        loop {
            match &entries[index] {
                Entry::Empty => return tombstone.unwrap_or(index),
                Entry::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Entry::Live(k, _) => {
                    if Rc::ptr_eq(k, key) {
                        return index;
                    }
                }
            }
            index = (index + 1) % capacity;
        }
    }

    fn adjust_capacity(&mut self, capacity: usize) {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, || Entry::Empty);

        self.count = 0;
        for entry in std::mem::take(&mut self.entries) {
            if let Entry::Live(key, value) = entry {
                let index = Self::find_entry(&entries, &key);
                entries[index] = Entry::Live(key, value);
                self.count += 1;
            }
        }

        self.entries = entries;
    }

    pub fn set(&mut self, key: Rc<ObjString>, value: V) -> bool {
        if self.count + 1 > (self.capacity() as f64 * TABLE_MAX_LOAD) as usize {
            let new_capacity = if self.capacity() == 0 {
                8
            } else {
                self.capacity() * 2
            };
            self.adjust_capacity(new_capacity);
        }

        let index = Self::find_entry(&self.entries, &key);
        let is_new = !matches!(self.entries[index], Entry::Live(..));
        if is_new && matches!(self.entries[index], Entry::Empty) {
            self.count += 1;
        }

        self.entries[index] = Entry::Live(key, value);
        is_new
    }

    pub fn get(&self, key: &Rc<ObjString>) -> Option<&V> {
        if self.count == 0 {
            return None;
        }
        let index = Self::find_entry(&self.entries, key);
        match &self.entries[index] {
            Entry::Live(_, value) => Some(value),
            _ => None,
        }
    }

    pub fn delete(&mut self, key: &Rc<ObjString>) -> bool {
        if self.count == 0 {
            return false;
        }
        let index = Self::find_entry(&self.entries, key);
        match self.entries[index] {
            Entry::Live(..) => {
                self.entries[index] = Entry::Tombstone;
                true
            }
            _ => false,
        }
    }

    /// Content-based lookup used only by string interning, where we
    /// don't have a key handle yet (that's the whole point: we're
    /// trying to find out whether one already exists).
    pub fn find_string(&self, chars: &str, hash: u32) -> Option<Rc<ObjString>> {
        if self.capacity() == 0 {
            return None;
        }

        let mut index = (hash as usize) % self.capacity();
        loop {
            match &self.entries[index] {
                Entry::Empty => return None,
                Entry::Live(key, _) if key.hash == hash && key.chars == chars => {
                    return Some(Rc::clone(key));
                }
                _ => {}
            }
            index = (index + 1) % self.capacity();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn intern(table: &mut Table<()>, s: &str) -> Rc<ObjString> {
        if let Some(existing) = table.find_string(s, ObjString::hash_of(s)) {
            return existing;
        }
        let obj = Rc::new(ObjString::new(s.to_string()));
        table.set(Rc::clone(&obj), ());
        obj
    }

    #[test]
    fn grows_at_three_quarters_load() {
        let mut table: Table<Value> = Table::new();
        for i in 0..6 {
            table.set(Rc::new(ObjString::new(format!("k{i}"))), Value::Number(i as f64));
        }
        assert_eq!(table.capacity(), 8);
        table.set(Rc::new(ObjString::new("k6".to_string())), Value::Number(6.0));
        assert_eq!(table.capacity(), 16);
    }

    #[test]
    fn delete_then_reinsert_is_findable() {
        let mut table: Table<()> = Table::new();
        let mut interned = Vec::new();
        for i in 0..4 {
            interned.push(intern(&mut table, &format!("key{i}")));
        }
        table.delete(&interned[1]);
        assert!(table.get(&interned[1]).is_none());
        assert!(table.get(&interned[0]).is_some());
        assert!(table.get(&interned[3]).is_some());
    }

    #[test]
    fn find_string_matches_by_content() {
        let mut table: Table<()> = Table::new();
        let a = intern(&mut table, "hello");
        let found = table.find_string("hello", ObjString::hash_of("hello")).unwrap();
        assert!(Rc::ptr_eq(&a, &found));
        assert!(table.find_string("nope", ObjString::hash_of("nope")).is_none());
    }
}
