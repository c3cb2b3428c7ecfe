/// A simple slab allocator.
///
/// A `Slab` stores values of type `T` in a contiguous array and
/// returns stable keys that can be reused after removal.
///
/// Internally, it keeps track of:
/// - occupied slots,
/// - a stack of free keys.
///
/// The executor uses it to own spawned tasks: a task's key is stable for
/// as long as the task is alive, so wakers can refer to it by key.
pub(crate) struct Slab<T> {
    /// Storage for items; `None` marks a free slot.
    items: Vec<Option<T>>,
    /// Stack of free keys that can be reused.
    free: Vec<usize>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates a new `Slab` with room for `capacity` items.
    ///
    /// All slots are initially free.
    pub(crate) fn new(capacity: usize) -> Self {
        let items = (0..capacity).map(|_| None).collect();
        let free = (0..capacity).rev().collect();

        Self {
            items,
            free,
            len: 0,
        }
    }

    /// Inserts a value into the slab and returns its key.
    ///
    /// If a free slot is available, it is reused.
    /// Otherwise, the slab grows exponentially.
    pub(crate) fn insert(&mut self, item: T) -> usize {
        let key = match self.free.pop() {
            Some(key) => key,
            None => {
                let len = self.items.len();
                let new_len = if len == 0 { 1 } else { 2 * len };

                self.items.extend((len..new_len).map(|_| None));
                self.free.extend(((len + 1)..new_len).rev());

                len
            }
        };

        self.items[key] = Some(item);
        self.len += 1;

        key
    }

    /// Removes and returns the value stored at `key`.
    ///
    /// Returns `None` if the slot is out of range or already free.
    pub(crate) fn remove(&mut self, key: usize) -> Option<T> {
        let item = self.items.get_mut(key)?.take()?;

        self.free.push(key);
        self.len -= 1;

        Some(item)
    }

    /// Returns a mutable reference to the value at `key`, if occupied.
    pub(crate) fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        self.items.get_mut(key)?.as_mut()
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Removes every value, returning them in key order.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        self.free.clear();
        self.free.extend((0..self.items.len()).rev());
        self.len = 0;

        self.items.iter_mut().filter_map(Option::take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Slab;

    #[test]
    fn reuses_freed_keys() {
        let mut slab = Slab::new(0);

        let a = slab.insert("a");
        let b = slab.insert("b");
        assert_ne!(a, b);
        assert_eq!(slab.len(), 2);

        assert_eq!(slab.remove(a), Some("a"));
        assert_eq!(slab.remove(a), None);

        let c = slab.insert("c");
        assert_eq!(c, a);
        assert_eq!(slab.get_mut(c), Some(&mut "c"));
    }

    #[test]
    fn drain_empties_the_slab() {
        let mut slab = Slab::new(4);
        for i in 0..6 {
            slab.insert(i);
        }

        let mut drained = slab.drain();
        drained.sort();

        assert_eq!(drained, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(slab.len(), 0);
        assert_eq!(slab.get_mut(0), None);
    }
}
