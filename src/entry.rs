use parking_lot::Mutex;

/// A single value slot shared between the stable and hot tables.
///
/// An empty slot means the key is logically absent. Every operation runs under the slot's own
/// lock, so it is indivisible even when the table that handed out the entry is only read-locked.
pub(crate) struct Entry<V> {
    slot: Mutex<Option<V>>,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V) -> Self {
        Self {
            slot: Mutex::new(Some(value)),
        }
    }

    pub(crate) fn is_occupied(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Overwrites the slot only if it currently holds a value.
    ///
    /// Returns the previous value, or hands `value` back if the slot was empty.
    pub(crate) fn update(&self, value: V) -> Result<V, V> {
        let mut slot = self.slot.lock();
        match slot.as_mut() {
            Some(current) => Ok(std::mem::replace(current, value)),
            None => Err(value),
        }
    }

    /// Empties the slot, returning what it held.
    pub(crate) fn take(&self) -> Option<V> {
        self.slot.lock().take()
    }
}

impl<V> Entry<V>
where
    V: Clone,
{
    pub(crate) fn load(&self) -> Option<V> {
        self.slot.lock().clone()
    }
}

impl<V> Entry<V>
where
    V: PartialEq,
{
    /// Replaces the value with `new` if it is equal to `current`.
    ///
    /// An empty slot never matches. On success the previous value is returned, on failure `new`
    /// is handed back.
    pub(crate) fn compare_and_swap(&self, current: &V, new: V) -> Result<V, V> {
        let mut slot = self.slot.lock();
        match slot.as_mut() {
            Some(v) if *v == *current => Ok(std::mem::replace(v, new)),
            _ => Err(new),
        }
    }

    /// Empties the slot if it holds a value equal to `current`.
    pub(crate) fn compare_and_delete(&self, current: &V) -> bool {
        let mut slot = self.slot.lock();
        if slot.as_ref() == Some(current) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

impl<V> std::fmt::Debug for Entry<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Entry").field(&*self.slot.lock()).finish()
    }
}
