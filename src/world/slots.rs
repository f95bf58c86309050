use std::fmt;

/// Stable handle into a [`DenseSlots`] store.
///
/// The generation is bumped every time a slot is vacated, so a key that
/// outlives its value never resolves to whatever takes the slot next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    index: u32,
    generation: u32,
}

impl SlotKey {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    dense: Option<usize>,
}

/// Generation-checked storage that keeps its values packed in insertion order.
///
/// Values can be iterated as a contiguous slice (the physics step and the
/// render backend both want that), while outside code only ever holds
/// [`SlotKey`]s. Removal preserves the relative order of the survivors.
#[derive(Debug, Clone)]
pub struct DenseSlots<T> {
    values: Vec<T>,
    owners: Vec<SlotKey>,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl<T> Default for DenseSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DenseSlots<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            owners: Vec::new(),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Reserves a key, then builds the value with it so the value can carry
    /// its own key.
    pub fn insert_with(&mut self, build: impl FnOnce(SlotKey) -> T) -> SlotKey {
        let dense = self.values.len();
        let key = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.dense = Some(dense);
                SlotKey { index, generation: slot.generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, dense: Some(dense) });
                SlotKey { index, generation: 0 }
            }
        };
        self.values.push(build(key));
        self.owners.push(key);
        key
    }

    pub fn insert(&mut self, value: T) -> SlotKey {
        self.insert_with(|_| value)
    }

    fn dense_index(&self, key: SlotKey) -> Option<usize> {
        let slot = self.slots.get(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.dense
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.dense_index(key).is_some()
    }

    pub fn get(&self, key: SlotKey) -> Option<&T> {
        self.dense_index(key).map(|i| &self.values[i])
    }

    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        self.dense_index(key).map(move |i| &mut self.values[i])
    }

    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let dense = self.dense_index(key)?;
        let slot = &mut self.slots[key.index as usize];
        slot.dense = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);

        let value = self.values.remove(dense);
        self.owners.remove(dense);
        for owner in &self.owners[dense..] {
            if let Some(moved) = self.slots[owner.index as usize].dense.as_mut() {
                *moved -= 1;
            }
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn keys(&self) -> impl Iterator<Item = SlotKey> + '_ {
        self.owners.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> {
        self.owners.iter().copied().zip(self.values.iter())
    }

    /// Empties the store, handing every value to `f` in order. Keys issued
    /// before the drain stay invalid afterwards.
    pub fn drain_each(&mut self, mut f: impl FnMut(SlotKey, T)) {
        let owners = std::mem::take(&mut self.owners);
        let values = std::mem::take(&mut self.values);
        for (key, value) in owners.into_iter().zip(values) {
            let slot = &mut self.slots[key.index as usize];
            slot.dense = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(key.index);
            f(key, value);
        }
    }
}
