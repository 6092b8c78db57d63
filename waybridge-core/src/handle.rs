//! Generation-checked handles for protocol objects.
//!
//! Every protocol object the bridge binds lives in a [`HandleArena`] slot.
//! Listener callbacks carry the [`Handle`] (slot index plus generation) as
//! their per-object data instead of a pointer, so an event that arrives for
//! an object which was already destroyed resolves to nothing instead of to
//! whatever now occupies the slot.

use std::fmt;

/// Index + generation pair identifying one arena slot occupant.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index of the handle.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when the handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack into one integer (generation in the high half) for hosts that
    /// can only carry plain numbers.
    pub fn to_bits(self) -> u64 {
        (self.generation as u64) << 32 | self.index as u64
    }

    /// Inverse of [`Handle::to_bits`].
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage that invalidates handles on removal.
pub struct HandleArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for HandleArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleArena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no live values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn next_handle(&self) -> Handle {
        match self.free.last() {
            Some(&index) => Handle {
                index,
                generation: self.slots[index as usize].generation,
            },
            None => Handle {
                index: self.slots.len() as u32,
                generation: 0,
            },
        }
    }

    /// Insert a value and return its handle.
    pub fn insert(&mut self, value: T) -> Handle {
        match self.try_insert_with(|_| Ok::<T, std::convert::Infallible>(value)) {
            Ok(handle) => handle,
            Err(never) => match never {},
        }
    }

    /// Insert a value built from the handle it will be stored under.
    ///
    /// The constructor sees the final handle before the slot is taken, which
    /// lets a proxy be created with the handle as its user data. Nothing is
    /// reserved if the constructor fails.
    pub fn try_insert_with<E>(
        &mut self,
        build: impl FnOnce(Handle) -> Result<T, E>,
    ) -> Result<Handle, E> {
        let handle = self.next_handle();
        let value = build(handle)?;
        if handle.index as usize == self.slots.len() {
            self.slots.push(Slot {
                generation: handle.generation,
                value: Some(value),
            });
        } else {
            self.free.pop();
            self.slots[handle.index as usize].value = Some(value);
        }
        self.len += 1;
        Ok(handle)
    }

    /// Remove the value behind `handle`, invalidating every copy of it.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Look up a live value.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Look up a live value mutably.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Whether `handle` still refers to a live value.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Iterate over live values with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    Handle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}
