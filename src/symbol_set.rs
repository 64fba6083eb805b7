//! Reference-counted symbol storage
//!
//! Symbols and symbol sets live in a [`SymbolArena`] and are addressed by
//! generation-checked handles. Counts are explicit: a set holds one
//! reference on each member, a composite symbol holds one reference on its
//! component set, and anything else that wants to keep a record alive past
//! its container must take its own reference first. A record whose count
//! drops to zero is released and its handle goes stale.

use crate::error::{Error, Result};
use crate::symbol::{Symbol, SymbolData};

/// Handle to a symbol stored in a [`SymbolArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId {
    index: u32,
    generation: u32,
}

/// Handle to a symbol set stored in a [`SymbolArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolSetId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct SetRecord {
    symbols: Vec<SymbolId>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    refcnt: u32,
    value: Option<T>,
}

/// Generational slot storage with free-list recycling
#[derive(Debug)]
struct Slots<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Slots<T> {
    fn insert(&mut self, value: T, refcnt: u32) -> (u32, u32) {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.refcnt = refcnt;
            slot.value = Some(value);
            return (index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            refcnt,
            value: Some(value),
        });
        (index, 0)
    }

    fn slot(&self, index: u32, generation: u32) -> Option<&Slot<T>> {
        self.slots
            .get(index as usize)
            .filter(|s| s.generation == generation && s.value.is_some())
    }

    fn slot_mut(&mut self, index: u32, generation: u32) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(index as usize)
            .filter(|s| s.generation == generation && s.value.is_some())
    }

    fn remove(&mut self, index: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.refcnt = 0;
        self.free.push(index);
        Some(value)
    }

    fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

/// Apply a signed delta to a count, refusing to go negative
fn adjust(count: u32, delta: i32) -> Result<u32> {
    let next = count as i64 + delta as i64;
    if next < 0 || next > u32::MAX as i64 {
        return Err(Error::Invalid);
    }
    Ok(next as u32)
}

enum Release {
    Symbol(u32),
    Set(u32),
}

/// Owner of every symbol and symbol set produced by an image scanner
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Slots<SymbolData>,
    sets: Slots<SetRecord>,
}

impl SymbolArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Construction (producer side)
    // ========================================================================

    /// Store a new symbol with no references
    pub(crate) fn alloc_symbol(&mut self, data: SymbolData) -> SymbolId {
        let (index, generation) = self.symbols.insert(data, 0);
        SymbolId { index, generation }
    }

    /// Create an empty set holding one reference for its creator
    pub(crate) fn alloc_set(&mut self) -> SymbolSetId {
        let (index, generation) = self.sets.insert(SetRecord::default(), 1);
        SymbolSetId { index, generation }
    }

    /// Append a symbol to a set; the set takes a reference on it
    pub(crate) fn push(&mut self, set: SymbolSetId, sym: SymbolId) -> Result<()> {
        self.symbol_ref(sym, 1)?;
        match self.sets.slot_mut(set.index, set.generation) {
            Some(slot) => {
                if let Some(rec) = slot.value.as_mut() {
                    rec.symbols.push(sym);
                }
                Ok(())
            }
            None => {
                self.symbol_ref(sym, -1)?;
                Err(Error::Invalid)
            }
        }
    }

    /// Remove a symbol from a set, dropping the set's reference on it
    pub(crate) fn remove(&mut self, set: SymbolSetId, sym: SymbolId) -> Result<()> {
        let rec = self
            .sets
            .slot_mut(set.index, set.generation)
            .and_then(|s| s.value.as_mut())
            .ok_or(Error::Invalid)?;
        let pos = rec
            .symbols
            .iter()
            .position(|&s| s == sym)
            .ok_or(Error::Invalid)?;
        rec.symbols.remove(pos);
        self.symbol_ref(sym, -1).map(|_| ())
    }

    pub(crate) fn symbol_data(&self, id: SymbolId) -> Option<&SymbolData> {
        self.symbols
            .slot(id.index, id.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub(crate) fn symbol_data_mut(&mut self, id: SymbolId) -> Option<&mut SymbolData> {
        self.symbols
            .slot_mut(id.index, id.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub(crate) fn set_members(&self, id: SymbolSetId) -> Option<&[SymbolId]> {
        self.sets
            .slot(id.index, id.generation)
            .and_then(|s| s.value.as_ref())
            .map(|rec| rec.symbols.as_slice())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up a live symbol
    pub fn symbol(&self, id: SymbolId) -> Option<Symbol<'_>> {
        self.symbol_data(id)
            .map(|data| Symbol::from_ref(self, id, data))
    }

    /// Look up a live symbol set
    pub fn set(&self, id: SymbolSetId) -> Option<SymbolSetView<'_>> {
        self.set_members(id).map(|symbols| SymbolSetView {
            arena: self,
            id,
            symbols,
        })
    }

    pub fn symbol_refcount(&self, id: SymbolId) -> Option<u32> {
        self.symbols.slot(id.index, id.generation).map(|s| s.refcnt)
    }

    pub fn set_refcount(&self, id: SymbolSetId) -> Option<u32> {
        self.sets.slot(id.index, id.generation).map(|s| s.refcnt)
    }

    /// Number of live symbols
    pub fn live_symbols(&self) -> usize {
        self.symbols.live()
    }

    /// Number of live symbol sets
    pub fn live_sets(&self) -> usize {
        self.sets.live()
    }

    // ========================================================================
    // Reference counting
    // ========================================================================

    /// Adjust a symbol's reference count by `delta`
    ///
    /// Returns the new count. Reaching zero releases the symbol together
    /// with its reference on any component set. A change that would make
    /// the count negative fails with [`Error::Invalid`] and changes nothing.
    pub fn symbol_ref(&mut self, id: SymbolId, delta: i32) -> Result<u32> {
        let slot = self
            .symbols
            .slot_mut(id.index, id.generation)
            .ok_or(Error::Invalid)?;
        let next = adjust(slot.refcnt, delta)?;
        slot.refcnt = next;
        if next == 0 && delta < 0 {
            self.release(Release::Symbol(id.index));
        }
        Ok(next)
    }

    /// Adjust a symbol set's reference count by `delta`
    ///
    /// Reaching zero releases the set and drops its reference on each
    /// member.
    pub fn symbol_set_ref(&mut self, id: SymbolSetId, delta: i32) -> Result<u32> {
        let slot = self
            .sets
            .slot_mut(id.index, id.generation)
            .ok_or(Error::Invalid)?;
        let next = adjust(slot.refcnt, delta)?;
        slot.refcnt = next;
        if next == 0 && delta < 0 {
            self.release(Release::Set(id.index));
        }
        Ok(next)
    }

    /// Release records iteratively so deep composites cannot overflow the stack
    fn release(&mut self, first: Release) {
        let mut pending = vec![first];
        while let Some(item) = pending.pop() {
            match item {
                Release::Symbol(index) => {
                    let Some(sym) = self.symbols.remove(index) else {
                        continue;
                    };
                    if let Some(set) = sym.components {
                        if let Some(slot) = self.sets.slot_mut(set.index, set.generation) {
                            slot.refcnt = slot.refcnt.saturating_sub(1);
                            if slot.refcnt == 0 {
                                pending.push(Release::Set(set.index));
                            }
                        }
                    }
                }
                Release::Set(index) => {
                    let Some(rec) = self.sets.remove(index) else {
                        continue;
                    };
                    for sym in rec.symbols {
                        if let Some(slot) = self.symbols.slot_mut(sym.index, sym.generation) {
                            slot.refcnt = slot.refcnt.saturating_sub(1);
                            if slot.refcnt == 0 {
                                pending.push(Release::Symbol(sym.index));
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Read-only view of a symbol set in insertion order
#[derive(Clone, Copy)]
pub struct SymbolSetView<'a> {
    arena: &'a SymbolArena,
    id: SymbolSetId,
    symbols: &'a [SymbolId],
}

impl<'a> SymbolSetView<'a> {
    /// Handle used to retain or release this set
    pub fn id(&self) -> SymbolSetId {
        self.id
    }

    /// Get an iterator over the symbols
    pub fn iter(&self) -> SymbolIterator<'a> {
        SymbolIterator {
            arena: self.arena,
            iter: self.symbols.iter(),
        }
    }

    /// First symbol of the set
    pub fn first(&self) -> Option<Symbol<'a>> {
        self.iter().next()
    }

    /// Handles of the member symbols
    pub fn ids(&self) -> &'a [SymbolId] {
        self.symbols
    }

    /// Check if there are any symbols
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get the number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
}

impl<'a> IntoIterator for SymbolSetView<'a> {
    type Item = Symbol<'a>;
    type IntoIter = SymbolIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over symbols
pub struct SymbolIterator<'a> {
    arena: &'a SymbolArena,
    iter: std::slice::Iter<'a, SymbolId>,
}

impl<'a> Iterator for SymbolIterator<'a> {
    type Item = Symbol<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for &id in self.iter.by_ref() {
            if let Some(sym) = self.arena.symbol(id) {
                return Some(sym);
            }
        }
        None
    }
}
