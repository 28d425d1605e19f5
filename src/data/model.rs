use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Label – the optional leading value of a record
// ---------------------------------------------------------------------------

/// Value stored in the label list for a record without an explicit label.
pub const NO_LABEL: f64 = -f64::MAX;

/// Outcome of the label-or-first-feature check on a record's first token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Label {
    Value(f64),
    /// The first token was already an `index:value` pair.
    Missing,
}

impl Label {
    /// Flatten to the label-list representation ([`NO_LABEL`] when missing).
    pub fn as_f64(self) -> f64 {
        match self {
            Label::Value(v) => v,
            Label::Missing => NO_LABEL,
        }
    }
}

// ---------------------------------------------------------------------------
// SparseVector – index → value, implicit zeros omitted
// ---------------------------------------------------------------------------

/// Nominal dimension of every parsed vector.
pub const CARDINALITY: usize = i32::MAX as usize;

/// Initial capacity; LIBSVM rows are usually very sparse.
pub const INITIAL_CAPACITY: usize = 12;

/// A random-access sparse vector. Indices absent from the map read as `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    entries: HashMap<usize, f64>,
}

impl Default for SparseVector {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseVector {
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Set `index` to `value`, replacing any previous value.
    ///
    /// The caller guarantees `index < CARDINALITY`; the decoder checks it.
    pub fn set(&mut self, index: usize, value: f64) {
        self.entries.insert(index, value);
    }

    pub fn get(&self, index: usize) -> f64 {
        self.entries.get(&index).copied().unwrap_or(0.0)
    }

    pub fn cardinality(&self) -> usize {
        CARDINALITY
    }

    /// Number of explicitly stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().map(|(&i, &v)| (i, v))
    }

    /// Stored entries sorted by index, for writers that need a stable layout.
    pub fn sorted_entries(&self) -> Vec<(usize, f64)> {
        let mut out: Vec<(usize, f64)> = self.iter().collect();
        out.sort_unstable_by_key(|&(i, _)| i);
        out
    }
}

impl FromIterator<(usize, f64)> for SparseVector {
    fn from_iter<T: IntoIterator<Item = (usize, f64)>>(iter: T) -> Self {
        let mut v = SparseVector::new();
        for (i, x) in iter {
            v.set(i, x);
        }
        v
    }
}

// ---------------------------------------------------------------------------
// Record – one decoded line
// ---------------------------------------------------------------------------

/// A decoded LIBSVM line: label and features travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub label: Label,
    pub vector: SparseVector,
}
