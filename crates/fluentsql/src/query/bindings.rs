//! Binding table keyed by clause category.

use crate::error::QueryError;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// Clause family a binding belongs to.
///
/// The declaration order is the flattening order: every compiled statement
/// emits its placeholders in this order, so [`Bindings::flatten`] must too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    Select,
    Join,
    Where,
    Having,
    Order,
    Union,
}

impl BindingType {
    /// All categories in flattening order.
    pub const ALL: [BindingType; 6] = [
        BindingType::Select,
        BindingType::Join,
        BindingType::Where,
        BindingType::Having,
        BindingType::Order,
        BindingType::Union,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BindingType::Select => "select",
            BindingType::Join => "join",
            BindingType::Where => "where",
            BindingType::Having => "having",
            BindingType::Order => "order",
            BindingType::Union => "union",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BindingType::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| QueryError::compile(format!("invalid binding type: {s}")))
    }
}

/// Ordered values per [`BindingType`].
///
/// The `union` category holds the union arms' values followed by the values
/// of raw union-level ORDER BY terms, which render after every arm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    slots: [Vec<Value>; 6],
    /// Trailing `union` values that belong to union-level ORDER BY terms.
    union_order: usize,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values of one category, in insertion order.
    pub fn get(&self, ty: BindingType) -> &[Value] {
        &self.slots[ty.index()]
    }

    pub fn push(&mut self, ty: BindingType, value: Value) {
        self.extend(ty, [value]);
    }

    /// Append to a category. Union arm values land before any union-level
    /// ORDER BY values already recorded.
    pub fn extend(&mut self, ty: BindingType, values: impl IntoIterator<Item = Value>) {
        let slot = &mut self.slots[ty.index()];
        if ty == BindingType::Union && self.union_order > 0 {
            let at = slot.len() - self.union_order;
            slot.splice(at..at, values);
        } else {
            slot.extend(values);
        }
    }

    /// Append values of a union-level ORDER BY term.
    pub fn extend_union_order(&mut self, values: impl IntoIterator<Item = Value>) {
        let slot = &mut self.slots[BindingType::Union.index()];
        let before = slot.len();
        slot.extend(values);
        self.union_order += slot.len() - before;
    }

    /// Replace one category wholesale.
    pub fn set(&mut self, ty: BindingType, values: Vec<Value>) {
        if ty == BindingType::Union {
            self.union_order = 0;
        }
        self.slots[ty.index()] = values;
    }

    pub fn clear(&mut self, ty: BindingType) {
        self.set(ty, Vec::new());
    }

    /// Concatenate every category in [`BindingType::ALL`] order.
    pub fn flatten(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.len());
        for slot in &self.slots {
            out.extend(slot.iter().cloned());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }
}
