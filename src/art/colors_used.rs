use std::collections::HashSet;

use crate::color::Rgb;

/// Distinct palette colors in first-use order.
#[derive(Default, Clone, PartialEq)]
pub struct ColorsUsed {
    vector: Vec<Rgb>,
    set: HashSet<Rgb>,
}

impl std::fmt::Debug for ColorsUsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.vector.fmt(f)
    }
}

impl ColorsUsed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, color: Rgb) {
        if self.set.insert(color) {
            self.vector.push(color);
        }
    }

    pub fn len(&self) -> usize {
        self.vector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    pub fn as_slice(&self) -> &[Rgb] {
        self.vector.as_slice()
    }

    pub fn iter(&self) -> <&'_ Self as IntoIterator>::IntoIter {
        self.into_iter()
    }
}

impl Extend<Rgb> for ColorsUsed {
    fn extend<T: IntoIterator<Item = Rgb>>(&mut self, iter: T) {
        for color in iter {
            self.insert(color);
        }
    }
}

impl<'a> IntoIterator for &'a ColorsUsed {
    type Item = Rgb;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Rgb>>;
    fn into_iter(self) -> Self::IntoIter {
        self.vector.iter().copied()
    }
}
