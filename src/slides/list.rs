use serde::{Deserialize, Serialize};

use crate::error::{ImageError, Result};
use crate::slides::item::ImageItem;

/// Ordered list of slides: the working set a project edits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideList {
    items: Vec<ImageItem>,
}

impl SlideList {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an image at the end of the show
    pub fn add(&mut self, item: ImageItem) {
        self.items.push(item);
    }

    pub fn add_many<I: IntoIterator<Item = ImageItem>>(&mut self, items: I) {
        self.items.extend(items);
    }

    /// Remove and return the slide at `index`
    pub fn remove(&mut self, index: usize) -> Result<ImageItem> {
        if index >= self.items.len() {
            return Err(ImageError::IndexOutOfRange {
                index,
                len: self.items.len(),
            }
            .into());
        }
        Ok(self.items.remove(index))
    }

    /// Move the slide at `index` one position earlier.
    ///
    /// Returns false when the slide is already first or does not exist.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.items.len() {
            return false;
        }
        self.items.swap(index, index - 1);
        true
    }

    /// Move the slide at `index` one position later.
    ///
    /// Returns false when the slide is already last or does not exist.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.items.len() {
            return false;
        }
        self.items.swap(index, index + 1);
        true
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        let len = self.items.len();
        for index in [a, b] {
            if index >= len {
                return Err(ImageError::IndexOutOfRange { index, len }.into());
            }
        }
        self.items.swap(a, b);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&ImageItem> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ImageItem> {
        self.items.get_mut(index)
    }

    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageItem> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ImageItem> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all slide durations, ignoring overlap
    pub fn total_duration(&self) -> f64 {
        self.items.iter().map(|item| item.total_duration()).sum()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl FromIterator<ImageItem> for SlideList {
    fn from_iter<I: IntoIterator<Item = ImageItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SlideList {
    type Item = ImageItem;
    type IntoIter = std::vec::IntoIter<ImageItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &SlideList) -> Vec<String> {
        list.iter().map(|item| item.file_name()).collect()
    }

    fn sample() -> SlideList {
        ["a.jpg", "b.jpg", "c.jpg"].into_iter().map(ImageItem::new).collect()
    }

    #[test]
    fn test_reorder() {
        let mut list = sample();

        assert!(list.move_up(2));
        assert_eq!(names(&list), vec!["a.jpg", "c.jpg", "b.jpg"]);

        assert!(list.move_down(0));
        assert_eq!(names(&list), vec!["c.jpg", "a.jpg", "b.jpg"]);

        // Edges are no-ops
        assert!(!list.move_up(0));
        assert!(!list.move_down(2));
        assert!(!list.move_down(7));
    }

    #[test]
    fn test_remove() {
        let mut list = sample();

        let removed = list.remove(1).unwrap();
        assert_eq!(removed.file_name(), "b.jpg");
        assert_eq!(list.len(), 2);

        assert!(list.remove(5).is_err());
    }

    #[test]
    fn test_edit_in_place() {
        let mut list = sample();
        list.get_mut(0).unwrap().duration = 5.0;

        assert_eq!(list.total_duration(), 11.0);
        assert!(list.swap(0, 3).is_err());
        list.swap(0, 2).unwrap();
        assert_eq!(list.get(2).unwrap().duration, 5.0);
    }
}
