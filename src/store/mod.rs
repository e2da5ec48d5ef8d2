//! In-memory book store.
//!
//! # Design Decisions
//! - Constructed once at startup and handed to the service; no global instance
//! - Ids are unique; a duplicate in the seed is rejected at construction
//! - Snapshots are returned in ascending id order so paging is stable

pub mod seed;

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::model::Book;

pub use seed::{default_books, load_seed};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate book id {0} in seed")]
    DuplicateId(i32),

    #[error("cannot read seed file {path}: {source}")]
    SeedIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse seed file {path}: {source}")]
    SeedParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Shared handle to the catalogue. Cloning is cheap.
#[derive(Clone, Debug, Default)]
pub struct BookStore {
    books: Arc<DashMap<i32, Book>>,
}

impl BookStore {
    /// Build a store from seed books.
    pub fn new(seed: Vec<Book>) -> Result<Self, StoreError> {
        let books = DashMap::with_capacity(seed.len());
        for book in seed {
            let id = book.id;
            if books.insert(id, book).is_some() {
                return Err(StoreError::DuplicateId(id));
            }
        }
        Ok(Self {
            books: Arc::new(books),
        })
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// All books, ascending by id.
    pub fn snapshot(&self) -> Vec<Book> {
        let mut books: Vec<Book> = self.books.iter().map(|r| r.value().clone()).collect();
        books.sort_by_key(|b| b.id);
        books
    }

    /// Books matching `predicate`, ascending by id.
    pub fn find_all<F>(&self, predicate: F) -> Vec<Book>
    where
        F: Fn(&Book) -> bool,
    {
        let mut books: Vec<Book> = self
            .books
            .iter()
            .filter(|r| predicate(r.value()))
            .map(|r| r.value().clone())
            .collect();
        books.sort_by_key(|b| b.id);
        books
    }

    pub fn get(&self, id: i32) -> Option<Book> {
        self.books.get(&id).map(|r| r.value().clone())
    }

    pub fn contains(&self, id: i32) -> bool {
        self.books.contains_key(&id)
    }

    pub fn max_id(&self) -> Option<i32> {
        self.books.iter().map(|r| *r.key()).max()
    }

    /// Run `f` against the stored book, returning the updated copy.
    pub fn update<F>(&self, id: i32, f: F) -> Option<Book>
    where
        F: FnOnce(&mut Book),
    {
        self.books.get_mut(&id).map(|mut entry| {
            f(entry.value_mut());
            entry.value().clone()
        })
    }

    pub fn remove(&self, id: i32) -> Option<Book> {
        self.books.remove(&id).map(|(_, book)| book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Author;

    fn book(id: i32) -> Book {
        Book {
            id,
            title: format!("Book {id}"),
            for_kids: id % 2 == 0,
            main_author: Author::new(id, "A"),
            authors: vec![],
            translators: vec![],
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = BookStore::new(vec![book(1), book(1)]).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(1)));
    }

    #[test]
    fn test_snapshot_sorted_by_id() {
        let store = BookStore::new(vec![book(3), book(1), book(2)]).unwrap();
        let ids: Vec<i32> = store.snapshot().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_max_id() {
        let store = BookStore::new(vec![book(1), book(2), book(3)]).unwrap();
        assert_eq!(store.max_id(), Some(3));
        assert_eq!(BookStore::default().max_id(), None);
    }

    #[test]
    fn test_find_all() {
        let store = BookStore::new(vec![book(1), book(2), book(3), book(4)]).unwrap();
        let kids: Vec<i32> = store.find_all(|b| b.for_kids).iter().map(|b| b.id).collect();
        assert_eq!(kids, vec![2, 4]);
    }

    #[test]
    fn test_update_and_remove() {
        let store = BookStore::new(vec![book(1)]).unwrap();
        let updated = store.update(1, |b| b.title = "New".into()).unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(store.get(1).unwrap().title, "New");
        assert!(store.update(2, |_| {}).is_none());

        assert!(store.remove(1).is_some());
        assert!(store.is_empty());
    }
}
