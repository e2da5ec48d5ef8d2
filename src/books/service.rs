//! Book catalogue operations.
//!
//! Every operation is stateless over the shared store. Writes only reach the
//! store when the service is not read-only; otherwise they validate and echo
//! the stored entity.

use crate::books::error::ServiceError;
use crate::model::{Author, Book, BookPatch, BookRating, RateParameters, Translator};
use crate::store::BookStore;

#[derive(Debug, Clone)]
pub struct BookService {
    store: BookStore,
    read_only: bool,
}

impl BookService {
    pub fn new(store: BookStore, read_only: bool) -> Self {
        Self { store, read_only }
    }

    pub fn store(&self) -> &BookStore {
        &self.store
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The whole collection, ascending by id.
    pub fn list(&self) -> Vec<Book> {
        self.store.snapshot()
    }

    pub fn get(&self, key: i32) -> Result<Book, ServiceError> {
        self.store.get(key).ok_or(ServiceError::NotFound(key))
    }

    /// Replace the book stored under `key` with `book`.
    pub fn replace(&self, key: i32, book: Book) -> Result<Book, ServiceError> {
        if book.id != key {
            return Err(ServiceError::InvalidInput(format!(
                "body ID {} does not match key {}",
                book.id, key
            )));
        }
        if self.read_only {
            return self.get(key);
        }
        let replaced = self
            .store
            .update(key, |stored| *stored = book)
            .ok_or(ServiceError::NotFound(key))?;
        tracing::info!(book_id = key, "Book replaced");
        Ok(replaced)
    }

    /// Apply the masked fields of `patch` to the book stored under `key`.
    pub fn patch(&self, key: i32, patch: &BookPatch) -> Result<Book, ServiceError> {
        if let Some(id) = patch.id {
            if id != key {
                return Err(ServiceError::InvalidInput(format!(
                    "ID cannot be changed from {} to {}",
                    key, id
                )));
            }
        }
        let current = self.get(key)?;
        if self.read_only || patch.is_empty() {
            return Ok(current);
        }
        let updated = self
            .store
            .update(key, |book| patch.apply(book))
            .ok_or(ServiceError::NotFound(key))?;
        tracing::info!(book_id = key, fields = ?patch.changed_fields(), "Book patched");
        Ok(updated)
    }

    pub fn delete(&self, key: i32) -> Result<Book, ServiceError> {
        if self.read_only {
            return self.get(key);
        }
        let removed = self.store.remove(key).ok_or(ServiceError::NotFound(key))?;
        tracing::info!(book_id = key, "Book deleted");
        Ok(removed)
    }

    /// `Books(key)/MainAuthor`. Exactly one book must match the key.
    pub fn main_author(&self, key: i32) -> Result<Author, ServiceError> {
        let mut matches = self.store.find_all(|book| book.id == key);
        if matches.len() != 1 {
            return Err(ServiceError::InvariantViolation(format!(
                "expected exactly one book with key {key}, found {}",
                matches.len()
            )));
        }
        Ok(matches.remove(0).main_author)
    }

    /// `Books/MostRecent()`: the highest id in the collection.
    pub fn most_recent(&self) -> Result<i32, ServiceError> {
        self.store
            .max_id()
            .ok_or_else(|| ServiceError::InvariantViolation("the collection is empty".into()))
    }

    /// `Books(key)/Rate`. The rating is returned, never stored.
    pub fn rate(&self, key: i32, params: RateParameters) -> Result<BookRating, ServiceError> {
        if params.rating < 0 {
            return Err(ServiceError::InvalidInput(format!(
                "Rating must not be negative, got {}",
                params.rating
            )));
        }
        Ok(BookRating {
            book_id: key,
            rating: params.rating,
        })
    }

    /// `ReturnAllForKidsBooks()`
    pub fn books_for_kids(&self) -> Vec<Book> {
        self.store.find_all(|book| book.for_kids)
    }

    /// `Books(key)/Authors`. An unknown key yields an empty collection.
    pub fn authors(&self, key: i32) -> Vec<Author> {
        self.store
            .get(key)
            .map(|book| book.authors)
            .unwrap_or_default()
    }

    /// `Books(key)/Translators`, reachable only through the owning book.
    pub fn translators(&self, key: i32) -> Result<Vec<Translator>, ServiceError> {
        Ok(self.single(key)?.translators)
    }

    fn single(&self, key: i32) -> Result<Book, ServiceError> {
        let mut matches = self.store.find_all(|book| book.id == key);
        match matches.len() {
            0 => Err(ServiceError::NotFound(key)),
            1 => Ok(matches.remove(0)),
            n => Err(ServiceError::InvariantViolation(format!(
                "{n} books share the key {key}"
            ))),
        }
    }
}
