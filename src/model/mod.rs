//! Entity types of the book catalogue.

pub mod book;

pub use book::{Author, Book, BookPatch, BookRating, RateParameters, Translator};
