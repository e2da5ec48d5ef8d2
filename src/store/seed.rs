//! Seed data for the book store.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::model::{Author, Book, Translator};
use crate::store::StoreError;

/// Built-in catalogue used when no seed file is configured.
pub fn default_books() -> Vec<Book> {
    let saint_exupery = Author::new(1, "Antoine de Saint-Exupery");
    let dostoevsky = Author::new(2, "Fyodor Dostoevsky");
    let lindgren = Author::new(3, "Astrid Lindgren");
    let pratchett = Author::new(4, "Terry Pratchett");
    let gaiman = Author::new(5, "Neil Gaiman");
    let jansson = Author::new(6, "Tove Jansson");

    vec![
        Book {
            id: 1,
            title: "The Little Prince".into(),
            for_kids: true,
            main_author: saint_exupery.clone(),
            authors: vec![saint_exupery],
            translators: vec![
                Translator::new(1, "Katherine Woods"),
                Translator::new(2, "Richard Howard"),
            ],
        },
        Book {
            id: 2,
            title: "Crime and Punishment".into(),
            for_kids: false,
            main_author: dostoevsky.clone(),
            authors: vec![dostoevsky],
            translators: vec![Translator::new(3, "Constance Garnett")],
        },
        Book {
            id: 3,
            title: "Pippi Longstocking".into(),
            for_kids: true,
            main_author: lindgren.clone(),
            authors: vec![lindgren],
            translators: vec![Translator::new(4, "Florence Lamborn")],
        },
        Book {
            id: 4,
            title: "Good Omens".into(),
            for_kids: false,
            main_author: pratchett.clone(),
            authors: vec![pratchett, gaiman],
            translators: vec![],
        },
        Book {
            id: 5,
            title: "Finn Family Moomintroll".into(),
            for_kids: true,
            main_author: jansson.clone(),
            authors: vec![jansson],
            translators: vec![Translator::new(5, "Thomas Warburton")],
        },
    ]
}

/// Load a seed catalogue from a JSON array of books.
pub fn load_seed(path: &Path) -> Result<Vec<Book>, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::SeedIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let books: Vec<Book> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::SeedParse {
            path: path.display().to_string(),
            source: e,
        })?;
    tracing::info!(path = %path.display(), books = books.len(), "Loaded seed file");
    Ok(books)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    #[test]
    fn test_default_books_have_unique_ids() {
        let books = default_books();
        let ids: HashSet<i32> = books.iter().map(|b| b.id).collect();
        assert_eq!(ids.len(), books.len());
    }

    #[test]
    fn test_load_seed_from_file() {
        let path = std::env::temp_dir().join(format!("seed-{}.json", uuid::Uuid::new_v4()));
        let mut file = File::create(&path).unwrap();
        write!(
            file,
            r#"[{{"ID":10,"Title":"T","ForKids":true,"MainAuthor":{{"Id":1,"Name":"A"}}}}]"#
        )
        .unwrap();

        let books = load_seed(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, 10);
        assert!(books[0].translators.is_empty());
    }

    #[test]
    fn test_load_seed_missing_file() {
        let err = load_seed(Path::new("/nonexistent/seed.json")).unwrap_err();
        assert!(matches!(err, StoreError::SeedIo { .. }));
    }
}
