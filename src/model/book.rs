//! Book catalogue entities.

use serde::{Deserialize, Serialize};

use crate::odata::entity::{EdmEntity, Navigation, Primitive, Property, PropertyKind};

/// A book in the catalogue.
///
/// `MainAuthor` and `Authors` are navigation properties; `Translators` is a
/// containment navigation owned by the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Book {
    #[serde(rename = "ID")]
    pub id: i32,
    pub title: String,
    pub for_kids: bool,
    pub main_author: Author,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub translators: Vec<Translator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Author {
    pub id: i32,
    pub name: String,
}

impl Author {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Translator {
    pub id: i32,
    pub name: String,
}

impl Translator {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Result of the `Rate` action. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BookRating {
    #[serde(rename = "BookID")]
    pub book_id: i32,
    pub rating: i32,
}

/// Parameters of the `Rate` action: `{ "Rating": 7 }`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RateParameters {
    pub rating: i32,
}

/// Partial update of a book.
///
/// Each `Some` field is part of the mask and carries its new value; `None`
/// leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct BookPatch {
    #[serde(rename = "ID")]
    pub id: Option<i32>,
    pub title: Option<String>,
    pub for_kids: Option<bool>,
    pub main_author: Option<Author>,
    pub authors: Option<Vec<Author>>,
    pub translators: Option<Vec<Translator>>,
}

impl BookPatch {
    /// Names of the properties covered by the mask.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.id.is_some() {
            fields.push("ID");
        }
        if self.title.is_some() {
            fields.push("Title");
        }
        if self.for_kids.is_some() {
            fields.push("ForKids");
        }
        if self.main_author.is_some() {
            fields.push("MainAuthor");
        }
        if self.authors.is_some() {
            fields.push("Authors");
        }
        if self.translators.is_some() {
            fields.push("Translators");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Overwrite the masked fields of `book`. The key is never changed.
    pub fn apply(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title.clone_from(title);
        }
        if let Some(for_kids) = self.for_kids {
            book.for_kids = for_kids;
        }
        if let Some(main_author) = &self.main_author {
            book.main_author = main_author.clone();
        }
        if let Some(authors) = &self.authors {
            book.authors.clone_from(authors);
        }
        if let Some(translators) = &self.translators {
            book.translators.clone_from(translators);
        }
    }
}

const AUTHOR_NAVIGATION: &[Navigation] = &[];
const TRANSLATOR_NAVIGATION: &[Navigation] = &[];

impl EdmEntity for Book {
    const TYPE_NAME: &'static str = "Book";
    const PROPERTIES: &'static [Property] = &[
        Property::new("ID", PropertyKind::Int32),
        Property::new("Title", PropertyKind::String),
        Property::new("ForKids", PropertyKind::Boolean),
    ];
    const NAVIGATION: &'static [Navigation] = &[
        Navigation::new("MainAuthor", AUTHOR_NAVIGATION),
        Navigation::new("Authors", AUTHOR_NAVIGATION),
        Navigation::new("Translators", TRANSLATOR_NAVIGATION),
    ];

    fn property(&self, name: &str) -> Option<Primitive> {
        match name {
            "ID" => Some(Primitive::Int(i64::from(self.id))),
            "Title" => Some(Primitive::String(self.title.clone())),
            "ForKids" => Some(Primitive::Bool(self.for_kids)),
            _ => None,
        }
    }
}

impl EdmEntity for Author {
    const TYPE_NAME: &'static str = "Author";
    const PROPERTIES: &'static [Property] = &[
        Property::new("Id", PropertyKind::Int32),
        Property::new("Name", PropertyKind::String),
    ];
    const NAVIGATION: &'static [Navigation] = AUTHOR_NAVIGATION;

    fn property(&self, name: &str) -> Option<Primitive> {
        match name {
            "Id" => Some(Primitive::Int(i64::from(self.id))),
            "Name" => Some(Primitive::String(self.name.clone())),
            _ => None,
        }
    }
}

impl EdmEntity for Translator {
    const TYPE_NAME: &'static str = "Translator";
    const PROPERTIES: &'static [Property] = &[
        Property::new("Id", PropertyKind::Int32),
        Property::new("Name", PropertyKind::String),
    ];
    const NAVIGATION: &'static [Navigation] = TRANSLATOR_NAVIGATION;

    fn property(&self, name: &str) -> Option<Primitive> {
        match name {
            "Id" => Some(Primitive::Int(i64::from(self.id))),
            "Name" => Some(Primitive::String(self.name.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        Book {
            id: 7,
            title: "Original".into(),
            for_kids: false,
            main_author: Author::new(1, "A"),
            authors: vec![Author::new(1, "A")],
            translators: vec![],
        }
    }

    #[test]
    fn test_book_wire_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["ID"], 7);
        assert_eq!(json["ForKids"], false);
        assert_eq!(json["MainAuthor"]["Name"], "A");
        assert!(json["Translators"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_patch_applies_only_masked_fields() {
        let mut book = sample();
        let patch: BookPatch = serde_json::from_str(r#"{"Title":"Renamed"}"#).unwrap();
        assert_eq!(patch.changed_fields(), vec!["Title"]);

        patch.apply(&mut book);
        assert_eq!(book.title, "Renamed");
        assert!(!book.for_kids);
        assert_eq!(book.authors, vec![Author::new(1, "A")]);
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let res: Result<BookPatch, _> = serde_json::from_str(r#"{"Tilte":"typo"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_patch_never_changes_key() {
        let mut book = sample();
        let patch = BookPatch {
            id: Some(99),
            for_kids: Some(true),
            ..BookPatch::default()
        };
        patch.apply(&mut book);
        assert_eq!(book.id, 7);
        assert!(book.for_kids);
    }

    #[test]
    fn test_rate_parameters_require_rating() {
        assert!(serde_json::from_str::<RateParameters>("{}").is_err());
        assert!(serde_json::from_str::<RateParameters>(r#"{"Rating":"high"}"#).is_err());
        let params: RateParameters = serde_json::from_str(r#"{"Rating":7}"#).unwrap();
        assert_eq!(params.rating, 7);
    }

    #[test]
    fn test_book_properties() {
        let book = sample();
        assert_eq!(book.property("ID"), Some(Primitive::Int(7)));
        assert_eq!(book.property("MainAuthor"), None);
        assert_eq!(Book::property_kind("ForKids"), Some(PropertyKind::Boolean));
    }
}
