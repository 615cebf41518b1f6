//! Vocabulary used by the Gutenberg RDF records.
//!
//! Terms are compile-time constants, shared read-only by every parser thread.

pub mod pgterms {
    use oxigraph::model::NamedNodeRef;

    pub const NS: &str = "http://www.gutenberg.org/2009/pgterms/";

    pub const EBOOK: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.gutenberg.org/2009/pgterms/ebook");
    pub const AGENT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.gutenberg.org/2009/pgterms/agent");
    pub const FILE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.gutenberg.org/2009/pgterms/file");
    pub const NAME: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.gutenberg.org/2009/pgterms/name");
    pub const DOWNLOADS: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.gutenberg.org/2009/pgterms/downloads");
}

pub mod dcterms {
    use oxigraph::model::NamedNodeRef;

    pub const NS: &str = "http://purl.org/dc/terms/";

    pub const TITLE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/title");
    pub const CREATOR: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/creator");
    pub const LANGUAGE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/language");
    pub const HAS_FORMAT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/hasFormat");
    pub const FORMAT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/format");
}

pub mod rdf {
    use oxigraph::model::NamedNodeRef;

    pub const TYPE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
    pub const VALUE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#value");
}
