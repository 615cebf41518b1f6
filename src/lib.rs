// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # gutentei
//!
//! Linguistically annotated TEI samples from the Project Gutenberg catalogue.
//!
//! ## Architecture
//!
//! - **Archive reader** (`archive`): forward-only cursor over a bzip2/gzip tar stream
//! - **Catalogue** (`catalogue`): RDF/XML records parsed with `oxigraph`, text metadata
//! - **Annotation** (`nlp`): the `Annotator` boundary and a rule-based baseline
//! - **Markup** (`markup`): offset-aligned streaming of annotations into TEI
//! - **Samples** (`samples`): working directory, text selection, batch conversion
//!
//! ## Library usage
//!
//! ```no_run
//! use gutentei::markup::{AlignOptions, TeiHeader};
//! use gutentei::nlp::RuleAnnotator;
//! use gutentei::samples::write_tei;
//!
//! let header = TeiHeader { title: "Example", ..Default::default() };
//! let xml = write_tei(Vec::new(), &header, "Hi.\nBye.", &RuleAnnotator, AlignOptions::default())?;
//! println!("{}", String::from_utf8_lossy(&xml));
//! # Ok::<(), gutentei::samples::SamplesError>(())
//! ```

pub mod archive;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod markup;
pub mod nlp;
pub mod samples;
