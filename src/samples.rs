//! Working-directory orchestration: catalogue, text list, TEI output.
//!
//! Layout of a samples directory:
//!
//! ```text
//! <dir>/catalogue.tar.bz2   cached catalogue container
//! <dir>/texts.json          all texts, in catalogue order
//! <dir>/txt/<id>.txt        downloaded plain texts
//! <dir>/tei/<id>.xml        annotated TEI documents
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalogue::cache::{fetch_to_file, part_path};
use crate::catalogue::{CatalogError, Catalogue, Text, load_texts, save_texts};
use crate::config::SamplesConfig;
use crate::markup::{AlignOptions, MarkupError, TeiHeader, TeiWriter, validate, write_annotated};
use crate::nlp::{Annotator, NlpError};

/// Errors from sample generation.
#[derive(Debug, Error, Diagnostic)]
pub enum SamplesError {
    #[error("I/O error at {path}: {source}")]
    #[diagnostic(
        code(gtei::samples::io),
        help("Ensure the working directory exists and is writable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot build worker pool: {message}")]
    #[diagnostic(
        code(gtei::samples::thread_pool),
        help("Lower the configured thread count.")
    )]
    ThreadPool { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Nlp(#[from] NlpError),
}

pub type SamplesResult<T> = std::result::Result<T, SamplesError>;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SamplesError + '_ {
    move |source| SamplesError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Outcome of a batch run. One entry per text, keyed by text id.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<(String, PathBuf)>,
    pub failed: Vec<(String, SamplesError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A samples working directory.
#[derive(Debug, Clone)]
pub struct Samples {
    dir: PathBuf,
    catalogue_file: PathBuf,
    texts_file: PathBuf,
    tei_dir: PathBuf,
    txt_dir: PathBuf,
}

impl Samples {
    /// Open `dir`, creating it and its subdirectories as needed.
    pub fn new(dir: impl Into<PathBuf>) -> SamplesResult<Self> {
        let dir = dir.into();
        let samples = Self {
            catalogue_file: dir.join("catalogue.tar.bz2"),
            texts_file: dir.join("texts.json"),
            tei_dir: dir.join("tei"),
            txt_dir: dir.join("txt"),
            dir,
        };
        for d in [&samples.dir, &samples.tei_dir, &samples.txt_dir] {
            std::fs::create_dir_all(d).map_err(io_err(d))?;
        }
        Ok(samples)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalogue_file(&self) -> &Path {
        &self.catalogue_file
    }

    pub fn texts_file(&self) -> &Path {
        &self.texts_file
    }

    pub fn tei_file(&self, text: &Text) -> PathBuf {
        self.tei_dir.join(format!("{}.xml", text.id))
    }

    pub fn txt_file(&self, text: &Text) -> PathBuf {
        self.txt_dir.join(format!("{}.txt", text.id))
    }

    /// Whether `texts.json` is at least as new as the cached catalogue.
    pub fn texts_up_to_date(&self) -> bool {
        let modified = |p: &Path| p.metadata().and_then(|m| m.modified()).ok();
        match (modified(&self.texts_file), modified(&self.catalogue_file)) {
            (Some(texts), Some(catalogue)) => texts >= catalogue,
            _ => false,
        }
    }

    /// All texts in catalogue order, from `texts.json` when it is current,
    /// otherwise by walking the catalogue (downloading it from
    /// `catalogue_url` if it is not cached).
    pub fn texts(&self, catalogue_url: &str) -> SamplesResult<Vec<Text>> {
        if self.texts_up_to_date() {
            let texts = load_texts(&self.texts_file)?;
            debug!(count = texts.len(), path = %self.texts_file.display(), "loaded texts");
            return Ok(texts);
        }

        let mut catalogue = Catalogue::cached(&self.catalogue_file, catalogue_url)?;
        let texts = Text::all_of(&mut catalogue);
        catalogue.close();
        let texts = texts?;

        save_texts(&self.texts_file, &texts)?;
        info!(count = texts.len(), path = %self.texts_file.display(), "saved texts");
        Ok(texts)
    }

    /// Texts in `language`, after skipping `skip` and keeping at most `limit`.
    pub fn select<'t>(texts: &'t [Text], language: &str, skip: usize, limit: usize) -> Vec<&'t Text> {
        texts
            .iter()
            .filter(|t| t.language == language)
            .skip(skip)
            .take(limit)
            .collect()
    }

    /// Plain-text contents of `text`, downloaded on first use.
    pub fn contents(&self, text: &Text) -> SamplesResult<String> {
        let path = self.txt_file(text);
        if !path.is_file() {
            fetch_to_file(&text.plain_text_url(), &path)?;
        }
        let bytes = std::fs::read(&path).map_err(io_err(&path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write `tei/<id>.xml` for `text`, returning its path.
    ///
    /// An existing non-empty file is kept unless `overwrite` is set. Output
    /// goes to a `.part` file first; on failure it is removed.
    pub fn tei(
        &self,
        annotator: &dyn Annotator,
        text: &Text,
        options: AlignOptions,
        overwrite: bool,
    ) -> SamplesResult<PathBuf> {
        let path = self.tei_file(text);
        if !overwrite && path.metadata().is_ok_and(|m| m.is_file() && m.len() > 0) {
            debug!(text = %text.id, path = %path.display(), "TEI already present");
            return Ok(path);
        }

        let body = Text::body(&self.contents(text)?);
        let part = part_path(&path);
        let file = File::create(&part).map_err(io_err(&part))?;

        match write_tei(BufWriter::new(file), &text.tei_header(), &body, annotator, options) {
            Ok(writer) => drop(writer),
            Err(e) => {
                let _ = std::fs::remove_file(&part);
                return Err(e);
            }
        }
        std::fs::rename(&part, &path).map_err(io_err(&path))?;
        Ok(path)
    }

    /// Convert `texts` on a worker pool, collecting every outcome.
    ///
    /// A failure is recorded against its text and never stops the others.
    pub fn process(
        &self,
        annotator: &dyn Annotator,
        texts: &[&Text],
        config: &SamplesConfig,
    ) -> SamplesResult<BatchReport> {
        let threads = config.worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("gutentei-{i}"))
            .build()
            .map_err(|e| SamplesError::ThreadPool {
                message: e.to_string(),
            })?;
        info!(texts = texts.len(), threads, "generating TEI");

        let options = config.align_options();
        let overwrite = config.overwrite;
        let (tx, rx) = mpsc::channel();
        pool.scope(|scope| {
            for &text in texts {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let outcome = self.tei(annotator, text, options, overwrite);
                    // The receiver outlives the scope.
                    let _ = tx.send((text.id.clone(), outcome));
                });
            }
        });
        drop(tx);

        let mut report = BatchReport::default();
        for (id, outcome) in rx {
            match outcome {
                Ok(path) => {
                    info!(text = %id, path = %path.display(), "wrote TEI");
                    report.written.push((id, path));
                }
                Err(e) => {
                    warn!(text = %id, error = %e, "TEI generation failed");
                    report.failed.push((id, e));
                }
            }
        }
        report.written.sort_by(|a, b| a.0.cmp(&b.0));
        report.failed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(report)
    }
}

/// Annotate `body` and write it as a TEI document to `out`.
///
/// Spans are validated before the first byte is written.
pub fn write_tei<W: Write>(
    out: W,
    header: &TeiHeader<'_>,
    body: &str,
    annotator: &dyn Annotator,
    options: AlignOptions,
) -> SamplesResult<W> {
    let annotation = annotator.annotate(body)?;
    validate(body, &annotation)?;
    debug!(
        annotator = annotator.name(),
        sentences = annotation.sentences.len(),
        tokens = annotation.token_count(),
        "annotated"
    );

    let mut tei = TeiWriter::new(out);
    tei.write_document(header, |w| write_annotated(w, body, &annotation, options))?;
    Ok(tei.into_inner()?)
}
