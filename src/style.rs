//! Style-sheet loading for windows.
//!
//! The toolkit does not fix a style-sheet format; a [`StyleEngine`]
//! supplied by the embedder parses sources into opaque [`StyleSheet`]
//! objects. The loader's job is path bookkeeping: while a file is being
//! parsed, relative resource references inside it resolve against the
//! file's own directory.
use derive_more::Display;
use log::debug;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::{fs, io};

/// A parsed, immutable style sheet. Windows hold these by `Rc`.
pub trait StyleSheet {}

/// Parses style-sheet sources. Supplied by the embedder.
pub trait StyleEngine {
    /// Parse `source`. `loader` is available for resolving and loading
    /// nested resources (imports, images). `prev` is the sheet being
    /// replaced, if any, so the engine can release or merge shared
    /// resources.
    fn parse(
        &self,
        source: &str,
        loader: &StyleLoader,
        prev: Option<&Rc<dyn StyleSheet>>,
    ) -> Result<Rc<dyn StyleSheet>, StyleError>;
}

#[derive(Debug, Display)]
pub enum StyleError {
    #[display(fmt = "could not read style source: {}", _0)]
    Io(io::Error),
    #[display(fmt = "style parse error: {}", _0)]
    Parse(String),
}

impl From<io::Error> for StyleError {
    fn from(e: io::Error) -> Self {
        StyleError::Io(e)
    }
}

impl std::error::Error for StyleError {}

/// Loads style sheets through a [`StyleEngine`], tracking the current
/// source directory for relative-path resolution.
pub struct StyleLoader {
    engine: Box<dyn StyleEngine>,
    cur_dir: RefCell<PathBuf>,
}

impl StyleLoader {
    pub fn new(engine: Box<dyn StyleEngine>) -> Self {
        Self {
            engine,
            cur_dir: RefCell::new(PathBuf::new()),
        }
    }

    /// Resolve `path` against the directory of the style source currently
    /// being parsed.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.cur_dir.borrow().join(path)
        }
    }

    /// Parse an in-memory style source. Relative references resolve
    /// against the loader's current directory. `prev` is forwarded to the
    /// engine as the sheet being replaced.
    pub fn load_str(
        &self,
        source: &str,
        prev: Option<&Rc<dyn StyleSheet>>,
    ) -> Result<Rc<dyn StyleSheet>, StyleError> {
        self.engine.parse(source, self, prev)
    }

    /// Read and parse a style-sheet file.
    ///
    /// While the file is parsed, the loader's current directory is the
    /// file's directory, and it is restored afterwards even on error, so
    /// nested loads from within `parse` see the right base.
    pub fn load_file(
        &self,
        path: &Path,
        prev: Option<&Rc<dyn StyleSheet>>,
    ) -> Result<Rc<dyn StyleSheet>, StyleError> {
        let path = self.resolve(path);
        debug!("loading style sheet from {:?}", path);
        let source = fs::read_to_string(&path)?;

        let dir = path.parent().map(Path::to_owned).unwrap_or_default();
        let saved = self.cur_dir.replace(dir);
        let result = self.engine.parse(&source, self, prev);
        self.cur_dir.replace(saved);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct NullSheet;
    impl StyleSheet for NullSheet {}

    /// Records the directory the loader resolves against at parse time,
    /// and whether a previous sheet was handed in.
    struct RecordingEngine {
        seen_dirs: Rc<StdRefCell<Vec<PathBuf>>>,
        saw_prev: Rc<StdRefCell<Vec<bool>>>,
        fail: bool,
    }

    impl StyleEngine for RecordingEngine {
        fn parse(
            &self,
            _source: &str,
            loader: &StyleLoader,
            prev: Option<&Rc<dyn StyleSheet>>,
        ) -> Result<Rc<dyn StyleSheet>, StyleError> {
            self.seen_dirs
                .borrow_mut()
                .push(loader.resolve(Path::new("asset.png")));
            self.saw_prev.borrow_mut().push(prev.is_some());
            if self.fail {
                Err(StyleError::Parse("bad".to_owned()))
            } else {
                Ok(Rc::new(NullSheet))
            }
        }
    }

    fn recording_loader(
        seen_dirs: Rc<StdRefCell<Vec<PathBuf>>>,
        saw_prev: Rc<StdRefCell<Vec<bool>>>,
        fail: bool,
    ) -> StyleLoader {
        StyleLoader::new(Box::new(RecordingEngine {
            seen_dirs,
            saw_prev,
            fail,
        }))
    }

    fn write_temp_sheet() -> PathBuf {
        let dir = std::env::temp_dir().join("shoji-style-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("main.style");
        fs::write(&path, "root {}").unwrap();
        path
    }

    #[test]
    fn relative_paths_resolve_against_the_sheet_directory() {
        init_logger();
        let path = write_temp_sheet();
        let seen_dirs = Rc::new(StdRefCell::new(Vec::new()));
        let loader = recording_loader(seen_dirs.clone(), Rc::new(StdRefCell::new(Vec::new())), false);

        loader.load_file(&path, None).unwrap();

        let seen = seen_dirs.borrow();
        assert_eq!(seen[0], path.parent().unwrap().join("asset.png"));
        // After the load the directory is restored.
        assert_eq!(
            loader.resolve(Path::new("asset.png")),
            PathBuf::from("asset.png")
        );
    }

    #[test]
    fn directory_is_restored_after_a_parse_error() {
        let path = write_temp_sheet();
        let loader = recording_loader(
            Rc::new(StdRefCell::new(Vec::new())),
            Rc::new(StdRefCell::new(Vec::new())),
            true,
        );

        assert!(loader.load_file(&path, None).is_err());
        assert_eq!(loader.resolve(Path::new("x")), PathBuf::from("x"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let loader = recording_loader(
            Rc::new(StdRefCell::new(Vec::new())),
            Rc::new(StdRefCell::new(Vec::new())),
            false,
        );
        match loader.load_file(Path::new("/nonexistent/sheet.style"), None) {
            Err(StyleError::Io(_)) => {}
            other => panic!("expected Io error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn the_replaced_sheet_is_handed_to_the_engine() {
        let saw_prev = Rc::new(StdRefCell::new(Vec::new()));
        let loader = recording_loader(Rc::new(StdRefCell::new(Vec::new())), saw_prev.clone(), false);

        let first = loader.load_str("root {}", None).unwrap();
        loader.load_str("root {}", Some(&first)).unwrap();

        assert_eq!(*saw_prev.borrow(), vec![false, true]);
    }
}
