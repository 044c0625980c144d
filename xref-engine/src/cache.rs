//! Single-flight document cache
//!
//! Memoizes "parse + wrap in `ParsedDocumentView`" per normalized absolute
//! path for the lifetime of one run. Concurrent resolves of the same path
//! join one shared parse; sequential resolves reuse the finished result.
//!
//! Failure handling: the parsing task removes its own map entry *before* the
//! shared future completes with the error, so every caller already attached
//! sees that same failure, while any caller arriving afterwards starts a
//! fresh parse. A transient failure (a momentarily locked file, say) never
//! poisons the key for the rest of the run.
//!
//! Normalization is lexical only (`.` and `..` segments); symlinked spellings
//! of the same file are distinct keys. Callers that need symlink-invariant
//! caching must pass already-canonicalized paths.

use crate::error::CacheError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;
use xref_parser::{ParseError, ParsedDocumentView, RawParseOutput};

type ParseResult = Result<Arc<ParsedDocumentView>, CacheError>;
type ParseFuture = Shared<BoxFuture<'static, ParseResult>>;

/// Pluggable parse step so tests can count or fail invocations
pub trait DocumentParser: Send + Sync + 'static {
    fn parse(&self, path: &Path) -> Result<RawParseOutput, ParseError>;
}

/// Production parser: the comrak-backed tokenizer from xref-parser
pub struct MarkdownParser;

impl DocumentParser for MarkdownParser {
    fn parse(&self, path: &Path) -> Result<RawParseOutput, ParseError> {
        xref_parser::parse(path)
    }
}

#[derive(Clone)]
pub struct DocumentCache {
    parser: Arc<dyn DocumentParser>,
    inflight: Arc<Mutex<HashMap<PathBuf, ParseFuture>>>,
}

impl DocumentCache {
    pub fn new(parser: Arc<dyn DocumentParser>) -> Self {
        DocumentCache {
            parser,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A cache backed by the standard Markdown tokenizer
    pub fn markdown() -> Self {
        Self::new(Arc::new(MarkdownParser))
    }

    /// Resolve a path to its parsed view, parsing at most once per key.
    pub async fn resolve(&self, path: &Path) -> ParseResult {
        let key = normalize_path(path);
        let future = {
            let mut inflight = self.inflight.lock().expect("cache mutex");
            if let Some(existing) = inflight.get(&key) {
                debug!(path = %key.display(), "document cache hit");
                existing.clone()
            } else {
                debug!(path = %key.display(), "document cache miss, parsing");
                let future = self.parse_task(key.clone()).boxed().shared();
                inflight.insert(key.clone(), future.clone());
                future
            }
        };
        future.await
    }

    fn parse_task(&self, key: PathBuf) -> impl std::future::Future<Output = ParseResult> {
        let parser = Arc::clone(&self.parser);
        let inflight = Arc::clone(&self.inflight);
        async move {
            let result = parser
                .parse(&key)
                .map(|raw| Arc::new(ParsedDocumentView::new(raw)))
                .map_err(|e| CacheError {
                    path: key.clone(),
                    message: e.to_string(),
                });
            if result.is_err() {
                // Evict before any caller observes the failure; new lookups
                // from this point on re-attempt the parse.
                inflight.lock().expect("cache mutex").remove(&key);
            }
            result
        }
    }
}

/// Resolve `.` and `..` segments without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts parses; fails the first `fail_first` invocations. When `delay`
    /// is set the parse blocks, so a second caller can attach to the
    /// in-flight future before it completes.
    struct CountingParser {
        calls: AtomicUsize,
        fail_first: usize,
        delay: Option<Duration>,
    }

    impl CountingParser {
        fn new(fail_first: usize) -> Self {
            CountingParser {
                calls: AtomicUsize::new(0),
                fail_first,
                delay: None,
            }
        }

        fn slow(fail_first: usize) -> Self {
            CountingParser {
                calls: AtomicUsize::new(0),
                fail_first,
                delay: Some(Duration::from_millis(80)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DocumentParser for CountingParser {
        fn parse(&self, path: &Path) -> Result<RawParseOutput, ParseError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            if call < self.fail_first {
                return Err(ParseError::Io {
                    path: path.to_path_buf(),
                    message: "simulated IO failure".to_string(),
                });
            }
            Ok(xref_parser::parse_source(path, "# Doc\n\nbody\n"))
        }
    }

    #[tokio::test]
    async fn sequential_resolves_parse_once() {
        let parser = Arc::new(CountingParser::new(0));
        let cache = DocumentCache::new(parser.clone());
        let path = Path::new("/docs/a.md");

        let first = cache.resolve(path).await.unwrap();
        let second = cache.resolve(path).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(parser.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolves_coalesce() {
        let parser = Arc::new(CountingParser::slow(0));
        let cache = DocumentCache::new(parser.clone());
        let path = PathBuf::from("/docs/a.md");

        let first = {
            let cache = cache.clone();
            let path = path.clone();
            tokio::spawn(async move { cache.resolve(&path).await })
        };
        // Give the first task time to start the parse, then pile on.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = {
            let cache = cache.clone();
            let path = path.clone();
            tokio::spawn(async move { cache.resolve(&path).await })
        };

        let a = first.await.unwrap().unwrap();
        let b = second.await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(parser.calls(), 1);
    }

    #[tokio::test]
    async fn distinct_spellings_of_one_path_share_a_key() {
        let parser = Arc::new(CountingParser::new(0));
        let cache = DocumentCache::new(parser.clone());

        cache.resolve(Path::new("/docs/a.md")).await.unwrap();
        cache.resolve(Path::new("/docs/./sub/../a.md")).await.unwrap();
        assert_eq!(parser.calls(), 1);
    }

    #[tokio::test]
    async fn failure_is_evicted_and_retried() {
        let parser = Arc::new(CountingParser::new(1));
        let cache = DocumentCache::new(parser.clone());
        let path = Path::new("/docs/a.md");

        let first = cache.resolve(path).await;
        assert!(first.is_err());

        // The failed entry must not replay; this re-attempts the parse.
        let second = cache.resolve(path).await;
        assert!(second.is_ok());
        assert_eq!(parser.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_failure() {
        let parser = Arc::new(CountingParser::slow(1));
        let cache = DocumentCache::new(parser.clone());
        let path = PathBuf::from("/docs/a.md");

        let first = {
            let cache = cache.clone();
            let path = path.clone();
            tokio::spawn(async move { cache.resolve(&path).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = {
            let cache = cache.clone();
            let path = path.clone();
            tokio::spawn(async move { cache.resolve(&path).await })
        };

        let a = first.await.unwrap();
        let b = second.await.unwrap();
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(a.unwrap_err(), b.unwrap_err());
        // One shared parse served both callers its failure.
        assert_eq!(parser.calls(), 1);
    }

    #[test]
    fn normalization_is_lexical() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d.md")),
            PathBuf::from("/a/c/d.md")
        );
        assert_eq!(normalize_path(Path::new("/a/../../b.md")), PathBuf::from("/b.md"));
        assert_eq!(normalize_path(Path::new("a/../../b.md")), PathBuf::from("../b.md"));
    }
}
