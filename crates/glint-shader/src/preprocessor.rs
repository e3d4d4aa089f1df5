//! Include expansion and comment stripping
//!
//! Runs before parsing: `#include "X"` / `#include <X>` lines are
//! replaced by the recursively expanded contents of `X` plus the
//! configured auxiliary extension, then comments are stripped in one
//! pass so comment syntax inside included files disappears too.
//!
//! A missing include is deliberately non-fatal: it expands to an empty
//! string and reports an error-level diagnostic, letting authors see
//! every unresolved include of a file in a single import.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::diagnostics::{Diagnostics, Severity};

/// Recursion limit for nested includes. Authoring cycles hit this and
/// fail fast instead of overflowing the stack.
const MAX_INCLUDE_DEPTH: usize = 32;

/// Matches a whole `#include "name"` or `#include <name>` line.
fn include_regex() -> &'static Regex {
    static INCLUDE_REGEX: OnceLock<Regex> = OnceLock::new();
    INCLUDE_REGEX.get_or_init(|| {
        Regex::new(r#"(?m)^[ \t]*#include[ \t]*["<](.+?)[">][ \t]*$"#)
            .expect("Invalid include regex")
    })
}

fn line_comment_regex() -> &'static Regex {
    static LINE_COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    LINE_COMMENT_REGEX.get_or_init(|| Regex::new(r"//.*").expect("Invalid line comment regex"))
}

fn block_comment_regex() -> &'static Regex {
    static BLOCK_COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    BLOCK_COMMENT_REGEX
        .get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid block comment regex"))
}

/// Remove `//...` line comments and non-nested `/* ... */` block
/// comments. Newlines outside comments are preserved, so line numbers
/// of surviving text stay meaningful for single-line comments.
pub fn strip_comments(source: &str) -> String {
    let no_line = line_comment_regex().replace_all(source, "");
    block_comment_regex().replace_all(&no_line, "").into_owned()
}

/// Expands includes against a project defaults directory and each
/// including file's own directory.
pub struct Preprocessor {
    defaults_dir: PathBuf,
    /// Extension appended to include names, with leading dot.
    include_extension: String,
}

impl Preprocessor {
    pub fn new(defaults_dir: impl Into<PathBuf>, include_extension: impl Into<String>) -> Self {
        Self {
            defaults_dir: defaults_dir.into(),
            include_extension: include_extension.into(),
        }
    }

    /// Full preprocessing: expand includes depth-first, then strip
    /// comments once over the fully expanded text.
    pub fn preprocess(&self, source: &str, file_dir: &Path, sink: &dyn Diagnostics) -> String {
        let expanded = self.expand_includes(source, file_dir, sink, 0);
        strip_comments(&expanded)
    }

    /// Replace every include line with the recursively expanded file
    /// contents. Resolution order: defaults directory first, then the
    /// including file's directory. Unresolved includes expand to the
    /// empty string.
    pub fn expand_includes(
        &self,
        source: &str,
        file_dir: &Path,
        sink: &dyn Diagnostics,
        depth: usize,
    ) -> String {
        include_regex()
            .replace_all(source, |caps: &Captures<'_>| {
                self.expand_one(&caps[1], file_dir, sink, depth)
            })
            .into_owned()
    }

    fn expand_one(
        &self,
        name: &str,
        file_dir: &Path,
        sink: &dyn Diagnostics,
        depth: usize,
    ) -> String {
        if depth >= MAX_INCLUDE_DEPTH {
            sink.report(
                Severity::Error,
                &format!("include \"{name}\" exceeds depth limit {MAX_INCLUDE_DEPTH}, likely an include cycle"),
            );
            return String::new();
        }

        let relative = format!("{name}{}", self.include_extension);

        // First check the defaults path, then the including file's directory.
        let mut path = self.defaults_dir.join(&relative);
        if !path.is_file() {
            path = file_dir.join(&relative);
        }

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => {
                sink.report(
                    Severity::Error,
                    &format!("failed to import shader, include not found: {}", path.display()),
                );
                return String::new();
            }
        };

        // Nested includes resolve relative to the file that declares them.
        let nested_dir = path.parent().unwrap_or(file_dir).to_path_buf();
        self.expand_includes(&text, &nested_dir, sink, depth + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use std::fs;

    fn preprocessor(defaults: &Path) -> Preprocessor {
        Preprocessor::new(defaults, ".glsl")
    }

    #[test]
    fn test_no_includes_is_identity() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink::new();
        let source = "vec3 color = vec3(1.0);\nfloat x = 2.0;\n";
        let out = preprocessor(dir.path()).preprocess(source, dir.path(), &sink);
        assert_eq!(out, source);
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_strip_comments_example() {
        let out = strip_comments("// comment\nAAA\n/* block\ncomment */\nBBB");
        assert_eq!(out, "\nAAA\n\nBBB");
    }

    #[test]
    fn test_missing_include_expands_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink::new();
        let source = "AAA\n#include \"missing\"\nBBB\n";
        let out = preprocessor(dir.path()).preprocess(source, dir.path(), &sink);
        assert_eq!(out, "AAA\n\nBBB\n");
        assert_eq!(sink.error_count(), 1);
        assert!(sink.entries()[0].1.contains("missing.glsl"));
    }

    #[test]
    fn test_include_resolves_from_file_directory() {
        let defaults = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("common.glsl"), "float shared_value = 1.0;\n").unwrap();

        let sink = RecordingSink::new();
        let out = preprocessor(defaults.path()).preprocess(
            "#include \"common\"\nvoid main() {}\n",
            dir.path(),
            &sink,
        );
        assert!(out.contains("float shared_value = 1.0;"));
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_defaults_directory_wins() {
        let defaults = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        fs::write(defaults.path().join("common.glsl"), "FROM_DEFAULTS\n").unwrap();
        fs::write(dir.path().join("common.glsl"), "FROM_FILE_DIR\n").unwrap();

        let sink = RecordingSink::new();
        let out =
            preprocessor(defaults.path()).preprocess("#include <common>\n", dir.path(), &sink);
        assert!(out.contains("FROM_DEFAULTS"));
        assert!(!out.contains("FROM_FILE_DIR"));
    }

    #[test]
    fn test_nested_includes_expand_depth_first() {
        let defaults = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("outer.glsl"), "OUTER_TOP\n#include \"inner\"\nOUTER_BOTTOM\n")
            .unwrap();
        fs::write(dir.path().join("inner.glsl"), "INNER // trailing comment\n").unwrap();

        let sink = RecordingSink::new();
        let out = preprocessor(defaults.path()).preprocess("#include \"outer\"\n", dir.path(), &sink);
        assert_eq!(out, "OUTER_TOP\nINNER \n\nOUTER_BOTTOM\n\n");
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_include_cycle_hits_depth_guard() {
        let defaults = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.glsl"), "#include \"b\"\n").unwrap();
        fs::write(dir.path().join("b.glsl"), "#include \"a\"\n").unwrap();

        let sink = RecordingSink::new();
        let out = preprocessor(defaults.path()).preprocess("#include \"a\"\n", dir.path(), &sink);
        assert_eq!(out.trim(), "");
        assert_eq!(sink.error_count(), 1);
        assert!(sink.entries()[0].1.contains("depth limit"));
    }

    #[test]
    fn test_preprocessing_is_deterministic() {
        let defaults = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        fs::write(defaults.path().join("lib.glsl"), "/* lib */ float f();\n").unwrap();

        let source = "#include \"lib\"\nvoid main() { /* body */ }\n";
        let sink = RecordingSink::new();
        let pre = preprocessor(defaults.path());
        let first = pre.preprocess(source, dir.path(), &sink);
        let second = pre.preprocess(source, dir.path(), &sink);
        assert_eq!(first, second);
    }

    #[test]
    fn test_comments_inside_includes_are_stripped() {
        let defaults = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("lit.glsl"),
            "// helper\nfloat lit() { return 1.0; }\n",
        )
        .unwrap();

        let sink = RecordingSink::new();
        let out = preprocessor(defaults.path()).preprocess("#include \"lit\"\n", dir.path(), &sink);
        assert!(!out.contains("helper"));
        assert!(out.contains("float lit()"));
    }
}
