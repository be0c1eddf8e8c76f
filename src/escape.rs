//! Path escaping for generated Ninja text and Make-style depfiles.
//!
//! Ninja treats `$`, space, and `:` specially inside path lists. Paths are
//! escaped before they are embedded in a build statement; variable values are
//! never escaped so callers can keep referencing `$builddir` and friends.
//!
//! # Examples
//!
//! ```
//! use shinobi::escape::escape_path;
//!
//! assert_eq!(escape_path("a b.txt"), "a$ b.txt");
//! assert_eq!(escape_path("c:d.txt"), "c$:d.txt");
//! ```

use itertools::Itertools;

/// Escape every `"$ "`, space, and colon in `path`.
///
/// The replacements run left to right: an already escaped space becomes
/// `"$$ "` first, every remaining space becomes `"$ "`, and finally every
/// colon becomes `"$:"`. A lone `$` is left alone so paths such as
/// `$builddir/out.txt` keep expanding.
#[must_use]
pub fn escape_path(path: &str) -> String {
    path.replace("$ ", "$$ ")
        .replace(' ', "$ ")
        .replace(':', "$:")
}

/// Escape each path and join them with single spaces.
///
/// # Examples
///
/// ```
/// use shinobi::escape::join_escaped;
///
/// assert_eq!(join_escaped(["a b", "c"]), "a$ b c");
/// ```
#[must_use]
pub fn join_escaped<I, S>(paths: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paths
        .into_iter()
        .map(|path| escape_path(path.as_ref()))
        .join(" ")
}

/// Split a Ninja path list on unescaped spaces, undoing [`escape_path`].
///
/// `$$` becomes `$`, `"$ "` becomes a space, and `"$:"` becomes a colon. A
/// `$` followed by any other character is kept verbatim.
#[must_use]
pub fn split_escaped(text: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => match chars.peek().copied() {
                Some(next @ ('$' | ' ' | ':')) => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push('$'),
            },
            ' ' => {
                if !current.is_empty() {
                    paths.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        paths.push(current);
    }
    paths
}

/// Escape a path for a Make-style dependency list.
///
/// Depfiles are read by Ninja's depfile parser rather than its manifest
/// lexer, so embedded spaces are backslash-escaped instead.
///
/// # Examples
///
/// ```
/// use shinobi::escape::escape_depfile_path;
///
/// assert_eq!(escape_depfile_path("my file.js"), "my\\ file.js");
/// ```
#[must_use]
pub fn escape_depfile_path(path: &str) -> String {
    path.replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain.txt", "plain.txt")]
    #[case("a b.txt", "a$ b.txt")]
    #[case("c:d.txt", "c$:d.txt")]
    #[case("my:: alia$ !", "my$:$:$ alia$$$ !")]
    #[case("file$ .txt", "file$$$ .txt")]
    #[case("$builddir/out.txt", "$builddir/out.txt")]
    fn escapes_ninja_specials(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_path(input), expected);
    }

    #[rstest]
    #[case(&["a b", "c:d", "e"])]
    #[case(&["x$ y", "$ lead", "trail "])]
    #[case(&["C:/Program Files/node.exe"])]
    #[case(&["one"])]
    fn split_recovers_escaped_paths(#[case] paths: &[&str]) {
        let joined = join_escaped(paths.iter().copied());
        assert_eq!(split_escaped(&joined), paths);
    }

    #[test]
    fn split_keeps_variable_references() {
        assert_eq!(
            split_escaped("$builddir/a.js $out"),
            vec!["$builddir/a.js", "$out"]
        );
    }

    #[test]
    fn depfile_escaping_only_touches_spaces() {
        assert_eq!(escape_depfile_path("dir/a b:c.js"), "dir/a\\ b:c.js");
    }
}
