//! Splitting compiler output into listed files and error lines.
//!
//! With `--pretty false` the compiler prints one diagnostic per line as
//! `<file>(<line>,<col>): error TS<code>: <message>` or
//! `error TS<code>: <message>`, and `--listFiles` prints one absolute path
//! per line. Continuation lines of multi-line messages are indented.

use camino::Utf8Path;

/// `true` when `line` is a compiler error in either accepted form.
///
/// # Examples
///
/// ```
/// use shinobi::tsc::is_error_line;
///
/// assert!(is_error_line("src/a.ts(3,7): error TS2322: Type 'string' is not assignable."));
/// assert!(is_error_line("error TS5083: Cannot read file 'tsconfig.json'."));
/// assert!(!is_error_line("/work/node_modules/typescript/lib/lib.es5.d.ts"));
/// ```
#[must_use]
pub fn is_error_line(line: &str) -> bool {
    if is_error_tail(line) {
        return true;
    }
    let Some((head, tail)) = line.split_once("): ") else {
        return false;
    };
    let Some((file, position)) = head.rsplit_once('(') else {
        return false;
    };
    let Some((row, col)) = position.split_once(',') else {
        return false;
    };
    !file.is_empty() && is_number(row) && is_number(col) && is_error_tail(tail)
}

/// Keep only the error lines of `output`.
#[must_use]
pub fn error_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| is_error_line(line))
        .map(str::to_owned)
        .collect()
}

/// The absolute file paths listed in `output`, in order.
#[must_use]
pub fn listed_files(output: &str) -> Vec<&Utf8Path> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && !is_error_line(line))
        .map(Utf8Path::new)
        .filter(|path| path.is_absolute())
        .collect()
}

fn is_error_tail(text: &str) -> bool {
    text.strip_prefix("error TS")
        .and_then(|rest| rest.split_once(": "))
        .is_some_and(|(code, _)| is_number(code))
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("index.ts(1,13): error TS2322: Type 'number' is not assignable to type 'string'.", true)]
    #[case("dir with space/a (copy).ts(10,2): error TS1005: ';' expected.", true)]
    #[case("error TS6053: File 'missing.ts' not found.", true)]
    #[case("index.ts(1,13): warning TS1: not an error", false)]
    #[case("index.ts(x,13): error TS2322: bad position", false)]
    #[case("  The file is in the program because:", false)]
    #[case("error TSabc: no code", false)]
    #[case("/abs/lib.d.ts", false)]
    fn recognises_error_lines(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(is_error_line(line), expected);
    }

    #[test]
    fn filters_listing_noise_from_failures() {
        let output = "/w/node_modules/typescript/lib/lib.d.ts\n/w/src/a.ts\nsrc/a.ts(2,1): error TS2304: Cannot find name 'x'.\n  related information\n";
        assert_eq!(
            error_lines(output),
            ["src/a.ts(2,1): error TS2304: Cannot find name 'x'."]
        );
    }

    #[test]
    fn lists_absolute_paths_only() {
        let output = "/w/a.ts\r\n\nerror TS5023: Unknown compiler option 'x'.\nrelative.ts\n/w/b.ts\n";
        let files: Vec<&str> = listed_files(output).into_iter().map(Utf8Path::as_str).collect();
        assert_eq!(files, ["/w/a.ts", "/w/b.ts"]);
    }
}
