use colored::*;
use regex::Regex;
use std::sync::OnceLock;

fn missing_header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"fatal error: '?([^':\s]+)'?(?:: No such file or directory| file not found)")
            .expect("missing-header pattern is valid")
    })
}

/// Turns common toolchain diagnostics into a short hint.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        // 1. Missing entry point (linker)
        if output.contains("undefined reference to `main'")
            || output.contains("_main\", referenced from")
            || output.contains("entry point must be defined")
        {
            return Some(format!(
                "The target has no {} function.\nCheck that the file defining it is under {} and listed by {}.",
                "main()".bold().yellow(),
                "src/".bold().yellow(),
                "modules".bold().green()
            ));
        }

        // 2. Unresolved symbols (linker)
        if output.contains("undefined reference to") || output.contains("Undefined symbols") {
            return Some(format!(
                "It looks like a {} error.\nPut the library under {} or declare it in {} / {} in doit.toml.",
                "Linker".bold().red(),
                "lib/<dir>/".bold().yellow(),
                "external_libs".bold().green(),
                "external_frameworks".bold().green()
            ));
        }

        // 3. Missing header (compiler)
        if let Some(caps) = missing_header_pattern().captures(output) {
            return Some(format!(
                "It looks like a {} error ({}).\nHeaders are searched in {}; add other paths to {} in doit.toml.",
                "Missing Header".bold().red(),
                caps[1].bold(),
                "include/".bold().yellow(),
                "cflags".bold().yellow()
            ));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linker_error() {
        colored::control::set_override(false);
        let err = "a.o: in function `f': undefined reference to `foo'";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Linker error"));
        assert!(msg.contains("external_libs"));
    }

    #[test]
    fn test_include_error_gcc() {
        colored::control::set_override(false);
        let err = "src/a.cpp:1:10: fatal error: foo.h: No such file or directory";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Missing Header"));
        assert!(msg.contains("foo.h"));
    }

    #[test]
    fn test_include_error_clang() {
        colored::control::set_override(false);
        let err = "src/a.cpp:1:10: fatal error: 'gl/glew.h' file not found";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("gl/glew.h"));
    }

    #[test]
    fn test_main_error() {
        colored::control::set_override(false);
        let err = "undefined reference to `main'";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("no main() function"));
    }

    #[test]
    fn test_unknown_output() {
        assert!(FeedbackAnalyzer::analyze("error: expected ';'").is_none());
    }
}
