//! Sequential, fail-fast compilation of stale sources.

use super::feedback::FeedbackAnalyzer;
use super::manifest::{BuildManifest, SourceFile};
use crate::config::TargetConfig;
use crate::error::{BuildError, IoResultExt};
use crate::process::{CommandRunner, Invocation};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPILE_COMMANDS_FILE: &str = "compile_commands.json";

pub fn compile_invocation(config: &TargetConfig, source: &SourceFile, include_dir: &Path) -> Invocation {
    Invocation::new(&config.compiler)
        .arg("-Wall")
        .args(&config.cflags)
        .arg("-c")
        .arg(&source.path)
        .arg("-o")
        .arg(&source.object)
        .arg(format!("-I{}", include_dir.display()))
        .cwd(&config.base_dir)
}

/// Compiles each stale source in order and stops at the first failure.
///
/// Returns the sources that were compiled.
pub fn compile_sources(
    runner: &mut dyn CommandRunner,
    config: &TargetConfig,
    stale: &[&SourceFile],
    include_dir: &Path,
    verbose: bool,
) -> Result<Vec<PathBuf>, BuildError> {
    if stale.is_empty() {
        return Ok(Vec::new());
    }

    let pb = ProgressBar::new(stale.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut compiled = Vec::with_capacity(stale.len());
    for source in stale {
        if let Some(parent) = source.object.parent() {
            fs::create_dir_all(parent).with_path("create", parent)?;
        }

        let invocation = compile_invocation(config, source, include_dir);
        pb.set_message(format!("Compiling {}", source.relative.display()));
        if verbose {
            pb.println(format!("   {} {}", "$".dimmed(), invocation.to_string().dimmed()));
        }

        let output = runner.run(&invocation)?;
        if !output.success {
            pb.abandon();
            println!(
                "{} Error compiling {}:\n{}",
                "x".red(),
                source.path.display(),
                output.stderr
            );
            if let Some(hint) = FeedbackAnalyzer::analyze(&output.stderr) {
                println!("{} {}", "💡".yellow(), hint);
            }
            return Err(BuildError::Compile {
                file: source.path.clone(),
                stderr: output.stderr,
            });
        }

        if !output.stderr.trim().is_empty() {
            pb.println(format!(
                "{} Warning in {}:\n{}",
                "!".yellow(),
                source.path.display(),
                output.stderr
            ));
        }

        compiled.push(source.path.clone());
        pb.inc(1);
    }

    pb.finish_with_message("Compilation complete");
    Ok(compiled)
}

/// Writes a compilation database covering the whole manifest.
pub fn write_compile_commands(
    config: &TargetConfig,
    manifest: &BuildManifest,
    include_dir: &Path,
) -> Result<PathBuf, BuildError> {
    let entries: Vec<serde_json::Value> = manifest
        .sources()
        .iter()
        .map(|source| {
            let invocation = compile_invocation(config, source, include_dir);
            let mut arguments = vec![invocation.program.to_string_lossy().to_string()];
            arguments.extend(invocation.args.iter().map(|a| a.to_string_lossy().into_owned()));
            json!({
                "directory": config.base_dir.to_string_lossy(),
                "arguments": arguments,
                "file": source.path.to_string_lossy(),
                "output": source.object.to_string_lossy(),
            })
        })
        .collect();

    fs::create_dir_all(manifest.object_dir()).with_path("create", manifest.object_dir())?;
    let path = manifest.object_dir().join(COMPILE_COMMANDS_FILE);
    let json_str = serde_json::to_string_pretty(&entries)
        .map_err(|e| BuildError::io("failed to serialize compile commands", e.into()))?;
    fs::write(&path, json_str).with_path("write", &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;

    struct FakeCompiler {
        calls: Vec<Invocation>,
        fail_on: Option<&'static str>,
    }

    impl CommandRunner for FakeCompiler {
        fn run(&mut self, invocation: &Invocation) -> Result<ProcessOutput, BuildError> {
            self.calls.push(invocation.clone());
            let src = &invocation.args[invocation.args.iter().position(|a| a == "-c").unwrap() + 1];
            if self.fail_on.is_some_and(|f| src.to_string_lossy().ends_with(f)) {
                return Ok(ProcessOutput::failure(1, "error: expected ';'"));
            }
            Ok(ProcessOutput::success(""))
        }
    }

    fn setup(names: &[&str]) -> (tempfile::TempDir, TargetConfig, BuildManifest) {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().to_path_buf();
        let mut config = TargetConfig::new("t1", &base);
        config.cflags = vec!["-std=c++17".into(), "-DX=1".into()];
        let sources: Vec<PathBuf> = names.iter().map(|n| base.join("src").join(n)).collect();
        let manifest = BuildManifest::new(&base.join("src"), &base.join("obj/t1"), &sources).unwrap();
        (tmp, config, manifest)
    }

    #[test]
    fn test_compile_argument_order() {
        let (tmp, config, manifest) = setup(&["sub/a.cpp"]);
        let inv = compile_invocation(&config, &manifest.sources()[0], &tmp.path().join("include"));
        let src = tmp.path().join("src/sub/a.cpp").to_string_lossy().to_string();
        let obj = tmp.path().join("obj/t1/sub/a.o").to_string_lossy().to_string();
        let inc = format!("-I{}", tmp.path().join("include").display());
        let args: Vec<String> = inv.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-Wall",
                "-std=c++17",
                "-DX=1",
                "-c",
                src.as_str(),
                "-o",
                obj.as_str(),
                inc.as_str(),
            ]
        );
        assert_eq!(inv.cwd.as_deref(), Some(tmp.path()));
    }

    #[test]
    fn test_creates_object_directories() {
        let (tmp, config, manifest) = setup(&["deep/er/a.cpp"]);
        let stale: Vec<&SourceFile> = manifest.sources().iter().collect();
        let mut runner = FakeCompiler { calls: vec![], fail_on: None };

        let compiled =
            compile_sources(&mut runner, &config, &stale, &tmp.path().join("include"), false).unwrap();

        assert_eq!(compiled.len(), 1);
        assert!(tmp.path().join("obj/t1/deep/er").is_dir());
    }

    #[test]
    fn test_stops_at_first_failure() {
        let (tmp, config, manifest) = setup(&["a.cpp", "b.cpp", "c.cpp"]);
        let stale: Vec<&SourceFile> = manifest.sources().iter().collect();
        let mut runner = FakeCompiler { calls: vec![], fail_on: Some("b.cpp") };

        let err = compile_sources(&mut runner, &config, &stale, &tmp.path().join("include"), false)
            .unwrap_err();

        assert_eq!(runner.calls.len(), 2);
        match err {
            BuildError::Compile { file, stderr } => {
                assert!(file.ends_with("b.cpp"));
                assert!(stderr.contains("expected ';'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compile_commands_cover_manifest() {
        let (tmp, config, manifest) = setup(&["a.cpp", "b.cpp"]);
        let path = write_compile_commands(&config, &manifest, &tmp.path().join("include")).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        let entries = parsed.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["arguments"][0], "clang++");
        assert!(entries[1]["file"].as_str().unwrap().ends_with("b.cpp"));
    }
}
