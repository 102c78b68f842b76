//! The diagram compiler: cache check, then pdflatex and pdf2svg on a miss.
//!
//! A diagram is reusable iff its `.tex` file exists, holds exactly the
//! current source, and its `.svg` exists. Source equality is decided by the
//! fingerprint stored in the cache index; without an index record the
//! `.tex` file is read and compared byte-for-byte.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

use super::{DiagramError, DiagramJob, JobKey, ProcessOutput, ProcessRunner, SystemRunner, Variant};
use crate::cache::{DiagramCache, IndexEntry, fingerprint};
use crate::utils::exec::{Cmd, FilterRule};
use crate::{debug, log};

/// pdf2svg (poppler) chatter that is not worth showing.
const CONVERT_FILTER: FilterRule = FilterRule::new(&["Syntax Warning:", "Syntax Error (", "Internal Error:"]);

/// Lines of tool output kept in a failure when no LaTeX error line is found.
const DETAIL_TAIL: usize = 12;

/// Explicit inputs of the compiler. Nothing is read from the process
/// environment or the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    /// Root of `.tex`/`.pdf` intermediates and the cache index.
    pub tmp_root: PathBuf,
    /// Root of `.svg` artifacts.
    pub output_root: PathBuf,
    /// URL prefix of `output_root`, leading slash, no trailing slash.
    pub public_base: String,
    pub pdflatex: PathBuf,
    pub pdf2svg: PathBuf,
}

/// Build step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Convert,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compile => "compile",
            Self::Convert => "convert",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    pub stage: Stage,
    /// `None` when the tool did not start or exited by signal.
    pub exit_code: Option<i32>,
    /// Relevant tool output (LaTeX `!` errors, else the tail of stderr/stdout).
    pub detail: String,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.stage)?;
        if let Some(code) = self.exit_code {
            write!(f, " (exit code {code})")?;
        }
        if !self.detail.is_empty() {
            write!(f, "\n{}", self.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    /// Artifact was up to date, no tool ran.
    Cached,
    /// Both tools ran and produced the artifact.
    Built { elapsed: Duration },
    /// The markup still points at the artifact, which does not exist.
    Failed(BuildFailure),
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached => f.write_str("cached"),
            Self::Built { elapsed } => write!(f, "built in {elapsed:.2?}"),
            Self::Failed(failure) => write!(f, "{} failed", failure.stage),
        }
    }
}

/// Result of rendering one diagram tag.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub key: JobKey,
    pub variant: Variant,
    /// HTML replacing the tag; produced whatever the status.
    pub markup: String,
    pub status: RenderStatus,
}

/// Renders diagrams, sharing one cache index across pages and threads.
pub struct DiagramCompiler<R: ProcessRunner = SystemRunner> {
    settings: CompilerSettings,
    cache: DiagramCache,
    /// One lock per (page id, name): concurrent renders of the same diagram
    /// build once, and the others observe the cache hit.
    locks: DashMap<JobKey, Arc<Mutex<()>>>,
    runner: R,
}

impl DiagramCompiler<SystemRunner> {
    /// Compiler running the real tools, with the index loaded from the tmp root.
    pub fn new(settings: CompilerSettings) -> Self {
        Self::with_runner(settings, SystemRunner)
    }
}

impl<R: ProcessRunner> DiagramCompiler<R> {
    pub fn with_runner(settings: CompilerSettings, runner: R) -> Self {
        let cache = DiagramCache::load(&settings.tmp_root);
        Self {
            settings,
            cache,
            locks: DashMap::new(),
            runner,
        }
    }

    pub fn cache(&self) -> &DiagramCache {
        &self.cache
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Ensure the SVG for `name` on `page_id` is current and return its markup.
    ///
    /// `body` is the tag body as written; the `tikz` variant wraps it before
    /// it is compared or written. Tool failures are reported in the returned
    /// status, filesystem failures as `Err`.
    pub fn render(
        &self,
        name: &str,
        body: &str,
        page_id: &str,
        variant: Variant,
    ) -> Result<RenderOutcome, DiagramError> {
        let job = DiagramJob::new(&self.settings, page_id, name, variant)?;

        fs::create_dir_all(&job.tmp_dir).map_err(DiagramError::io(&job.tmp_dir))?;
        fs::create_dir_all(&job.out_dir).map_err(DiagramError::io(&job.out_dir))?;

        let source = variant.document(body);
        let hash = fingerprint(&job.key.page_id, &job.key.name, &source);
        let fingerprint = hash.to_hex();

        let lock = Arc::clone(self.locks.entry(job.key.clone()).or_default().value());
        let _guard = lock.lock();

        let status = if self.is_valid(&job, &source, &fingerprint) {
            debug!("cache"; "{} is up to date ({})", job.key, hash);
            RenderStatus::Cached
        } else {
            debug!("cache"; "{} needs a build ({})", job.key, hash);
            self.build(&job, &source, fingerprint)?
        };

        Ok(RenderOutcome {
            markup: variant.embed_markup(&job.public_path),
            key: job.key,
            variant,
            status,
        })
    }

    /// Write the cache index if it changed.
    pub fn persist(&self) -> io::Result<bool> {
        self.cache.persist()
    }

    fn is_valid(&self, job: &DiagramJob, source: &str, fingerprint: &str) -> bool {
        if !job.tex_path.is_file() || !job.svg_path.is_file() {
            return false;
        }

        let key = job.key.to_string();
        match self.cache.get(&key) {
            Some(entry) => entry.fingerprint == fingerprint && entry.artifact == job.svg_path,
            None => {
                // No index record (first run with an old tmp dir, or index
                // removed): trust the .tex file and adopt it into the index.
                let same = fs::read(&job.tex_path).is_ok_and(|stored| stored == source.as_bytes());
                if same {
                    self.cache.record(key, IndexEntry::new(fingerprint, &job.svg_path));
                }
                same
            }
        }
    }

    fn build(
        &self,
        job: &DiagramJob,
        source: &str,
        fingerprint: String,
    ) -> Result<RenderStatus, DiagramError> {
        let started = Instant::now();

        fs::write(&job.tex_path, source).map_err(DiagramError::io(&job.tex_path))?;
        // A PDF left by an earlier build must not be converted in place of a
        // failed compile.
        remove_if_exists(&job.pdf_path)?;

        let result = self.compile(job).and_then(|()| self.convert(job));

        let key = job.key.to_string();
        match result {
            Ok(()) => {
                let elapsed = started.elapsed();
                self.cache.record(key, IndexEntry::new(fingerprint, &job.svg_path));
                log!(job.variant.tag(); "built {} in {:.2?}", job.key, elapsed);
                Ok(RenderStatus::Built { elapsed })
            }
            Err(failure) => {
                // Broken is explicit: no stale SVG, no index record, so the
                // next render retries.
                remove_if_exists(&job.svg_path)?;
                self.cache.forget(&key);
                log!("error"; "{} {}: {}", job.variant, job.key, failure);
                Ok(RenderStatus::Failed(failure))
            }
        }
    }

    /// `pdflatex [-interaction=nonstopmode] -output-directory=<dir> <tex>`
    fn compile_cmd(&self, job: &DiagramJob) -> Cmd {
        let mut output_dir = std::ffi::OsString::from("-output-directory=");
        output_dir.push(&job.tmp_dir);

        let mut cmd = Cmd::new(&self.settings.pdflatex);
        if job.variant.nonstop() {
            cmd = cmd.arg("-interaction=nonstopmode");
        }
        // No working directory change: relative roots resolve against the
        // same directory as every other path of the job.
        cmd.arg(output_dir).arg(&job.tex_path)
    }

    /// `pdf2svg <pdf> <svg>`
    fn convert_cmd(&self, job: &DiagramJob) -> Cmd {
        Cmd::new(&self.settings.pdf2svg).args([&job.pdf_path, &job.svg_path])
    }

    fn compile(&self, job: &DiagramJob) -> Result<(), BuildFailure> {
        let output = self.run_stage(Stage::Compile, &self.compile_cmd(job))?;
        let produced = job.pdf_path.is_file();

        match (output.success, produced) {
            (_, false) => Err(BuildFailure {
                stage: Stage::Compile,
                exit_code: output.code,
                detail: compile_detail(&output),
            }),
            (false, true) => {
                // pdflatex in nonstop mode writes a PDF past recoverable errors
                log!("warning"; "{} compiled with errors:\n{}", job.key, compile_detail(&output));
                Ok(())
            }
            (true, true) => Ok(()),
        }
    }

    fn convert(&self, job: &DiagramJob) -> Result<(), BuildFailure> {
        let output = self.run_stage(Stage::Convert, &self.convert_cmd(job))?;

        if output.success && job.svg_path.is_file() {
            debug_stderr(&output);
            return Ok(());
        }

        let lines = CONVERT_FILTER.keep(&output.stderr);
        let detail = if lines.is_empty() {
            format!("no SVG written to {}", job.svg_path.display())
        } else {
            tail(&lines)
        };
        Err(BuildFailure {
            stage: Stage::Convert,
            exit_code: output.code,
            detail,
        })
    }

    fn run_stage(&self, stage: Stage, cmd: &Cmd) -> Result<ProcessOutput, BuildFailure> {
        debug!("exec"; "{} {:?}", cmd.program_name(), cmd.get_args());
        self.runner.run(cmd).map_err(|err| BuildFailure {
            stage,
            exit_code: None,
            detail: format!("{err:#}"),
        })
    }
}

/// LaTeX reports errors on stdout as `! message` followed by `l.<line> ...`.
fn compile_detail(output: &ProcessOutput) -> String {
    let mut errors = Vec::new();
    let mut lines = output.stdout.lines().peekable();
    while let Some(line) = lines.next() {
        if line.starts_with('!') {
            errors.push(line.trim_end().to_string());
            while let Some(next) = lines.peek() {
                if next.starts_with("l.") {
                    errors.push(next.trim_end().to_string());
                    break;
                }
                if next.starts_with('!') {
                    break;
                }
                lines.next();
            }
        }
    }
    if !errors.is_empty() {
        return errors.join("\n");
    }

    let fallback = if output.stderr.trim().is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    let lines: Vec<String> = fallback
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    tail(&lines)
}

fn tail(lines: &[String]) -> String {
    lines[lines.len().saturating_sub(DETAIL_TAIL)..].join("\n")
}

fn debug_stderr(output: &ProcessOutput) {
    if crate::logger::is_verbose() {
        CONVERT_FILTER.log("pdf2svg", &output.stderr);
    }
}

fn remove_if_exists(path: &Path) -> Result<(), DiagramError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DiagramError::Io(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::variant::{TIKZ_POSTAMBLE, TIKZ_PREAMBLE};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mode {
        Ok,
        CompileFails,
        CompileRecovers,
        ConvertFails,
        NotInstalled,
    }

    /// Records invocations and fakes the files pdflatex and pdf2svg produce.
    struct FakeRunner {
        mode: Mutex<Mode>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
        compiles: AtomicUsize,
    }

    impl FakeRunner {
        fn new(mode: Mode) -> Self {
            Self {
                mode: Mutex::new(mode),
                calls: Mutex::new(Vec::new()),
                compiles: AtomicUsize::new(0),
            }
        }

        fn set_mode(&self, mode: Mode) {
            *self.mode.lock() = mode;
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().clone()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, cmd: &Cmd) -> anyhow::Result<ProcessOutput> {
            let program = cmd.program_name();
            let args: Vec<String> = cmd
                .get_args()
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            self.calls.lock().push((program.clone(), args.clone()));

            let mode = *self.mode.lock();
            if mode == Mode::NotInstalled {
                anyhow::bail!("Failed to execute `{program}`");
            }

            let ok = ProcessOutput {
                success: true,
                code: Some(0),
                ..Default::default()
            };
            let failed = ProcessOutput {
                success: false,
                code: Some(1),
                stdout: "This is pdfTeX\n! Undefined control sequence.\n<recently read> \\foo\nl.5 \\foo\n".into(),
                stderr: String::new(),
            };

            let last = PathBuf::from(args.last().cloned().unwrap_or_default());
            if program == "pdflatex" {
                self.compiles.fetch_add(1, Ordering::SeqCst);
                match mode {
                    Mode::CompileFails => return Ok(failed),
                    Mode::CompileRecovers => {
                        fs::write(last.with_extension("pdf"), "%PDF").unwrap();
                        return Ok(failed);
                    }
                    _ => fs::write(last.with_extension("pdf"), "%PDF").unwrap(),
                }
            } else {
                if mode == Mode::ConvertFails {
                    return Ok(ProcessOutput {
                        success: false,
                        code: Some(255),
                        stderr: "Syntax Warning: noise\nUnable to open file\n".into(),
                        ..Default::default()
                    });
                }
                assert!(Path::new(&args[0]).is_file(), "converter ran without a PDF");
                fs::write(&last, "<svg/>").unwrap();
            }
            Ok(ok)
        }
    }

    fn settings(dir: &Path) -> CompilerSettings {
        CompilerSettings {
            tmp_root: dir.join("_tikz_tmp"),
            output_root: dir.join("svg"),
            public_base: "/svg".to_string(),
            pdflatex: PathBuf::from("pdflatex"),
            pdf2svg: PathBuf::from("pdf2svg"),
        }
    }

    fn compiler(dir: &Path, mode: Mode) -> DiagramCompiler<FakeRunner> {
        DiagramCompiler::with_runner(settings(dir), FakeRunner::new(mode))
    }

    const BODY: &str = "\\draw (0,0) -- (1,1);\n";

    #[test]
    fn test_first_render_builds() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);

        let outcome = c.render("fig1", BODY, "posts/my-post", Variant::Tikz).unwrap();
        assert!(matches!(outcome.status, RenderStatus::Built { .. }));
        assert_eq!(
            outcome.markup,
            "<embed src=\"/svg/posts/my-post/fig1.svg\" type=\"image/svg+xml\" />"
        );

        let tex = dir.path().join("_tikz_tmp/posts/my-post/fig1.tex");
        assert_eq!(
            fs::read_to_string(tex).unwrap(),
            format!("{TIKZ_PREAMBLE}{BODY}{TIKZ_POSTAMBLE}")
        );
        assert!(dir.path().join("svg/posts/my-post/fig1.svg").is_file());
        assert_eq!(c.runner().call_count(), 2);
    }

    #[test]
    fn test_second_render_is_cached() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);

        c.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        let second = c.render("fig1", BODY, "p", Variant::Tikz).unwrap();

        assert_eq!(second.status, RenderStatus::Cached);
        assert_eq!(c.runner().call_count(), 2);
    }

    #[test]
    fn test_changed_source_rebuilds() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);

        c.render("fig1", BODY, "p", Variant::Latex).unwrap();
        let changed = "\\documentclass{standalone}\\begin{document}B\\end{document}";
        let outcome = c.render("fig1", changed, "p", Variant::Latex).unwrap();

        assert!(matches!(outcome.status, RenderStatus::Built { .. }));
        assert_eq!(c.runner().call_count(), 4);
        let tex = dir.path().join("_tikz_tmp/p/fig1.tex");
        assert_eq!(fs::read_to_string(tex).unwrap(), changed);
    }

    #[test]
    fn test_missing_artifact_rebuilds() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);

        c.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        fs::remove_file(dir.path().join("svg/p/fig1.svg")).unwrap();

        let outcome = c.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        assert!(matches!(outcome.status, RenderStatus::Built { .. }));
        assert_eq!(c.runner().call_count(), 4);
    }

    #[test]
    fn test_missing_tex_rebuilds() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);

        c.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        fs::remove_file(dir.path().join("_tikz_tmp/p/fig1.tex")).unwrap();

        c.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        assert_eq!(c.runner().call_count(), 4);
    }

    #[test]
    fn test_persisted_index_survives_restart() {
        let dir = TempDir::new().unwrap();
        let first = compiler(dir.path(), Mode::Ok);
        first.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        assert!(first.persist().unwrap());

        let second = compiler(dir.path(), Mode::Ok);
        assert_eq!(second.cache().len(), 1);
        let outcome = second.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        assert_eq!(outcome.status, RenderStatus::Cached);
        assert_eq!(second.runner().call_count(), 0);
    }

    #[test]
    fn test_without_index_falls_back_to_tex_comparison() {
        let dir = TempDir::new().unwrap();
        let first = compiler(dir.path(), Mode::Ok);
        first.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        // never persisted: the next process sees only the files

        let second = compiler(dir.path(), Mode::Ok);
        assert_eq!(second.cache().len(), 0);
        let outcome = second.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        assert_eq!(outcome.status, RenderStatus::Cached);
        assert_eq!(second.runner().call_count(), 0);
        // adopted into the index
        assert_eq!(second.cache().len(), 1);

        let changed = second.render("fig1", "\\fill (0,0) circle (1);", "p", Variant::Tikz).unwrap();
        assert!(matches!(changed.status, RenderStatus::Built { .. }));
    }

    #[test]
    fn test_jekyll_tmp_tree_is_reused() {
        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join("_tikz_tmp/p");
        fs::create_dir_all(&tmp).unwrap();
        fs::write(
            tmp.join("fig1.tex"),
            "        \\documentclass{standalone}\n        \\usepackage{tikz}\n        \\begin{document}\n        \\begin{tikzpicture}\n\\draw (0,0) -- (1,1);\n        \\end{tikzpicture}\n        \\end{document}\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("svg/p")).unwrap();
        fs::write(dir.path().join("svg/p/fig1.svg"), "<svg/>").unwrap();

        let c = compiler(dir.path(), Mode::Ok);
        let outcome = c.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        assert_eq!(outcome.status, RenderStatus::Cached);
        assert_eq!(c.runner().call_count(), 0);
    }

    #[test]
    fn test_edited_tex_without_index_rebuilds() {
        let dir = TempDir::new().unwrap();
        compiler(dir.path(), Mode::Ok)
            .render("fig1", BODY, "p", Variant::Latex)
            .unwrap();
        fs::write(dir.path().join("_tikz_tmp/p/fig1.tex"), "edited").unwrap();

        let c = compiler(dir.path(), Mode::Ok);
        c.render("fig1", BODY, "p", Variant::Latex).unwrap();
        assert_eq!(c.runner().call_count(), 2);
    }

    #[test]
    fn test_compiler_arguments_per_variant() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);
        let tmp_dir = dir.path().join("_tikz_tmp/p");

        c.render("a", BODY, "p", Variant::Tikz).unwrap();
        c.render("b", BODY, "p", Variant::Latex).unwrap();

        let calls = c.runner().calls();
        let out_dir_arg = format!("-output-directory={}", tmp_dir.display());
        assert_eq!(
            calls[0],
            (
                "pdflatex".to_string(),
                vec![out_dir_arg.clone(), tmp_dir.join("a.tex").display().to_string()]
            )
        );
        assert_eq!(
            calls[1],
            (
                "pdf2svg".to_string(),
                vec![
                    tmp_dir.join("a.pdf").display().to_string(),
                    dir.path().join("svg/p/a.svg").display().to_string(),
                ]
            )
        );
        assert_eq!(calls[2].1[0], "-interaction=nonstopmode");
        assert_eq!(calls[2].1[1], out_dir_arg);
    }

    #[test]
    fn test_whitespace_in_name() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);

        let outcome = c.render("  fig 1 ", BODY, "p", Variant::Tikz).unwrap();
        assert_eq!(outcome.key.name, "fig1");
        assert!(dir.path().join("_tikz_tmp/p/fig1.tex").is_file());
        assert!(outcome.markup.contains("src=\"/svg/p/fig1.svg\""));
    }

    #[test]
    fn test_compile_failure_removes_stale_artifact() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);
        c.render("fig1", BODY, "p", Variant::Latex).unwrap();

        c.runner().set_mode(Mode::CompileFails);
        let outcome = c.render("fig1", "\\foo", "p", Variant::Latex).unwrap();

        let RenderStatus::Failed(failure) = &outcome.status else {
            panic!("expected failure, got {:?}", outcome.status);
        };
        assert_eq!(failure.stage, Stage::Compile);
        assert_eq!(failure.exit_code, Some(1));
        assert_eq!(failure.detail, "! Undefined control sequence.\nl.5 \\foo");
        // the converter never ran
        assert_eq!(c.runner().call_count(), 3);
        // reference is still emitted, artifact is gone
        assert!(outcome.markup.contains("/svg/p/fig1.svg"));
        assert!(!dir.path().join("svg/p/fig1.svg").exists());
        assert!(c.cache().get("p/fig1").is_none());

        // failed diagrams are retried
        c.runner().set_mode(Mode::Ok);
        let retry = c.render("fig1", "\\foo", "p", Variant::Latex).unwrap();
        assert!(matches!(retry.status, RenderStatus::Built { .. }));
    }

    #[test]
    fn test_recoverable_compile_error_still_converts() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::CompileRecovers);

        let outcome = c.render("fig1", BODY, "p", Variant::Latex).unwrap();
        assert!(matches!(outcome.status, RenderStatus::Built { .. }));
        assert_eq!(c.runner().call_count(), 2);
    }

    #[test]
    fn test_convert_failure() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::ConvertFails);

        let outcome = c.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        let RenderStatus::Failed(failure) = outcome.status else {
            panic!("expected failure");
        };
        assert_eq!(failure.stage, Stage::Convert);
        assert_eq!(failure.exit_code, Some(255));
        assert_eq!(failure.detail, "Unable to open file");
    }

    #[test]
    fn test_missing_tool_is_failure_not_error() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::NotInstalled);

        let outcome = c.render("fig1", BODY, "p", Variant::Tikz).unwrap();
        let RenderStatus::Failed(failure) = outcome.status else {
            panic!("expected failure");
        };
        assert_eq!(failure.stage, Stage::Compile);
        assert_eq!(failure.exit_code, None);
        assert!(failure.detail.contains("pdflatex"));
        assert_eq!(
            outcome.markup,
            "<embed src=\"/svg/p/fig1.svg\" type=\"image/svg+xml\" />"
        );
    }

    #[test]
    fn test_invalid_job_is_error() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);

        assert!(matches!(
            c.render("   ", BODY, "p", Variant::Tikz),
            Err(DiagramError::InvalidName(_))
        ));
        assert!(matches!(
            c.render("fig", BODY, "../outside", Variant::Tikz),
            Err(DiagramError::InvalidPageId(_))
        ));
        assert_eq!(c.runner().call_count(), 0);
    }

    #[test]
    fn test_unwritable_tmp_root_is_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("_tikz_tmp");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let c = compiler(dir.path(), Mode::Ok);
        let err = c.render("fig", BODY, "p", Variant::Tikz).unwrap_err();
        assert!(matches!(err, DiagramError::Io(..)));
    }

    #[test]
    fn test_concurrent_renders_build_once() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| c.render("fig1", BODY, "p", Variant::Tikz).unwrap());
            }
        });

        assert_eq!(c.runner().compiles.load(Ordering::SeqCst), 1);
        assert_eq!(c.runner().call_count(), 2);
    }

    /// Behaves like the real tools: inputs are resolved against the process
    /// working directory and must exist, the PDF lands in `-output-directory`.
    struct PathCheckingRunner;

    impl ProcessRunner for PathCheckingRunner {
        fn run(&self, cmd: &Cmd) -> anyhow::Result<ProcessOutput> {
            let args: Vec<PathBuf> = cmd.get_args().iter().map(PathBuf::from).collect();
            let missing = |path: &Path| ProcessOutput {
                success: false,
                code: Some(1),
                stdout: format!("! I can't find file {}", path.display()),
                stderr: String::new(),
            };

            if cmd.program_name() == "pdflatex" {
                let tex = &args[args.len() - 1];
                if !tex.is_file() {
                    return Ok(missing(tex));
                }
                let out_dir = args
                    .iter()
                    .find_map(|a| a.to_str()?.strip_prefix("-output-directory="))
                    .map(PathBuf::from)
                    .unwrap();
                fs::write(out_dir.join(tex.file_name().unwrap()).with_extension("pdf"), "%PDF")?;
            } else {
                if !args[0].is_file() {
                    return Ok(missing(&args[0]));
                }
                fs::write(&args[1], "<svg/>")?;
            }
            Ok(ProcessOutput {
                success: true,
                code: Some(0),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_relative_roots_build() {
        let dir = TempDir::new_in(".").unwrap();
        let cwd = std::env::current_dir().unwrap();
        let relative = dir.path().strip_prefix(&cwd).unwrap();
        assert!(relative.is_relative());

        let c = DiagramCompiler::with_runner(settings(relative), PathCheckingRunner);
        let outcome = c.render("fig", BODY, "p", Variant::Tikz).unwrap();

        assert!(
            matches!(outcome.status, RenderStatus::Built { .. }),
            "{:?}",
            outcome.status
        );
        assert!(relative.join("svg/p/fig.svg").is_file());
        assert!(relative.join("_tikz_tmp/p/fig.pdf").is_file());
    }

    #[test]
    fn test_tikz_compile_has_no_interaction_flag() {
        let dir = TempDir::new().unwrap();
        let c = compiler(dir.path(), Mode::Ok);
        c.render("a", BODY, "p", Variant::Tikz).unwrap();

        let calls = c.runner().calls();
        assert_eq!(calls[0].1.len(), 2);
        assert!(calls[0].1.iter().all(|a| !a.is_empty() && !a.starts_with("-interaction")));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(RenderStatus::Cached.to_string(), "cached");
        let failed = RenderStatus::Failed(BuildFailure {
            stage: Stage::Compile,
            exit_code: Some(1),
            detail: String::new(),
        });
        assert_eq!(failed.to_string(), "compile failed");
    }

    #[test]
    fn test_compile_detail_fallback_to_stderr_tail() {
        let output = ProcessOutput {
            success: false,
            code: Some(1),
            stdout: "noise\n".into(),
            stderr: (0..20).map(|i| format!("line {i}\n")).collect(),
        };
        let detail = compile_detail(&output);
        assert_eq!(detail.lines().count(), DETAIL_TAIL);
        assert!(detail.ends_with("line 19"));
    }

    #[test]
    fn test_failure_display() {
        let failure = BuildFailure {
            stage: Stage::Convert,
            exit_code: Some(2),
            detail: "bad pdf".into(),
        };
        assert_eq!(failure.to_string(), "convert failed (exit code 2)\nbad pdf");
    }
}
