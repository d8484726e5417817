//! Preprocess command - convert a directory of replays to JSON Lines
//!
//! Files are parsed on a rayon pool. A file that is not a supported replay,
//! or is a damaged one, is logged and skipped; the batch carries on.

use anyhow::{Context, Result};
use aoe2rec_core::{Replay, ReplayParser};
use clap::Args;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::config::{Config, PreprocessSection};
use crate::output::{Layout, write_jsonl};

/// Arguments for the preprocess command
#[derive(Args)]
pub struct PreprocessArgs {
    /// Directory to search for replays (recursively)
    #[arg(long)]
    pub input: PathBuf,

    /// Directory for the .jsonl files
    #[arg(long)]
    pub output: PathBuf,

    /// Worker threads (default: one per CPU)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// One line per event, or one line per file
    #[arg(long, value_enum)]
    pub layout: Option<Layout>,

    /// Config file (defaults to ./aoe2rec.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fail if no file could be converted
    #[arg(long)]
    pub strict: bool,
}

/// What happened to one input file
#[derive(Debug)]
enum Outcome {
    Processed { output: PathBuf, events: usize },
    Skipped(String),
    Failed(String),
}

/// Per-file results, sorted by input path
#[derive(Debug, Default)]
struct Summary {
    results: Vec<(PathBuf, Outcome)>,
}

impl Summary {
    fn processed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Processed { .. }))
    }

    fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|(_, o)| pred(o)).count()
    }

    fn print(&self) {
        println!("=== Preprocess ===");
        for (path, outcome) in &self.results {
            match outcome {
                Outcome::Processed { output, events } => println!(
                    "  ok      {} -> {} ({} events)",
                    path.display(),
                    output.display(),
                    events
                ),
                Outcome::Skipped(reason) => println!("  skipped {}: {}", path.display(), reason),
                Outcome::Failed(reason) => println!("  failed  {}: {}", path.display(), reason),
            }
        }
        println!(
            "  {} processed, {} skipped, {} failed",
            self.processed(),
            self.skipped(),
            self.failed()
        );
    }
}

/// Execute the preprocess command
pub fn execute(args: PreprocessArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let layout = args.layout.unwrap_or(config.preprocess.layout);
    let jobs = args.jobs.unwrap_or(config.preprocess.jobs);
    let parser = ReplayParser::new(config.parse);

    let summary = run(
        &args.input,
        &args.output,
        &parser,
        &config.preprocess,
        layout,
        jobs,
    )?;
    summary.print();

    if summary.failed() > 0 {
        anyhow::bail!("{} file(s) could not be read or written", summary.failed());
    }
    if args.strict && summary.processed() == 0 {
        anyhow::bail!("No replays were converted from {}", args.input.display());
    }
    Ok(())
}

fn run(
    input: &Path,
    output: &Path,
    parser: &ReplayParser,
    section: &PreprocessSection,
    layout: Layout,
    jobs: usize,
) -> Result<Summary> {
    let files = collect_inputs(input, section)?;
    tracing::info!("Found {} replay file(s) in {}", files.len(), input.display());

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to build worker pool")?;

    let plan = plan_outputs(input, output, &files);
    let mut results: Vec<(PathBuf, Outcome)> = pool.install(|| {
        plan.par_iter()
            .map(|(path, target)| {
                let outcome = match target {
                    Some(target) => process_file(parser, path, target, layout),
                    None => {
                        tracing::warn!("Skipping {}: output name collides", path.display());
                        Outcome::Skipped("output name collides with another input".into())
                    }
                };
                (path.clone(), outcome)
            })
            .collect()
    });
    results.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(Summary { results })
}

/// Every file under `input` with a configured extension
fn collect_inputs(input: &Path, section: &PreprocessSection) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        anyhow::bail!("Input directory not found: {}", input.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && section.matches(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// `<output>/<relative dir>/<stem>.jsonl`
fn output_path(input: &Path, output: &Path, file: &Path) -> PathBuf {
    let relative = file.strip_prefix(input).unwrap_or(file);
    let mut target = output.join(relative);
    target.set_extension("jsonl");
    target
}

/// `<output>/<relative dir>/<file name>.jsonl`
fn output_path_with_extension(input: &Path, output: &Path, file: &Path) -> PathBuf {
    let relative = file.strip_prefix(input).unwrap_or(file);
    let mut name = relative.as_os_str().to_os_string();
    name.push(".jsonl");
    output.join(name)
}

/// Pair every input with a distinct target.
///
/// Inputs sharing a stem (`game.mgz`, `game.rec`) keep their extension in
/// the output name. An input whose target is still taken gets `None`.
fn plan_outputs(
    input: &Path,
    output: &Path,
    files: &[PathBuf],
) -> Vec<(PathBuf, Option<PathBuf>)> {
    let mut stems: HashMap<PathBuf, usize> = HashMap::new();
    for file in files {
        *stems.entry(output_path(input, output, file)).or_default() += 1;
    }

    let targets: Vec<PathBuf> = files
        .iter()
        .map(|file| {
            let target = output_path(input, output, file);
            if stems[&target] > 1 {
                output_path_with_extension(input, output, file)
            } else {
                target
            }
        })
        .collect();

    let mut taken: HashMap<&Path, usize> = HashMap::new();
    for target in &targets {
        *taken.entry(target.as_path()).or_default() += 1;
    }

    files
        .iter()
        .zip(&targets)
        .map(|(file, target)| {
            let target = (taken[target.as_path()] == 1).then(|| target.clone());
            (file.clone(), target)
        })
        .collect()
}

fn process_file(parser: &ReplayParser, path: &Path, target: &Path, layout: Layout) -> Outcome {
    let name = path.display();

    let replay = match parser.parse_path(path) {
        Ok(replay) => replay,
        Err(e) if e.is_skippable() => {
            tracing::warn!("Skipping {name}: {e}");
            return Outcome::Skipped(e.to_string());
        }
        Err(e) => {
            tracing::error!("Failed to read {name}: {e}");
            return Outcome::Failed(e.to_string());
        }
    };

    match write_output(target, &replay, layout) {
        Ok(_) => {
            tracing::debug!("Converted {name} ({} events)", replay.events().len());
            Outcome::Processed {
                output: target.to_path_buf(),
                events: replay.events().len(),
            }
        }
        Err(e) => {
            tracing::error!("Failed to write {}: {e:#}", target.display());
            Outcome::Failed(format!("{e:#}"))
        }
    }
}

/// Lines are staged in a temporary file next to `target` and moved into
/// place only once complete, so a failed write leaves nothing behind.
fn write_output(target: &Path, replay: &Replay, layout: Layout) -> Result<usize> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create a temporary file in {}", parent.display()))?;
    let lines = write_jsonl(BufWriter::new(staged.as_file_mut()), replay, layout)?;
    staged
        .persist(target)
        .with_context(|| format!("Failed to move output into {}", target.display()))?;
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoe2rec_core::{Event, encode_events, write_gzip};
    use tempfile::TempDir;

    fn good_replay() -> Vec<u8> {
        let events = vec![Event::new(1000, "Alice", "move"), Event::new(2000, "Bob", "attack")];
        write_gzip(Vec::new(), &encode_events(&events).unwrap()).unwrap()
    }

    fn corrupt_replay() -> Vec<u8> {
        // count=1, timestamp, player length 3, only two payload bytes
        let mut raw = 1u32.to_le_bytes().to_vec();
        raw.extend_from_slice(&1000u32.to_le_bytes());
        raw.push(3);
        raw.extend_from_slice(b"Al");
        raw
    }

    fn run_default(input: &Path, output: &Path) -> Summary {
        run(
            input,
            output,
            &ReplayParser::default(),
            &PreprocessSection::default(),
            Layout::Events,
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_good_foreign_and_corrupt_files() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(input.path().join("good.aoe2record"), good_replay()).unwrap();
        fs::write(input.path().join("foreign.mgz"), b"PK\x03\x04 this is a zip archive").unwrap();
        fs::write(input.path().join("corrupt.rec"), corrupt_replay()).unwrap();
        fs::write(input.path().join("readme.txt"), b"not even considered").unwrap();

        let summary = run_default(input.path(), output.path());
        assert_eq!(summary.processed(), 1);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.failed(), 0);

        let jsonl = fs::read_to_string(output.path().join("good.jsonl")).unwrap();
        assert_eq!(jsonl.lines().count(), 2);
        assert!(!output.path().join("foreign.jsonl").exists());
        assert!(!output.path().join("corrupt.jsonl").exists());
    }

    #[test]
    fn test_summary_sorted_by_path() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        for name in ["c.mgz", "a.mgz", "b.mgz"] {
            fs::write(input.path().join(name), good_replay()).unwrap();
        }

        let summary = run_default(input.path(), output.path());
        let names: Vec<_> = summary
            .results
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.mgz", "b.mgz", "c.mgz"]);
    }

    #[test]
    fn test_nested_directories_are_mirrored() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::create_dir_all(input.path().join("2024/ranked")).unwrap();
        fs::write(input.path().join("2024/ranked/game.mgz"), good_replay()).unwrap();

        let summary = run_default(input.path(), output.path());
        assert_eq!(summary.processed(), 1);
        assert!(output.path().join("2024/ranked/game.jsonl").is_file());
    }

    #[test]
    fn test_missing_input_dir() {
        let output = TempDir::new().unwrap();
        let result = run(
            Path::new("/no/such/replays"),
            output.path(),
            &ReplayParser::default(),
            &PreprocessSection::default(),
            Layout::Events,
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_same_stem_inputs_keep_their_extension() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let long: Vec<_> = (0..2000)
            .map(|i| Event::new(i, "Alice", "move"))
            .collect();
        let long = write_gzip(Vec::new(), &encode_events(&long).unwrap()).unwrap();
        fs::write(input.path().join("game.mgz"), long).unwrap();
        fs::write(input.path().join("game.rec"), good_replay()).unwrap();

        let summary = run_default(input.path(), output.path());
        assert_eq!(summary.processed(), 2);
        assert!(!output.path().join("game.jsonl").exists());

        let mgz = fs::read_to_string(output.path().join("game.mgz.jsonl")).unwrap();
        let rec = fs::read_to_string(output.path().join("game.rec.jsonl")).unwrap();
        assert_eq!(mgz.lines().count(), 2000);
        assert_eq!(rec.lines().count(), 2);
    }

    #[test]
    fn test_unresolvable_collision_is_skipped() {
        // "game.mgz.rec" has stem "game.mgz", the same as "game.mgz"'s full name
        let files = vec![
            PathBuf::from("/in/game.mgz"),
            PathBuf::from("/in/game.rec"),
            PathBuf::from("/in/game.mgz.rec"),
            PathBuf::from("/in/solo.mgz"),
        ];
        let plan = plan_outputs(Path::new("/in"), Path::new("/out"), &files);
        let targets: Vec<_> = plan.into_iter().map(|(_, target)| target).collect();
        assert_eq!(
            targets,
            [
                None,
                Some(PathBuf::from("/out/game.rec.jsonl")),
                None,
                Some(PathBuf::from("/out/solo.jsonl")),
            ]
        );
    }

    #[test]
    fn test_failed_write_leaves_no_partial_output() {
        let output = TempDir::new().unwrap();
        // A directory squatting on the target makes the final move fail
        let target = output.path().join("game.jsonl");
        fs::create_dir(&target).unwrap();

        let replay = Replay::Events(vec![Event::new(1000, "Alice", "move")]);
        assert!(write_output(&target, &replay, Layout::Events).is_err());

        let entries: Vec<_> = fs::read_dir(output.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, ["game.jsonl"]);
        assert!(target.is_dir());
    }

    #[test]
    fn test_write_output_replaces_whole_file() {
        let output = TempDir::new().unwrap();
        let target = output.path().join("game.jsonl");
        fs::write(&target, "stale\n".repeat(10)).unwrap();

        let replay = Replay::Events(vec![Event::new(1000, "Alice", "move")]);
        assert_eq!(write_output(&target, &replay, Layout::Events).unwrap(), 1);
        assert_eq!(fs::read_to_string(&target).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_output_path() {
        let target = output_path(
            Path::new("/in"),
            Path::new("/out"),
            Path::new("/in/sub/game.aoe2record"),
        );
        assert_eq!(target, PathBuf::from("/out/sub/game.jsonl"));
    }
}
