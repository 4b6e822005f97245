//! Bulk examiner for Windows shell link files: one indented text report per
//! file, or one csv/tsv row per file for spreadsheet review.

mod report;
mod table;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum, ValueHint};
use lnkspect::ShellLinkFile;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Hierarchical key: value report.
    Txt,
    /// Comma separated values, one row per file.
    Csv,
    /// Tab separated values, one row per file.
    Tsv,
}

#[derive(Parser)]
#[clap(name = "lnkspect", author, version, about = "A forensic examiner for Windows shell link (.lnk) files", long_about = None)]
struct Cli {
    #[clap(value_hint = ValueHint::AnyPath, required = true, help = "link file(s), or a single directory to sweep")]
    paths: Vec<PathBuf>,

    /// shortened output: omit offsets, sizes, reserved fields, raw flag
    /// words and UUID version/variant detail
    #[clap(short = 's', long = "short")]
    short: bool,

    /// hunt for property stores inside ItemID payloads (full txt output
    /// only)
    #[clap(short = 'i', long = "idlist-stores")]
    idlist_stores: bool,

    /// output format
    #[clap(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Txt)]
    output: OutputFormat,

    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _ = TermLogger::init(
        cli.verbose.log_level_filter(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let files = expand_paths(&cli.paths)?;
    let mut out = io::stdout().lock();
    let mut rendered = 0usize;

    for path in &files {
        match ShellLinkFile::open(path) {
            Ok(link) => {
                emit(&mut out, &cli, path, &link, rendered)?;
                rendered += 1;
            }
            // A single damaged file must not end the sweep.
            Err(err) => eprintln!("lnkspect: {}: {err}", path.display()),
        }
    }
    Ok(())
}

fn emit(
    out: &mut impl Write,
    cli: &Cli,
    path: &std::path::Path,
    link: &ShellLinkFile,
    rendered: usize,
) -> io::Result<()> {
    match cli.output {
        OutputFormat::Txt => report::write_report(
            out,
            path,
            link,
            &report::Options {
                short: cli.short,
                idlist_stores: cli.idlist_stores && !cli.short,
            },
        ),
        OutputFormat::Csv | OutputFormat::Tsv => {
            let csv = cli.output == OutputFormat::Csv;
            let sep = if csv { ',' } else { '\t' };
            let record = table::record(&path.display().to_string(), link, cli.short);
            if rendered == 0 {
                table::write_names(out, &record, sep)?;
            }
            table::write_values(out, &record, sep, csv)
        }
    }
}

/// Either one directory (all regular files inside, in name order) or one or
/// more explicit files; mixing the two is refused.
fn expand_paths(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    if paths.iter().any(|p| p.is_dir()) {
        anyhow::ensure!(
            paths.len() == 1,
            "a directory cannot be combined with other arguments"
        );
        let dir = &paths[0];
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("cannot read directory {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        Ok(files)
    } else {
        Ok(paths.to_vec())
    }
}
