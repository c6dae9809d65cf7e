//! bss-django - Bootstrap Studio export to Django migrator

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bss_django::convert::{ConvertOptions, Converter, MalformedPathPolicy};
use bss_django::project::{self, MigrationConfig, Owner, Relocation, RelocationKind};

#[derive(Parser)]
#[command(name = "bss-django")]
#[command(version, about = "Bootstrap Studio export to Django migrator", long_about = None)]
#[command(after_help = "EXAMPLES:
    bss-django convert index.html              Convert a page in place
    bss-django convert index.html -o out.html  Convert to another file
    bss-django plan --export site --project mysite
    bss-django migrate --export site --project mysite")]
struct Cli {
    /// Log every rewrite (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert exported pages to Django templates
    Convert {
        /// Pages to convert
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Output file, or directory when converting several pages
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        convert: ConvertArgs,
    },
    /// Show where export folders would be copied
    Plan {
        #[command(flatten)]
        paths: ProjectArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert an export and copy it into a Django project
    Migrate {
        #[command(flatten)]
        paths: ProjectArgs,

        #[command(flatten)]
        convert: ConvertArgs,

        /// Plan only, touch nothing
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Fail a page on asset paths too short to remap instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Spaces per nesting level
    #[arg(long, value_name = "N", default_value_t = 1)]
    indent: usize,
}

impl ConvertArgs {
    fn options(&self) -> ConvertOptions {
        let policy = if self.strict {
            MalformedPathPolicy::Fail
        } else {
            MalformedPathPolicy::Skip
        };
        ConvertOptions::default()
            .with_indent(self.indent)
            .with_malformed_paths(policy)
    }
}

#[derive(Args)]
struct ProjectArgs {
    /// Bootstrap Studio export directory
    #[arg(long, value_name = "DIR")]
    export: PathBuf,

    /// Django project root
    #[arg(long, value_name = "DIR", env = "DJANGO_PROJECT")]
    project: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Convert {
            files,
            output,
            convert,
        } => convert_files(&files, output.as_deref(), convert.options()),
        Command::Plan { paths, json } => show_plan(&paths, json),
        Command::Migrate {
            paths,
            convert,
            dry_run,
            json,
        } => {
            let config = MigrationConfig::new(&paths.export, &paths.project)
                .with_convert_options(convert.options());
            if dry_run {
                show_plan(&paths, json)
            } else {
                run_migration(&config, json)
            }
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Returns whether every page converted.
fn convert_files(
    files: &[PathBuf],
    output: Option<&Path>,
    options: ConvertOptions,
) -> Result<bool, String> {
    let converter = Converter::new(options);
    let mut ok = true;

    for file in files {
        let dest = match output {
            None => file.clone(),
            Some(out) if files.len() == 1 => out.to_path_buf(),
            Some(dir) => match file.file_name() {
                Some(name) => dir.join(name),
                None => {
                    eprintln!("error: {} has no file name", file.display());
                    ok = false;
                    continue;
                }
            },
        };

        match converter.convert_file(file, &dest) {
            Ok(stats) => {
                println!("{} -> {} ({} rewrites)", file.display(), dest.display(), stats.rewrites());
                for skipped in &stats.skipped {
                    println!("  skipped asset path: {skipped}");
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                ok = false;
            }
        }
    }
    Ok(ok)
}

fn show_plan(paths: &ProjectArgs, json: bool) -> Result<bool, String> {
    let config = MigrationConfig::new(&paths.export, &paths.project);
    let applications = project::discover_applications(&config.project_root).map_err(|e| e.to_string())?;
    let relocations = project::plan(&config, &applications).map_err(|e| e.to_string())?;

    if json {
        let text = serde_json::to_string_pretty(&relocations).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        let names: Vec<&str> = applications.iter().map(|a| a.name.as_str()).collect();
        println!("Applications: {}", names.join(", "));
        print_relocations(&relocations);
    }
    Ok(true)
}

fn run_migration(config: &MigrationConfig, json: bool) -> Result<bool, String> {
    let report = project::migrate(config).map_err(|e| e.to_string())?;

    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        let conversion = &report.conversion;
        println!(
            "Pages: {} converted, {} already converted, {} failed",
            conversion.converted.len(),
            conversion.already_converted.len(),
            conversion.failed.len()
        );
        for failure in &conversion.failed {
            println!("  {}: {}", failure.path.display(), failure.message);
        }
        print_relocations(&report.relocations);
        println!("Files copied: {}", report.files_copied);
    }
    Ok(report.is_success())
}

fn print_relocations(relocations: &[Relocation]) {
    for relocation in relocations {
        let kind = match &relocation.kind {
            RelocationKind::Markup => "html".to_string(),
            RelocationKind::Asset(category) => category.clone(),
        };
        let owner = match &relocation.owner {
            Owner::Application(name) => name.as_str(),
            Owner::Common => "common",
        };
        println!(
            "{kind:>5} [{owner}] {} -> {}",
            relocation.source.display(),
            relocation.destination.display()
        );
    }
}
