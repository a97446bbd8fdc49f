use clap::Parser;
use foldpdf::config::{self, Overrides};
use foldpdf::imaging::{PageSize, QualityPreset};
use foldpdf::logging::{self, LogConfig};
use foldpdf::writer::{DocumentMetadata, PdfWriter};
use foldpdf::{compile, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "foldpdf")]
#[command(about = "Bind folders of PDFs and images into one PDF with a folder-shaped outline")]
#[command(long_about = "\
Bind folders of PDFs and images into one PDF with a folder-shaped outline

Folders become outline sections, files become pages. Files and folders are
bound in name order unless a folder says otherwise.

Folder conventions (dotfiles inside a folder):

  .ignore   skip this folder and everything below it
  .title    outline title for this folder (plain text)
  .order    names of children to put first, one per line
  .label    outline titles for files, one `name = title` per line
  .dpi      resolution for images in this folder and below (e.g. 300)

A foldpdf.toml in the root folder supplies defaults for the options below;
run 'foldpdf --gen-config' to print a documented one.

Examples:

  foldpdf my_docs/ -o my_docs.pdf
  foldpdf services/ -o service.pdf -x 'temp' -i 'cars'")]
#[command(version)]
struct Cli {
    /// Root folder to bind
    #[arg(required_unless_present = "gen_config")]
    root: Option<PathBuf>,

    /// Output PDF file (a .pdf extension is enforced)
    #[arg(short, long, value_name = "FILE", default_value = "output.pdf")]
    output: PathBuf,

    /// Show what would be bound without creating output
    #[arg(long)]
    dry_run: bool,

    /// Write log messages to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Include only paths matching a regular expression (repeatable)
    #[arg(short, long, value_name = "REGEX", help_heading = "Selection")]
    include: Vec<String>,

    /// Exclude paths matching a regular expression (repeatable)
    #[arg(short = 'x', long, value_name = "REGEX", help_heading = "Selection")]
    exclude: Vec<String>,

    /// Replace underscores and capitalise outline titles without a label
    #[arg(short, long, help_heading = "Pages and outline")]
    pretty: bool,

    /// Image resolution preset: low (150 dpi), medium (300), high (600)
    #[arg(short, long, value_enum, help_heading = "Pages and outline")]
    quality: Option<QualityPreset>,

    /// Image resolution in dpi, overrides --quality
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(1..=config::MAX_DPI as i64),
        help_heading = "Pages and outline"
    )]
    dpi: Option<u32>,

    /// Page size images are centred on
    #[arg(long, value_enum, help_heading = "Pages and outline")]
    page: Option<PageSize>,

    /// PDF title (defaults to the root folder's name)
    #[arg(short, long, value_name = "STR", help_heading = "Metadata")]
    title: Option<String>,

    /// PDF author
    #[arg(short, long, value_name = "STR", help_heading = "Metadata")]
    author: Option<String>,

    /// PDF subject
    #[arg(short, long, value_name = "STR", help_heading = "Metadata")]
    subject: Option<String>,

    /// PDF keywords (comma-separated)
    #[arg(short, long, value_name = "STR", help_heading = "Metadata")]
    keywords: Option<String>,

    /// Print the plan (with --dry-run) or the compile report as JSON
    #[arg(long)]
    json: bool,

    /// Print a stock foldpdf.toml with all options documented
    #[arg(long)]
    gen_config: bool,

    /// Debug logging and the full outline after a compile
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            page_size: self.page,
            quality: self.quality,
            dpi: self.dpi,
            pretty_labels: self.pretty,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            metadata: DocumentMetadata {
                title: self.title.clone(),
                author: self.author.clone(),
                subject: self.subject.clone(),
                keywords: self.keywords.clone(),
                creator: None,
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }
    let root = cli.root.clone().ok_or("a root folder is required")?;

    logging::init_logging(LogConfig {
        verbose: cli.verbose,
        log_file: cli.log.as_deref(),
    })?;

    let config = config::load_config(&root)?.with_overrides(cli.overrides());
    config.validate()?;
    let options = config.compile_options(cli.output.clone());

    if cli.dry_run {
        let entries = compile::plan(&root, &options)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            output::print_plan(&entries);
        }
        return Ok(());
    }

    init_thread_pool(&config.processing);
    let materializer = config.materializer();
    let mut writer = PdfWriter::new();
    let report = compile::compile(&root, &options, &materializer, &mut writer)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if cli.verbose {
        output::print_outline(report.outline());
    }
    output::print_summary(&report);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
