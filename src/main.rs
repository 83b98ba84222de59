use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use loctag::ai::{GenerationMode, TagGenerationClientBuilder};
use loctag::models::UnknownCategory;
use loctag::tags::{
    TagError, TagNormalizer, UsageSort, default_merge_target, filter_analyses, filter_usage,
    locations_using, word_stats,
};
use loctag::utils::ensure_database_directory;
use loctag::{
    BatchReport, Category, CleanupOutcome, Config, Database, LocationAnalysis, LocationError,
    LocationId, TagService, TagUsage,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// loctag - tag maintenance for a travel-location catalogue
#[derive(Parser)]
#[command(name = "loctag")]
#[command(about = "Clean, merge and generate tags on travel locations")]
#[command(version)]
struct Cli {
    /// Log every location touched
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Import locations from a JSON array file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print every location as a JSON array
    Export,
    /// Show how many locations use each tag of a category
    Usage(UsageCommand),
    /// Show the most frequent words in a category's tags
    Words {
        #[arg(short, long)]
        category: Category,
    },
    /// List locations with repeated tags
    Duplicates {
        /// Case-insensitive location name filter
        #[arg(short, long)]
        filter: Option<String>,

        /// Include locations without duplicates
        #[arg(long)]
        all: bool,
    },
    /// Remove repeated tags, keeping each in its highest-priority category
    Cleanup {
        /// Location to clean
        #[arg(value_name = "ID", required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Clean every location that has duplicates
        #[arg(long)]
        all: bool,
    },
    /// Rename a tag on every location that uses it
    Rename {
        #[arg(short, long)]
        category: Category,
        old: String,
        new: String,
    },
    /// Merge several tags of a category into one
    Merge(MergeCommand),
    /// Remove a tag from every location that uses it
    DeleteTag {
        #[arg(short, long)]
        category: Category,
        tag: String,
    },
    /// Generate tags for a location and store them
    Suggest {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(short, long, value_enum, default_value_t = ModeArg::Seo)]
        mode: ModeArg,

        #[arg(short, long, default_value = "it")]
        language: String,
    },
    /// Fold duplicate location records into one master record
    MergeLocations {
        #[arg(value_name = "MASTER")]
        master: String,

        #[arg(value_name = "SOURCE", required = true)]
        sources: Vec<String>,
    },
    /// Delete a location and its details
    DeleteLocation {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Parser)]
struct UsageCommand {
    #[arg(short, long)]
    category: Category,

    /// Case-insensitive substring filter on tag text
    #[arg(short, long, default_value = "")]
    filter: String,

    #[arg(short, long, value_enum, default_value_t = SortArg::Count)]
    sort: SortArg,
}

#[derive(Parser)]
struct MergeCommand {
    #[arg(short, long)]
    category: Category,

    /// Destination tag; defaults to the most used source
    #[arg(long, value_name = "TAG")]
    into: Option<String>,

    /// Tags to merge
    #[arg(value_name = "TAG", num_args = 2.., required = true)]
    tags: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Count,
    Alpha,
}

impl From<SortArg> for UsageSort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Count => UsageSort::Count,
            SortArg::Alpha => UsageSort::Alpha,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Seo,
    Wizard,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Seo => GenerationMode::Seo,
            ModeArg::Wizard => GenerationMode::Wizard,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Config::from_env().and_then(|config| run(cli.command, &config));

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "info,loctag=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are rejected input such as blank tag names or unknown
/// locations. Store and network failures are internal errors.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.is::<TagError>() || cause.is::<LocationError>() || cause.is::<UnknownCategory>()
    })
}

fn open_service(config: &Config) -> Result<TagService> {
    ensure_database_directory(&config.database_path)?;
    let db = Database::open(&config.database_path).context("Failed to open database")?;
    Ok(TagService::new(db))
}

fn run(command: Commands, config: &Config) -> Result<()> {
    let service = open_service(config)?;

    match command {
        Commands::Import { file } => execute_import(&service, &file),
        Commands::Export => execute_export(&service),
        Commands::Usage(cmd) => execute_usage(&service, &cmd),
        Commands::Words { category } => execute_words(&service, category),
        Commands::Duplicates { filter, all } => {
            execute_duplicates(&service, filter.as_deref().unwrap_or_default(), all)
        }
        Commands::Cleanup { id, all } => execute_cleanup(&service, id.as_deref(), all),
        Commands::Rename { category, old, new } => execute_rename(&service, category, &old, &new),
        Commands::Merge(cmd) => execute_merge(&service, &cmd),
        Commands::DeleteTag { category, tag } => execute_delete_tag(&service, category, &tag),
        Commands::Suggest { id, mode, language } => {
            execute_suggest(&service, config, &id, mode.into(), &language)
        }
        Commands::MergeLocations { master, sources } => {
            execute_merge_locations(&service, &master, &sources)
        }
        Commands::DeleteLocation { id } => {
            service.delete_location(&LocationId::new(id.as_str()))?;
            println!("Location {id} deleted");
            Ok(())
        }
    }
}

fn execute_import(service: &TagService, file: &Path) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let documents: Vec<serde_json::Value> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of locations", file.display()))?;

    let imported = service.import_locations(documents)?;
    println!("Imported {imported} locations");
    Ok(())
}

fn execute_export(service: &TagService) -> Result<()> {
    let documents = service.export_locations()?;
    println!("{}", serde_json::to_string_pretty(&documents)?);
    Ok(())
}

fn execute_usage(service: &TagService, cmd: &UsageCommand) -> Result<()> {
    let usage = service.tag_usage(cmd.category)?;
    let rows = filter_usage(&usage, &cmd.filter, cmd.sort.into());
    print!("{}", render_usage(&rows));
    Ok(())
}

fn execute_words(service: &TagService, category: Category) -> Result<()> {
    let usage = service.tag_usage(category)?;
    for (word, count) in word_stats(&usage) {
        println!("{count:>5}  {word}");
    }
    Ok(())
}

fn execute_duplicates(service: &TagService, filter: &str, all: bool) -> Result<()> {
    let analyses = service.analyze_duplicates()?;
    let shown = filter_analyses(&analyses, filter, !all);
    if shown.is_empty() {
        println!("No locations with duplicate tags");
    }
    for analysis in shown {
        print!("{}", render_analysis(analysis));
    }
    Ok(())
}

fn execute_cleanup(service: &TagService, id: Option<&str>, all: bool) -> Result<()> {
    if all {
        let report = service.cleanup_all()?;
        return print_report(&report);
    }

    let Some(id) = id else {
        anyhow::bail!("Either a location id or --all is required");
    };
    match service.cleanup_location(&LocationId::new(id))? {
        CleanupOutcome::Cleaned(categories) => {
            let names: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
            println!("Cleaned {id}: {}", names.join(", "));
        }
        CleanupOutcome::AlreadyClean => println!("{id} has no duplicate tags"),
        CleanupOutcome::Missing => return Err(LocationError::NotFound(id.into()).into()),
    }
    Ok(())
}

/// Distinct ids of the locations listed under `tag` in a usage table.
fn usage_ids(usage: &[TagUsage], tag: &str) -> Vec<LocationId> {
    locations_using(usage, &HashSet::from([tag.to_string()]))
}

fn execute_rename(service: &TagService, category: Category, old: &str, new: &str) -> Result<()> {
    let usage = service.tag_usage(category)?;
    let report = service.rename_tag(category, old, new, &usage_ids(&usage, old))?;
    print_report(&report)
}

fn execute_merge(service: &TagService, cmd: &MergeCommand) -> Result<()> {
    let usage = service.tag_usage(cmd.category)?;
    let selected: HashSet<String> = cmd.tags.iter().cloned().collect();

    let destination = match &cmd.into {
        Some(destination) => destination.clone(),
        None => default_merge_target(&usage, &selected).ok_or(TagError::NoCandidates)?,
    };

    let report = service.merge_tags(cmd.category, &cmd.tags, &destination, &usage)?;
    println!("Merged into \"{}\"", destination.trim());
    print_report(&report)
}

fn execute_delete_tag(service: &TagService, category: Category, tag: &str) -> Result<()> {
    let usage = service.tag_usage(category)?;
    let report = service.delete_tag(category, tag, &usage_ids(&usage, tag))?;
    print_report(&report)
}

fn execute_suggest(
    service: &TagService,
    config: &Config,
    id: &str,
    mode: GenerationMode,
    language: &str,
) -> Result<()> {
    let client = TagGenerationClientBuilder::new()
        .base_url(config.ai_base_url.as_str())
        .timeout(config.ai_timeout)
        .build()?;

    let written = service.suggest_tags(&LocationId::new(id), &client, mode, language, &config.matcher)?;
    for (category, tags) in written.iter() {
        let labels = match mode {
            GenerationMode::Wizard => TagNormalizer::canonical_labels(tags),
            GenerationMode::Seo => tags.to_vec(),
        };
        println!("{category}: {}", labels.join(", "));
    }
    Ok(())
}

fn execute_merge_locations(service: &TagService, master: &str, sources: &[String]) -> Result<()> {
    let sources: Vec<LocationId> = sources.iter().map(|id| LocationId::new(id.as_str())).collect();
    let report = service.merge_locations(&LocationId::new(master), &sources)?;

    println!("Merged {} locations into {master}", report.merged.len());
    for skipped in &report.skipped {
        println!("Skipped {skipped}: not found");
    }
    Ok(())
}

/// Prints a batch summary, failing when the batch stopped early.
fn print_report(report: &BatchReport) -> Result<()> {
    println!("{}", capitalize(&report.to_string()));
    for (id, error) in &report.failed {
        eprintln!("Failed on {id}: {error}");
    }
    if !report.pending.is_empty() {
        let pending: Vec<&str> = report.pending.iter().map(LocationId::as_str).collect();
        eprintln!("Not attempted: {}", pending.join(", "));
    }

    if report.is_complete() {
        Ok(())
    } else {
        anyhow::bail!("Batch stopped after a store error; earlier writes were kept")
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_usage(rows: &[&TagUsage]) -> String {
    rows.iter()
        .map(|usage| format!("{:>5}  {}\n", usage.count(), usage.tag()))
        .collect()
}

fn render_analysis(analysis: &LocationAnalysis) -> String {
    let mut out = format!(
        "{} ({}) - {} tags, {} duplicated\n",
        analysis.name,
        analysis.id,
        analysis.total_tags,
        analysis.duplicates.len()
    );
    for duplicate in &analysis.duplicates {
        let categories: Vec<&str> = duplicate.categories.iter().map(|c| c.as_str()).collect();
        out.push_str(&format!(
            "    {} x{}: {}\n",
            duplicate.tag,
            duplicate.count,
            categories.join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use loctag::DuplicateInfo;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn merge_requires_two_tags() {
        let result = Cli::try_parse_from(["loctag", "merge", "--category", "sport", "Ski"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_category_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["loctag", "usage", "--category", "food"]);
        assert!(result.is_err());
    }

    #[test]
    fn cleanup_needs_id_or_all() {
        assert!(Cli::try_parse_from(["loctag", "cleanup"]).is_err());
        assert!(Cli::try_parse_from(["loctag", "cleanup", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["loctag", "cleanup", "a", "--all"]).is_err());
    }

    #[test]
    fn category_argument_is_case_insensitive() {
        let cli = Cli::try_parse_from(["loctag", "words", "--category", " Sport "]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Words {
                category: Category::Sport
            }
        ));
    }

    #[test]
    fn tag_errors_are_user_errors() {
        let error = anyhow::Error::from(TagError::EmptyTagName).context("Rename failed");
        assert!(is_user_error(&error));
    }

    #[test]
    fn store_errors_are_internal_errors() {
        let error = anyhow::anyhow!("Database error: disk I/O error");
        assert!(!is_user_error(&error));
    }

    #[test]
    fn usage_ids_returns_empty_for_unknown_tag() {
        let service = TagService::new(Database::in_memory().unwrap());
        let usage = service.tag_usage(Category::Sport).unwrap();
        assert!(usage_ids(&usage, "Ski").is_empty());
    }

    #[test]
    fn render_analysis_lists_categories() {
        let analysis = LocationAnalysis {
            id: LocationId::new("cortina"),
            name: "Cortina".to_string(),
            total_tags: 3,
            duplicates: vec![DuplicateInfo {
                tag: "relax".to_string(),
                count: 2,
                categories: vec![Category::Vibe, Category::Highlights],
            }],
        };

        let out = render_analysis(&analysis);

        assert!(out.starts_with("Cortina (cortina) - 3 tags, 1 duplicated"));
        assert!(out.contains("relax x2: vibe, highlights"));
    }

    #[test]
    fn print_report_fails_when_batch_stopped() {
        let report = BatchReport {
            requested: 2,
            pending: vec![LocationId::new("b")],
            ..Default::default()
        };
        assert!(print_report(&report).is_err());
        assert!(print_report(&BatchReport::default()).is_ok());
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("updated 1 of 2"), "Updated 1 of 2");
        assert_eq!(capitalize(""), "");
    }
}
