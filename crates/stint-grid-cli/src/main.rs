use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use stint_grid::{
    generate_matrix, load_roster_file, parse_wall_clock, save_roster_file, DriverDraft,
    EventInfo, EventParameters, RaceDuration, Roster, RosterEditor, SpreadsheetExporter,
    TimezoneResolver, AMBIGUOUS_ABBREVIATIONS, DEFAULT_BLOCK_MINUTES,
    DEFAULT_GREEN_FLAG_OFFSET_MINUTES,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Endurance-race driver availability sheets", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a driver availability spreadsheet from a roster
    Sheet(SheetArgs),
    /// Create and edit roster files
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },
    /// List the timezone abbreviations the resolver understands
    Zones,
}

#[derive(Parser, Debug)]
struct SheetArgs {
    /// Roster CSV file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    roster: PathBuf,

    /// Published race start, GMT (HH:MM)
    #[arg(long)]
    start_gmt: String,

    /// Sim-time reference clock at the green flag (HH:MM)
    #[arg(long)]
    start_local: Option<String>,

    /// Minutes between the published start and the green flag
    #[arg(long, default_value_t = DEFAULT_GREEN_FLAG_OFFSET_MINUTES, allow_hyphen_values = true)]
    offset: i64,

    /// Time block size in minutes (15, 30, 45 or 60)
    #[arg(long, default_value_t = DEFAULT_BLOCK_MINUTES)]
    block: i64,

    /// GMT race date (YYYY-MM-DD); controls daylight-saving offsets
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Override the roster's race length (MINUTES, HH:MM or D:HH:MM)
    #[arg(long)]
    race_length: Option<String>,

    /// Output XLSX path
    #[arg(short, long, default_value = "driver_availability.xlsx", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Print the matrix as JSON instead of writing a spreadsheet
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum RosterAction {
    /// Create an empty roster file
    Init(InitArgs),
    /// Append a driver to a roster file
    ///
    /// Every driver already on the roster must have a resolvable timezone;
    /// a file with an unknown zone has to be fixed (or that driver removed)
    /// before other edits are saved.
    Add(AddArgs),
    /// Remove the driver at a 0-based position
    Remove {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        index: usize,
    },
    /// Print a roster file
    Show {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct InitArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// Race length (MINUTES, HH:MM or D:HH:MM)
    #[arg(long)]
    race_length: String,

    #[arg(long, default_value = "")]
    event_name: String,

    #[arg(long, default_value = "")]
    team_name: String,

    #[arg(long, default_value = "")]
    track: String,

    #[arg(long, default_value = "")]
    car: String,

    /// Overwrite an existing file
    #[arg(long, action = ArgAction::SetTrue)]
    force: bool,
}

#[derive(Parser, Debug)]
struct AddArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    #[arg(long)]
    name: String,

    #[arg(long)]
    irating: String,

    /// Timezone abbreviation (see `stint-grid zones`) or IANA name
    #[arg(long, default_value = "UTC")]
    timezone: String,

    #[arg(long, action = ArgAction::SetTrue)]
    back_to_back: bool,

    #[arg(long, action = ArgAction::SetTrue)]
    triple_stint: bool,

    /// Eligible to start the race
    #[arg(long, action = ArgAction::SetTrue)]
    start: bool,

    /// Eligible to finish the race
    #[arg(long, action = ArgAction::SetTrue)]
    finish: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let resolver = TimezoneResolver::default();
    match cli.command {
        Command::Sheet(args) => handle_sheet(args, &resolver),
        Command::Roster { action } => handle_roster(action, &resolver),
        Command::Zones => handle_zones(&resolver),
    }
}

fn handle_sheet(args: SheetArgs, resolver: &TimezoneResolver<'_>) -> Result<()> {
    let roster = load(&args.roster, resolver)?;
    if roster.drivers.is_empty() {
        bail!("roster {} has no drivers", args.roster.display());
    }

    let race_length = args
        .race_length
        .as_deref()
        .unwrap_or(&roster.event.race_length);
    let start_gmt = parse_wall_clock(&args.start_gmt)?;
    let start_local = args
        .start_local
        .as_deref()
        .map(parse_wall_clock)
        .transpose()?;

    let mut params =
        EventParameters::new(race_length, start_gmt, start_local, args.offset, args.block)?;
    if let Some(date) = args.date {
        params = params.with_race_date(date);
    }

    let matrix = generate_matrix(&params, &roster.drivers, resolver)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matrix)?);
        return Ok(());
    }

    SpreadsheetExporter::new()
        .save(&matrix, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        rows = matrix.rows.len(),
        drivers = matrix.drivers.len(),
        "wrote {}",
        args.output.display()
    );
    Ok(())
}

fn handle_roster(action: RosterAction, resolver: &TimezoneResolver<'_>) -> Result<()> {
    match action {
        RosterAction::Init(args) => {
            if args.file.exists() && !args.force {
                bail!("{} already exists (use --force to overwrite)", args.file.display());
            }
            RaceDuration::parse(&args.race_length)?;
            let roster = Roster {
                event: EventInfo {
                    event_name: args.event_name,
                    team_name: args.team_name,
                    track: args.track,
                    car: args.car,
                    race_length: args.race_length,
                },
                drivers: Vec::new(),
            };
            store(&roster, &args.file, resolver)?;
            info!("created {}", args.file.display());
        }
        RosterAction::Add(args) => {
            // Validate the label now so a typo is caught at entry time.
            resolver.resolve(&args.timezone)?;
            let mut editor = RosterEditor::new(load(&args.file, resolver)?);
            let index = editor.push_draft(DriverDraft {
                irating: args.irating,
                name: args.name,
                back_to_back_ok: args.back_to_back,
                triple_stint_ok: args.triple_stint,
                timezone: args.timezone,
                start_eligible: args.start,
                finish_eligible: args.finish,
            });
            let name = editor.commit(index)?.name().to_string();
            store_edited(editor.roster(), &args.file, resolver)?;
            info!(driver = %name, "added driver to {}", args.file.display());
        }
        RosterAction::Remove { file, index } => {
            let mut editor = RosterEditor::new(load(&file, resolver)?);
            let removed = editor.remove_driver(index)?;
            store_edited(editor.roster(), &file, resolver)?;
            info!(driver = %removed.name(), "removed driver from {}", file.display());
        }
        RosterAction::Show { file } => {
            let roster = load(&file, resolver)?;
            print_roster(&roster);
        }
    }
    Ok(())
}

fn handle_zones(resolver: &TimezoneResolver<'_>) -> Result<()> {
    println!("zone table v{}", resolver.table().version);
    for (abbrev, tz) in resolver.table().entries() {
        println!("{abbrev:<6} {}", tz.name());
    }
    println!();
    println!("ambiguous abbreviations:");
    for collision in AMBIGUOUS_ABBREVIATIONS {
        println!(
            "{:<6} {} (not {})",
            collision.abbrev,
            collision.chosen.name(),
            collision.shadowed
        );
    }
    Ok(())
}

fn print_roster(roster: &Roster) {
    let event = &roster.event;
    println!("Event:       {}", event.event_name);
    println!("Team:        {}", event.team_name);
    println!("Track:       {}", event.track);
    println!("Car:         {}", event.car);
    println!("Race Length: {}", event.race_length);
    println!();
    println!(
        "{:>3}  {:<20} {:>7}  {:<8} {:<3} {:<3} {:<5} {:<6}",
        "#", "Driver", "iRating", "Timezone", "B2B", "x3", "Start", "Finish"
    );
    for (i, d) in roster.drivers.iter().enumerate() {
        println!(
            "{:>3}  {:<20} {:>7}  {:<8} {:<3} {:<3} {:<5} {:<6}",
            i,
            d.name(),
            d.irating(),
            d.timezone_abbrev(),
            yes_no(d.back_to_back_ok()),
            yes_no(d.triple_stint_ok()),
            yes_no(d.start_eligible()),
            yes_no(d.finish_eligible()),
        );
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn load(path: &Path, resolver: &TimezoneResolver<'_>) -> Result<Roster> {
    load_roster_file(path, resolver).with_context(|| format!("failed to load {}", path.display()))
}

/// Save after an edit, naming any driver whose zone blocks the save.
fn store_edited(roster: &Roster, path: &Path, resolver: &TimezoneResolver<'_>) -> Result<()> {
    if let Some(driver) = roster
        .drivers
        .iter()
        .find(|d| resolver.resolve(d.timezone_abbrev()).is_err())
    {
        bail!(
            "driver '{}' in {} has unknown timezone '{}'; fix that row or remove the driver first",
            driver.name(),
            path.display(),
            driver.timezone_abbrev()
        );
    }
    store(roster, path, resolver)
}

fn store(roster: &Roster, path: &Path, resolver: &TimezoneResolver<'_>) -> Result<()> {
    save_roster_file(roster, path, resolver)
        .with_context(|| format!("failed to save {}", path.display()))
}
