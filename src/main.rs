use medialist::config::{self, Settings};
use medialist::{PlayMode, PlaylistCore, PlaylistFormat, PlaylistObserver};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct CliArgs {
    config_dir: Option<PathBuf>,
    command: Vec<String>,
}

/// Host side of the notification port: the terminal has nothing to redraw,
/// so events are just logged.
struct LogObserver;

impl PlaylistObserver for LogObserver {
    fn selection_changed(&mut self, index: Option<usize>) {
        info!(?index, "selection changed");
    }

    fn mode_changed(&mut self, mode: PlayMode) {
        info!(%mode, "mode changed");
    }

    fn playlist_changed(&mut self) {
        info!("playlist changed");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medialist=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1).collect())?;
    let settings_path = match &args.config_dir {
        Some(dir) => dir.join("settings.json"),
        None => config::settings_path()?,
    };
    let mut settings = Settings::open(settings_path)?;

    let mut core = PlaylistCore::new();
    core.subscribe(Box::new(LogObserver));
    core.load(&settings);

    let changed = run_command(&mut core, &args.command)?;
    if changed {
        core.save(&mut settings)?;
    }
    Ok(())
}

fn run_command(core: &mut PlaylistCore, command: &[String]) -> anyhow::Result<bool> {
    let Some((name, rest)) = command.split_first() else {
        print_list(core);
        return Ok(false);
    };

    match name.as_str() {
        "list" => {
            print_list(core);
            Ok(false)
        }
        "add" => {
            if rest.is_empty() {
                anyhow::bail!("add requires at least one path");
            }
            let added = core.add_dropped(rest.iter().map(PathBuf::from));
            println!("Added {added} of {} paths", rest.len());
            Ok(added > 0)
        }
        "remove" => {
            let row = parse_row(rest, "remove")?;
            if !core.remove_at(row) {
                anyhow::bail!("no entry at row {}", row + 1);
            }
            Ok(true)
        }
        "clear" => {
            core.clear();
            Ok(true)
        }
        "play" => {
            let row = parse_row(rest, "play")?;
            if !core.activate_row(row) {
                anyhow::bail!("no entry at row {}", row + 1);
            }
            print_current(core);
            Ok(true)
        }
        "next" => {
            match core.advance() {
                Some(entry) => println!("Now playing: {}", entry.display_name()),
                None => println!("End of playlist"),
            }
            Ok(true)
        }
        "prev" => {
            match core.step_back() {
                Some(entry) => println!("Now playing: {}", entry.display_name()),
                None => println!("Start of playlist"),
            }
            Ok(true)
        }
        "mode" => {
            match rest.first() {
                Some(value) => core.set_mode(value.parse().map_err(anyhow::Error::msg)?),
                None => core.cycle_mode(),
            }
            println!("Play mode: {}", core.mode());
            Ok(true)
        }
        "favorite" => {
            let row = parse_row(rest, "favorite")?;
            let Some(favorite) = core.toggle_favorite(row) else {
                anyhow::bail!("no entry at row {}", row + 1);
            };
            println!("{}", if favorite { "Marked favorite" } else { "Unmarked favorite" });
            Ok(true)
        }
        "search" => {
            core.search(&rest.join(" "));
            print_list(core);
            Ok(false)
        }
        "info" => {
            let row = parse_row(rest, "info")?;
            let Some(entry) = core.entry_at(row) else {
                anyhow::bail!("no entry at row {}", row + 1);
            };
            for (label, value) in entry.properties() {
                println!("{label:>9}: {value}");
            }
            Ok(false)
        }
        "export" => {
            let Some(target) = rest.first().map(PathBuf::from) else {
                anyhow::bail!("export requires a target file");
            };
            let format = match rest.get(1) {
                Some(name) => name.parse()?,
                None => PlaylistFormat::from_path(&target).unwrap_or(PlaylistFormat::M3u),
            };
            match core.export_to(&target, format) {
                Ok(count) => println!("Exported {count} entries to {}", target.display()),
                Err(err) => {
                    warn!(%err, "export failed");
                    println!("Export failed: {err}");
                }
            }
            Ok(false)
        }
        "import" => {
            let Some(source) = rest.first().map(PathBuf::from) else {
                anyhow::bail!("import requires a playlist file");
            };
            match core.import_from(&source) {
                Ok(report) => {
                    println!("Imported {} files ({} new)", report.found, report.added);
                    Ok(report.added > 0)
                }
                Err(err) => {
                    warn!(%err, "import failed");
                    println!("Import failed: {err}");
                    Ok(false)
                }
            }
        }
        other => anyhow::bail!("unknown command {other}"),
    }
}

fn parse_row(rest: &[String], command: &str) -> anyhow::Result<usize> {
    let Some(value) = rest.first() else {
        anyhow::bail!("{command} requires a row number");
    };
    let row: usize = value
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid row number {value}"))?;
    if row == 0 {
        anyhow::bail!("rows start at 1");
    }
    Ok(row - 1)
}

fn print_list(core: &PlaylistCore) {
    if core.is_empty() {
        println!("Playlist is empty");
        return;
    }
    for (idx, entry) in core.entries().iter().enumerate() {
        let marker = if core.current_index() == Some(idx) { '>' } else { ' ' };
        let star = if entry.is_favorite { '*' } else { ' ' };
        println!("{marker}{star}{:>4}  {}", idx + 1, entry.display_name());
    }
    println!("{} files, mode: {}", core.len(), core.mode());
}

fn print_current(core: &PlaylistCore) {
    if let Some(entry) = core.current_entry() {
        println!("Now playing: {}", entry.display_name());
    }
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--config-dir" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--config-dir requires a directory");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--config-dir cannot be empty");
                }
                out.config_dir = Some(PathBuf::from(value.trim()));
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                out.command = args[index..].to_vec();
                break;
            }
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("medialist [--config-dir DIR] <command>");
    println!("  list                     Show the playlist");
    println!("  add PATH...              Add files or directories");
    println!("  remove ROW               Remove an entry");
    println!("  clear                    Empty the playlist");
    println!("  play ROW                 Make an entry current");
    println!("  next | prev              Step through the playlist");
    println!("  mode [NAME]              Set or cycle the play mode");
    println!("  favorite ROW             Toggle the favorite flag");
    println!("  info ROW                 Show entry properties");
    println!("  search KEYWORD           Show matching entries");
    println!("  export FILE [m3u|pls]    Write a playlist file");
    println!("  import FILE              Add entries from a playlist file");
}
