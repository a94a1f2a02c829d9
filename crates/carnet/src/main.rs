//! `carnet` - CLI for the work-placement logbook
//!
//! Every command opens the local store, works on one saved logbook and
//! saves it back.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;

use carnet::app::{Notice, NEW_RECORD_WARNING};
use carnet::backup;
use carnet::cli::{
    open_session, BackupCommand, Cli, Command, CommentCommand, ConfigCommand, DayCommand,
    EvalCommand, NewCommand, PdfCommand, SetCommand, ShowCommand,
};
use carnet::pdf::{self, ExportOptions};
use carnet::record::{parse_date, EncodedImage};
use carnet::view::{self, Page, PAGE_COUNT};
use carnet::{init_logging, AppState, Config, PageRasterizer, RecordStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::New(cmd) => handle_new(&open_store(&config)?, cmd),
        Command::List(cmd) => handle_list(&open_store(&config)?, cmd.json),
        Command::Show(cmd) => handle_show(&open_store(&config)?, &cmd),
        Command::Set(cmd) => handle_set(&open_store(&config)?, cmd),
        Command::Day(cmd) => handle_day(&open_store(&config)?, cmd),
        Command::Eval(cmd) => handle_eval(&open_store(&config)?, cmd),
        Command::Comment(cmd) => handle_comment(&open_store(&config)?, cmd),
        Command::Stats(cmd) => handle_stats(&open_store(&config)?, cmd.json),
        Command::Backup(cmd) => handle_backup(&config, &open_store(&config)?, cmd),
        Command::Pdf(cmd) => handle_pdf(&config, &open_store(&config)?, cmd).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> Result<RecordStore> {
    let db_path = config.database_path();
    RecordStore::open(&db_path).with_context(|| format!("failed to open {}", db_path.display()))
}

fn handle_new(store: &RecordStore, cmd: NewCommand) -> Result<()> {
    let mut state = AppState::from_store(store)?;
    if !state.saved().is_empty() {
        eprintln!("{NEW_RECORD_WARNING}");
    }

    state.new_record();
    if let Some(surname) = cmd.surname {
        state.set_surname(surname);
    }
    if let Some(first_name) = cmd.first_name {
        state.set_first_name(first_name);
    }
    let notice = state.save(store)?;

    println!("{notice}");
    println!("{}", state.record().id);
    Ok(())
}

fn handle_list(store: &RecordStore, json: bool) -> Result<()> {
    let records = store.load_all()?;

    if json {
        let list: Vec<_> = records
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "nom": r.surname,
                    "prenom": r.first_name,
                    "lieu": r.location,
                    "dateDebut": r.start_date,
                    "photos": r.photo_count(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("Aucun carnet enregistré.");
        return Ok(());
    }
    for record in &records {
        let start = record
            .start_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default();
        println!(
            "{:<15} {:<20} {:<20} {:<10} {}",
            record.id,
            record.display_name(),
            record.first_name,
            start,
            record.location
        );
    }
    Ok(())
}

fn handle_show(store: &RecordStore, cmd: &ShowCommand) -> Result<()> {
    let state = open_session(store, &cmd.record)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(state.record())?);
        return Ok(());
    }

    let pages = match cmd.page {
        Some(page) => usize::from(page)..usize::from(page) + 1,
        None => 0..PAGE_COUNT,
    };
    for index in pages {
        let page_view = view::render(state.record(), index);
        let title = Page::from_index(index).map(Page::title).unwrap_or_default();
        println!("== {} ({}/{}) ==", title, index + 1, PAGE_COUNT);
        for line in page_view.text_lines() {
            println!("{line}");
        }
        println!();
    }
    Ok(())
}

fn handle_set(store: &RecordStore, cmd: SetCommand) -> Result<()> {
    let mut state = open_session(store, &cmd.record)?;

    if let Some(surname) = cmd.surname {
        state.set_surname(surname);
    }
    if let Some(first_name) = cmd.first_name {
        state.set_first_name(first_name);
    }
    if let Some(start) = cmd.start {
        state.set_start_date(parse_date(&start)?);
    }
    if let Some(end) = cmd.end {
        state.set_end_date(parse_date(&end)?);
    }
    if let Some(location) = cmd.location {
        state.set_location(location);
    }

    println!("{}", state.save(store)?);
    Ok(())
}

fn handle_day(store: &RecordStore, cmd: DayCommand) -> Result<()> {
    let mut state = open_session(store, &cmd.record)?;
    let day = usize::from(cmd.day);

    if let Some(description) = cmd.description {
        state.set_description(day, description)?;
    }
    if let Some(position) = cmd.remove_photo {
        state.remove_photo(day, usize::from(position) - 1)?;
    }
    for path in &cmd.add_photo {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let photo = EncodedImage::from_bytes(&bytes)
            .with_context(|| format!("{} is not a supported image", path.display()))?;
        if let Some(notice) = state.add_photo(day, photo)? {
            eprintln!("{notice}");
            break;
        }
    }

    println!("{}", state.save(store)?);
    Ok(())
}

fn handle_eval(store: &RecordStore, cmd: EvalCommand) -> Result<()> {
    let mut state = open_session(store, &cmd.record)?;
    state.set_evaluation(usize::from(cmd.point) - 1, cmd.option)?;
    println!("{}", state.save(store)?);
    Ok(())
}

fn handle_comment(store: &RecordStore, cmd: CommentCommand) -> Result<()> {
    let mut state = open_session(store, &cmd.record)?;
    state.set_comment(usize::from(cmd.prompt), cmd.text)?;
    println!("{}", state.save(store)?);
    Ok(())
}

fn handle_stats(store: &RecordStore, json: bool) -> Result<()> {
    let stats = store.stats()?;

    if json {
        let value = serde_json::json!({
            "database_path": store.path(),
            "total_records": stats.total_records,
            "total_photos": stats.total_photos,
            "payload_bytes": stats.payload_bytes,
            "last_saved": stats.last_saved,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("carnet storage");
        println!("--------------");
        println!("Database:      {}", store.path().display());
        println!("Records:       {}", stats.total_records);
        println!("Photos:        {}", stats.total_photos);
        println!("Payload:       {} bytes", stats.payload_bytes);
        match stats.last_saved {
            Some(at) => println!("Last saved:    {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Last saved:    never"),
        }
    }
    Ok(())
}

fn handle_backup(config: &Config, store: &RecordStore, cmd: BackupCommand) -> Result<()> {
    match cmd {
        BackupCommand::Export {
            record,
            name,
            output,
        } => {
            let state = open_session(store, &record)?;
            let label = name.unwrap_or_else(|| {
                backup::default_backup_name(state.record(), chrono::Local::now().date_naive())
            });
            let dir = output.unwrap_or_else(|| config.output_dir());
            let notice = state.export_backup(&dir, &label)?;
            report_written(&notice);
        }
        BackupCommand::Import { file } => {
            let mut state = AppState::from_store(store)?;
            match state.import_backup(&file) {
                Ok(notice) => {
                    state.save(store)?;
                    println!("{notice}");
                    println!("{}", state.record().id);
                }
                Err(e) => {
                    eprintln!("{}", Notice::ImportFailed);
                    return Err(e.into());
                }
            }
        }
    }
    Ok(())
}

async fn handle_pdf(config: &Config, store: &RecordStore, cmd: PdfCommand) -> Result<()> {
    let mut state = open_session(store, &cmd.record)?;
    let label = cmd
        .name
        .unwrap_or_else(|| pdf::default_pdf_name(state.record()));
    let dir = cmd.output.unwrap_or_else(|| config.output_dir());

    let rasterizer = PageRasterizer::from_config(&config.pdf);
    let options = ExportOptions::from_config(config);
    let path = pdf::export_pdf(&mut state, &rasterizer, options, &dir, &label)
        .await
        .context("PDF generation failed")?;

    report_written(&Notice::PdfWritten(path));
    Ok(())
}

fn report_written(notice: &Notice) {
    println!("{notice}");
    if let Notice::BackupWritten(path) | Notice::PdfWritten(path) = notice {
        println!("{}", path.display());
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Export]");
                println!("  Output directory:   {}", config.output_dir().display());
                println!();
                println!("[PDF]");
                println!("  Settle delay (ms):  {}", config.pdf.settle_delay_ms);
                println!("  DPI:                {}", config.pdf.dpi);
                println!("  JPEG quality:       {}", config.pdf.jpeg_quality);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
