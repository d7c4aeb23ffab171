use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::warn;
use structopt::StructOpt;

use marktplatz::{config, prompt};
use marktplatz::{
    AnalysisClient, ArtikelForm, Dashboard, DashboardState, DeleteConfirm, Record, RecordClient,
    View,
};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "marktplatz",
    about = "Mein Marktplatz: Artikel im Datenspeicher verwalten"
)]
enum Command {
    /// Artikel-Übersicht mit Statistik anzeigen
    List,
    /// Details eines Artikels anzeigen
    Show { id: String },
    /// Neuen Artikel einstellen
    Add {
        #[structopt(flatten)]
        fields: FieldArgs,
    },
    /// Artikel bearbeiten; nicht angegebene Felder behalten ihren Wert,
    /// ein leerer Wert löscht das Feld
    Edit {
        id: String,
        #[structopt(flatten)]
        fields: FieldArgs,
    },
    /// Artikel löschen
    Delete {
        id: String,
        /// Ohne Rückfrage löschen
        #[structopt(long)]
        yes: bool,
    },
}

#[derive(Debug, StructOpt)]
struct FieldArgs {
    #[structopt(long)]
    hersteller: Option<String>,
    #[structopt(long)]
    modell: Option<String>,
    #[structopt(long)]
    farbe: Option<String>,
    #[structopt(long)]
    groesse: Option<String>,
    /// Pfad zu einem Produktfoto; die KI füllt Felder daraus vor
    #[structopt(long, parse(from_os_str))]
    foto: Option<PathBuf>,
    /// Foto anhängen, ohne es analysieren zu lassen
    #[structopt(long)]
    no_analyze: bool,
}

fn main() {
    pretty_env_logger::init();
    if let Err(e) = run(Command::from_args()) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    let config = config::read()?;
    let client =
        RecordClient::new(&config).context("HTTP-Client konnte nicht erstellt werden")?;
    match command {
        Command::List => list_flow(&client),
        Command::Show { id } => show_flow(&client, &id),
        Command::Add { fields } => {
            let analyzer = AnalysisClient::from_config(&config)?;
            add_flow(&client, analyzer.as_ref(), fields)
        }
        Command::Edit { id, fields } => {
            let analyzer = AnalysisClient::from_config(&config)?;
            edit_flow(&client, analyzer.as_ref(), &id, fields)
        }
        Command::Delete { id, yes } => delete_flow(&client, &id, yes),
    }
}

/// Initial fetch with the manual-retry loop: a failed load blocks the view
/// until the user retries or gives up.
fn mount(client: &RecordClient) -> Result<Dashboard> {
    let mut dashboard = Dashboard::new();
    loop {
        match dashboard.refresh(client) {
            DashboardState::Ready(_) => break,
            DashboardState::Failed(message) => {
                eprintln!("Fehler beim Laden: {}", message);
                match prompt::confirm("Erneut versuchen?")? {
                    Some(true) => continue,
                    _ => bail!("Laden abgebrochen"),
                }
            }
            DashboardState::Loading => continue,
        }
    }
    Ok(dashboard)
}

fn list_flow(client: &RecordClient) -> Result<()> {
    let dashboard = mount(client)?;
    if let Some(view) = dashboard.view() {
        render_dashboard(view);
    }
    Ok(())
}

fn show_flow(client: &RecordClient, id: &str) -> Result<()> {
    let dashboard = mount(client)?;
    let record = dashboard
        .record(id)
        .with_context(|| format!("Artikel {} nicht gefunden", id))?;
    render_detail(record);
    Ok(())
}

fn add_flow(
    client: &RecordClient,
    analyzer: Option<&AnalysisClient>,
    args: FieldArgs,
) -> Result<()> {
    let mut form = ArtikelForm::create();
    fill_form(&mut form, &args);
    attach_foto(&mut form, analyzer, &args)?;
    submit_form(client, &mut form, "Fehler beim Erstellen", "Artikel eingestellt")?;
    list_flow(client)
}

fn edit_flow(
    client: &RecordClient,
    analyzer: Option<&AnalysisClient>,
    id: &str,
    args: FieldArgs,
) -> Result<()> {
    let record = client
        .get(id)
        .context("Artikel konnte nicht geladen werden")?
        .with_context(|| format!("Artikel {} nicht gefunden", id))?;
    let mut form = ArtikelForm::edit(&record);
    fill_form(&mut form, &args);
    attach_foto(&mut form, analyzer, &args)?;
    submit_form(client, &mut form, "Fehler beim Speichern", "Artikel aktualisiert")?;
    list_flow(client)
}

fn delete_flow(client: &RecordClient, id: &str, yes: bool) -> Result<()> {
    let dashboard = mount(client)?;
    let record = dashboard
        .record(id)
        .with_context(|| format!("Artikel {} nicht gefunden", id))?;
    let dialog = DeleteConfirm::new(record);
    if !yes {
        let question = format!(
            "\"{}\" wirklich löschen? Diese Aktion kann nicht rückgängig gemacht werden.",
            dialog.display_name()
        );
        if !matches!(prompt::confirm(&question)?, Some(true)) {
            println!("Abgebrochen");
            return Ok(());
        }
    }
    // The dialog is consumed here: it closes even when the call fails and
    // the error is surfaced on its own.
    match dialog.confirm(client) {
        Ok(_) => {
            println!("Artikel gelöscht");
            list_flow(client)
        }
        Err(e) => bail!("Fehler beim Löschen: {}", e),
    }
}

/// Flag values are the user's form input; an explicitly empty value clears
/// the field on submit.
fn fill_form(form: &mut ArtikelForm, args: &FieldArgs) {
    if let Some(v) = &args.hersteller {
        form.hersteller = v.clone();
    }
    if let Some(v) = &args.modell {
        form.modell = v.clone();
    }
    if let Some(v) = &args.farbe {
        form.farbe = v.clone();
    }
    if let Some(v) = &args.groesse {
        form.groesse = v.clone();
    }
}

fn attach_foto(
    form: &mut ArtikelForm,
    analyzer: Option<&AnalysisClient>,
    args: &FieldArgs,
) -> Result<()> {
    let path = match &args.foto {
        Some(p) => p,
        None => return Ok(()),
    };
    let bytes = std::fs::read(path)
        .with_context(|| format!("Foto {} konnte nicht gelesen werden", path.display()))?;
    let analyzer = if args.no_analyze {
        None
    } else {
        if analyzer.is_none() {
            warn!("Kein Anthropic-API-Key konfiguriert, Bildanalyse übersprungen");
        }
        analyzer
    };
    if analyzer.is_some() {
        println!("Analysiere Bild mit KI...");
    }
    match form.attach_image(&bytes, analyzer) {
        Ok(true) => println!("Felder automatisch ausgefüllt!"),
        Ok(false) => {}
        // Non-fatal: preview is kept, manual entry continues.
        Err(e) => eprintln!("{}. Bitte manuell ausfüllen.", e),
    }
    Ok(())
}

/// Failed submits keep the form open (values and error retained) and
/// re-enable submission; success closes it.
fn submit_form(
    client: &RecordClient,
    form: &mut ArtikelForm,
    error_prefix: &str,
    success: &str,
) -> Result<()> {
    loop {
        if form.submit(client) {
            println!("{}", success);
            return Ok(());
        }
        eprintln!(
            "{}: {}",
            error_prefix,
            form.last_error().unwrap_or("Unbekannter Fehler")
        );
        match prompt::confirm("Erneut versuchen?")? {
            Some(true) => continue,
            _ => bail!("Artikel nicht gespeichert"),
        }
    }
}

fn render_dashboard(view: &View) {
    println!("Mein Marktplatz");
    println!("===============");
    println!("Artikel eingestellt: {}", view.stats.total);
    if view.records.is_empty() {
        println!();
        println!("Noch keine Artikel. Stelle deinen ersten Artikel ein:");
        println!("  marktplatz add --hersteller ... --modell ...");
        return;
    }
    println!();
    println!("Top Hersteller:");
    for (name, count) in &view.stats.top_hersteller {
        println!("  {:<20} {}", name, count);
    }
    println!();
    println!(
        "{:<26} {:<30} {:<20} {}",
        "ID", "Artikel", "Details", "Erstellt"
    );
    for record in &view.records {
        println!(
            "{:<26} {:<30} {:<20} {}",
            record.record_id,
            record.display_name(),
            record.detail_line(),
            record.createdat.as_deref().unwrap_or("-"),
        );
    }
}

fn render_detail(record: &Record) {
    println!("Artikeldetails");
    println!();
    println!("Artikel: {}", record.display_name());
    let fields = &record.fields;
    if let Some(h) = nonempty(&fields.hersteller) {
        println!("Hersteller: {}", h);
    }
    if let Some(m) = nonempty(&fields.modell) {
        println!("Modell: {}", m);
    }
    if let Some(f) = nonempty(&fields.farbe) {
        println!("Farbe: {}", f);
    }
    if let Some(g) = nonempty(&fields.groesse) {
        println!("Größe: {}", g);
    }
    println!(
        "Foto: {}",
        if fields.foto.is_some() { "vorhanden" } else { "-" }
    );
    if let Some(c) = &record.createdat {
        println!("Erstellt: {}", c);
    }
    if let Some(u) = &record.updatedat {
        println!("Aktualisiert: {}", u);
    }
    println!();
    println!("Bearbeiten: marktplatz edit {}", record.record_id);
    println!("Löschen:    marktplatz delete {}", record.record_id);
}

fn nonempty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
