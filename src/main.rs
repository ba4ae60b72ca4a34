use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use serde::Deserialize;

use quotation_wizard::steps::customer::ImageSlot;
use quotation_wizard::steps::{delete_item, move_item, ItemsStep, MoveDirection};
use quotation_wizard::{
    CustomerInfo, DirectorySink, NoticeVariant, QuotationItem, QuotationSession, Step, SystemOpener, WizardConfig,
};

#[derive(Parser, Debug)]
#[command(name = "quotewiz")]
#[command(author, version, about = "Build, export and send business quotations", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed the quotation from a JSON file (customer_info, items, notes)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where exported files are saved
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Export the seeded quotation as PDF and exit
    #[arg(long)]
    pdf: bool,

    /// Export the seeded quotation as a Word document and exit
    #[arg(long)]
    word: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Seed {
    customer_info: CustomerInfo,
    items: Vec<QuotationItem>,
    notes: String,
}

const HELP: &str = "\
Commands:
  name <text>               set the customer name
  company <text>            set the company name
  logo <path>               attach a logo image
  signature <path>          attach a signature image
  rm-logo | rm-signature    remove an attachment
  add <name> | <qty> | <price> [| <description>]
  edit <n> <name> | <qty> | <price> [| <description>]
  delete <n>                remove item n
  up <n> | down <n>         move item n
  notes <text>              replace the notes
  next | back               move between steps
  show                      show the current step
  print                     print the quotation
  pdf | word                export the quotation
  email <address>           send by e-mail
  whatsapp <number>         send by WhatsApp
  reset                     start a new quotation
  help | quit";

fn print_notices(session: &QuotationSession) {
    for notice in session.drain_notices() {
        let marker = match notice.variant {
            NoticeVariant::Info => "*",
            NoticeVariant::Destructive => "!",
        };
        println!("{} {}: {}", marker, notice.title, notice.description);
    }
}

fn show_step(session: &QuotationSession, items_step: &ItemsStep) {
    let (step, progress) = session.with_wizard(|w| (w.step(), w.progress()));
    let doc = session.snapshot();
    println!(
        "Step {} of {}: {} ({:.0}%)",
        step.index() + 1,
        Step::ALL.len(),
        step.title(),
        progress * 100.0
    );
    match step {
        Step::CustomerInfo => print!("{}", session.customer_step().render_text(&doc.customer_info)),
        Step::Items => print!("{}", items_step.render_text(&doc.items, &doc.notes, &session.config().currency)),
        Step::Preview => print!("{}", session.render_text()),
    }
}

/// `<name> | <qty> | <price> [| <description>]`
fn parse_item_fields(text: &str) -> Option<(String, String, String, String)> {
    let parts: Vec<&str> = text.split('|').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    let description = parts.get(3).copied().unwrap_or_default();
    Some((parts[0].to_string(), parts[1].to_string(), parts[2].to_string(), description.to_string()))
}

fn item_index(arg: &str, len: usize) -> Option<usize> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Some(n - 1),
        _ => None,
    }
}

/// Save an item through the dialog; `edit_id` selects edit mode.
fn save_item(session: &QuotationSession, items_step: &mut ItemsStep, edit_id: Option<&str>, fields: &str) {
    let Some((name, qty, price, description)) = parse_item_fields(fields) else {
        println!("usage: <name> | <qty> | <price> [| <description>]");
        return;
    };
    let doc = session.snapshot();
    let dialog = &mut items_step.dialog;
    match edit_id {
        Some(id) => {
            if !dialog.open_edit(&doc.items, id) {
                println!("no such item");
                return;
            }
        }
        None => dialog.open_add(),
    }
    dialog.set_name(&name);
    dialog.set_quantity_text(&qty);
    dialog.set_unit_price_text(&price);
    dialog.set_description(&description);
    let title = dialog.title();
    match dialog.save(&doc.items) {
        Ok(items) => {
            session.with_wizard(|w| w.update_items(items, doc.notes.clone()));
            println!("{}: saved", title);
        }
        Err(e) => {
            println!("! {}", e);
            dialog.cancel();
        }
    }
}

fn reorder(session: &QuotationSession, arg: &str, direction: MoveDirection) {
    let doc = session.snapshot();
    match item_index(arg, doc.items.len()) {
        Some(index) => {
            let items = move_item(&doc.items, index, direction);
            session.with_wizard(|w| w.update_items(items, doc.notes));
        }
        None => println!("no such item"),
    }
}

async fn run_command(session: &QuotationSession, items_step: &mut ItemsStep, line: &str) -> bool {
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };
    let customer = session.snapshot().customer_info;
    let step = session.customer_step();

    match cmd {
        "name" => session.with_wizard(|w| w.update_customer(step.set_customer_name(&customer, arg))),
        "company" => session.with_wizard(|w| w.update_customer(step.set_company_name(&customer, arg))),
        "logo" | "signature" => {
            let slot = if cmd == "logo" { ImageSlot::Logo } else { ImageSlot::Signature };
            match step.attach_file(&customer, slot, Path::new(arg)) {
                Ok(info) => session.with_wizard(|w| w.update_customer(info)),
                Err(e) => println!("! {}", e),
            }
        }
        "rm-logo" => session.with_wizard(|w| w.update_customer(step.remove(&customer, ImageSlot::Logo))),
        "rm-signature" => session.with_wizard(|w| w.update_customer(step.remove(&customer, ImageSlot::Signature))),
        "add" => save_item(session, items_step, None, arg),
        "edit" => {
            let (n, fields) = arg.split_once(char::is_whitespace).unwrap_or((arg, ""));
            let doc = session.snapshot();
            match item_index(n, doc.items.len()) {
                Some(i) => save_item(session, items_step, Some(&doc.items[i].id), fields),
                None => println!("no such item"),
            }
        }
        "delete" => {
            let doc = session.snapshot();
            match item_index(arg, doc.items.len()) {
                Some(i) => {
                    let items = delete_item(&doc.items, &doc.items[i].id);
                    session.with_wizard(|w| w.update_items(items, doc.notes));
                }
                None => println!("no such item"),
            }
        }
        "up" => reorder(session, arg, MoveDirection::Up),
        "down" => reorder(session, arg, MoveDirection::Down),
        "notes" => {
            let doc = session.snapshot();
            let notes = arg.replace("\\n", "\n");
            session.with_wizard(|w| w.update_items(doc.items, notes));
        }
        "next" => {
            if session.advance().is_ok() {
                show_step(session, items_step);
            }
        }
        "back" => match session.retreat() {
            Ok(_) => show_step(session, items_step),
            Err(e) => println!("! {}", e),
        },
        "show" => show_step(session, items_step),
        "print" => print!("{}", session.render_text()),
        "pdf" => {
            if let Ok(artifact) = session.export_pdf().await {
                println!("saved {}", artifact.file_name);
            }
        }
        "word" => {
            if let Ok(artifact) = session.export_word().await {
                println!("saved {}", artifact.file_name);
            }
        }
        "email" => {
            println!("Sending...");
            let _ = session.send_email(arg).await;
        }
        "whatsapp" => {
            println!("Sending...");
            let _ = session.send_whatsapp(arg).await;
        }
        "reset" => {
            session.reset();
            show_step(session, items_step);
        }
        "help" => println!("{}", HELP),
        "quit" | "exit" => return false,
        other => println!("unknown command `{}` (try `help`)", other),
    }
    print_notices(session);
    true
}

fn load_seed(session: &QuotationSession, path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let seed: Seed = serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    info!("seeded {} items from {}", seed.items.len(), path.display());
    session.with_wizard(|w| {
        w.update_customer(seed.customer_info);
        w.update_items(seed.items, seed.notes);
    });
    Ok(())
}

async fn export_and_exit(session: &QuotationSession, pdf: bool, word: bool) -> anyhow::Result<()> {
    while session.step() != Step::Preview {
        if let Err(e) = session.advance() {
            print_notices(session);
            bail!("quotation is incomplete: {}", e);
        }
    }
    if pdf {
        let artifact = session.export_pdf().await.context("PDF export failed")?;
        println!("saved {}", artifact.file_name);
    }
    if word {
        let artifact = session.export_word().await.context("Word export failed")?;
        println!("saved {}", artifact.file_name);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => WizardConfig::from_json_file(path).context("Failed to load configuration")?,
        None => WizardConfig::default(),
    };
    let session = QuotationSession::new(
        config,
        Arc::new(DirectorySink::new(&cli.output_dir)),
        Box::new(SystemOpener),
    );
    if let Some(path) = &cli.input {
        load_seed(&session, path)?;
    }

    if cli.pdf || cli.word {
        return export_and_exit(&session, cli.pdf, cli.word).await;
    }

    println!("Mung Quotation V 1.0 (type `help` for commands)");
    let number = session.snapshot().quotation_number;
    println!("Quotation {}", number);
    let mut items_step = ItemsStep::new();
    show_step(&session, &items_step);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !run_command(&session, &mut items_step, line).await {
            break;
        }
    }
    Ok(())
}
