//! Line-oriented front end over the desk commands.
//!
//! Reads commands from any `BufRead` and writes to any `Write`, so the whole
//! interaction can be driven from tests with in-memory buffers.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Local};

use crate::commands::{self, review::ConfirmResult, review::ReviewView, DeskSnapshot};
use crate::config;
use crate::core_state::DeskState;
use crate::models::{format_taka, OrderRecord};
use crate::orders::OrderStats;
use crate::review::FieldStatus;

/// Printed at startup.
pub const VERIFY_REMINDER: &str =
    "AI can make mistakes. Check every field against the chat before saving.";

const HELP: &str = "\
Commands:
  paste               paste chat text (finish with a line containing only '.')
  extract             extract an order from the pasted chat in the background
  wait                wait for the running extraction and show its result
  new                 start a blank order
  set <field> <value> edit the open order (name, phone, address, price, items, note)
  show                show the open order
  save                save the open order
  discard             discard the open order
  list                list saved orders
  search <query>      find orders by customer name or phone
  delete <id>         delete a saved order
  stats               order count and revenue
  status              show the desk status
  help                show this help
  quit                leave";

#[derive(Debug, PartialEq)]
enum ShellCommand<'a> {
    Paste,
    Extract,
    Wait,
    New,
    Set { field: &'a str, value: &'a str },
    Show,
    Save,
    Discard,
    List,
    Search(&'a str),
    Delete(&'a str),
    Stats,
    Status,
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> ShellCommand<'_> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "paste" => ShellCommand::Paste,
        "extract" => ShellCommand::Extract,
        "wait" => ShellCommand::Wait,
        "new" => ShellCommand::New,
        "set" => {
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((field, value)) => (field, value.trim()),
                None => (rest, ""),
            };
            ShellCommand::Set { field, value }
        }
        "show" => ShellCommand::Show,
        "save" => ShellCommand::Save,
        "discard" => ShellCommand::Discard,
        "list" => ShellCommand::List,
        "search" => ShellCommand::Search(rest),
        "delete" => ShellCommand::Delete(rest),
        "stats" => ShellCommand::Stats,
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        _ => ShellCommand::Unknown(word),
    }
}

pub struct Shell<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until `quit` or end of input.
    pub fn run(&mut self, state: &mut DeskState) -> io::Result<()> {
        writeln!(self.output, "{} v{}", config::APP_NAME, config::APP_VERSION)?;
        writeln!(self.output, "{VERIFY_REMINDER}")?;
        writeln!(self.output, "Type 'help' for commands.")?;

        loop {
            if let Some(result) = commands::extraction::poll_extraction(state) {
                writeln!(self.output, "Extraction finished.")?;
                self.show_extraction(result)?;
            }

            let snapshot = commands::desk_snapshot(state);
            write!(self.output, "{}", prompt(&snapshot))?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }

            if !self.dispatch(state, &line)? {
                break;
            }
        }
        Ok(())
    }

    /// Handle one command line. Returns false when the shell should stop.
    fn dispatch(&mut self, state: &mut DeskState, line: &str) -> io::Result<bool> {
        match parse_command(line) {
            ShellCommand::Empty => {}
            ShellCommand::Quit => return Ok(false),
            ShellCommand::Help => writeln!(self.output, "{HELP}")?,
            ShellCommand::Paste => self.paste(state)?,
            ShellCommand::Extract => match commands::extraction::start_extraction(state) {
                Ok(()) => writeln!(
                    self.output,
                    "Extracting order details... other commands keep working; 'wait' to block."
                )?,
                Err(msg) => writeln!(self.output, "! {msg}")?,
            },
            ShellCommand::Wait => match commands::extraction::wait_for_extraction(state) {
                Some(result) => self.show_extraction(result)?,
                None => writeln!(self.output, "No extraction is running.")?,
            },
            ShellCommand::New => {
                let view = commands::review::start_manual_order(state);
                write!(self.output, "{}", render_review(&view))?;
            }
            ShellCommand::Set { field, value } => {
                match commands::review::update_review_field(state, field, value) {
                    Ok(view) => write!(self.output, "{}", render_review(&view))?,
                    Err(msg) => writeln!(self.output, "! {msg}")?,
                }
            }
            ShellCommand::Show => match commands::review::get_review(state) {
                Ok(view) => write!(self.output, "{}", render_review(&view))?,
                Err(msg) => writeln!(self.output, "{msg}")?,
            },
            ShellCommand::Save => match commands::review::confirm_review(state) {
                Ok(ConfirmResult::Saved { order }) => {
                    writeln!(self.output, "Order saved ({}).", order.id)?;
                }
                Ok(ConfirmResult::Blocked { review }) => {
                    writeln!(self.output, "Cannot save yet:")?;
                    for issue in &review.issues {
                        writeln!(self.output, "  - {}", issue.message)?;
                    }
                    write!(self.output, "{}", render_review(&review))?;
                }
                Err(msg) => writeln!(self.output, "! {msg}")?,
            },
            ShellCommand::Discard => match commands::review::discard_review(state) {
                Ok(()) => writeln!(self.output, "Order discarded.")?,
                Err(msg) => writeln!(self.output, "{msg}")?,
            },
            ShellCommand::List => {
                let orders = commands::orders::list_orders(state);
                write!(self.output, "{}", render_orders(&orders))?;
            }
            ShellCommand::Search(query) => {
                let orders = commands::orders::search_orders(state, query);
                write!(self.output, "{}", render_orders(&orders))?;
            }
            ShellCommand::Delete("") => writeln!(self.output, "Usage: delete <id>")?,
            ShellCommand::Delete(id) => match commands::orders::delete_order(state, id) {
                Ok(true) => writeln!(self.output, "Order deleted.")?,
                Ok(false) => writeln!(self.output, "No order with id {id}.")?,
                Err(msg) => writeln!(self.output, "! {msg}")?,
            },
            ShellCommand::Stats => {
                let stats = commands::orders::order_stats(state);
                writeln!(self.output, "{}", render_stats(&stats))?;
            }
            ShellCommand::Status => {
                let snapshot = commands::desk_snapshot(state);
                write!(self.output, "{}", render_snapshot(&snapshot))?;
            }
            ShellCommand::Unknown(word) => {
                writeln!(self.output, "Unknown command '{word}'. Type 'help'.")?;
            }
        }
        Ok(true)
    }

    fn show_extraction(&mut self, result: Result<ReviewView, String>) -> io::Result<()> {
        match result {
            Ok(view) => write!(self.output, "{}", render_review(&view)),
            Err(msg) => writeln!(self.output, "! {msg}"),
        }
    }

    /// Collect lines up to a lone "." (or end of input) as the chat text.
    fn paste(&mut self, state: &mut DeskState) -> io::Result<()> {
        writeln!(self.output, "Paste the chat, then a line with only '.':")?;
        self.output.flush()?;

        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim() == "." {
                break;
            }
            lines.push(line.to_string());
        }

        let text = lines.join("\n");
        commands::extraction::set_chat_input(state, &text);
        writeln!(
            self.output,
            "Chat text captured ({} characters).",
            text.chars().count()
        )?;
        Ok(())
    }
}

fn prompt(snapshot: &DeskSnapshot) -> &'static str {
    if snapshot.extract_enabled {
        "> "
    } else {
        "(extracting) > "
    }
}

pub fn render_snapshot(snapshot: &DeskSnapshot) -> String {
    let mut out = format!(
        "Chat: {} characters | Extraction: {:?} | Review: {} | Orders: {}\n",
        snapshot.chat_input_chars,
        snapshot.status,
        if snapshot.review_open { "open" } else { "none" },
        snapshot.order_count
    );
    if let Some(message) = &snapshot.message {
        out.push_str(&format!("Last message: {message}\n"));
    }
    out
}

fn field_display(value: Option<&str>, status: FieldStatus, is_price: bool) -> String {
    match (status, value) {
        (FieldStatus::Missing, _) | (_, None) => "[missing]".to_string(),
        (FieldStatus::Empty, _) => "[empty]".to_string(),
        (_, Some(v)) if is_price => match v.parse::<f64>() {
            Ok(amount) => format_taka(amount),
            Err(_) => v.to_string(),
        },
        (_, Some(v)) => v.to_string(),
    }
}

/// Review form: price banner first, then one line per field.
pub fn render_review(view: &ReviewView) -> String {
    let mut out = String::new();
    if let Some(warning) = &view.price_warning {
        out.push_str(&format!("!! {warning}\n"));
    }

    for field in &view.fields {
        let is_price = field.key == "price";
        let flagged = view.issues.iter().any(|i| i.field == field.field);
        let mut line = format!(
            "{} {:<17}{}",
            if flagged { "*" } else { " " },
            format!("{}:", field.label),
            field_display(field.value.as_deref(), field.status, is_price)
        );
        if field.status == FieldStatus::Invalid {
            line.push_str("  (must be greater than zero)");
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    if view.issues.is_empty() {
        out.push_str("Ready to save.\n");
    }
    out
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}

pub fn render_order(order: &OrderRecord) -> String {
    let d = &order.details;
    let name = d.customer_name.as_known().map_or("[missing]", String::as_str);
    let phone = d.phone_number.as_known().map_or("[missing]", String::as_str);
    let address = d
        .delivery_address
        .as_known()
        .map_or("[missing]", String::as_str);
    let price = d
        .total_price
        .as_known()
        .map_or_else(|| "[missing]".to_string(), |p| format_taka(*p));

    let mut out = format!(
        "{}  {}  {}\n  {} | {} | {} | {}\n",
        order.id,
        format_timestamp(order.timestamp),
        order.status,
        name,
        phone,
        price,
        address
    );
    if let Some(items) = &d.items {
        out.push_str(&format!("  Items: {items}\n"));
    }
    if let Some(note) = &d.note {
        out.push_str(&format!("  Note: {note}\n"));
    }
    out
}

pub fn render_orders(orders: &[OrderRecord]) -> String {
    if orders.is_empty() {
        return "No orders found.\n".to_string();
    }
    orders.iter().map(render_order).collect()
}

pub fn render_stats(stats: &OrderStats) -> String {
    format!(
        "Orders: {}  Revenue: {}",
        stats.order_count,
        format_taka(stats.total_revenue)
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::core_state::test_support::{desk, karim_draft, rahim_draft, StubExtractor};
    use crate::core_state::ExtractionStatus;
    use crate::db::MemorySlot;
    use crate::orders::ORDERS_SLOT_KEY;

    fn run_script(state: &mut DeskState, script: &str) -> String {
        let mut shell = Shell::new(Cursor::new(script.to_string()), Vec::new());
        shell.run(state).unwrap();
        String::from_utf8(shell.into_output()).unwrap()
    }

    #[test]
    fn parse_set_keeps_value_spaces() {
        assert_eq!(
            parse_command("set address House 24/1, Road 5\n"),
            ShellCommand::Set {
                field: "address",
                value: "House 24/1, Road 5"
            }
        );
        assert_eq!(
            parse_command("set note"),
            ShellCommand::Set {
                field: "note",
                value: ""
            }
        );
        assert_eq!(parse_command("  "), ShellCommand::Empty);
        assert_eq!(parse_command("SEARCH 017"), ShellCommand::Search("017"));
    }

    #[test]
    fn startup_prints_reminder() {
        let (stub, _) = StubExtractor::failing();
        let mut state = desk(&MemorySlot::new(), stub);
        let out = run_script(&mut state, "quit\n");
        assert!(out.contains(VERIFY_REMINDER));
    }

    #[test]
    fn paste_extract_save_flow() {
        let slot = MemorySlot::new();
        let (stub, calls) = StubExtractor::returning(rahim_draft());
        let mut state = desk(&slot, stub);

        let out = run_script(
            &mut state,
            "paste\nRahim, 01712345678\nDhanmondi, 1200tk for 2 shirts\n.\nextract\nwait\nsave\nlist\n",
        );
        assert_eq!(calls.get(), 1);
        assert!(out.contains("Chat text captured (49 characters)."));
        assert!(out.contains("Ready to save."));
        assert!(out.contains("Order saved ("));
        assert!(out.contains("৳1,200"));
        assert_eq!(state.store().len(), 1);
        assert!(slot.get(ORDERS_SLOT_KEY).is_some());
    }

    #[test]
    fn extract_without_paste_reports_inline() {
        let (stub, _) = StubExtractor::returning(rahim_draft());
        let mut state = desk(&MemorySlot::new(), stub);
        let out = run_script(&mut state, "extract\n");
        assert!(out.contains("! Please paste the chat text first."));
    }

    #[test]
    fn missing_price_banner_and_markers() {
        let (stub, _) = StubExtractor::returning(karim_draft());
        let mut state = desk(&MemorySlot::new(), stub);
        let out = run_script(
            &mut state,
            "paste\nKarim, House 24/1, Road 5\n.\nextract\nwait\nset phone\nsave\n",
        );

        let banner = out.find("!! Price was not found").unwrap();
        let form = out.find("Customer name").unwrap();
        assert!(banner < form);
        assert!(out.contains("[missing]"));
        assert!(out.contains("[empty]"));
        assert!(out.contains("Cannot save yet:"));
        assert!(state.store().is_empty());
    }

    #[test]
    fn manual_entry_through_shell() {
        let (stub, _) = StubExtractor::failing();
        let mut state = desk(&MemorySlot::new(), stub);
        let out = run_script(
            &mut state,
            "new\nset name Nila\nset phone 01911000000\nset address Mirpur 10\nset price 0\nsave\nset price 1500\nsave\nstats\n",
        );
        assert!(out.contains("(must be greater than zero)"));
        assert!(out.contains("Orders: 1  Revenue: ৳1,500"));
    }

    #[test]
    fn failed_extraction_message() {
        let (stub, _) = StubExtractor::failing();
        let mut state = desk(&MemorySlot::new(), stub);
        let out = run_script(&mut state, "paste\nRahim\n.\nextract\nwait\n");
        assert!(out.contains("! AI failed to extract details. Please try again."));
        assert_eq!(state.chat_input(), "Rahim");
    }

    #[test]
    fn unknown_command_and_delete_usage() {
        let (stub, _) = StubExtractor::failing();
        let mut state = desk(&MemorySlot::new(), stub);
        let out = run_script(&mut state, "frobnicate\ndelete\ndelete nope\nlist\n");
        assert!(out.contains("Unknown command 'frobnicate'"));
        assert!(out.contains("Usage: delete <id>"));
        assert!(out.contains("No order with id nope."));
        assert!(out.contains("No orders found."));
    }

    #[test]
    fn discard_leaves_history_empty() {
        let slot = MemorySlot::new();
        let (stub, _) = StubExtractor::returning(rahim_draft());
        let mut state = desk(&slot, stub);
        let out = run_script(&mut state, "paste\nRahim\n.\nextract\nwait\ndiscard\nshow\n");
        assert!(out.contains("Order discarded."));
        assert!(out.contains("No order is open for review"));
        assert_eq!(slot.write_count(), 0);
    }

    #[test]
    fn shell_stays_usable_while_extracting() {
        let (stub, calls, open) = StubExtractor::gated(rahim_draft());
        let mut state = desk(&MemorySlot::new(), stub);
        let out = run_script(
            &mut state,
            "paste\nRahim, 01712345678, Dhanmondi, 1200tk\n.\nextract\nextract\nlist\nstatus\n",
        );

        assert!(out.contains("! An extraction is already in progress"));
        assert!(out.contains("No orders found."));
        assert!(out.contains("(extracting) > "));
        assert!(out.contains("Extraction: Loading"));
        assert_eq!(state.status(), ExtractionStatus::Loading);

        open.send(()).unwrap();
        assert!(state.wait_extraction().unwrap().is_ok());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn wait_without_extraction() {
        let (stub, _) = StubExtractor::failing();
        let mut state = desk(&MemorySlot::new(), stub);
        let out = run_script(&mut state, "wait\nstatus\n");
        assert!(out.contains("No extraction is running."));
        assert!(out.contains("Extraction: Idle | Review: none | Orders: 0"));
    }

    #[test]
    fn render_order_shows_missing_price() {
        let record = OrderRecord {
            id: "abc".into(),
            timestamp: 0,
            status: crate::models::OrderStatus::Confirmed,
            details: karim_draft(),
        };
        let out = render_order(&record);
        assert!(out.starts_with("abc  "));
        assert!(out.contains("Karim | [missing] | [missing] | House 24/1, Road 5"));
    }
}
