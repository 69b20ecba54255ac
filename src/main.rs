//! Sales Console — line-oriented front end.
//!
//! Reads one command per line from stdin. Type `help` for the list.

use tokio::io::{AsyncBufReadExt, BufReader};

use sales_console_lib::config::{load_config, ConsoleConfig};
use sales_console_lib::types::{
    Lead, LeadSort, LeadStatus, OpportunityStage, SortDirection, SortField, StatusFilter,
};
use sales_console_lib::view;
use sales_console_lib::error::ErrorPayload;
use sales_console_lib::{ConsoleError, SalesConsole};

const HELP: &str = "\
Commands:
  list                          show the filtered and sorted leads
  search <text>                 filter by name or company (empty clears)
  status <all|new|contacted|qualified|unqualified>
  sort <score|name|company|status> [asc|desc]
  show <id>                     lead details
  close                         close the lead details
  email <id> <address>          change a lead's email
  set-status <id> <status>      change a lead's status
  convert <id> [amount] [stage] convert a lead into an opportunity
  opps                          list opportunities
  reload                        fetch leads again
  reset                         restore default filters and sort
  error                         show and clear the last error
  help | quit";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{}. Using default configuration.", e);
            ConsoleConfig::default()
        }
    };

    let console = match SalesConsole::from_config(&config) {
        Ok(console) => console,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = console.mount().await {
        report_error(&e);
    }
    print_leads(&console);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }
        handle_command(&console, line).await;
    }
}

async fn handle_command(console: &SalesConsole, line: &str) {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "help" => println!("{}", HELP),
        "list" => print_leads(console),
        "search" => {
            // Apply immediately in an interactive shell; typing is line-buffered.
            console.set_search(rest);
            console.search_debouncer().settle(rest);
            print_leads(console);
        }
        "status" => match rest.parse::<StatusFilter>() {
            Ok(status) => {
                console.set_status_filter(status);
                print_leads(console);
            }
            Err(e) => println!("! {}", e),
        },
        "sort" => {
            let mut parts = rest.split_whitespace();
            let field = parts.next().map(str::parse::<SortField>);
            let direction = parts.next().map(str::parse::<SortDirection>);
            match (field, direction) {
                (Some(Ok(field)), None) => {
                    console.toggle_sort(field);
                    print_leads(console);
                }
                (Some(Ok(field)), Some(Ok(direction))) => {
                    console.set_sort(LeadSort { field, direction });
                    print_leads(console);
                }
                (Some(Err(e)), _) | (_, Some(Err(e))) => println!("! {}", e),
                (None, _) => println!("! usage: sort <field> [asc|desc]"),
            }
        }
        "show" => match console.select_lead(rest) {
            Ok(lead) => print_lead_detail(console, &lead),
            Err(e) => report_error(&e),
        },
        "close" => console.clear_selection(),
        "email" => {
            let (id, address) = rest.split_once(' ').unwrap_or((rest, ""));
            let mut editor = match console.editor_for(id) {
                Ok(editor) => editor,
                Err(e) => return report_error(&e),
            };
            editor.set_email(address.trim());
            if let Some(message) = editor.email_error() {
                println!("! {}", message);
                return;
            }
            report_save(console.submit_editor(&mut editor).await);
        }
        "set-status" => {
            let (id, status) = rest.split_once(' ').unwrap_or((rest, ""));
            let status = match status.parse::<LeadStatus>() {
                Ok(status) => status,
                Err(e) => {
                    println!("! {}", e);
                    return;
                }
            };
            let mut editor = match console.editor_for(id) {
                Ok(editor) => editor,
                Err(e) => return report_error(&e),
            };
            editor.set_status(status);
            report_save(console.submit_editor(&mut editor).await);
        }
        "convert" => {
            let mut parts = rest.split_whitespace();
            let id = parts.next().unwrap_or_default();
            let mut form = match console.convert_form_for(id) {
                Ok(form) => form,
                Err(e) => return report_error(&e),
            };
            if let Some(amount) = parts.next() {
                form.set_amount(amount);
            }
            if let Some(stage) = parts.next() {
                match stage.parse::<OpportunityStage>() {
                    Ok(stage) => form.set_stage(stage),
                    Err(e) => {
                        println!("! {}", e);
                        return;
                    }
                }
            }
            match console.submit_convert_form(&mut form).await {
                Ok(opp) => println!("Created {} ({})", opp.name, opp.id),
                Err(e) => report_error(&e),
            }
        }
        "opps" => print_opportunities(console),
        "reload" => match console.load_leads().await {
            Ok(_) => print_leads(console),
            Err(e) => report_error(&e),
        },
        "reset" => {
            console.reset_preferences();
            print_leads(console);
        }
        "error" => {
            match console.error() {
                Some(message) => println!("! {}", message),
                None => println!("No error"),
            }
            console.dismiss_error();
        }
        other => println!("! Unknown command: {} (try `help`)", other),
    }
}

fn report_save(result: Result<Lead, ConsoleError>) {
    match result {
        Ok(lead) => println!("Saved {} ({}, {})", lead.name, lead.email, lead.status),
        Err(e) => report_error(&e),
    }
}

fn report_error(err: &ConsoleError) {
    let payload = ErrorPayload::from(err);
    println!("! {} ({})", payload.message, payload.recovery_suggestion);
}

fn print_leads(console: &SalesConsole) {
    let state = console.state();
    if state.is_loading {
        println!("Loading leads...");
        return;
    }
    println!(
        "{}  [search: {:?}, status: {}, sort: {:?} {:?}]",
        console.lead_summary(),
        console.settled_search(),
        state.filters.status,
        state.sort.field,
        state.sort.direction
    );
    for lead in console.visible_leads() {
        let marker = if state.is_lead_converted(&lead.id) { "*" } else { " " };
        println!(
            "{} {:>4}  {:<20} {:<24} {:>3}  {}",
            marker,
            lead.id,
            lead.name,
            lead.company,
            lead.score,
            lead.status.label()
        );
    }
}

fn print_lead_detail(console: &SalesConsole, lead: &Lead) {
    println!("{} <{}>", lead.name, lead.email);
    println!("  company: {}", lead.company);
    println!("  source:  {}", lead.source_label());
    println!("  score:   {}", lead.score);
    println!("  status:  {}", lead.status.label());
    if console.is_lead_converted(&lead.id) {
        println!("  already converted");
    }
}

fn print_opportunities(console: &SalesConsole) {
    let opportunities = console.opportunities();
    println!("{}", view::opportunity_count_label(opportunities.len()));
    for opp in opportunities {
        let amount = opp
            .amount
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {:<40} {:<24} {:<12} {:>12}  {}",
            opp.id,
            opp.name,
            opp.account_name,
            opp.stage.label(),
            amount,
            opp.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}
