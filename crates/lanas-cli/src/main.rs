//! `lanas` CLI: command-line client for the Lanas lead intake server.
//!
//! A standalone HTTP client with no internal crate dependencies. It talks to
//! the server exclusively through the REST API.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// Lanas: lead intake administration.
#[derive(Parser)]
#[command(
    name = "lanas",
    version,
    about = "Lanas CLI: check the server, browse and export leads",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         LANAS_ADDR    Server address (default: http://127.0.0.1:8080)\n  \
         LANAS_TOKEN   Admin bearer token\n\n\
         {DIM}Examples:{RESET}\n  \
         lanas status\n  \
         lanas leads list\n  \
         lanas leads export --output leads.csv\n  \
         lanas submit lead.json"
    ),
)]
struct Cli {
    /// Lanas server address.
    #[arg(long, env = "LANAS_ADDR", default_value = "http://127.0.0.1:8080")]
    addr: String,

    /// Admin bearer token.
    #[arg(long, env = "LANAS_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server health.
    Status,
    /// Print the answer options of every choice question.
    Catalog,
    /// Browse captured leads (needs an admin token).
    Leads {
        #[command(subcommand)]
        action: LeadCommands,
    },
    /// Submit a complete answer set from a JSON file.
    Submit {
        /// Path to a JSON object mapping field names to values.
        file: String,
    },
}

#[derive(Subcommand)]
enum LeadCommands {
    /// List every lead, newest first.
    List,
    /// Show one lead with catalog labels resolved.
    Show {
        /// Lead id.
        id: String,
    },
    /// Download all leads as CSV.
    Export {
        /// Output file (default: the server-suggested name).
        #[arg(long, short)]
        output: Option<String>,
    },
}

// ── HTTP client ──────────────────────────────────────────────────────

struct Client {
    http: reqwest::Client,
    addr: String,
    token: Option<String>,
}

impl Client {
    fn new(addr: String, token: Option<String>) -> Self {
        let http = reqwest::Client::new();
        let addr = addr.trim_end_matches('/').to_owned();
        Self { http, addr, token }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr)
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no token provided, set LANAS_TOKEN or use --token"))
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(self.token()?)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn get_no_auth(&self, path: &str) -> Result<Value> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn post_no_auth(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    /// Fetch a file download: raw bytes plus the suggested file name.
    async fn download(&self, path: &str) -> Result<(Vec<u8>, Option<String>)> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(self.token()?)
            .send()
            .await
            .context("request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("server returned {status}: {body}");
        }
        let filename = resp
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename);
        let bytes = resp.bytes().await.context("failed to read response body")?;
        Ok((bytes.to_vec(), filename))
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    if status == reqwest::StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let body = resp.text().await.context("failed to read response body")?;
    if !status.is_success() {
        bail!("server returned {status}: {body}");
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).context("failed to parse response JSON")
}

/// File name from `attachment; filename="..."`.
fn attachment_filename(disposition: &str) -> Option<String> {
    let (_, rest) = disposition.split_once("filename=")?;
    let name = rest.trim().trim_matches('"');
    // Never write outside the working directory.
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    (!name.is_empty()).then(|| name.to_owned())
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<22}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn joined(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(_) => println!("{value}"),
    }
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = Client::new(cli.addr, cli.token);

    match run(client, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(client: Client, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Status => cmd_status(&client).await,
        Commands::Catalog => cmd_catalog(&client).await,
        Commands::Leads { action } => cmd_leads(&client, action).await,
        Commands::Submit { file } => cmd_submit(&client, &file).await,
    }
}

// ── Commands ─────────────────────────────────────────────────────────

async fn cmd_status(client: &Client) -> Result<()> {
    let resp = client.get_no_auth("/v1/sys/health").await?;
    println!();
    header("◆", "Lanas Status");
    kv_line("Status", &format!("{GREEN}{}{RESET}", str_field(&resp, "status")));
    kv_line("Version", str_field(&resp, "version"));
    kv_line("Storage", str_field(&resp, "storage"));
    let sessions = resp.get("sessions").and_then(Value::as_u64).unwrap_or(0);
    kv_line("Open form sessions", &sessions.to_string());
    println!();
    Ok(())
}

async fn cmd_catalog(client: &Client) -> Result<()> {
    let resp = client.get_no_auth("/v1/catalog").await?;
    println!();
    let categories = resp
        .get("categories")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for category in &categories {
        header("▸", str_field(category, "category"));
        let options = category
            .get("options")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for option in &options {
            println!(
                "  {CYAN}├─{RESET} {:<16} {DIM}{}{RESET}",
                str_field(option, "code"),
                str_field(option, "label")
            );
        }
        println!();
    }
    Ok(())
}

async fn cmd_leads(client: &Client, action: LeadCommands) -> Result<()> {
    match action {
        LeadCommands::List => {
            let resp = client.get("/v1/admin/leads").await?;
            let leads = resp
                .get("leads")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            println!();
            header("▤", &format!("Leads ({})", leads.len()));
            if leads.is_empty() {
                println!("  {DIM}(no leads yet){RESET}");
            }
            for lead in &leads {
                println!(
                    "  {CYAN}├─{RESET} {DIM}{}{RESET}  {BOLD}{}{RESET}  {}  {DIM}{}{RESET}",
                    str_field(lead, "id"),
                    str_field(lead, "name"),
                    str_field(lead, "email"),
                    str_field(lead, "created_at"),
                );
            }
            println!();
        }
        LeadCommands::Show { id } => {
            let resp = client.get(&format!("/v1/admin/leads/{id}")).await?;
            let Some(lead) = resp.get("labeled") else {
                print_json(&resp);
                return Ok(());
            };
            println!();
            header("◆", str_field(lead, "name"));
            for key in [
                "id",
                "created_at",
                "email",
                "phone",
                "profession",
                "specialty",
                "monthly_income",
                "has_debts",
                "total_assets",
                "main_objective",
                "urgency_level",
                "contact_preference",
                "availability",
                "additional_comments",
            ] {
                kv_line(key, str_field(lead, key));
            }
            kv_line("investments", &joined(lead, "investments"));
            kv_line("financial_challenges", &joined(lead, "financial_challenges"));
            println!();
        }
        LeadCommands::Export { output } => {
            let (bytes, suggested) = client.download("/v1/admin/leads/export").await?;
            let path = output
                .or(suggested)
                .unwrap_or_else(|| "leads.csv".to_owned());
            std::fs::write(&path, &bytes).with_context(|| format!("failed to write {path}"))?;
            // One newline precedes each data row.
            let rows = bytes.iter().filter(|&&b| b == b'\n').count();
            println!();
            if rows == 0 {
                warning("No leads yet; wrote the header row only.");
            }
            success(&format!("Exported {rows} lead(s) to {BOLD}{path}{RESET}"));
            println!();
        }
    }
    Ok(())
}

async fn cmd_submit(client: &Client, file: &str) -> Result<()> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;
    let body: Value =
        serde_json::from_str(&raw).with_context(|| format!("{file} is not valid JSON"))?;
    if !body.is_object() {
        bail!("{file} must contain a JSON object of field names to values");
    }

    let resp = client.post_no_auth("/v1/leads", &body).await?;
    println!();
    success("Lead submitted");
    kv_line("ID", str_field(&resp, "id"));
    kv_line("Created", str_field(&resp, "created_at"));
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_filename_is_extracted() {
        assert_eq!(
            attachment_filename("attachment; filename=\"leads_2026-10-17.csv\"").as_deref(),
            Some("leads_2026-10-17.csv")
        );
        assert_eq!(attachment_filename("attachment"), None);
    }

    #[test]
    fn attachment_filename_drops_directories() {
        assert_eq!(
            attachment_filename("attachment; filename=\"../../etc/leads.csv\"").as_deref(),
            Some("leads.csv")
        );
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = Client::new("http://localhost:8080/".to_owned(), None);
        assert_eq!(client.url("/v1/sys/health"), "http://localhost:8080/v1/sys/health");
        assert!(client.token().is_err());
    }
}
