//!
//! dormcheck CLI
//! -------------
//! One-shot client for the dormitory inspection service. Signs in (or tries to
//! resume a session), runs a single command and prints the result as JSON.

use std::env;

use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use dormcheck::config::ClientConfig;
use dormcheck::notify::Severity;
use dormcheck::resource::QueryParams;
use dormcheck::ServiceContext;

// Used when RUST_LOG is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "info";

fn log_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?)
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--user <u> --password <p>] <command> [args]\n\nCommands:\n  whoami                         show the signed-in identity\n  students [key=value ...]       list students (skip, limit, search, ...)\n  rooms [key=value ...]          list rooms\n  buildings-tree                 buildings with rooms and beds\n  inspections [key=value ...]    search inspection records (student_name, room_number, status, ...)\n  items [key=value ...]          list inspection items\n  announcements [skip] [limit]   list announcements\n  search <text>                  global search\n  dashboard                      home page data for the current user\n  can <permission>               check a permission for the current user\n  logout                         end the session\n\nEnvironment:\n  DORMCHECK_API_BASE, DORMCHECK_HTTP_TIMEOUT_SECS, DORMCHECK_LOCALE, DORMCHECK_MESSAGES, RUST_LOG"
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn params_from(args: &[String]) -> Result<QueryParams> {
    args.iter()
        .map(|a| a.split_once('=').ok_or_else(|| anyhow!("expected key=value, got '{}'", a)))
        .collect::<Result<Vec<_>>>()
        .map(|pairs| pairs.into_iter().collect())
}

async fn run(ctx: &ServiceContext, command: &str, rest: &[String]) -> Result<()> {
    match command {
        "whoami" => match ctx.session().identity() {
            Some(id) => print_json(&*id),
            None => Err(anyhow!("not signed in")),
        },
        "students" => print_json(&ctx.students().list(&params_from(rest)?).await?),
        "rooms" => print_json(&ctx.rooms().list_rooms(&params_from(rest)?).await?),
        "buildings-tree" => print_json(&ctx.buildings().full_tree().await?),
        "inspections" => {
            let params = params_from(rest)?;
            if params.is_empty() {
                print_json(&ctx.inspections().list(&params).await?)
            } else {
                let filters = dormcheck::domain::SearchParams {
                    student_name: params.get("student_name").map(str::to_string),
                    room_number: params.get("room_number").map(str::to_string),
                    start_date: params.get("start_date").map(str::to_string),
                    end_date: params.get("end_date").map(str::to_string),
                    status: params.get("status").map(|s| serde_json::from_value(serde_json::Value::String(s.to_string()))).transpose()?,
                    skip: params.get("skip").map(str::parse::<u32>).transpose()?,
                    limit: params.get("limit").map(str::parse::<u32>).transpose()?,
                };
                print_json(&ctx.inspections().search(&filters).await?)
            }
        }
        "items" => print_json(&ctx.items().list(&params_from(rest)?).await?),
        "announcements" => {
            let skip = rest.first().map(|s| s.parse::<u32>()).transpose()?.unwrap_or(0);
            let limit = rest.get(1).map(|s| s.parse::<u32>()).transpose()?.unwrap_or(10);
            print_json(&ctx.announcements().list(skip, limit).await?)
        }
        "search" => {
            let text = rest.join(" ");
            let search = ctx.search();
            search.set_query(text);
            search.settle().await;
            match search.error() {
                Some(e) => Err(anyhow!(e)),
                None => print_json(&search.results()),
            }
        }
        "dashboard" => print_json(&ctx.dashboard().load().await),
        "can" => {
            let perm = rest.first().ok_or_else(|| anyhow!("can requires a permission name"))?;
            println!("{}", ctx.session().has_permission(perm));
            Ok(())
        }
        "logout" => {
            ctx.session().logout().await;
            Ok(())
        }
        other => Err(anyhow!("unknown command '{}'", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(log_filter()?).with_writer(std::io::stderr).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut config = ClientConfig::from_env();
    let mut user: Option<String> = None;
    let mut password: Option<String> = None;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--api" => {
                if i + 1 >= args.len() { eprintln!("--api requires a URL"); print_usage(&program); std::process::exit(2); }
                config = config.with_api_base(args[i + 1].clone());
                i += 2; continue;
            }
            "--user" => {
                if i + 1 >= args.len() { eprintln!("--user requires a value"); print_usage(&program); std::process::exit(2); }
                user = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--password" => {
                if i + 1 >= args.len() { eprintln!("--password requires a value"); print_usage(&program); std::process::exit(2); }
                password = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            other => { positional.push(other.to_string()); i += 1; }
        }
    }

    let Some((command, rest)) = positional.split_first() else {
        print_usage(&program);
        std::process::exit(2);
    };

    info!(target: "dormcheck", "dormcheck starting: api_base='{}', locale={}, command={}", config.api_base, config.locale, command);
    let ctx = ServiceContext::from_config(config)?;

    let signed_in = match (user.as_deref(), password.as_deref()) {
        (Some(u), Some(p)) => ctx.session().login(u, p).await,
        (None, None) => ctx.session().resolve_identity().await,
        _ => return Err(anyhow!("--user and --password must be given together")),
    };
    if !signed_in && user.is_some() {
        return Err(anyhow!("login failed"));
    }

    let outcome = run(&ctx, command, rest).await;

    let last = ctx.notifier().current();
    if last.visible {
        let tag = match last.severity {
            Severity::Success => "ok",
            Severity::Error => "error",
            Severity::Info => "info",
        };
        eprintln!("[{}] {}", tag, last.message);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn default_filter_lets_the_startup_banner_through() {
        let filter = EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn params_from_rejects_bare_words() {
        assert!(params_from(&["limit=5".to_string()]).is_ok());
        assert!(params_from(&["limit".to_string()]).is_err());
    }
}
