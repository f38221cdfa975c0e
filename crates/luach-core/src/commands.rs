use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use crate::annotate::annotate;
use crate::cli::Invocation;
use crate::config::Config;
use crate::datetime::format_key;
use crate::error::CalendarError;
use crate::hebrew::HebrewCalendar;
use crate::range::generate;
use crate::render::Renderer;
use crate::site::{Site, resolve_dest, validate_dest};

const GENERATE_USAGE: &str = "luach generate <start-date> <end-date> <dest>";
const PUBLISH_USAGE: &str = "luach publish <dest>";
const SHOW_USAGE: &str = "luach show <dest>";

pub fn known_command_names() -> Vec<&'static str> {
    vec!["generate", "publish", "show", "help"]
}

pub fn expand_command_abbrev<'a>(token: &str, known: &[&'a str]) -> Option<&'a str> {
    if let Some(exact) = known.iter().copied().find(|name| *name == token) {
        return Some(exact);
    }
    if token.is_empty() {
        return None;
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(cfg, renderer, inv))]
pub fn dispatch(cfg: &Config, renderer: &mut Renderer, inv: Invocation) -> anyhow::Result<()> {
    debug!(command = %inv.command, args = ?inv.command_args, "dispatching command");

    match inv.command.as_str() {
        "generate" => cmd_generate(cfg, &inv.command_args),
        "publish" => cmd_publish(cfg, &inv.command_args),
        "show" => cmd_show(cfg, renderer, &inv.command_args),
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn positional<'a, const N: usize>(
    args: &'a [String],
    usage: &'static str,
) -> Result<[&'a str; N], CalendarError> {
    if args.len() > N {
        warn!(extra = ?&args[N..], "ignoring extra arguments");
    }
    let taken: Vec<&str> = args.iter().take(N).map(String::as_str).collect();
    taken
        .try_into()
        .map_err(|_| CalendarError::MissingArgument { usage })
}

#[instrument(skip(cfg))]
fn cmd_generate(cfg: &Config, args: &[String]) -> anyhow::Result<()> {
    let [start, end, dest] = positional::<3>(args, GENERATE_USAGE)?;

    let range = generate(start, end)?;

    let dest = resolve_dest(dest)?;
    validate_dest(&dest)?;

    let annotated = annotate(&range, &HebrewCalendar)?;
    let site = Site::new(cfg, &dest);
    site.deploy(&annotated)?;
    site.publish()
        .context("calendar was generated but could not be published")?;

    info!(dest = %dest.display(), "generate complete");
    println!(
        "Generated {} days ({} to {}) in {}",
        annotated.days.len(),
        format_key(annotated.start_date),
        format_key(annotated.end_date),
        dest.display()
    );
    Ok(())
}

#[instrument(skip(cfg))]
fn cmd_publish(cfg: &Config, args: &[String]) -> anyhow::Result<()> {
    let [dest] = positional::<1>(args, PUBLISH_USAGE)?;
    let site = Site::new(cfg, &resolve_dest(dest)?);

    let data = site.publish()?;
    println!(
        "Published \"{}\" ({} days) to {}",
        data.title,
        data.days.len(),
        site.data_path.display()
    );
    Ok(())
}

#[instrument(skip(cfg, renderer))]
fn cmd_show(cfg: &Config, renderer: &mut Renderer, args: &[String]) -> anyhow::Result<()> {
    let [dest] = positional::<1>(args, SHOW_USAGE)?;
    let site = Site::new(cfg, &resolve_dest(dest)?);

    let data = site.calendar()?;
    renderer.print_calendar(&data)
}

fn print_help() {
    println!("Usage:");
    println!("  {GENERATE_USAGE}");
    println!("      pad the range to whole weeks, write the page and its data to <dest>");
    println!("  {PUBLISH_USAGE}");
    println!("      merge the edited statuses into the page data");
    println!("  {SHOW_USAGE}");
    println!("      print the merged calendar");
    println!();
    println!("Options: -v/-q, --rc key=value, --luachrc <file>");
}

#[cfg(test)]
mod tests {
    use super::{expand_command_abbrev, known_command_names, positional};
    use crate::error::CalendarError;

    #[test]
    fn expands_unique_prefixes_only() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("gen", &known), Some("generate"));
        assert_eq!(expand_command_abbrev("p", &known), Some("publish"));
        assert_eq!(expand_command_abbrev("show", &known), Some("show"));
        assert_eq!(expand_command_abbrev("x", &known), None);
        assert_eq!(expand_command_abbrev("", &known), None);
    }

    #[test]
    fn missing_positionals_report_usage() {
        let args = vec!["2026-02-01".to_string(), "2026-02-28".to_string()];
        let err = positional::<3>(&args, "luach generate <start-date> <end-date> <dest>")
            .expect_err("missing dest");
        assert_eq!(
            err,
            CalendarError::MissingArgument {
                usage: "luach generate <start-date> <end-date> <dest>",
            }
        );
        assert_eq!(
            err.to_string(),
            "usage: luach generate <start-date> <end-date> <dest>"
        );
    }

    #[test]
    fn takes_exact_positionals() {
        let args = vec!["/tmp/cal".to_string()];
        assert_eq!(positional::<1>(&args, "luach show <dest>"), Ok(["/tmp/cal"]));
    }
}
