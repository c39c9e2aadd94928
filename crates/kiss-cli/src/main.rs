// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use kiss_app::LabelTemplateId;
use kiss_client::Client;
use runtime::ApiRuntime;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    init_tracing();
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("KISS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    if options.print_template {
        print!("{}", kiss_app::import::template_csv());
        return Ok(());
    }

    let mut config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `kiss --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    if options.dont_show_prefill || options.default_template.is_some() {
        if options.dont_show_prefill {
            config.ui.dont_show_prefill_modal = Some(true);
        }
        if let Some(template) = options.default_template {
            config.ui.default_label_template = Some(template);
        }
        config.save(&options.config_path)?;
        println!("saved preferences to {}", options.config_path.display());
        if options.action.is_none() && !options.check_only {
            return Ok(());
        }
    }

    let client = Client::new(&config.server_url(), config.server_timeout()?).with_context(|| {
        format!(
            "invalid [server] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    let mut runtime = ApiRuntime::new(client);
    let mut out = io::stdout().lock();

    if options.check_only {
        runtime.check(&mut out)?;
    }

    match options.action {
        Some(Action::Categories { search }) => runtime.categories(search.as_deref(), &mut out),
        Some(Action::Items { not_confirmed }) => runtime.items(not_confirmed, &mut out),
        Some(Action::Import(path)) => runtime.import(&path, &mut out),
        Some(Action::Export(path)) => runtime.export(&path, &mut out),
        None if options.check_only => Ok(()),
        None => {
            print_help();
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Categories { search: Option<String> },
    Items { not_confirmed: bool },
    Import(PathBuf),
    Export(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    print_template: bool,
    check_only: bool,
    show_help: bool,
    dont_show_prefill: bool,
    default_template: Option<LabelTemplateId>,
    action: Option<Action>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        print_template: false,
        check_only: false,
        show_help: false,
        dont_show_prefill: false,
        default_template: None,
        action: None,
    };
    let mut search: Option<String> = None;
    let mut not_confirmed = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        match arg {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--template" => {
                options.print_template = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--categories" => {
                set_action(&mut options, Action::Categories { search: None })?;
            }
            "--search" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--search requires a term"))?;
                search = Some(value.as_ref().to_owned());
            }
            "--items" => {
                set_action(
                    &mut options,
                    Action::Items {
                        not_confirmed: false,
                    },
                )?;
            }
            "--not-confirmed" => {
                not_confirmed = true;
            }
            "--import" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--import requires a CSV file path"))?;
                set_action(&mut options, Action::Import(PathBuf::from(value.as_ref())))?;
            }
            "--export" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--export requires an output file path"))?;
                set_action(&mut options, Action::Export(PathBuf::from(value.as_ref())))?;
            }
            "--dont-show-prefill" => {
                options.dont_show_prefill = true;
            }
            "--default-template" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--default-template requires a template id"))?;
                let id: LabelTemplateId = value.as_ref().parse().with_context(|| {
                    format!("--default-template expects a numeric id, got {:?}", value.as_ref())
                })?;
                options.default_template = Some(id);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
        }
    }

    match (&mut options.action, search) {
        (Some(Action::Categories { search: slot }), term) => *slot = term,
        (_, Some(_)) => bail!("--search only applies to --categories"),
        _ => {}
    }
    match (&mut options.action, not_confirmed) {
        (Some(Action::Items { not_confirmed: slot }), flag) => *slot = flag,
        (_, true) => bail!("--not-confirmed only applies to --items"),
        _ => {}
    }

    Ok(options)
}

fn set_action(options: &mut CliOptions, action: Action) -> Result<()> {
    if let Some(existing) = &options.action {
        bail!("choose one action per run; got {existing:?} and {action:?}");
    }
    options.action = Some(action);
    Ok(())
}

fn print_help() {
    println!("kiss (POS back office)");
    println!("  --config <path>           Use a specific config path");
    println!("  --print-config-path       Print resolved config path");
    println!("  --print-example-config    Print a v1 config template");
    println!("  --check                   Validate config and reach the server");
    println!("  --categories              Print the category tree");
    println!("    --search <term>         Only categories whose name contains <term>");
    println!("  --items                   List items");
    println!("    --not-confirmed         Only items still awaiting confirmation");
    println!("  --import <file.csv>       Create one item per CSV row");
    println!("  --export <file>           Export items (.xlsx/.xls/.tsv for tab-separated)");
    println!("  --template                Print the CSV import template");
    println!("  --dont-show-prefill       Stop showing the prefill prompt");
    println!("  --default-template <id>   Remember the default label template");
    println!("  --help                    Show this help");
}

#[cfg(test)]
mod tests {
    use super::{Action, CliOptions, parse_cli_args};
    use anyhow::Result;
    use kiss_app::LabelTemplateId;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/kiss-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                print_template: false,
                check_only: false,
                show_help: false,
                dont_show_prefill: false,
                default_template: None,
                action: None,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.print_template);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_attaches_search_to_categories() -> Result<()> {
        let options = parse_cli_args(
            vec!["--search", "gel", "--categories"],
            default_options_path(),
        )?;
        assert_eq!(
            options.action,
            Some(Action::Categories {
                search: Some("gel".to_owned())
            })
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_modifier_without_its_action() {
        let error = parse_cli_args(vec!["--items", "--search", "gel"], default_options_path())
            .expect_err("search without categories should fail");
        assert!(error.to_string().contains("--search only applies to --categories"));

        let error = parse_cli_args(vec!["--not-confirmed"], default_options_path())
            .expect_err("not-confirmed without items should fail");
        assert!(error.to_string().contains("--not-confirmed only applies to --items"));
    }

    #[test]
    fn parse_cli_args_sets_not_confirmed_items() -> Result<()> {
        let options = parse_cli_args(vec!["--items", "--not-confirmed"], default_options_path())?;
        assert_eq!(
            options.action,
            Some(Action::Items {
                not_confirmed: true
            })
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_two_actions() {
        let error = parse_cli_args(
            vec!["--import", "a.csv", "--export", "b.csv"],
            default_options_path(),
        )
        .expect_err("two actions should fail");
        assert!(error.to_string().contains("choose one action per run"));
    }

    #[test]
    fn parse_cli_args_reads_import_and_export_paths() -> Result<()> {
        let import = parse_cli_args(vec!["--import", "items.csv"], default_options_path())?;
        assert_eq!(import.action, Some(Action::Import(PathBuf::from("items.csv"))));

        let export = parse_cli_args(vec!["--export", "out.xlsx"], default_options_path())?;
        assert_eq!(export.action, Some(Action::Export(PathBuf::from("out.xlsx"))));

        let error = parse_cli_args(vec!["--import"], default_options_path())
            .expect_err("missing import path should fail");
        assert!(error.to_string().contains("--import requires a CSV file path"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_reads_preference_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--dont-show-prefill", "--default-template", "4"],
            default_options_path(),
        )?;
        assert!(options.dont_show_prefill);
        assert_eq!(options.default_template, Some(LabelTemplateId::new(4)));

        let error = parse_cli_args(vec!["--default-template", "four"], default_options_path())
            .expect_err("non-numeric template should fail");
        assert!(error.to_string().contains("expects a numeric id"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_and_template_flags() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);

        let template = parse_cli_args(vec!["--template"], default_options_path())?;
        assert!(template.print_template);
        Ok(())
    }
}
