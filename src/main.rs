use spotstat::app::{self, AppStartupOptions};
use spotstat::config;
use spotstat::logging::{self, LogTarget, LoggingConfig};
use spotstat::query::SIMPLE_VIEW_PAGE_SIZE;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    simple: bool,
    page_size: Option<usize>,
    print: bool,
    paths: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let settings = config::load_settings()?;

    let target = if args.print {
        LogTarget::Stderr
    } else {
        config::ensure_config_dir()?;
        LogTarget::File(config::log_path()?)
    };
    let _log_guard = logging::init_logging(&LoggingConfig {
        filter_directives: settings.log_filter.clone(),
        target,
    })?;
    tracing::info!(version = %env!("CARGO_PKG_VERSION"), "starting");

    let page_size = match (args.page_size, args.simple) {
        (Some(size), _) => size,
        (None, true) => SIMPLE_VIEW_PAGE_SIZE,
        (None, false) => settings.page_size,
    };
    let options = AppStartupOptions {
        settings,
        page_size,
        initial_paths: args.paths,
    };

    if args.print {
        if options.initial_paths.is_empty() {
            anyhow::bail!("--print needs at least one export path");
        }
        return app::run_print(options, &mut std::io::stdout().lock());
    }

    app::run_with_startup(options)
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--simple" => out.simple = true,
            "--print" => out.print = true,
            "--page-size" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--page-size requires a number");
                };
                let size: usize = value
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("--page-size must be a positive number"))?;
                if size == 0 {
                    anyhow::bail!("--page-size must be a positive number");
                }
                out.page_size = Some(size);
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with("--") => anyhow::bail!("unknown argument {other}"),
            path => out.paths.push(PathBuf::from(path)),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("spotstat [options] [PATH...]");
    println!("  PATH              Export file or directory of *.json exports");
    println!("  --simple          Show 20 rows per page");
    println!("  --page-size N     Rows per page");
    println!("  --print           Print the first page as TSV and exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn paths_and_flags_are_parsed() {
        let parsed = parse_args(args(&["--simple", "a.json", "exports", "--print"])).expect("parse");
        assert!(parsed.simple);
        assert!(parsed.print);
        assert_eq!(parsed.paths, vec![PathBuf::from("a.json"), PathBuf::from("exports")]);
    }

    #[test]
    fn page_size_must_be_positive() {
        assert_eq!(
            parse_args(args(&["--page-size", "15"])).expect("parse").page_size,
            Some(15)
        );
        assert!(parse_args(args(&["--page-size", "0"])).is_err());
        assert!(parse_args(args(&["--page-size"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }
}
