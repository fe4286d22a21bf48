use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use sigmaforge::config::{Config, DEFAULT_CONFIG_FILE};
use sigmaforge::convert::Converter;
use sigmaforge::error::ForgeError;
use sigmaforge::interactive::{self, Prompter, RuleSource};
use sigmaforge::output::{listing, OutputFormat};
use sigmaforge::session::RunOptions;

const EXAMPLES: &str = "\
Examples:
  sigmaforge -i rule.yml -s splunk
  sigmaforge -i rules/proc_creation_win_curl_execution.yml -s splunk -s elasticsearch
  sigmaforge -i /path/to/sigma_rule.yml -s azure-sentinel -o splunk_query.txt
  sigmaforge -i rule.yml -s all -o queries.txt
  cat rule.yml | sigmaforge -i - -s loki --no-header
  sigmaforge -i rule.yml --validate
  sigmaforge --interactive
  sigmaforge --list-siem
  sigmaforge --list-pipelines";

#[derive(Parser)]
#[command(
    name = "sigmaforge",
    about = "Convert Sigma detection rules into native SIEM/XDR queries. One Sigma rule. Every SIEM.",
    version,
    disable_version_flag = true,
    after_help = EXAMPLES
)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    _version: Option<bool>,

    /// Sigma rule file (YAML); '-' reads from stdin
    #[arg(short, long, value_name = "PATH")]
    input: Option<String>,

    /// Target SIEM; repeat for several, 'all' for every supported platform
    #[arg(short = 's', long = "siem", value_name = "SIEM")]
    siems: Vec<String>,

    /// Processing pipeline (default: sysmon)
    #[arg(short, long, value_name = "NAME")]
    pipeline: Option<String>,

    /// Write output to file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long)]
    format: Option<String>,

    /// List supported SIEM platforms and exit
    #[arg(long)]
    list_siem: bool,

    /// List common processing pipelines and exit
    #[arg(long)]
    list_pipelines: bool,

    /// Omit the SIEM name header above each query
    #[arg(long)]
    no_header: bool,

    /// Prompt for the rule and SIEM choice when not given
    #[arg(long)]
    interactive: bool,

    /// Convert the rule for every SIEM and report which backends work
    #[arg(long)]
    validate: bool,

    /// Config file path (default: .sigmaforge.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// sigma-cli command line, e.g. "python3 -m sigma". Split on whitespace,
    /// so paths containing spaces must go in the config file's engine.command
    #[arg(long, env = "SIGMAFORGE_ENGINE", value_name = "CMD")]
    engine: Option<String>,

    /// Write a starter .sigmaforge.toml and exit
    #[arg(long)]
    init_config: bool,

    /// Overwrite an existing config file with --init-config
    #[arg(long, requires = "init_config")]
    force: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SIGMAFORGE_LOG").unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32, ForgeError> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if cli.init_config {
        return cmd_init_config(&config_path, cli.force);
    }

    let config = Config::load(&config_path)?;
    let format = resolve_format(cli.format.as_deref(), config.defaults.format);

    if cli.list_siem {
        print!("{}", listing::render_siem_list(format)?);
        return Ok(0);
    }
    if cli.list_pipelines {
        print!("{}", listing::render_pipelines());
        return Ok(0);
    }

    cmd_convert(cli, &config, format)
}

fn resolve_format(flag: Option<&str>, default: OutputFormat) -> OutputFormat {
    match flag {
        Some(s) => OutputFormat::from_str_lenient(s).unwrap_or_else(|| {
            eprintln!("Warning: unknown format '{}', using {:?}", s, default);
            default
        }),
        None => default,
    }
}

/// The rule text and, when it came from a file, that file's path.
struct RuleInput {
    text: String,
    path: Option<PathBuf>,
}

fn cmd_convert(cli: Cli, config: &Config, format: OutputFormat) -> Result<i32, ForgeError> {
    let mut prompter = interactive::Terminal;

    if cli.interactive {
        prompter.say(interactive::BANNER)?;
        prompter.say("SigmaForge - Interactive mode (Ctrl+C to exit)\n")?;
    }

    let rule = match (&cli.input, cli.interactive) {
        (Some(input), _) => read_rule_input(input)?,
        (None, true) => match interactive::prompt_rule_source(&mut prompter)? {
            RuleSource::Skipped => {
                eprintln!("No input. Use -i <file> or run with -h for help.");
                return Ok(0);
            }
            RuleSource::Inline(text) => RuleInput { text, path: None },
            RuleSource::File(path) => read_rule_file(&path)?,
        },
        (None, false) => {
            return Err(ForgeError::Usage(
                "-i/--input is required (or use --list-siem / --list-pipelines).".into(),
            ))
        }
    };

    if rule.text.trim().is_empty() {
        return Err(ForgeError::Usage("Sigma rule input is empty.".into()));
    }

    let pipeline = cli
        .pipeline
        .clone()
        .unwrap_or_else(|| config.defaults.pipeline.clone());
    let engine = config.engine.build(cli.engine.as_deref())?;
    let converter = Converter::new(engine);

    if cli.validate {
        let report = sigmaforge::validate::validate(
            &converter,
            &rule.text,
            rule.path.as_deref(),
            &pipeline,
        );
        let rendered = match format {
            OutputFormat::Json => serde_json::to_string_pretty(&report)?,
            OutputFormat::Text => report.render(),
        };
        print!("{}", rendered.trim_end());
        println!();
        return Ok(report.exit_code());
    }

    let mut siems: Vec<String> = cli
        .siems
        .iter()
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .collect();
    if siems.is_empty() {
        if !cli.interactive {
            return Err(ForgeError::Usage("At least one -s/--siem is required.".into()));
        }
        siems = interactive::prompt_siem_choice(&mut prompter)?;
        if siems.is_empty() {
            return Err(ForgeError::Usage("No SIEM selected.".into()));
        }
    }

    let options = RunOptions {
        pipeline: &pipeline,
        rule_path: rule.path.as_deref(),
    };
    let report = sigmaforge::convert_rule(&converter, &rule.text, &siems, &options);

    if report.has_output() {
        let headers = !(cli.no_header || config.defaults.no_header);
        let rendered = sigmaforge::render_report(&report, format, headers)?;
        match &cli.output {
            Some(out) => {
                std::fs::write(out, format!("{}\n", rendered)).map_err(|e| {
                    ForgeError::Output(format!("cannot write {}: {}", out.display(), e))
                })?;
                eprintln!(
                    "Wrote {} conversion(s) to {}.",
                    report.blocks.len(),
                    out.display()
                );
            }
            None => println!("{}", rendered),
        }
    }

    for error in &report.errors {
        eprintln!("{}", error);
    }

    Ok(report.exit_code())
}

fn read_rule_input(input: &str) -> Result<RuleInput, ForgeError> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(RuleInput { text, path: None });
    }
    read_rule_file(Path::new(input))
}

fn read_rule_file(path: &Path) -> Result<RuleInput, ForgeError> {
    if !path.exists() {
        return Err(ForgeError::InputNotFound(path.display().to_string()));
    }
    Ok(RuleInput {
        text: std::fs::read_to_string(path)?,
        path: Some(path.to_path_buf()),
    })
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32, ForgeError> {
    if path.exists() && !force {
        eprintln!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
        return Ok(1);
    }

    std::fs::write(path, Config::starter_toml())?;
    println!("Created {}", path.display());

    Ok(0)
}
