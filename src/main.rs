use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use shoal::{RuntimeError, Shell, ShellError, ShellOptions};

#[derive(Parser)]
#[command(name = "shoal")]
#[command(about = "A POSIX-style shell with bridged interpreter blocks")]
#[command(version)]
struct Cli {
    /// Execute the script from command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Working directory to start in
    #[arg(long = "cwd")]
    cwd: Option<PathBuf>,

    /// Output the result as JSON (exitCode)
    #[arg(long = "json")]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Script file to execute
    #[arg()]
    script_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .ok();

    // Determine script source: -c, file, or stdin
    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("shoal: cannot read {}: {}", file.display(), e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("shoal: no script provided; use -c 'script', a script file, or stdin");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let mut shell = match Shell::with_options(ShellOptions {
        cwd: cli.cwd,
        vars: Vec::new(),
    }) {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("shoal: {}", e);
            std::process::exit(1);
        }
    };

    let code = match shell.eval(&script) {
        Ok(status) => status.code(),
        Err(ShellError::Runtime(RuntimeError::ExitRequest(code))) => code,
        Err(e @ ShellError::Parse(_)) => {
            eprintln!("shoal: {}", e);
            2
        }
        Err(e) => {
            eprintln!("shoal: {}", e);
            1
        }
    };

    if cli.json {
        println!("{}", serde_json::json!({ "exitCode": code }));
    }
    std::process::exit(code);
}
