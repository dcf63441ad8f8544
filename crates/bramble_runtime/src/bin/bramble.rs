//! Bramble CLI entry point.

use bramble_runtime::serialize::MODULE_EXTENSION;
use bramble_runtime::{Player, PlayerConfig, Story, load_from_file, logging, save_to_file};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// What the CLI was asked to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Command {
    #[default]
    None,
    Compile,
    Play,
}

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    command: Command,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    resources: Option<PathBuf>,
    log: Option<String>,
    print_ast: bool,
    print_module: bool,
    show_help: bool,
    show_version: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();
    let mut args = args.into_iter().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "--print-ast" => config.print_ast = true,
            "--print-module" => config.print_module = true,
            "-o" | "--output" => config.output = Some(value(&mut args, &arg)?.into()),
            "--resources" => config.resources = Some(value(&mut args, &arg)?.into()),
            "--log" => config.log = Some(value(&mut args, &arg)?),
            "compile" if config.command == Command::None => config.command = Command::Compile,
            "play" if config.command == Command::None => config.command = Command::Play,
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option: {flag}").into());
            }
            path => {
                if config.input.is_some() {
                    return Err(format!("unexpected argument: {path}").into());
                }
                config.input = Some(PathBuf::from(path));
            }
        }
    }

    Ok(config)
}

fn value(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    args.next()
        .ok_or_else(|| format!("{flag} requires a value").into())
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("bramble {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    logging::init(config.log.as_deref());

    match config.command {
        Command::Compile => compile(&config),
        Command::Play => play(&config),
        Command::None => {
            print_help();
            Err("no command given".into())
        }
    }
}

fn input_path(config: &CliConfig) -> Result<&Path, Box<dyn std::error::Error>> {
    config
        .input
        .as_deref()
        .ok_or_else(|| "missing story file".into())
}

fn compile(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let input = input_path(config)?;
    let source = fs::read_to_string(input)
        .map_err(|e| format!("failed to read '{}': {e}", input.display()))?;

    if config.print_ast {
        let tree = bramble_language::parse(&source)?;
        let story = bramble_language::translate_story(&tree)?;
        println!("{story:#?}");
    }

    let module = bramble_language::compile(&source)?;
    if config.print_module {
        print!("{module}");
    }

    let output = config
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension(MODULE_EXTENSION));
    save_to_file(&module, &output)?;
    eprintln!("compiled {} -> {}", input.display(), output.display());
    Ok(())
}

fn play(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let input = input_path(config)?;
    let module = if input.extension().is_some_and(|ext| ext == MODULE_EXTENSION) {
        load_from_file(input)?
    } else {
        let source = fs::read_to_string(input)
            .map_err(|e| format!("failed to read '{}': {e}", input.display()))?;
        bramble_language::compile(&source)?
    };

    if config.print_module {
        print!("{module}");
    }

    let resources = config
        .resources
        .clone()
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let player_config = PlayerConfig::new().with_resource_dir(resources);

    let mut player = Player::new(Story::new(module), player_config)?;
    player.run()?;
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mBramble\x1b[0m - Interactive fiction compiler and player

\x1b[1mUSAGE:\x1b[0m
    bramble compile FILE [-o OUT] [--print-ast] [--print-module]
    bramble play FILE [--resources DIR]

\x1b[1mCOMMANDS:\x1b[0m
    compile       Compile a story source file to a .bmod module
    play          Play a story source file or compiled .bmod module

\x1b[1mOPTIONS:\x1b[0m
    -h, --help         Print help information
    -V, --version      Print version information
    -o, --output OUT   Where to write the compiled module
    --print-ast        Print the translated syntax tree
    --print-module     Print the bytecode listing
    --resources DIR    Directory sounds are loaded from
    --log LEVEL        Log filter (overrides BRAMBLE_LOG)

\x1b[1mEXAMPLES:\x1b[0m
    bramble compile cellar.bramble           Write cellar.bmod
    bramble play cellar.bramble              Compile and play
    bramble play cellar.bmod --log debug     Play with debug logging

\x1b[1mIN PLAY:\x1b[0m
    quit                 End the story
    Ctrl+D               Exit
    Ctrl+C               Cancel current input"
    );
}
