use std::{
    error::Error,
    fs,
    io::{self, Read, Write},
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use justsh::{util::fmt::tree, Options};
use log::{info, warn};

/// Names searched for, in order, when no input file is given.
const JUSTFILE_NAMES: [&str; 4] = ["justfile", ".justfile", "Justfile", ".Justfile"];

/// Compile a justfile to a POSIX sh script
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input justfile path, or `-` for stdin
    #[arg(short, long)]
    infile: Option<PathBuf>,

    /// Output script path, or `-` for stdout
    #[arg(short, long, default_value = "just.sh")]
    outfile: PathBuf,

    /// Log what the compiler does
    #[arg(short, long)]
    verbose: bool,

    /// Print the parsed justfile instead of compiling it
    #[arg(long)]
    print_ast: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if std::env::args().next().is_some_and(|argv0| argv0.ends_with("just.sh")) {
        warn!("Call `./just.sh` instead of `just.sh` to execute the generated script.");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let infile = args
        .infile
        .clone()
        .or_else(find_justfile)
        .ok_or("No justfile found in the current directory, pass one with `--infile`")?;
    let stdin = is_stdio(&infile);
    let stdout = is_stdio(&args.outfile);

    info!(
        "Compiling justfile to shell script: `{}` -> `{}`",
        if stdin { "stdin".into() } else { infile.display().to_string() },
        if stdout { "stdout".into() } else { args.outfile.display().to_string() },
    );

    let text = if stdin {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        text
    } else {
        fs::read_to_string(&infile)
            .map_err(|e| format!("failed to read `{}`: {e}", infile.display()))?
    };

    if args.print_ast {
        let justfile = justsh::parse(&text).map_err(|e| e.render(&text))?;
        print!("{}", tree::print_justfile_string(&justfile));
        return Ok(());
    }

    let script_name = if stdout {
        "just.sh".to_owned()
    } else {
        args.outfile
            .file_name()
            .map_or_else(|| "just.sh".to_owned(), |name| name.to_string_lossy().into_owned())
    };
    let options = Options {
        script_name,
        ..Options::default()
    };
    let script = justsh::compile(&text, &options).map_err(|e| e.render(&text))?;

    if stdout {
        io::stdout().write_all(script.as_bytes())?;
        return Ok(());
    }

    fs::write(&args.outfile, script)
        .map_err(|e| format!("failed to write `{}`: {e}", args.outfile.display()))?;
    let mut permissions = fs::metadata(&args.outfile)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(&args.outfile, permissions)?;
    Ok(())
}

fn find_justfile() -> Option<PathBuf> {
    JUSTFILE_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}
