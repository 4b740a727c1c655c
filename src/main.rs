use std::path::PathBuf;
use std::process;

use portsh::patterns::TableCache;
use portsh::{scan_path, ExitStatus, ScanEvent, ScanOptions};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage() {
    eprintln!("usage: portsh [-n] [-f] [-x] script ...");
}

fn print_help() {
    println!("portsh {VERSION} - check shell scripts for bashisms");
    println!();
    println!("USAGE:");
    println!("    portsh [OPTIONS] script ...");
    println!();
    println!("OPTIONS:");
    println!("    -n, --newline    Flag 'echo -n' (not portable to all sh implementations)");
    println!("    -f, --force      Check scripts even when they do not look like /bin/sh");
    println!("    -x, --extra      Enable pedantic checks ($BASH, RANDOM=, ...)");
    println!("    -h, --help       Print this help");
    println!("    -v, --version    Print the version");
    println!();
    println!("Diagnostics go to standard error. The exit code is a bitmask:");
    println!("0 clean, 1 bashisms found, 2 unreadable or non-sh files, 3 both.");
}

fn main() {
    let mut opts = ScanOptions::default();
    let mut files: Vec<PathBuf> = Vec::new();

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-n" | "--newline" => opts.echo_newline = true,
            "-f" | "--force" => opts.force = true,
            "-x" | "--extra" => opts.extra = true,
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-v" | "--version" => {
                println!("portsh {VERSION}");
                return;
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                eprintln!("portsh: unknown option: {flag}");
                print_usage();
                process::exit(1);
            }
            path => files.push(PathBuf::from(path)),
        }
    }

    if files.is_empty() {
        print_usage();
        process::exit(1);
    }

    let mut cache = TableCache::new();
    let mut status = ExitStatus::CLEAN;
    for file in &files {
        status |= scan_path(file, &opts, &mut cache, &mut |event| match event {
            ScanEvent::Bashism(diag) => eprintln!("{diag}"),
            ScanEvent::Warning(text) => eprintln!("{text}"),
        });
    }

    process::exit(status.code());
}
