//! Formulax CLI - parse markup, dump ASTs, evaluate expressions

#[cfg(feature = "cli")]
use clap::Parser;
use formulax::{evaluate, parse, transcribe, Token};
use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "fmx")]
#[command(version)]
#[command(about = "Formulax - formula markup parser and calculator", long_about = None)]
struct Cli {
    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Dump the parsed AST as compact JSON instead of pretty JSON
    #[arg(long)]
    compact: bool,

    /// Print parse warnings to stderr
    #[arg(short, long)]
    warnings: bool,

    /// Evaluate a plain arithmetic expression and print its markup
    #[arg(short, long)]
    eval: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(expr) = &cli.eval {
        let tokens = lex_expression(expr);
        return match evaluate(&tokens) {
            Ok(result) => {
                println!("{}", transcribe(&result, "", false));
                ExitCode::SUCCESS
            }
            Err(failure) => {
                eprintln!("error: {}", failure);
                ExitCode::FAILURE
            }
        };
    }

    let input = match read_input(cli.input_file.as_deref()) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let outcome = parse(&input);
    if cli.warnings {
        for warning in &outcome.warnings {
            eprintln!("warning: {}", warning);
        }
    }
    let json = if cli.compact {
        serde_json::to_string(&outcome.ast)
    } else {
        serde_json::to_string_pretty(&outcome.ast)
    };
    let json = match json {
        Ok(json) => json,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = write_output(cli.output.as_deref(), &json) {
        eprintln!("error: {}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, content),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")
        }
    }
}

/// Turn a plain expression string into calculator tokens: digit runs
/// become numbers, letters become free variables, everything else a
/// symbol per character.
fn lex_expression(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            tokens.push(Token::number(chars[start..i].iter().collect::<String>()));
            continue;
        }
        if c.is_alphabetic() {
            tokens.push(Token::variable(c.to_string()));
        } else {
            tokens.push(Token::symbol(c.to_string()));
        }
        i += 1;
    }
    tokens
}
