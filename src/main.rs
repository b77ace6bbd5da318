use rusty_playground::playground_frontend::Parser;
use rusty_playground::treewalk_interpreter::Interpreter;

use clap::Parser as ClapParser;
use log::{debug, info};
use std::{fs, process};

#[derive(ClapParser, Debug)]
#[clap(name = "plgd", about = "Runs a playground script")]
struct Args {
    /// Script to run.
    script: String,

    /// Return syntax errors as a failing exit code instead of only printing
    /// them.
    #[clap(long)]
    testing: bool,

    /// Print the parsed tree instead of running it.
    #[clap(long)]
    dump_ast: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    debug!("{:?}", args);

    let source = match fs::read_to_string(&args.script) {
        Ok(source) => source,
        Err(e) => {
            report_error(&format!("Could not read {}: {}", args.script, e));
            process::exit(74);
        }
    };

    let mut parser = Parser::new(&source);
    parser.set_testing(args.testing);
    let root = match parser.program() {
        Ok(Some(root)) => root,
        // Already reported by the parser.
        Ok(None) => process::exit(65),
        Err(e) => {
            report_error(&format!("Syntax Error: {}", e));
            process::exit(65);
        }
    };

    if args.dump_ast {
        print!("{}", root.to_string_tree());
        return;
    }

    info!("Running {}", args.script);
    let mut interpreter = Interpreter::new();
    if let Err(e) = interpreter.run_program(&root) {
        report_error(&e.to_string());
        process::exit(70);
    }
}

fn report_error(error_message: &str) {
    eprintln!("{}", error_message);
}
