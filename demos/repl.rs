use log::{LevelFilter, Log, Metadata, Record};
use racklet::ast::Value;
use racklet::reader;
use racklet::session::Session;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

const PROMPT: &str = ">>> ";
const CONTINUATION_PROMPT: &str = "  > ";

/// Prints interpreter log records to stdout while `:debug` is on
struct ReplLogger;

impl Log for ReplLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: ReplLogger = ReplLogger;

fn main() {
    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("Racklet - an evaluator for a small functional subset of Racket");
    println!("Enter expressions like: (define sq (lambda (x) (* x x)))");
    println!("Type :help for more commands, or Ctrl+D to exit.");
    println!();

    if log::set_logger(&LOGGER).is_err() {
        eprintln!("Warning: could not install logger, :debug will have no effect");
    }
    log::set_max_level(LevelFilter::Off);

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            return;
        }
    };

    let session = match Session::with_prelude() {
        Ok(session) => session,
        Err(err) => {
            eprintln!("Could not load prelude: {err}");
            return;
        }
    };

    // Text of an expression still waiting for closing parentheses
    let mut pending = String::new();

    loop {
        let prompt = if pending.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        };

        match rl.readline(prompt) {
            Ok(line) => {
                if pending.is_empty() {
                    let command = line.trim();
                    if command.is_empty() {
                        continue;
                    }

                    // Handle special commands
                    match command {
                        ":help" => {
                            print_help();
                            continue;
                        }
                        ":env" => {
                            print_environment(&session);
                            continue;
                        }
                        ":debug" => {
                            toggle_debug();
                            continue;
                        }
                        ":quit" | ":exit" | "end" => {
                            println!("Goodbye!");
                            break;
                        }
                        _ => {}
                    }
                }

                pending.push_str(&line);
                pending.push('\n');
                if reader::is_incomplete(&pending) {
                    continue;
                }

                let source = std::mem::take(&mut pending);
                let _ = rl.add_history_entry(source.trim_end());
                eval_and_print(&session, &source);
            }

            Err(ReadlineError::Interrupted) if !pending.is_empty() => {
                // Ctrl+C abandons a partially entered expression
                pending.clear();
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

/// Evaluate each expression in order, printing its value; stop at the first error
fn eval_and_print(session: &Session, source: &str) {
    let expressions = match reader::parse(source) {
        Ok(expressions) => expressions,
        Err(e) => {
            println!("Error: {e}");
            return;
        }
    };

    for expr in &expressions {
        match session.eval(expr) {
            Ok(value) => println!("==> {value}"),
            Err(e) => {
                println!("Error: {e}");
                return;
            }
        }
    }
}

fn toggle_debug() {
    if log::max_level() == LevelFilter::Off {
        log::set_max_level(LevelFilter::Trace);
        println!("Debug output enabled");
    } else {
        log::set_max_level(LevelFilter::Off);
        println!("Debug output disabled");
    }
}

fn print_help() {
    println!("Racklet REPL commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current global bindings");
    println!("  :debug     - Toggle tracing of evaluation and function application");
    println!("  :quit      - Exit the interpreter (also :exit or end)");
    println!("  Ctrl+D     - Exit the interpreter");
    println!("  Ctrl+C     - Discard a partially entered expression, or exit");
    println!();
    println!("Language:");
    println!("  Integers: 42, -5, #xff");
    println!("  Booleans: #t, #f (only #t counts as true)");
    println!("  Symbols and lists: 'sym, '(1 2 3), (quote x)");
    println!("  Special forms: quote, define, lambda, if");
    println!("  Arithmetic: +, -, *, /, quotient, remainder, modulo, abs, min, max");
    println!("  Comparison: =, <, >, <=, >=, !=");
    println!("  Logic: not, and, or");
    println!("  Lists: cons, car, cdr, list, null?, length, append");
    println!("  Predicates: equal?, list?, integer?, boolean?, symbol?, procedure?");
    println!("  Prelude: map, filter, foldl, reverse");
    println!();
    println!("Examples:");
    println!("  (define fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))");
    println!("  (fact 10)");
    println!("  (map (lambda (x) (* x x)) '(1 2 3))");
    println!();
}

fn print_environment(session: &Session) {
    let bindings = session.global_frame().bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Global bindings ({} total):", bindings.len());
    println!();

    // Separate primitives from user-defined values
    let mut primitives = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings {
        match value {
            Value::Primitive(_) => primitives.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !primitives.is_empty() {
        println!("Primitive functions ({}):", primitives.len());
        // Print in columns for readability
        let mut col = 0;
        for name in primitives {
            print!("  {:<15}", name.name());
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}
