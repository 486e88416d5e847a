//! Basic help text parsing example.
//!
//! Parses pre-captured help output and prints what was recognized, without
//! executing any commands.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p treemand-discovery --example parse_help
//! ```

use treemand_discovery::parse_help;

fn main() {
    // Example help text (Clap-style)
    let help_text = r#"
Usage: mycli [OPTIONS] <COMMAND>

A fictional CLI tool for demonstration

Commands:
  init     Initialize a new project
  build    Build the project
  deploy   Deploy to production
  help     Print this message or the help of the given subcommand(s)

Options:
  -v, --verbose          Enable verbose output
  -q, --quiet            Suppress all output
  -c, --config <FILE>    Path to config file [default: config.toml]
      --no-color         Disable colored output
  -j, --jobs <N>         Number of parallel jobs [default: 4]
  -h, --help             Print help
  -V, --version          Print version
"#;

    let parsed = parse_help(help_text);

    println!("Description: {}", parsed.description);

    println!("\nSubcommands ({}):", parsed.subcommands.len());
    for name in &parsed.subcommands {
        println!("  {name}");
    }

    println!("\nFlags ({}):", parsed.flags.len());
    for flag in &parsed.flags {
        let short = flag
            .short_name
            .as_deref()
            .map(|s| format!("-{s}, "))
            .unwrap_or_default();
        println!("  {short}{} <{}>  {}", flag.name, flag.value_type, flag.description);
    }

    println!("\nPositionals ({}):", parsed.positionals.len());
    for positional in &parsed.positionals {
        let kind = if positional.required { "required" } else { "optional" };
        println!("  {} ({kind})", positional.name);
    }
}
