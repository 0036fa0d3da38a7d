use colored::*;
use console::Term;
use std::fmt::Display;

/// Console output with the kitstart palette and symbols.
/// Just a namespace; never instantiated.
/// Colors: teal (38, 198, 160) for info, orange (240, 136, 62) for brand.
pub struct Logger;

impl Logger {
    /// Prints the banner, centered on the terminal.
    /// Slashes and underscores get the brand color, letters get teal.
    pub fn banner() {
        let term = Term::stdout();
        let width = term.size().1 as usize;

        let banner = r#"
    __   _ __        __             __
   / /__(_) /______/ /_____ ______/ /_
  / //_/ / __/ ___/ __/ __ `/ ___/ __/
 / ,< / / /_(__  ) /_/ /_/ / /  / /_
/_/|_/_/\__/____/\__/\__,_/_/   \__/
"#;

        for line in banner.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let colored_line = if line.contains('/') || line.contains('_') {
                line.truecolor(240, 136, 62).bold().to_string()
            } else {
                line.truecolor(38, 198, 160).bold().to_string()
            };
            println!("{:^width$}", colored_line, width = width);
        }
        println!();
    }

    pub fn info<T: Display>(msg: T) {
        println!("{} {}", "•".truecolor(38, 198, 160).bold(), msg);
    }

    pub fn success<T: Display>(msg: T) {
        println!("{} {}", "✔".green().bold(), msg);
    }

    pub fn error<T: Display>(msg: T) {
        eprintln!("{} {}", "✖".red().bold(), msg);
    }

    /// Use sparingly, nobody reads the tenth warning.
    pub fn warn<T: Display>(msg: T) {
        println!("{} {}", "⚠".yellow().bold(), msg);
    }

    /// Big red block for fatal errors, so nobody confuses it with progress output.
    /// Prints the error and then every cause under it.
    pub fn error_banner(err: &anyhow::Error) {
        eprintln!();
        eprintln!("{}", " ERROR ".on_red().white().bold());
        Self::error(err);
        for cause in err.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }
        eprintln!();
    }

    /// Section header. The leading newline keeps it off the previous output.
    pub fn header<T: Display>(msg: T) {
        println!(
            "\n{}",
            msg.to_string().truecolor(240, 136, 62).bold().underline()
        );
    }

    /// "command description" with the command in brand color and the rest dimmed.
    pub fn command<T: Display>(cmd: &str, msg: T) {
        println!(
            "{} {}",
            cmd.truecolor(240, 136, 62).bold(),
            msg.to_string().dimmed()
        );
    }

    pub fn highlight<T: Display>(msg: T) -> String {
        msg.to_string().truecolor(38, 198, 160).bold().to_string()
    }

    /// Project names, versions, licenses.
    pub fn brand_text<T: Display>(msg: T) -> String {
        msg.to_string().truecolor(240, 136, 62).bold().to_string()
    }

    pub fn dim<T: Display>(msg: T) -> String {
        msg.to_string().dimmed().to_string()
    }
}
