use colored::Colorize;

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn subheader(title: &str) {
    println!("{}", title.bold());
}

pub fn warn(msg: &str) {
    eprintln!("{}", warn_line(msg));
}

pub fn error(msg: &str) {
    eprintln!("{}", error_line(msg));
}

pub fn success(msg: &str) {
    println!("{}", success_line(msg));
}

fn warn_line(msg: &str) -> String {
    format!("{} {}", "warning:".yellow().bold(), msg)
}

fn error_line(msg: &str) -> String {
    format!("{} {}", "error:".red().bold(), msg)
}

fn success_line(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_does_not_panic() {
        header("Configuration Sources");
        subheader("Rejected");
    }

    #[test]
    fn test_warn_line_prefixes_message() {
        let line = warn_line("failed to parse toml config source bad.toml");
        assert!(line.contains("warning:"));
        assert!(line.ends_with(" failed to parse toml config source bad.toml"));
    }

    #[test]
    fn test_error_line_prefixes_message() {
        let line = error_line("section 'mongo' not found");
        assert!(line.contains("error:"));
        assert!(line.ends_with(" section 'mongo' not found"));
        assert!(!line.contains("warning:"));
    }

    #[test]
    fn test_success_line_marks_message() {
        let line = success_line("All sources loaded");
        assert!(line.contains('✓'));
        assert!(line.ends_with(" All sources loaded"));
    }
}
