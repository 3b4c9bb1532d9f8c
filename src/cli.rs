use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "alertdog")]
#[command(version)]
#[command(about = "Dead man's switch for Prometheus watchdog alerts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path
    #[arg(short, long, env = "ALERTDOG_CONFIG", default_value = "config.yml")]
    pub config: String,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Receive webhooks and sweep for missing watchdogs (default)
    Run,
    /// Load and validate the configuration, then exit
    Validate,
}

/// Print the effective configuration for `alertdog validate`
pub fn print_config_summary(config: &AppConfig) {
    println!("\n\x1b[36mAlertdog configuration\x1b[0m\n");
    println!("  Listen port:       {}", config.port);
    println!("  Sweep interval:    {}s", config.check_interval_secs);
    println!("  Webhook expiry:    {}s", config.expiry_secs);
    println!("  Alert expiry:      {}s", config.alert_expiry_secs);
    println!("  Push timeout:      {}s", config.push_timeout_secs);

    println!("\n  Alertmanagers ({}):", config.alertmanager_endpoints.len());
    for endpoint in &config.alertmanager_endpoints {
        println!("    - {}", endpoint);
    }

    println!("\n  Expected watchdogs ({}):", config.expected.len());
    for watchdog in &config.expected {
        let mut labels: Vec<String> = watchdog
            .match_labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        labels.sort();
        println!(
            "    - {{{}}} expiry {}s -> {}",
            labels.join(", "),
            watchdog.expiry_secs,
            watchdog.alert.display_name()
        );
    }

    let runbook = config.pager_duty.runbook_url.as_deref().unwrap_or("-");
    println!("\n  PagerDuty runbook: {}", runbook);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::parse_from(["alertdog"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, "config.yml");
    }

    #[test]
    fn test_validate_with_config_path() {
        let cli = Cli::parse_from(["alertdog", "--config", "/etc/alertdog.yml", "validate"]);
        assert_eq!(cli.command, Some(Commands::Validate));
        assert_eq!(cli.config, "/etc/alertdog.yml");
    }
}
