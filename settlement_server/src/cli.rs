use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "MSR_HOST",
        "MSR_PORT",
        "MSR_MELI_APP_ID",
        "MSR_MELI_SELLER_IDS",
        "MSR_MELI_IP_WHITELIST",
        "MSR_USE_X_FORWARDED_FOR",
        "MSR_USE_FORWARDED",
        "MSR_QUEUE_FILE",
        "MSR_LEDGER_FILE",
        "MSR_MATURATION_WINDOW_SECS",
        "MSR_POLL_INTERVAL_SECS",
        "MSR_DAILY_REPORT_AT",
        "MSR_MONTHLY_REPORT_AT",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
