use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
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
    // MT_CHAT_WEBHOOK_URL and MT_BOOKING_API_TOKEN are secrets and must not be printed
    const DISPLAY_ENVS: [&str; 19] = [
        "RUST_LOG",
        "MT_HOST",
        "MT_PORT",
        "MT_DATABASE_URL",
        "MT_DB_MAX_CONNECTIONS",
        "MT_INGESTION_ENABLED",
        "MT_INGESTION_INTERVAL_SECS",
        "MT_MAX_CONCURRENT_FETCHES",
        "MT_FULL_MATCH_SIZE",
        "MT_MIN_KNOWN_MEMBERS",
        "MT_DRY_RUN",
        "MT_RESULT_WINDOW_HOURS",
        "MT_REPUBLISH_AFTER_MINS",
        "MT_EVENT_BUFFER_SIZE",
        "MT_CHAT_USERNAME",
        "MT_BOOKING_API_URL",
        "MT_BOOKING_TENANT_IDS",
        "MT_BOOKING_LOOKBACK_DAYS",
        "MT_BOOKING_LOOKAHEAD_DAYS",
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
