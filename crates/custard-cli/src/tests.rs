use super::*;

#[test]
fn parses_scrape_command() {
    let cli = Cli::try_parse_from(["custard-cli", "scrape"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Scrape));
    assert!(cli.date.is_none());
}

#[test]
fn parses_site_command_with_id() {
    let cli = Cli::try_parse_from(["custard-cli", "site", "kopps"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Site { ref id } if id == "kopps"));
}

#[test]
fn site_command_requires_an_id() {
    assert!(Cli::try_parse_from(["custard-cli", "site"]).is_err());
}

#[test]
fn date_override_is_global() {
    let cli = Cli::try_parse_from(["custard-cli", "site", "oscars", "--date", "2025-07-15"])
        .expect("expected valid cli args");
    assert_eq!(cli.date, NaiveDate::from_ymd_opt(2025, 7, 15));
}

#[test]
fn malformed_date_is_rejected() {
    assert!(Cli::try_parse_from(["custard-cli", "scrape", "--date", "July 15"]).is_err());
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["custard-cli"]).is_err());
}
