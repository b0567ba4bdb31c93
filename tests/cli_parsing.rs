use arbor::cli::commands::label::LabelCommands;
use arbor::cli::commands::note::NoteCommands;
use arbor::cli::commands::pr::PrCommands;
use arbor::cli::{Cli, Commands};
use clap::{CommandFactory, Parser};

#[test]
fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_parse_list_with_refresh() {
    let cli = Cli::try_parse_from(["arbor", "list", "--refresh", "--force", "--json"]).unwrap();
    assert!(cli.json);
    match cli.command {
        Commands::List(args) => {
            assert!(args.refresh);
            assert!(args.force);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_force_requires_refresh() {
    assert!(Cli::try_parse_from(["arbor", "list", "--force"]).is_err());
}

#[test]
fn test_parse_show_positional_target() {
    let cli = Cli::try_parse_from(["arbor", "show", "api:feat/x"]).unwrap();
    match cli.command {
        Commands::Show(target) => {
            assert_eq!(target.target.as_deref(), Some("api:feat/x"));
            assert_eq!(target.number, None);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_path_flags() {
    let cli = Cli::try_parse_from(["arbor", "path", "-n", "9", "-r", "alpha"]).unwrap();
    match cli.command {
        Commands::Path(target) => {
            assert_eq!(target.number, Some(9));
            assert_eq!(target.repo.as_deref(), Some("alpha"));
            assert!(target.target.is_none());
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_positional_target_conflicts_with_flags() {
    assert!(Cli::try_parse_from(["arbor", "path", "3", "-n", "4"]).is_err());
}

#[test]
fn test_parse_note_set() {
    let cli = Cli::try_parse_from(["arbor", "note", "set", "needs rebase", "7"]).unwrap();
    match cli.command {
        Commands::Note(args) => match args.command {
            NoteCommands::Set { text, target } => {
                assert_eq!(text, "needs rebase");
                assert_eq!(target.target.as_deref(), Some("7"));
            }
            _ => panic!("Wrong note command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_exec_trailing_command() {
    let cli = Cli::try_parse_from(["arbor", "exec", "3", "--", "cargo", "test", "-q"]).unwrap();
    match cli.command {
        Commands::Exec(args) => {
            assert_eq!(args.target.target.as_deref(), Some("3"));
            assert_eq!(args.command, vec!["cargo", "test", "-q"]);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_exec_requires_command() {
    assert!(Cli::try_parse_from(["arbor", "exec", "3"]).is_err());
}

#[test]
fn test_parse_pr_refresh() {
    let cli = Cli::try_parse_from(["arbor", "pr", "refresh", "--force"]).unwrap();
    match cli.command {
        Commands::Pr(args) => match args.command {
            PrCommands::Refresh { force } => assert!(force),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_label_add() {
    let cli = Cli::try_parse_from(["arbor", "label", "add", "web", "-r", "api"]).unwrap();
    match cli.command {
        Commands::Label(args) => match args.command {
            LabelCommands::Add { label, repo } => {
                assert_eq!(label, "web");
                assert_eq!(repo.as_deref(), Some("api"));
            }
            _ => panic!("Wrong label command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_gc_default_age() {
    let cli = Cli::try_parse_from(["arbor", "gc"]).unwrap();
    match cli.command {
        Commands::Gc(args) => assert_eq!(args.older_than_days, 30),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_global_config_after_subcommand() {
    let cli = Cli::try_parse_from(["arbor", "sync", "--config", "/etc/arbor.yaml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/arbor.yaml")));
    assert!(matches!(cli.command, Commands::Sync));
}

#[test]
fn test_parse_reset_and_remove_aliases() {
    let cli = Cli::try_parse_from(["arbor", "reset", "--yes"]).unwrap();
    assert!(matches!(cli.command, Commands::Reset(ref a) if a.yes));

    let cli = Cli::try_parse_from(["arbor", "rm", "--force", "feat/x"]).unwrap();
    match cli.command {
        Commands::Remove(args) => {
            assert!(args.force);
            assert_eq!(args.target.target.as_deref(), Some("feat/x"));
        }
        _ => panic!("Wrong top-level command"),
    }
}
