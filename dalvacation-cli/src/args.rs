//! Command-line argument parsing.

use std::{error::Error, fmt::Display, path::PathBuf, process};

use dalvacation::dir::DataDirectory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignUp,
    Rooms,
    /// Details of a room, with the reservations of the signed-in user.
    Room(String),
    Reserve(String),
    Concern,
    Logout,
}

impl Command {
    /// Parses a command word, taking its operand from `rest` when it has one.
    fn parse(word: &str, rest: &mut impl Iterator<Item = String>) -> Result<Self, String> {
        let mut operand = |what: &str| {
            rest.next()
                .ok_or_else(|| format!("missing {} to command '{}'", what, word))
        };
        match word {
            "signup" => Ok(Self::SignUp),
            "rooms" => Ok(Self::Rooms),
            "room" => Ok(Self::Room(operand("room id")?)),
            "reserve" => Ok(Self::Reserve(operand("room id")?)),
            "concern" => Ok(Self::Concern),
            "logout" => Ok(Self::Logout),
            _ => Err(format!("unknown command '{}'", word)),
        }
    }
}

/// Parsed command-line argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    DatadirPath(DataDirectory),
    ConfigPath(PathBuf),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub datadir: DataDirectory,
    pub config_path: Option<PathBuf>,
    pub command: Command,
}

/// Parse command-line arguments.
///
/// `args` includes the program name at args[0].
pub fn parse_args(args: Vec<String>, version: impl Display) -> Result<Vec<Arg>, Box<dyn Error>> {
    let mut res = Vec::new();

    let app_name = args
        .first()
        .and_then(|a| std::path::Path::new(a).file_name())
        .and_then(|s| s.to_str())
        .unwrap_or("dalvacation")
        .to_string();

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-v") {
        eprintln!("{}", version);
        process::exit(0);
    }

    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        eprintln!(
            r#"
Usage: {app_name} [OPTIONS] [COMMAND]

Commands:
    signup              Create an account (default)
    rooms               List the rooms
    room <ROOM_ID>      Show a room and your reservations of it
    reserve <ROOM_ID>   Request a booking of a room
    concern             Send a concern about a booking to the support agents
    logout              Forget the signed-in user

Options:
    --datadir <PATH>    Path of the data directory
    --config <PATH>     Path of the configuration file
    -v, --version       Display {app_name} version
    -h, --help          Print help
        "#
        );
        process::exit(0);
    }

    let mut iter = args.into_iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--datadir" => match iter.next() {
                Some(a) => res.push(Arg::DatadirPath(DataDirectory::new(PathBuf::from(a)))),
                None => return Err("missing arg to --datadir".into()),
            },
            "--config" => match iter.next() {
                Some(a) => res.push(Arg::ConfigPath(PathBuf::from(a))),
                None => return Err("missing arg to --config".into()),
            },
            a if a.starts_with('-') => return Err(format!("unknown option {}", a).into()),
            a => res.push(Arg::Command(Command::parse(a, &mut iter)?)),
        }
    }

    Ok(res)
}

/// Convert parsed command-line arguments to the options of the run.
pub fn args_to_options(args: &[Arg]) -> Result<Options, Box<dyn Error>> {
    let mut datadir = None;
    let mut config_path = None;
    let mut command = None;
    for arg in args {
        let duplicate = match arg {
            Arg::DatadirPath(d) => datadir.replace(d.clone()).is_some(),
            Arg::ConfigPath(p) => config_path.replace(p.clone()).is_some(),
            Arg::Command(c) => command.replace(c.clone()).is_some(),
        };
        if duplicate {
            return Err("Unknown args combination".into());
        }
    }
    Ok(Options {
        datadir: match datadir {
            Some(d) => d,
            None => DataDirectory::new_default()?,
        },
        config_path,
        command: command.unwrap_or(Command::SignUp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION: &str = "0.1.0";

    fn args(line: &str) -> Vec<String> {
        line.split(' ').map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert!(parse_args(args("app --meth"), VERSION).is_err());
        assert!(parse_args(args("app --datadir"), VERSION).is_err());
        assert!(parse_args(args("app book"), VERSION).is_err());
        assert!(parse_args(args("app reserve"), VERSION).is_err());
        assert_eq!(
            Some(vec![Arg::Command(Command::Reserve("r-1".to_string()))]),
            parse_args(args("app reserve r-1"), VERSION).ok()
        );
        assert_eq!(
            Some(vec![
                Arg::Command(Command::Room("r-2".to_string())),
                Arg::ConfigPath(PathBuf::from("conf.toml")),
            ]),
            parse_args(args("app room r-2 --config conf.toml"), VERSION).ok()
        );
        assert_eq!(
            Some(vec![Arg::Command(Command::Rooms)]),
            parse_args(args("app rooms"), VERSION).ok()
        );
        assert_eq!(
            Some(vec![
                Arg::DatadirPath(DataDirectory::new(PathBuf::from("hello"))),
                Arg::Command(Command::Logout),
                Arg::ConfigPath(PathBuf::from("conf.toml")),
            ]),
            parse_args(
                args("app --datadir hello logout --config conf.toml"),
                VERSION
            )
            .ok()
        );
    }

    #[test]
    fn test_args_to_options() {
        let options = args_to_options(&[
            Arg::Command(Command::Rooms),
            Arg::DatadirPath(DataDirectory::new(PathBuf::from("hello"))),
        ])
        .unwrap();
        assert_eq!(
            options,
            Options {
                datadir: DataDirectory::new(PathBuf::from("hello")),
                config_path: None,
                command: Command::Rooms,
            }
        );

        let options =
            args_to_options(&[Arg::DatadirPath(DataDirectory::new(PathBuf::from("x")))]).unwrap();
        assert_eq!(options.command, Command::SignUp);

        assert!(args_to_options(&[
            Arg::Command(Command::Rooms),
            Arg::Command(Command::Logout)
        ])
        .is_err());
    }
}
