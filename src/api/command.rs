use std::str::FromStr;

use crate::blueprint::catalog::{CAMP, TOWN};
use crate::engine::{Error, Quantity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Buy { resource: String, quantity: Quantity },
    Resources,
    Save,
    Reset,
    Help,
    Exit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = parts.first() else {
            return Err(Error::InvalidArgument("empty command".to_string()));
        };

        match first.to_ascii_lowercase().as_str() {
            "bc" => shorthand_buy(CAMP, "bc", &parts),
            "bt" => shorthand_buy(TOWN, "bt", &parts),
            "buy" | "b" => match parts.as_slice() {
                [_, resource, quantity] => Ok(Command::Buy {
                    resource: resource.to_ascii_lowercase(),
                    quantity: quantity.parse()?,
                }),
                _ => Err(Error::InvalidArgument(
                    "format should be 'buy <resource> <number>' or 'buy <resource> all'"
                        .to_string(),
                )),
            },
            "resources" | "r" => Ok(Command::Resources),
            "save" | "s" => Ok(Command::Save),
            "reset" => match parts.get(1) {
                Some(&"confirm") => Ok(Command::Reset),
                _ => Err(Error::InvalidArgument(
                    "type 'reset confirm' to erase your civilization".to_string(),
                )),
            },
            "help" | "h" => Ok(Command::Help),
            "exit" | "e" | "quit" | "q" => Ok(Command::Exit),
            other => Err(Error::InvalidArgument(format!(
                "unknown command '{other}', type \"help\" for a list of valid commands"
            ))),
        }
    }
}

fn shorthand_buy(resource: &str, alias: &str, parts: &[&str]) -> Result<Command, Error> {
    match parts {
        [_, quantity] => Ok(Command::Buy {
            resource: resource.to_string(),
            quantity: quantity.parse()?,
        }),
        _ => Err(Error::InvalidArgument(format!(
            "format should be '{alias} <number>' or '{alias} all'"
        ))),
    }
}

pub const HELP: &str = "\
Commands:
  bc <number|all>               buy camps, each produces 1 villager per second
  bt <number|all>               buy towns, each produces 2 villagers per second
  buy <resource> <number|all>   buy any purchasable resource
  resources, r                  show resource counts and what you can afford
  save, s                       save now
  reset confirm                 erase your civilization and start over
  help, h                       show this message
  exit, e                       save and cleanly exit the game
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorthand_buys() {
        assert_eq!(
            "bc 3".parse::<Command>().unwrap(),
            Command::Buy {
                resource: CAMP.to_string(),
                quantity: Quantity::Exact(3)
            }
        );
        assert_eq!(
            "  BT   all ".parse::<Command>().unwrap(),
            Command::Buy {
                resource: TOWN.to_string(),
                quantity: Quantity::All
            }
        );
    }

    #[test]
    fn test_parse_generic_buy() {
        assert_eq!(
            "buy Camp 2".parse::<Command>().unwrap(),
            Command::Buy {
                resource: CAMP.to_string(),
                quantity: Quantity::Exact(2)
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed_buys() {
        assert!(matches!(
            "bc".parse::<Command>(),
            Err(Error::InvalidArgument(msg)) if msg.contains("bc <number>")
        ));
        assert!("bc ten".parse::<Command>().is_err());
        assert!("bt 1 2".parse::<Command>().is_err());
        assert!("buy camp".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("r".parse::<Command>().unwrap(), Command::Resources);
        assert_eq!("resources".parse::<Command>().unwrap(), Command::Resources);
        assert_eq!("s".parse::<Command>().unwrap(), Command::Save);
        assert_eq!("h".parse::<Command>().unwrap(), Command::Help);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Exit);
        assert_eq!("e".parse::<Command>().unwrap(), Command::Exit);
    }

    #[test]
    fn test_reset_needs_confirmation() {
        assert!("reset".parse::<Command>().is_err());
        assert_eq!("reset confirm".parse::<Command>().unwrap(), Command::Reset);
    }

    #[test]
    fn test_unknown_and_empty() {
        assert!(matches!(
            "dance".parse::<Command>(),
            Err(Error::InvalidArgument(msg)) if msg.contains("dance")
        ));
        assert!("   ".parse::<Command>().is_err());
    }
}
