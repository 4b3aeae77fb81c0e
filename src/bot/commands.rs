use anyhow::anyhow;
use std::fmt::Display;
use std::str::FromStr;
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
    #[command(description = "показать справку")]
    Help,
    #[command(description = "показать курсы валют")]
    Currency,
    #[command(description = "конвертировать валюту, например /convert USD 100")]
    Convert(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertArgs {
    pub code: String,
    pub amount: String,
}

/// Splits `/convert` arguments into an upper-cased code and the raw amount.
pub fn parse_convert_args(args: &str) -> Option<ConvertArgs> {
    match args.split_whitespace().collect::<Vec<_>>().as_slice() {
        [code, amount] => Some(ConvertArgs {
            code: code.to_uppercase(),
            amount: amount.to_string(),
        }),
        _ => None,
    }
}

/// Payload of an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Currency(String),
    More,
    Back,
    Page(usize),
    Noop,
}

impl Display for CallbackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackAction::Currency(code) => write!(f, "cur:{code}"),
            CallbackAction::More => write!(f, "more"),
            CallbackAction::Back => write!(f, "back"),
            CallbackAction::Page(page) => write!(f, "page:{page}"),
            CallbackAction::Noop => write!(f, "noop"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("cur", code)) if !code.is_empty() => Ok(CallbackAction::Currency(code.to_string())),
            Some(("page", page)) => page
                .parse()
                .map(CallbackAction::Page)
                .map_err(|e| anyhow!("Invalid page '{}': {}", page, e)),
            None if s == "more" => Ok(CallbackAction::More),
            None if s == "back" => Ok(CallbackAction::Back),
            None if s == "noop" => Ok(CallbackAction::Noop),
            _ => Err(anyhow!("Unknown callback data: {}", s)),
        }
    }
}
