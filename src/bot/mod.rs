//! Telegram front end over [`RateStore`].
//!
//! Handlers only translate chat updates into store calls and render the
//! results with [`messages`]; no rate logic lives here.

pub mod commands;
pub mod keyboards;
pub mod messages;

use crate::core::config::AppConfig;
use crate::store::RateStore;
use anyhow::{Context, Result};
use commands::{CallbackAction, Command};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::utils::command::BotCommands;
use teloxide::{ApiError, RequestError};
use tracing::{debug, info, warn};

/// Shared state handed to every handler.
pub struct BotContext {
    pub store: Arc<RateStore>,
    pub items_per_page: usize,
}

pub async fn run(config: &AppConfig, store: Arc<RateStore>) -> Result<()> {
    let token = config.resolve_bot_token().with_context(|| {
        format!(
            "No bot token configured, set `bot_token` in the config file or {}",
            crate::core::config::BOT_TOKEN_ENV
        )
    })?;

    let bot = Bot::new(token);
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    // Warm the cache so the first user does not wait for the feed
    if let Err(e) = store.fetch().await {
        warn!(error = %e, "Initial rate fetch failed, will retry on demand");
    }

    let context = Arc::new(BotContext {
        store,
        items_per_page: config.items_per_page,
    });

    info!("Starting bot polling");
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![context])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
    Ok(())
}

fn schema() -> UpdateHandler<RequestError> {
    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::endpoint(unknown_command));

    let callback_handler = Update::filter_callback_query().endpoint(handle_callback);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    context: Arc<BotContext>,
) -> ResponseResult<()> {
    debug!(chat_id = %msg.chat.id, command = ?cmd, "Handling command");

    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, messages::START_TEXT)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, messages::HELP_TEXT)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Currency => {
            bot.send_message(msg.chat.id, messages::CHOOSE_CURRENCY)
                .reply_markup(keyboards::popular_keyboard())
                .await?;
        }
        Command::Convert(args) => {
            let text = match commands::parse_convert_args(&args) {
                Some(args) => match context.store.convert(&args.code, &args.amount).await {
                    Ok(conversion) => messages::render_conversion(&conversion),
                    Err(e) => messages::render_conversion_error(&e),
                },
                None => messages::CONVERT_USAGE.to_string(),
            };
            bot.send_message(msg.chat.id, text).await?;
        }
    }

    Ok(())
}

async fn unknown_command(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, messages::UNKNOWN_COMMAND)
        .await?;
    Ok(())
}

async fn handle_callback(
    bot: Bot,
    query: CallbackQuery,
    context: Arc<BotContext>,
) -> ResponseResult<()> {
    // Always answer first to clear the loading indicator
    bot.answer_callback_query(query.id.clone()).await?;

    let Some(action) = query
        .data
        .as_deref()
        .and_then(|data| data.parse::<CallbackAction>().ok())
    else {
        debug!(data = ?query.data, "Ignoring unknown callback");
        return Ok(());
    };

    let Some(message) = query.message.as_ref().and_then(|m| m.regular_message()) else {
        debug!("Callback without an accessible message");
        return Ok(());
    };
    let chat_id = message.chat.id;

    match action {
        CallbackAction::Noop => Ok(()),
        CallbackAction::Back => {
            edit(
                &bot,
                chat_id,
                message.id,
                messages::POPULAR_CURRENCIES.to_string(),
                Some(keyboards::popular_keyboard()),
            )
            .await
        }
        CallbackAction::More => show_page(&bot, chat_id, message.id, &context, 1).await,
        CallbackAction::Page(page) => show_page(&bot, chat_id, message.id, &context, page).await,
        CallbackAction::Currency(code) => {
            let text = match context.store.get_rate(&code).await {
                Ok(quote) => messages::render_rate(&quote),
                Err(e) => messages::render_rate_error(&e),
            };
            edit(&bot, chat_id, message.id, text, message.reply_markup().cloned()).await
        }
    }
}

async fn show_page(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    context: &BotContext,
    page: usize,
) -> ResponseResult<()> {
    let extra = keyboards::extra_currencies(&context.store.list_currencies().await);
    if extra.is_empty() {
        return edit(
            bot,
            chat_id,
            message_id,
            messages::LIST_UNAVAILABLE.to_string(),
            Some(keyboards::popular_keyboard()),
        )
        .await;
    }

    let keyboard = keyboards::all_currencies_keyboard(&extra, page, context.items_per_page);
    edit(
        bot,
        chat_id,
        message_id,
        messages::ALL_CURRENCIES.to_string(),
        Some(keyboard),
    )
    .await
}

async fn edit(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> ResponseResult<()> {
    let mut request = bot.edit_message_text(chat_id, message_id, text);
    if let Some(keyboard) = keyboard {
        request = request.reply_markup(keyboard);
    }

    match request.await {
        Ok(_) => Ok(()),
        // Re-selecting the same currency renders identical text
        Err(RequestError::Api(ApiError::MessageNotModified)) => {
            debug!("Message not modified");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
