//! User-facing texts. Everything here is a pure function of store results.

use crate::core::{Conversion, RateError, RateQuote, Trend};
use rust_decimal::Decimal;

pub const START_TEXT: &str = "\
🤖 <b>Добро пожаловать в бот курсов валют!</b>

Я помогу тебе:
💱 Узнать актуальные курсы валют
🔄 Конвертировать любую сумму
📊 Следить за изменениями курсов

Для начала работы используй:
/currency - посмотреть курсы валют
/help - подробная инструкция

<b>Данные предоставлены ЦБ РФ</b>";

pub const HELP_TEXT: &str = "\
🤖 <b>Бот курсов валют ЦБ РФ</b>

<b>Доступные команды:</b>

/start - Начать работу с ботом
/help - Показать это сообщение

💱 <b>Основные команды:</b>
/currency - Показать курсы валют
/convert [валюта] [сумма] - Конвертировать валюту

📊 <b>Примеры использования:</b>
/convert USD 100 - Конвертировать 100 долларов
/convert EUR 50.5 - Конвертировать 50.5 евро

<b>Как пользоваться:</b>
1. Нажми /currency чтобы увидеть список валют
2. Выбери валюту из списка
3. Используй кнопки для навигации
4. Для конвертации используй /convert

📈 <b>Особенности:</b>
• Данные обновляются каждый час
• Показывается изменение курса
• Поддержка 30+ валют
• Конвертация с учетом номинала";

pub const UNKNOWN_COMMAND: &str =
    "❌ Неизвестная команда.\nИспользуй /help для просмотра доступных команд.";

pub const CONVERT_USAGE: &str = "Неверно введена команда. Пример: /convert usd 100.";

pub const CHOOSE_CURRENCY: &str = "Выберите валюту:";
pub const POPULAR_CURRENCIES: &str = "Популярные валюты:";
pub const ALL_CURRENCIES: &str = "Все доступные валюты:";

pub const LIST_UNAVAILABLE: &str =
    "❌ Не удалось загрузить список валют\n\nПопробуйте позже или проверьте соединение";

const BASE_CURRENCY: &str = "RUB";

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// Signed delta with four decimals, e.g. `+0.1250` or `-1.5000`.
pub fn format_delta(delta: Decimal) -> String {
    let sign = if delta.is_sign_negative() && !delta.is_zero() {
        '-'
    } else {
        '+'
    };
    format!("{sign}{:.4}", delta.abs().round_dp(4))
}

pub fn trend_emoji(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "📈",
        Trend::Down => "📉",
        Trend::Flat => "➡️",
    }
}

pub fn render_rate(quote: &RateQuote) -> String {
    let mut text = String::new();

    if quote.is_stale {
        text.push_str(&format!(
            "⚠️ Данные могут быть устаревшими\nОбновлено: {}\n\n",
            quote.updated_at.format("%d.%m.%Y в %H:%M")
        ));
    }

    text.push_str(&format!(
        "💱 {}\n• {} {}\n• 💰 Курс: {} {BASE_CURRENCY}",
        quote.code.to_uppercase(),
        quote.nominal,
        quote.name,
        money(quote.value)
    ));

    if !quote.delta.is_zero() {
        text.push_str(&format!(
            "\n{} Изменение: {}",
            trend_emoji(quote.trend()),
            format_delta(quote.delta)
        ));
    }

    text
}

/// Amount as typed, always with a fractional part: `100.0`, `50.5`.
fn format_amount(amount: Decimal) -> String {
    let amount = amount.normalize();
    if amount.scale() == 0 {
        format!("{amount}.0")
    } else {
        amount.to_string()
    }
}

pub fn render_conversion(conversion: &Conversion) -> String {
    format!(
        "💱 Конвертация {}\n\n• 💰 {} {}\n• 🔄 = {} {BASE_CURRENCY}\n",
        conversion.code.to_uppercase(),
        format_amount(conversion.amount),
        conversion.name,
        money(conversion.result)
    )
}

fn render_common_error(err: &RateError) -> String {
    match err {
        RateError::CurrencyNotFound(code) => format!(
            "❌ Валюта '{code}' не найдена\n\nПопробуйте выбрать из списка доступных валют"
        ),
        RateError::InvalidAmount(_) => {
            "❌ Неправильный формат суммы\n\n💡 Пример правильной команды:\n/convert USD 100.5"
                .to_string()
        }
        RateError::InvalidCurrencyFormat(_) => {
            "❌ Неправильный формат валюты\n\n💡 Пример правильной команды:\n/convert USD 100.5"
                .to_string()
        }
        RateError::DataUnavailable
        | RateError::Network(_)
        | RateError::EmptyResponse
        | RateError::MalformedData(_) => {
            "❌ Не удалось получить данные\n\nПопробуйте позже или проверьте соединение"
                .to_string()
        }
    }
}

pub fn render_rate_error(err: &RateError) -> String {
    match err {
        RateError::DataUnavailable => {
            "❌ Не удалось получить актуальный курс\n\nПопробуйте позже или проверьте соединение"
                .to_string()
        }
        _ => render_common_error(err),
    }
}

pub fn render_conversion_error(err: &RateError) -> String {
    match err {
        RateError::DataUnavailable => {
            "❌ Не удалось произвести конвертацию\n\nПопробуйте позже или проверьте соединение"
                .to_string()
        }
        RateError::InvalidAmount(text) if text.trim().starts_with('-') => {
            "❌ Сумма должна быть положительным числом\n\nПример: 100 или 50.5".to_string()
        }
        _ => render_common_error(err),
    }
}
