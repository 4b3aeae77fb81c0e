use super::ui;
use crate::bot::messages;
use crate::core::{RateError, RateTable};
use crate::store::RateStore;
use anyhow::Result;
use comfy_table::Cell;

impl RateTable {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Code"),
            ui::header_cell("Currency"),
            ui::header_cell("Nominal"),
            ui::header_cell("Rate (RUB)"),
            ui::header_cell("Per unit (RUB)"),
        ]);

        for entry in &self.entries {
            table.add_row(vec![
                Cell::new(&entry.code),
                Cell::new(&entry.name),
                ui::number_cell(entry.nominal.to_string()),
                ui::number_cell(format!("{:.4}", entry.value)),
                ui::number_cell(format!("{:.4}", entry.unit_value().round_dp(4))),
            ]);
        }

        let title = match &self.date {
            Some(date) => format!("Exchange rates on {date}"),
            None => "Exchange rates".to_string(),
        };

        format!(
            "{}\n\n{}\n{}",
            ui::style_text(&title, ui::StyleType::Title),
            table,
            ui::style_text(
                &format!("{} currencies", self.len()),
                ui::StyleType::Subtle
            )
        )
    }
}

pub async fn list(store: &RateStore) -> Result<()> {
    let table = store.rates().await.ok_or(RateError::DataUnavailable)?;
    println!("{}", table.display_as_table());
    Ok(())
}

pub async fn rate(store: &RateStore, code: &str) -> Result<()> {
    match store.get_rate(&code.to_uppercase()).await {
        Ok(quote) => {
            let text = messages::render_rate(&quote);
            if quote.is_stale {
                println!("{}", ui::style_text(&text, ui::StyleType::Warning));
            } else {
                println!("{text}");
            }
            Ok(())
        }
        Err(e) => {
            let text = messages::render_rate_error(&e);
            Err(anyhow::Error::new(e).context(ui::style_text(&text, ui::StyleType::Error)))
        }
    }
}

pub async fn convert(store: &RateStore, code: &str, amount: &str) -> Result<()> {
    match store.convert(&code.to_uppercase(), amount).await {
        Ok(conversion) => {
            println!("{}", messages::render_conversion(&conversion));
            Ok(())
        }
        Err(e) => {
            let text = messages::render_conversion_error(&e);
            Err(anyhow::Error::new(e).context(ui::style_text(&text, ui::StyleType::Error)))
        }
    }
}
