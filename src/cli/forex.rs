use super::ui;
use crate::refresh::{ForexFilter, ForexRefresher};
use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;

pub async fn run(
    refresher: &ForexRefresher,
    page: usize,
    size: usize,
    filter: &ForexFilter,
) -> Result<()> {
    let result = refresher.get_forexes(page, size, filter, Utc::now()).await?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Rate"),
        ui::header_cell("Bid"),
        ui::header_cell("Ask"),
        ui::header_cell("Last refresh"),
    ]);

    for forex in &result.items {
        table.add_row(vec![
            Cell::new(&forex.symbol),
            ui::number_cell(forex.exchange_rate, 4),
            ui::number_cell(forex.bid, 4),
            ui::number_cell(forex.ask, 4),
            Cell::new(forex.last_refresh.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]);
    }

    println!("{table}");
    println!(
        "\nPage {}: {} of {} pairs",
        result.page,
        result.items.len(),
        ui::style_text(&result.total.to_string(), ui::StyleType::TotalValue)
    );
    Ok(())
}
