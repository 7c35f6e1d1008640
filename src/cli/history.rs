use super::ui;
use crate::core::forex::Granularity;
use crate::refresh::ForexRefresher;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(
    refresher: &ForexRefresher,
    from: &str,
    to: &str,
    granularity: Granularity,
) -> Result<()> {
    let series = refresher.get_time_series(from, to, granularity).await?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Timestamp"), ui::header_cell("Rate")]);
    for point in &series.points {
        table.add_row(vec![
            Cell::new(&point.timestamp),
            ui::number_cell(point.rate, 4),
        ]);
    }

    println!(
        "{} ({granularity})\n",
        ui::style_text(&series.symbol, ui::StyleType::Title)
    );
    println!("{table}");
    Ok(())
}
