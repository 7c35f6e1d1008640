use super::ui;
use crate::aggregate::OptionAggregator;
use crate::core::options::OptionFilter;
use anyhow::Result;
use comfy_table::Cell;
use ordered_float::OrderedFloat;

pub async fn run(aggregator: &OptionAggregator, filter: &OptionFilter) -> Result<()> {
    let mut summaries = aggregator.summarize(filter).await?;
    // Aggregation order is unspecified; sort for display.
    summaries.sort_by_key(|s| (OrderedFloat(s.strike), s.option_type.to_string()));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Strike"),
        ui::header_cell("Type"),
        ui::header_cell("Expiration"),
        ui::header_cell("Open interest"),
        ui::header_cell("Ask"),
        ui::header_cell("Bid"),
        ui::header_cell("Price"),
    ]);

    for summary in &summaries {
        table.add_row(vec![
            ui::number_cell(summary.strike, 2),
            Cell::new(summary.option_type.to_string()),
            Cell::new(summary.expiration_date.to_string()),
            Cell::new(summary.open_interest.to_string()),
            ui::number_cell(summary.ask, 2),
            ui::number_cell(summary.bid, 2),
            ui::number_cell(summary.price, 2),
        ]);
    }

    println!(
        "Options for {}\n",
        ui::style_text(&filter.symbol, ui::StyleType::Title)
    );
    println!("{table}");
    Ok(())
}
