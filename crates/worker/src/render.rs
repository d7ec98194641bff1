use comfy_table::{presets::UTF8_FULL, Table};
use featured_core::domain::prediction::Direction;
use featured_core::domain::row::{PredictionRow, UNAVAILABLE};

pub fn board_table(rows: &[PredictionRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Symbol", "Open Price", "Sentiment", "Projected Change"]);

    for row in rows {
        table.add_row(vec![
            format!("{}\n{}", row.symbol, row.company_name),
            row.open_price
                .clone()
                .unwrap_or_else(|| UNAVAILABLE.to_string()),
            row.sentiment
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| UNAVAILABLE.to_string()),
            change_cell(row),
        ]);
    }

    table
}

fn change_cell(row: &PredictionRow) -> String {
    match (&row.projected_change, row.direction) {
        (Some(change), Some(Direction::Decrease)) => format!("↓ {change}"),
        (Some(change), _) => format!("↑ {change}"),
        (None, _) => match &row.error {
            Some(err) => format!("{UNAVAILABLE} ({err})"),
            None => UNAVAILABLE.to_string(),
        },
    }
}
