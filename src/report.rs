//! Terminal rendering of reports and site lists.

use comfy_table::{
    presets::UTF8_FULL,
    CellAlignment,
    Table,
};
use terminus_metrics_pipeline::{
    present::{
        format_count,
        format_percent,
        SummaryLine,
    },
    MetricsTable,
    Presenter,
    Site,
};

fn table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

pub fn metrics_table(presenter: &Presenter, metrics: &MetricsTable) -> Table {
    let pages = metrics.has_pages_served();
    let mut out = table();

    let mut header = vec!["Period", "Visits"];
    if pages {
        header.push("Pages Served");
    }
    header.extend(["Cache Hits", "Cache Misses", "Cache Hit Ratio"]);
    out.set_header(header);

    for row in metrics.rows() {
        let mut cells = vec![presenter.label(row), format_count(row.visits)];
        if pages {
            cells.push(row.pages_served.map(format_count).unwrap_or_default());
        }
        cells.push(format_count(row.cache_hits));
        cells.push(format_count(row.cache_misses));
        cells.push(
            row.hit_ratio()
                .map(|ratio| format_percent(ratio * 100.0))
                .unwrap_or_else(|| "n/a".to_string()),
        );
        out.add_row(cells);
    }

    for index in 1..out.column_count() {
        if let Some(column) = out.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    out
}

pub fn summary_table(lines: &[SummaryLine]) -> Table {
    let mut out = table();
    for line in lines {
        out.add_row(vec![line.label.to_string(), line.value.clone()]);
    }
    out
}

pub fn sites_table(sites: &[Site]) -> Table {
    let mut out = table();
    out.set_header(vec!["Name", "Plan"]);
    for site in sites {
        out.add_row(vec![site.name.clone(), site.plan.clone()]);
    }
    out
}
