use crate::{
    csv::read_records,
    MetricsError,
};
use serde::Serialize;

/// One line of `terminus site:list --format=csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub name: String,
    pub plan: String,
    /// Every other column, keyed by its header.
    pub fields: Vec<(String, String)>,
}

pub fn parse_site_list(csv: &str) -> Result<Vec<Site>, MetricsError> {
    let mut records = read_records(csv).into_iter();
    let Some(header) = records.next() else {
        return Ok(Vec::new());
    };

    let position = |name: &str| header.iter().position(|cell| cell.eq_ignore_ascii_case(name));
    let (Some(name), Some(plan)) = (position("name"), position("plan")) else {
        return Err(MetricsError::Parse(format!(
            "site list has no Name and Plan columns (header: {})",
            header.join(",")
        )));
    };

    let sites = records
        .filter_map(|record| {
            let site_name = record.get(name).filter(|value| !value.is_empty())?.clone();
            let site_plan = record.get(plan).cloned().unwrap_or_default();
            let fields = header
                .iter()
                .zip(&record)
                .enumerate()
                .filter(|(index, _)| *index != name && *index != plan)
                .map(|(_, (key, value))| (key.clone(), value.clone()))
                .collect();
            Some(Site {
                name: site_name,
                plan: site_plan,
                fields,
            })
        })
        .collect::<Vec<_>>();
    debug!(sites = sites.len(), "parsed site list");
    Ok(sites)
}

/// Sites whose plan is one of `plans`, compared case-insensitively. An empty `plans` keeps everything.
pub fn filter_by_plan(sites: Vec<Site>, plans: &[String]) -> Vec<Site> {
    if plans.is_empty() {
        return sites;
    }
    sites
        .into_iter()
        .filter(|site| plans.iter().any(|plan| plan.trim().eq_ignore_ascii_case(&site.plan)))
        .collect()
}
