use crate::{
    error::AppError,
    router::AppState,
};
use axum::{
    extract::{
        Query,
        State,
    },
    http::header,
    response::{
        Html,
        IntoResponse,
        Response,
    },
    Json,
};
use serde::{
    Deserialize,
    Serialize,
};
use terminus_metrics_pipeline::{
    csv,
    present::{
        FormState,
        View,
    },
    MetricRow,
    MetricsError,
    MetricsRequest,
    ParseWarning,
    Period,
    Site,
    Summary,
};

/// `?site=..&env=..&period=..`. The query string is the only session state the dashboard has.
#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

impl MetricsQuery {
    fn is_submitted(&self) -> bool {
        [&self.site, &self.env]
            .iter()
            .any(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// The form as the user filled it, falling back to the configured defaults.
    fn form(&self, state: &AppState) -> FormState {
        let mut form = FormState::from(&state.config.defaults);
        if let Some(site) = &self.site {
            form.site = site.clone();
        }
        if let Some(env) = &self.env {
            form.environment = env.clone();
        }
        if let Some(period) = self.period.as_deref().and_then(|p| p.parse().ok()) {
            form.period = period;
        }
        form
    }

    fn request(&self, state: &AppState) -> Result<MetricsRequest, MetricsError> {
        let defaults = &state.config.defaults;
        let period = match self.period.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            None => defaults.period,
            Some(period) => period
                .parse::<Period>()
                .map_err(|_| MetricsError::InvalidRequest(format!("unknown period `{period}`, use day, week or month")))?,
        };
        let env = match self.env.as_deref().map(str::trim) {
            Some(env) if !env.is_empty() => env,
            _ => defaults.environment.as_str(),
        };
        MetricsRequest::new(self.site.clone().unwrap_or_default(), env, period)
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn dashboard(State(state): State<AppState>, Query(query): Query<MetricsQuery>) -> Html<String> {
    let form = query.form(&state);
    if !query.is_submitted() {
        return Html(state.presenter.dashboard_page(&form, View::Form));
    }
    match query.request(&state) {
        Err(err) => {
            info!(%err, "rejected dashboard request");
            Html(state.presenter.dashboard_page(&form, View::Rejected(&err)))
        }
        Ok(request) => {
            let report = state.pipeline.run(request).await;
            Html(state.presenter.dashboard_page(&form, View::Report(&report)))
        }
    }
}

pub async fn metrics_csv(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Response, AppError> {
    let request = query.request(&state)?;
    let file_name = request.csv_file_name();
    let table = state.pipeline.run(request).await.outcome?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        csv::export(&table),
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub request: MetricsRequest,
    pub rows: Vec<MetricRow>,
    pub summary: Summary,
    pub parse_warnings: Vec<ParseWarning>,
    pub stderr_warnings: Vec<String>,
}

pub async fn metrics_json(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricsResponse>, AppError> {
    let report = state.pipeline.run(query.request(&state)?).await;
    let stderr_warnings = report.warnings().into_iter().map(str::to_string).collect();
    let table = report.outcome?;
    Ok(Json(MetricsResponse {
        request: report.request,
        rows: table.rows().to_vec(),
        summary: table.summary().clone(),
        parse_warnings: table.warnings().to_vec(),
        stderr_warnings,
    }))
}

pub async fn sites(State(state): State<AppState>) -> Html<String> {
    let plans = &state.config.terminus.plans;
    let sites = state.pipeline.sites(plans).await;
    Html(
        state
            .presenter
            .sites_page(sites.as_deref(), plans),
    )
}

pub async fn sites_json(State(state): State<AppState>) -> Result<Json<Vec<Site>>, AppError> {
    Ok(Json(state.pipeline.sites(&state.config.terminus.plans).await?))
}
