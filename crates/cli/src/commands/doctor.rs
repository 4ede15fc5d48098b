use aislefinder_agent::provider_from_config;
use aislefinder_core::config::{AppConfig, LoadOptions, SuggestionProviderKind};
use aislefinder_db::{connect_with_config, ProductRepository, SqlCatalogRepository};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.push(check_suggestion_provider(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            let reason = "configuration did not load";
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("suggestion_provider", reason));
            checks.push(DoctorCheck::skipped("database_connectivity", reason));
            checks.push(DoctorCheck::skipped("catalog_readiness", reason));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_suggestion_provider(config: &AppConfig) -> DoctorCheck {
    let suggestions = &config.suggestions;
    match provider_from_config(suggestions) {
        Ok(_) if suggestions.provider == SuggestionProviderKind::Disabled => DoctorCheck::pass(
            "suggestion_provider",
            "disabled; showcase serves the featured sample only",
        ),
        Ok(_) => DoctorCheck::pass(
            "suggestion_provider",
            format!(
                "{} client ready (model `{}`)",
                suggestions.provider.as_str(),
                suggestions.model
            ),
        ),
        Err(error) => DoctorCheck::fail("suggestion_provider", format!("{error:#}")),
    }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("catalog_readiness", "the async runtime did not start"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::skipped("catalog_readiness", "the database is unreachable"),
                ];
            }
        };

        let connectivity = DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        );
        let readiness = match SqlCatalogRepository::new(pool.clone()).list().await {
            Ok(products) if products.is_empty() => {
                DoctorCheck::fail("catalog_readiness", "catalog is empty; run `aislefinder seed`")
            }
            Ok(products) => DoctorCheck::pass(
                "catalog_readiness",
                format!("{} products in catalog", products.len()),
            ),
            Err(error) => DoctorCheck::fail(
                "catalog_readiness",
                format!("catalog unreadable ({error}); run `aislefinder migrate`"),
            ),
        };

        pool.close().await;
        vec![connectivity, readiness]
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{render_human, CheckStatus, DoctorCheck, DoctorReport};

    #[test]
    fn human_report_marks_each_check() {
        let report = DoctorReport {
            overall_status: CheckStatus::Fail,
            summary: "doctor: one or more readiness checks failed".to_string(),
            checks: vec![
                DoctorCheck::pass("config_validation", "configuration loaded and validated"),
                DoctorCheck::fail("catalog_readiness", "catalog is empty; run `aislefinder seed`"),
                DoctorCheck::skipped("suggestion_provider", "configuration did not load"),
            ],
        };

        let rendered = render_human(&report);

        assert!(rendered.contains("- [ok] config_validation"));
        assert!(rendered.contains("- [fail] catalog_readiness: catalog is empty"));
        assert!(rendered.contains("- [skip] suggestion_provider: skipped because"));
    }
}
