//! CLI command implementations

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, Utc};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{
    CallApi, CallPage, CustomerCalls, CustomerQuery, ExportKind, HttpCrmClient, MetricsRange,
    MetricsSummary,
};
use crate::cli::args::{CallFilterArgs, CallsCommand, ConfigCommand, CustomersCommand, ExportTarget};
use crate::config::Settings;
use crate::view::table::format_duration;
use crate::view::{
    validate_custom_range, CallLogViewModel, Confirm, DateRange, DetailView, FilterCriteria,
    FilterState, Notice, Preconfirmed, RetryOutcome,
};
use crate::CrmError;

/// Handle calls subcommands
pub async fn calls_command(settings: &Settings, cmd: CallsCommand) -> Result<()> {
    match cmd {
        CallsCommand::List {
            filters,
            page,
            per_page,
            json,
        } => list_calls(settings, &filters, page, per_page, json).await,
        CallsCommand::View { call_id, json } => view_call(settings, &call_id, json).await,
        CallsCommand::Retry { call_id, yes } => retry_call(settings, &call_id, yes).await,
    }
}

/// List calls matching the filters
pub async fn list_calls(
    settings: &Settings,
    filters: &CallFilterArgs,
    page: u32,
    per_page: Option<u32>,
    json: bool,
) -> Result<()> {
    let client = connect(settings)?;
    let per_page = per_page.unwrap_or(settings.tui.page_size);
    let mut model = CallLogViewModel::new(Arc::new(client), per_page);
    model.filters_mut().set_criteria(criteria_from_args(filters)?);
    model.filters_mut().set_page(page);

    if let Err(e) = model.submit_filters().await {
        return Err(cli_error(e, model.notice()));
    }

    if json {
        let page = CallPage {
            calls: model.calls().to_vec(),
            pagination: model.pagination(),
        };
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if model.rows().is_empty() {
        println!("No calls found");
        return Ok(());
    }

    println!(
        "{:<14} {:<22} {:<16} {:<17} {:<10} {:<9} {}",
        "ID", "Customer", "Phone", "Created", "Status", "Duration", "Actions"
    );
    println!("{}", "-".repeat(100));

    for row in model.rows() {
        let actions: Vec<&str> = row.actions.iter().map(|a| a.label()).collect();
        println!(
            "{:<14} {:<22} {:<16} {:<17} {:<10} {:<9} {}",
            truncate(&row.call_id, 12),
            truncate(&row.customer_name, 20),
            truncate(&row.customer_phone, 14),
            row.created_at,
            row.status,
            row.duration,
            actions.join(", ")
        );
    }

    let pagination = model.pagination();
    println!();
    println!(
        "Page {} of {} ({} calls)",
        pagination.page,
        pagination.pages.max(1),
        pagination.total
    );

    Ok(())
}

/// Show the detail view of a single call
pub async fn view_call(settings: &Settings, call_id: &str, json: bool) -> Result<()> {
    let client = connect(settings)?;
    let detail = client
        .fetch_call_detail(call_id)
        .await
        .map_err(|e| cli_error(e, None))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    print_detail(&DetailView::from_detail(&detail));
    Ok(())
}

fn print_detail(view: &DetailView) {
    println!("Basic Information");
    for field in &view.basic {
        println!("  {:<12} {}", field.label, field.value);
    }

    println!();
    println!("Additional Details");
    for field in &view.additional {
        println!("  {:<12} {}", field.label, field.value);
    }

    if let Some(summary) = &view.summary {
        println!();
        println!("Summary:");
        println!("{}", summary);
    }

    if let Some(transcript) = &view.transcript {
        println!();
        println!("Transcript:");
        println!("{}", transcript);
    }

    if !view.timeline.is_empty() {
        println!();
        println!("Timeline:");
        for event in &view.timeline {
            println!("  {}", event.value);
        }
    }
}

/// Confirm and retry a failed call
pub async fn retry_call(settings: &Settings, call_id: &str, yes: bool) -> Result<()> {
    let client = connect(settings)?;
    let mut model = CallLogViewModel::new(Arc::new(client), settings.tui.page_size);

    let outcome = if yes {
        model.retry(call_id, &Preconfirmed(true)).await
    } else {
        model.retry(call_id, &StdinConfirm).await
    };

    match outcome {
        RetryOutcome::Declined => println!("Retry cancelled"),
        RetryOutcome::AlreadyInFlight => println!("A retry for {} is already running", call_id),
        RetryOutcome::Succeeded { message } => {
            println!("{}", message);
            if let Some(Notice::Error(text)) = model.notice() {
                println!("(Could not refresh the call list: {})", text);
            }
        }
        RetryOutcome::Failed { message } => anyhow::bail!("Retry failed: {}", message),
    }

    Ok(())
}

/// Terminal prompt shown before a retry is sent
struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, call_id: &str) -> bool {
        let prompt = format!("Retry call {}? [y/N] ", call_id);
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stdout = io::stdout();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

/// Handle customers subcommands
pub async fn customers_command(settings: &Settings, cmd: CustomersCommand) -> Result<()> {
    match cmd {
        CustomersCommand::List {
            search,
            page,
            per_page,
        } => list_customers(settings, search, page, per_page).await,
        CustomersCommand::Calls { customer_id, json } => {
            customer_calls(settings, customer_id, json).await
        }
    }
}

/// List customers
pub async fn list_customers(
    settings: &Settings,
    search: Option<String>,
    page: u32,
    per_page: u32,
) -> Result<()> {
    let client = connect(settings)?;
    let query = CustomerQuery {
        search,
        page,
        per_page,
    };
    let result = client
        .fetch_customers(&query)
        .await
        .map_err(|e| cli_error(e, None))?;

    if result.customers.is_empty() {
        println!("No customers found");
        return Ok(());
    }

    println!(
        "{:<6} {:<24} {:<16} {:<28} {:<6}",
        "ID", "Name", "Phone", "Email", "Calls"
    );
    println!("{}", "-".repeat(84));

    for customer in &result.customers {
        println!(
            "{:<6} {:<24} {:<16} {:<28} {:<6}",
            customer.id,
            truncate(&customer.name, 22),
            truncate(&customer.phone, 14),
            truncate(customer.email.as_deref().unwrap_or("-"), 26),
            customer.call_count
        );
    }

    println!();
    println!(
        "Page {} of {} ({} customers)",
        result.pagination.page,
        result.pagination.pages.max(1),
        result.pagination.total
    );

    Ok(())
}

/// Show one customer and the calls placed to them
pub async fn customer_calls(settings: &Settings, customer_id: i64, json: bool) -> Result<()> {
    let client = connect(settings)?;
    let history = client
        .fetch_customer_calls(customer_id)
        .await
        .map_err(|e| cli_error(e, None))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    print_customer_calls(&history);
    Ok(())
}

fn print_customer_calls(history: &CustomerCalls) {
    let customer = &history.customer;
    println!("Customer {}: {}", customer.id, customer.name);
    println!("  Phone: {}", customer.phone);
    if let Some(email) = customer.email.as_deref().filter(|e| !e.trim().is_empty()) {
        println!("  Email: {}", email);
    }
    println!();

    if history.calls.is_empty() {
        println!("No calls for this customer");
        return;
    }

    println!(
        "{:<24} {:<17} {:<10} {:>8}  {}",
        "Call ID", "Started", "Status", "Duration", "Summary"
    );
    println!("{}", "-".repeat(90));

    for call in &history.calls {
        let started = call
            .call_started_at
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<17} {:<10} {:>8}  {}",
            truncate(&call.call_id, 22),
            started,
            call.status.label(),
            format_duration(call.duration_seconds.unwrap_or(0)),
            truncate(call.summary.as_deref().unwrap_or("-"), 40)
        );
    }

    println!();
    println!("{} calls", history.calls.len());
}

/// Download a CSV export to disk
pub async fn export(
    settings: &Settings,
    target: ExportTarget,
    filters: &CallFilterArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let client = connect(settings)?;

    let (kind, query) = match target {
        ExportTarget::Calls => {
            let mut state = FilterState::new(settings.tui.page_size);
            state.set_criteria(criteria_from_args(filters)?);
            let query = state.submit(Utc::now()).map_err(|e| cli_error(e, None))?;
            (ExportKind::Calls, Some(query))
        }
        ExportTarget::Customers => (ExportKind::Customers, None),
    };

    let bytes = client
        .download_export(kind, query.as_ref())
        .await
        .map_err(|e| cli_error(e, None))?;

    let path = output.unwrap_or_else(|| settings.export_path(&kind.file_name(Local::now())));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    println!("Exported {} bytes to: {}", bytes.len(), path.display());
    Ok(())
}

/// Show the metrics summary
pub async fn show_metrics(
    settings: &Settings,
    from: Option<String>,
    to: Option<String>,
    json: bool,
) -> Result<()> {
    let range = metrics_range(from, to).map_err(|e| cli_error(e, None))?;
    let client = connect(settings)?;
    let summary = client
        .fetch_metrics_summary(&range)
        .await
        .map_err(|e| cli_error(e, None))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_metrics(&summary);
    Ok(())
}

fn print_metrics(summary: &MetricsSummary) {
    if let Some(daily) = &summary.daily_stats {
        println!("Today");
        println!("  Total calls:      {}", daily.total_calls);
        println!("  Successful calls: {}", daily.successful_calls);
        println!("  Failed calls:     {}", daily.failed_calls);
    }

    if let Some(days) = summary.period_days {
        println!("Last {} days", days);
    }
    if let Some(total) = summary.total_calls {
        println!("  Total calls:      {}", total);
    }
    if let Some(successful) = summary.successful_calls {
        println!("  Successful calls: {}", successful);
    }
    if let Some(rate) = summary.success_rate {
        println!("  Success rate:     {:.1}%", rate);
    }
    if let Some(avg) = summary.average_duration {
        println!("  Avg duration:     {}", format_duration(avg.max(0.0).round() as u64));
    }
    if let Some(unique) = summary.unique_customers {
        println!("  Unique customers: {}", unique);
    }

    if !summary.call_distribution.is_empty() {
        println!();
        println!("Calls by status:");
        for bucket in &summary.call_distribution {
            println!("  {:<12} {}", bucket.status.label(), bucket.count);
        }
    }

    if !summary.customer_growth.is_empty() {
        println!();
        println!("New customers:");
        for point in &summary.customer_growth {
            println!("  {:<12} {}", point.date, point.count);
        }
    }
}

/// Show dashboard counters
pub async fn show_stats(settings: &Settings) -> Result<()> {
    let client = connect(settings)?;
    let stats = client
        .fetch_dashboard_stats()
        .await
        .map_err(|e| cli_error(e, None))?;

    println!("Total calls:      {}", stats.total_calls);
    println!("Total customers:  {}", stats.total_customers);
    println!("Active calls:     {}", stats.active_calls);
    println!("Calls (last 24h): {}", stats.recent_calls_24h);
    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(settings)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

// Helper functions

fn connect(settings: &Settings) -> Result<HttpCrmClient> {
    HttpCrmClient::from_settings(settings).context("Failed to set up the CRM client")
}

fn criteria_from_args(args: &CallFilterArgs) -> Result<FilterCriteria> {
    let date_range = match (&args.range, &args.from, &args.to) {
        (Some(range), _, _) => DateRange::from_preset(range).with_context(|| {
            format!("Invalid --range '{}'. Expected one of: 24h, 7d, 30d, all", range)
        })?,
        (None, Some(from), Some(to)) => DateRange::Custom {
            start: from.clone(),
            end: to.clone(),
        },
        _ => DateRange::All,
    };

    Ok(FilterCriteria {
        status: args.status.clone(),
        date_range,
        search: args.search.clone().unwrap_or_default(),
    })
}

/// Validate the metrics window before anything is sent.
fn metrics_range(
    from: Option<String>,
    to: Option<String>,
) -> std::result::Result<MetricsRange, CrmError> {
    match (from, to) {
        (Some(from), Some(to)) => {
            let (start, end) = validate_custom_range(&from, &to)?;
            Ok(MetricsRange {
                start_date: Some(start),
                end_date: Some(end),
            })
        }
        (None, None) => Ok(MetricsRange::default()),
        (Some(_), None) => Err(CrmError::validation("end_date", "End date is required")),
        (None, Some(_)) => Err(CrmError::validation("start_date", "Start date is required")),
    }
}

/// Turn a library error into the message an operator should see.
///
/// Validation errors name the flag; network errors print the generic
/// message and keep the detail for `--verbose` logs.
fn cli_error(err: CrmError, notice: Option<&Notice>) -> anyhow::Error {
    match &err {
        CrmError::Validation { field, message } => {
            anyhow::anyhow!("{}: {}", flag_for(field), message)
        }
        _ if err.is_transport_or_parse() => {
            tracing::debug!(error = %err, "request failed");
            let text = notice
                .map(|n| n.text().to_string())
                .unwrap_or_else(|| err.user_message());
            anyhow::anyhow!("{}", text)
        }
        _ => anyhow::Error::new(err),
    }
}

fn flag_for(field: &str) -> &'static str {
    match field {
        "start_date" => "--from",
        "end_date" => "--to",
        _ => "--from/--to",
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_flag_maps_to_preset() {
        let args = CallFilterArgs {
            range: Some("7d".to_string()),
            ..CallFilterArgs::default()
        };
        let criteria = criteria_from_args(&args).unwrap();
        assert_eq!(criteria.date_range, DateRange::Last7d);
    }

    #[test]
    fn unknown_range_is_rejected() {
        let args = CallFilterArgs {
            range: Some("2w".to_string()),
            ..CallFilterArgs::default()
        };
        assert!(criteria_from_args(&args).is_err());
    }

    #[test]
    fn validation_error_names_the_flag() {
        let err = cli_error(
            CrmError::validation("end_date", "End date is required"),
            None,
        );
        assert_eq!(err.to_string(), "--to: End date is required");
    }

    #[test]
    fn metrics_window_is_validated_before_sending() {
        let inverted = metrics_range(Some("2024-02-10".into()), Some("2024-02-01".into()));
        assert!(matches!(
            inverted,
            Err(CrmError::Validation {
                field: "date_range",
                ..
            })
        ));
        assert!(metrics_range(Some("02/01/2024".into()), Some("2024-02-10".into())).is_err());
        assert!(metrics_range(Some("2024-02-01".into()), None).is_err());

        let range = metrics_range(Some(" 2024-02-01".into()), Some("2024-02-10".into())).unwrap();
        assert_eq!(range.start_date.as_deref(), Some("2024-02-01"));
        assert_eq!(metrics_range(None, None).unwrap(), MetricsRange::default());
    }

    #[test]
    fn truncate_respects_multibyte_names() {
        assert_eq!(truncate("Zoë Ångström-Lee", 8), "Zoë Å...");
        assert_eq!(truncate("Ada", 8), "Ada");
    }
}
