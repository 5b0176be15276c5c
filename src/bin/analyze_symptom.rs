//! One-shot symptom analysis from the command line.
//!
//! Validates the input, sends a single request to the configured backend and
//! prints the normalized result, either as JSON or as a plain-text summary.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin analyze_symptom -- --symptom <text> [--duration <bucket>] \
//!     [--severity <level>] [--info <text>] [--age <years>] [--gender <value>] \
//!     [--history <text>] [--json]
//! cargo run --bin analyze_symptom -- --health
//! ```
//!
//! Exit codes: 0 success, 1 backend failure, 2 usage or validation error.

use std::sync::Arc;

use symptom_assist::adapters::sanitize::SanitizingMakeWriter;
use symptom_assist::adapters::HttpAnalysisBackend;
use symptom_assist::application::AnalysisService;
use symptom_assist::config::AppConfig;
use symptom_assist::domain::response::humanize_key;
use symptom_assist::domain::{
    AnalysisResponse, Choice, DurationBucket, Gender, Severity, SymptomForm,
};
use symptom_assist::ports::CancelToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Usage: analyze_symptom --symptom <text> [--duration <bucket>] [--severity <level>] [--info <text>] [--age <years>] [--gender <value>] [--history <text>] [--json]\n       analyze_symptom --health";

fn usage_error(message: &str) -> ! {
    eprintln!("{message}\n{USAGE}");
    std::process::exit(2);
}

fn choices<C: Choice>() -> String {
    C::ALL
        .iter()
        .map(|c| format!("\"{}\"", c.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_choice<C: Choice>(flag: &str, raw: &str) -> C {
    C::from_wire(raw).unwrap_or_else(|| {
        usage_error(&format!("Invalid {flag} {raw:?}; expected one of {}", choices::<C>()))
    })
}

fn print_list(title: &str, items: &[String]) {
    println!("\n{title}:");
    if items.is_empty() {
        println!("  No data for this section");
    }
    for item in items {
        println!("  - {item}");
    }
}

fn print_summary(r: &AnalysisResponse) {
    println!("== AI Analysis ==\n{}", r.symptom_analysis.trim());
    if !r.ai_web_research.trim().is_empty() {
        println!("\nAI Web Research:\n{}", r.ai_web_research.trim());
    }
    if !r.risk_assessment.is_empty() {
        println!("\nRisk Assessment:");
        for (key, value) in r.risk_assessment.iter() {
            println!("  {}: {}", humanize_key(key), value);
        }
    }
    print_list("Personalized Tips", &r.personalized_tips);

    println!("\n== Diet Plan ==");
    print_list("Foods to Consume", &r.diet_plan.foods_to_consume);
    print_list("Foods to Avoid", &r.diet_plan.foods_to_avoid);
    print_list("Nutritional Focus", &r.diet_plan.nutritional_focus);
    print_list("Supplements", &r.diet_plan.supplements);
    print_list("Meal Suggestions", &r.diet_plan.meal_suggestions);

    println!("\n== Possible Causes ==");
    if r.possible_causes.is_empty() {
        println!("  No data for this section");
    }
    for cause in &r.possible_causes {
        let urgency = cause.urgency_level.as_str();
        if urgency.is_empty() {
            println!("  * {}", cause.condition);
        } else {
            println!("  * {} [{} urgency]", cause.condition, urgency);
        }
        if !cause.probability.is_empty() || !cause.ai_confidence.is_empty() {
            println!(
                "    Probability: {} | AI confidence: {}",
                cause.probability, cause.ai_confidence
            );
        }
        if !cause.description.is_empty() {
            println!("    {}", cause.description);
        }
    }
    print_list("Lifestyle Suggestions", &r.lifestyle_suggestions);

    println!("\n== AI Insights ==");
    if r.ai_insights.is_empty() {
        println!("  No data for this section");
    }
    for insight in &r.ai_insights {
        println!("  * {} ({})", insight.title, insight.insight_type);
        println!("    {}", insight.description);
        println!("    Recommendation: {}", insight.recommendation);
        println!("    Evidence level: {}", insight.evidence_level);
    }

    print_list("\n!! Seek immediate care if", &r.red_flags);

    println!("\n{}", r.medical_disclaimer.trim());
    println!("\nGenerated: {}", r.search_timestamp.display());
}

fn run(mut form: SymptomForm, json: bool, health: bool) -> symptom_assist::Result<i32> {
    let config = AppConfig::load()?;

    // Diagnostics go to stderr so stdout stays machine-readable with --json.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(std::io::stderr)))
        .init();

    let backend = HttpAnalysisBackend::new(&config)?;
    let service = AnalysisService::new(Arc::new(backend));

    if health {
        let h = service.check_backend()?;
        println!(
            "{}: {} (ai_enhanced={})",
            service.endpoint(),
            h.status,
            h.ai_enhanced
        );
        return Ok(if h.is_healthy() { 0 } else { 1 });
    }

    let request = form.build_request();
    form.clear();
    let request = request?;

    let cancel = CancelToken::with_timeout(config.request_timeout);
    let response = service.analyze(&request, &cancel)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_summary(&response);
    }
    Ok(0)
}

fn main() {
    let mut args = std::env::args().skip(1);
    let mut form = SymptomForm::default();
    let mut json = false;
    let mut health = false;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| -> String {
            args.next()
                .filter(|v| !v.starts_with("--"))
                .unwrap_or_else(|| usage_error(&format!("Missing value for {flag}")))
        };
        match arg.as_str() {
            "--symptom" => form.symptom = value("--symptom"),
            "--duration" => form.duration = Some(parse_choice("--duration", &value("--duration"))),
            "--severity" => form.severity = Some(parse_choice("--severity", &value("--severity"))),
            "--info" => form.additional_info = value("--info"),
            "--age" => form.age = value("--age"),
            "--gender" => form.gender = Some(parse_choice("--gender", &value("--gender"))),
            "--history" => form.medical_history = value("--history"),
            "--json" => json = true,
            "--health" => health = true,
            "-h" | "--help" => {
                println!(
                    "{USAGE}\n\nDurations: {}\nSeverities: {}\nGenders: {}\n\nThe backend URL is read from SYMPTOM_ASSIST_BACKEND_URL (or BACKEND_URL, or a .env file).",
                    choices::<DurationBucket>(),
                    choices::<Severity>(),
                    choices::<Gender>()
                );
                return;
            }
            _ => usage_error(&format!("Unknown arg: {arg}")),
        }
    }

    match run(form, json, health) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Detail is in the (sanitized) log; the user gets the fixed sentence.
            eprintln!("{}", e.user_message());
            std::process::exit(e.exit_code());
        }
    }
}
