//! Test Transaction Client
//!
//! Generates random transactions and posts them to the fraud detection API.
//!
//! Usage: test-client [base_url] [count] [fraud_rate] [delay_ms]

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, Timelike};
use fraud_detection_api::types::prediction::{Label, PredictionResult};
use fraud_detection_api::types::transaction::{RawTransaction, TransactionTime};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

const MERCHANTS: [&str; 6] = [
    "Walmart",
    "Target",
    "Kroger",
    "Shell",
    "Amazon",
    "Costco",
];

const CITIES: [(&str, &str, f64, f64, u64); 4] = [
    ("Springfield", "IL", 39.7817, -89.6501, 116250),
    ("Austin", "TX", 30.2672, -97.7431, 961855),
    ("Portland", "OR", 45.5152, -122.6784, 652503),
    ("Columbus", "OH", 39.9612, -82.9988, 905748),
];

const JOBS: [&str; 5] = ["Engineer", "Teacher", "Nurse", "Accountant", "Designer"];

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a typical daytime purchase
    fn generate_legitimate(&mut self) -> RawTransaction {
        let (city, state, lat, long, city_pop) = self.random_city();
        let when = self.recent_time(8..22);

        RawTransaction {
            merchant: self.random_choice(&MERCHANTS).to_string(),
            category: self
                .random_choice(&["grocery_pos", "gas_transport", "home", "food_dining"])
                .to_string(),
            city: city.to_string(),
            state: state.to_string(),
            job: self.random_choice(&JOBS).to_string(),
            amt: self.rng.gen_range(5.0..250.0),
            lat,
            long,
            city_pop,
            timestamp: TransactionTime::Text(when.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }

    /// Generate a large late-night online purchase
    fn generate_suspicious(&mut self) -> RawTransaction {
        let (city, state, lat, long, city_pop) = self.random_city();
        let when = self.recent_time(0..5); // Night time

        RawTransaction {
            merchant: self.random_choice(&["Amazon", "fraud_Kirlin and Sons"]).to_string(),
            category: self
                .random_choice(&["shopping_net", "misc_net"])
                .to_string(),
            city: city.to_string(),
            state: state.to_string(),
            job: self.random_choice(&JOBS).to_string(),
            amt: self.rng.gen_range(800.0..3000.0), // High amount
            lat,
            long,
            city_pop,
            timestamp: TransactionTime::Text(when.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }

    fn random_city(&mut self) -> (&'static str, &'static str, f64, f64, u64) {
        CITIES[self.rng.gen_range(0..CITIES.len())]
    }

    /// A time within the last week with the hour drawn from `hours`
    fn recent_time(&mut self, hours: std::ops::Range<u32>) -> NaiveDateTime {
        let day = Local::now().naive_local() - ChronoDuration::days(self.rng.gen_range(0..7));
        let hour = self.rng.gen_range(hours);
        day.with_hour(hour)
            .and_then(|t| t.with_minute(self.rng.gen_range(0..60)))
            .unwrap_or(day)
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args.get(1).map(|s| s.as_str()).unwrap_or("http://localhost:8080");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let health_url = format!("{}/api/health", base_url);
    match client.get(&health_url).send().await {
        Ok(resp) => info!(status = %resp.status(), "API reachable"),
        Err(e) => {
            warn!(error = %e, "API not reachable. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    }

    let predict_url = format!("{}/api/predict", base_url);
    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    let mut sent_suspicious = 0;
    let mut flagged_fraud = 0;
    let mut failures = 0;

    for i in 0..count {
        let transaction = if rng.gen_bool(fraud_rate) {
            sent_suspicious += 1;
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let response = client.post(&predict_url).json(&transaction).send().await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                let result: PredictionResult = resp.json().await?;
                if result.prediction == Label::Fraud {
                    flagged_fraud += 1;
                }
            }
            Ok(resp) => {
                failures += 1;
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "Prediction request failed");
            }
            Err(e) => {
                failures += 1;
                warn!(error = %e, "Prediction request error");
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} transactions ({} suspicious, {} flagged fraud, {} failed)",
                i + 1,
                count,
                sent_suspicious,
                flagged_fraud,
                failures
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} transactions ({} suspicious, {} flagged fraud, {} failed)",
        count, sent_suspicious, flagged_fraud, failures
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no API connection)");

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let transaction = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&transaction)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample transaction {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
