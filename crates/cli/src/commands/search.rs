use chrono::Utc;
use clap::Args;
use homesearch_core::config::LoadOptions;
use homesearch_core::search::{OneOrMany, Range};
use homesearch_core::SearchIntent;

use crate::commands::{async_runtime, caller, load_config, CallerArgs, CommandResult};

const COMMAND: &str = "search";

/// Search filters. Flags are applied on top of `--intent` when both are given.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    #[arg(long, help = "Search intent as a JSON object, the shape the assistant extracts")]
    pub intent: Option<String>,
    #[arg(long, help = "City name (repeatable)")]
    pub city: Vec<String>,
    #[arg(long, help = "Master-planned community name (repeatable)")]
    pub community: Vec<String>,
    #[arg(long, help = "County name (repeatable)")]
    pub county: Vec<String>,
    #[arg(long, help = "ZIP code")]
    pub zip: Option<String>,
    #[arg(long, help = "Minimum list price")]
    pub min_price: Option<i64>,
    #[arg(long, help = "Maximum list price")]
    pub max_price: Option<i64>,
    #[arg(long, help = "Minimum bedrooms")]
    pub min_beds: Option<i64>,
    #[arg(long, help = "Maximum bedrooms")]
    pub max_beds: Option<i64>,
    #[arg(long, help = "Property type name (repeatable)")]
    pub property_type: Vec<String>,
    #[arg(long, help = "Search sold listings instead of active ones")]
    pub sold: bool,
    #[arg(long, help = "Offset of the first result")]
    pub start: Option<u32>,
    #[arg(long, help = "Number of results, at most the configured page size")]
    pub limit: Option<u32>,
    #[command(flatten)]
    pub caller: CallerArgs,
}

impl SearchArgs {
    pub fn build_intent(&self) -> Result<SearchIntent, String> {
        let mut intent = match self.intent.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => serde_json::from_str::<SearchIntent>(raw)
                .map_err(|error| format!("--intent is not a valid search intent: {error}"))?,
            _ => SearchIntent::default(),
        };

        intent.city.extend(self.city.iter().cloned());
        intent.community.extend(self.community.iter().cloned());
        intent.county.extend(self.county.iter().cloned());
        intent.property_type.extend(self.property_type.iter().cloned());
        if let Some(zip) = &self.zip {
            intent.zip_code = Some(OneOrMany::One(zip.clone()));
        }
        if let Some(range) = range(self.min_price, self.max_price) {
            intent.price = Some(range);
        }
        if let Some(range) = range(self.min_beds, self.max_beds) {
            intent.bedrooms = Some(range);
        }
        if self.sold {
            intent.sold = Some(true);
        }
        intent.start = self.start.or(intent.start);
        intent.limit = self.limit.or(intent.limit);
        Ok(intent)
    }
}

fn range(min: Option<i64>, max: Option<i64>) -> Option<Range<i64>> {
    (min.is_some() || max.is_some()).then_some(Range { min, max, equal: None })
}

pub fn run(options: LoadOptions, args: SearchArgs) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let caller = match caller(COMMAND, &args.caller) {
        Ok(caller) => caller,
        Err(failure) => return failure,
    };
    let intent = match args.build_intent() {
        Ok(intent) => intent,
        Err(message) => return CommandResult::failure(COMMAND, "invalid_input", message, 2),
    };
    let runtime = match async_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };
    let service = match homesearch_api::listing_service(&config) {
        Ok(service) => service,
        Err(error) => return CommandResult::failure(COMMAND, "client_init", error.to_string(), 3),
    };

    match runtime.block_on(service.search(&intent, caller.as_ref(), Utc::now())) {
        Ok(result) => CommandResult::success_json(COMMAND, &result),
        Err(error) => CommandResult::failure(COMMAND, "upstream", error.to_string(), 4),
    }
}
