use chrono::Utc;
use homesearch_core::config::LoadOptions;

use crate::commands::{async_runtime, caller, load_config, CallerArgs, CommandResult};

const COMMAND: &str = "detail";

pub fn run(options: LoadOptions, id: &str, caller_args: CallerArgs) -> CommandResult {
    let id = id.trim();
    if id.is_empty() {
        return CommandResult::failure(COMMAND, "invalid_input", "listing id must not be empty", 2);
    }
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let caller = match caller(COMMAND, &caller_args) {
        Ok(caller) => caller,
        Err(failure) => return failure,
    };
    let runtime = match async_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };
    let service = match homesearch_api::listing_service(&config) {
        Ok(service) => service,
        Err(error) => return CommandResult::failure(COMMAND, "client_init", error.to_string(), 3),
    };

    match runtime.block_on(service.detail(id, caller.as_ref(), Utc::now())) {
        Ok(record) if record.is_found() => CommandResult::success_json(COMMAND, &record),
        Ok(_) => CommandResult::failure(COMMAND, "not_found", format!("no listing `{id}`"), 5),
        Err(error) => CommandResult::failure(COMMAND, "upstream", error.to_string(), 4),
    }
}
