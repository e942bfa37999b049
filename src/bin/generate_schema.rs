//! Generate JSON Schema for the facade configuration
//!
//! This binary generates a JSON Schema from the FacadeConfig struct using
//! schemars, for editors that validate `config.json`.
//!
//! Usage:
//!   cargo run --features dev-bins --bin generate_schema > config-schema.json

use dfs_facade::config::FacadeConfig;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(FacadeConfig);
    let output = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema");
    println!("{}", output);
}
