// CV generation: prompt building, the AI call, record persistence and the
// request pipeline that ties them to the quota ledger.
// All LLM calls go through llm_client, no direct Anthropic calls here.

pub mod analysis;
pub mod generator;
pub mod handlers;
pub mod orchestrator;
pub mod prompt_builder;
pub mod prompts;
pub mod store;
pub mod tone;
