pub mod day_plans;
pub mod history;
pub mod shopping;
