use clap::Parser;
use rusqlite::Connection;

use std::error::Error;
use std::sync::{Arc, Mutex};

mod data;
mod goals;
mod habits;
mod internal_error;
mod points;
mod suggest;
mod tasks;

use suggest::helpers::{SuggestionClient, SuggestionConfig};

#[macro_use]
extern crate rocket;

#[derive(Parser, Debug)]
#[command(name = "rgoals", about = "Goal tracking API server with points-based progress")]
struct Cli {
    /// SQLite database file.
    #[arg(long, default_value = "rgoals.db")]
    db_path: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let connection = Connection::open(&cli.db_path)?;
    data::create_tables(&connection)?;
    let connection = Arc::new(Mutex::new(connection));

    let suggestion_client = SuggestionClient::new(SuggestionConfig::from_env());
    if !suggestion_client.is_configured() {
        tracing::warn!("RGOALS_API_KEY is not set; suggestion endpoints serve fallbacks only");
    }

    let figment = rocket::Config::figment().merge(("port", cli.port));

    rocket::custom(figment)
        .manage(connection.clone())
        .manage(suggestion_client)
        .mount(
            "/api",
            routes![
                goals::endpoints::get_goals,
                goals::endpoints::add_goal,
                goals::endpoints::set_goal,
                goals::endpoints::set_goal_points,
                goals::endpoints::delete_goal,
                goals::endpoints::add_milestone,
                goals::endpoints::set_milestone,
                goals::endpoints::add_step,
                goals::endpoints::set_step,
                goals::endpoints::set_step_notes,
                goals::endpoints::delete_step,
                tasks::endpoints::get_tasks,
                tasks::endpoints::add_task,
                tasks::endpoints::move_task,
                tasks::endpoints::delete_task,
                habits::endpoints::get_habits,
                habits::endpoints::add_habit,
                habits::endpoints::delete_habit,
                points::endpoints::toggle_step,
                points::endpoints::toggle_task,
                points::endpoints::toggle_milestone,
                points::endpoints::delete_milestone,
                points::endpoints::convert_step_to_task,
                points::endpoints::toggle_habit,
                suggest::endpoints::clarify_goal,
                suggest::endpoints::generate_milestones,
                suggest::endpoints::generate_milestone_steps,
                suggest::endpoints::generate_next_step,
            ],
        )
        .launch()
        .await?;

    Ok(())
}
