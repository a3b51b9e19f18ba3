// HTTP handler bindings for the agent endpoints
//
// Thin wrappers that bind Rocket routes to the Bot's methods. Handlers only
// deserialize the request, pull the Bot out of Rocket's managed state, delegate
// and serialize the reply.

use rocket::http::Status;
use rocket::response::status::BadRequest;
use rocket::serde::json::Json;
use serde_json::Value;

use divercite_agent::bot::{Bot, MoveRequest, MoveResponse};
use divercite_agent::game::GameState;

/// GET / endpoint
/// Returns agent metadata
#[get("/")]
pub fn index(bot: &rocket::State<Bot>) -> Json<Value> {
    Json(bot.info())
}

/// POST /start endpoint
#[post("/start", format = "json", data = "<state>")]
pub fn start(bot: &rocket::State<Bot>, state: Json<GameState>) -> Status {
    bot.start(&state);

    Status::Ok
}

/// POST /move endpoint
/// Runs one search and returns the chosen action (null to pass)
#[post("/move", format = "json", data = "<move_req>")]
pub async fn get_move(
    bot: &rocket::State<Bot>,
    move_req: Json<MoveRequest>,
) -> Result<Json<MoveResponse>, BadRequest<String>> {
    bot.get_move(move_req.into_inner())
        .await
        .map(Json)
        .map_err(BadRequest)
}

/// POST /end endpoint
#[post("/end", format = "json", data = "<state>")]
pub fn end(bot: &rocket::State<Bot>, state: Json<GameState>) -> Status {
    bot.end(&state);

    Status::Ok
}
