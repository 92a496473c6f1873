use actix_web::{get, post, web, HttpResponse, Responder};
use log::{error, info, warn};

use crate::errors::ApiError;
use crate::models::{AppState, ChallengeResponse, ScoreResponse, ScoreSubmission};
use crate::services::generator::{daily_puzzle, today_seed};
use crate::services::leaderboard::LEADERBOARD_SIZE;
use crate::services::scoring::{render_meanings, sanitize_name, ScoringEngine};

const MAX_BODY_BYTES: usize = 64 * 1024;

/// JSON extractor settings: bounded body, malformed payloads become 400s
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err, _req| {
            warn!("Rejected score payload: {}", err);
            actix_web::Error::from(ApiError::Validation(format!("Invalid payload: {}", err)))
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(daily_challenge)
        .service(daily_leaderboard)
        .service(submit_score);
}

#[get("/api/daily-challenge")]
pub async fn daily_challenge(data: web::Data<AppState>) -> impl Responder {
    let puzzle = daily_puzzle(&today_seed(), &data.dictionary);
    info!(
        "Serving puzzle for {} (attempt {}, playable: {})",
        puzzle.seed, puzzle.attempt, puzzle.valid
    );

    HttpResponse::Ok().json(ChallengeResponse {
        letters: puzzle.letters.iter().map(|c| c.to_string()).collect(),
    })
}

#[get("/api/daily-challenge/leaderboard")]
pub async fn daily_leaderboard(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let entries = data.leaderboard.top(&today_seed(), LEADERBOARD_SIZE).map_err(|e| {
        error!("Failed to read leaderboard: {}", e);
        ApiError::Unavailable(e)
    })?;
    Ok(HttpResponse::Ok().json(entries))
}

#[post("/api/daily-challenge/score")]
pub async fn submit_score(
    data: web::Data<AppState>,
    body: web::Json<ScoreSubmission>,
) -> Result<HttpResponse, ApiError> {
    let submission = body.into_inner();
    let name = sanitize_name(&submission.name)?;

    let engine = ScoringEngine::new(&data.dictionary, &data.resolver, data.max_words);
    engine.check_size(&submission.found_words)?;

    // Never trust a client-supplied pool
    let seed = today_seed();
    let puzzle = daily_puzzle(&seed, &data.dictionary);
    let result = engine.score(&submission.found_words, &puzzle.letters).await?;

    if let Err(e) = data.leaderboard.insert(&name, result.total_score, &seed) {
        error!("Failed to save score for {}: {}", name, e);
        return Err(e.into());
    }
    info!("Saved score {} for {} on {}", result.total_score, name, seed);

    Ok(HttpResponse::Created().json(ScoreResponse {
        success: true,
        validated_score: result.total_score,
        meanings: render_meanings(&result.accepted_words),
    }))
}
