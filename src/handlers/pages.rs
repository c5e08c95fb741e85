use axum::{Extension, extract::State, response::Response};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    models::movie::{CATALOGUE, Movie},
    services::session::ActiveSession,
    state::AppState,
    views::{Empty, render_private, render_public},
};

/// A movie as listed on the home page.
#[derive(Serialize)]
struct MovieCard {
    title: &'static str,
    genre: &'static str,
    /// Query string of the movie's booking link, e.g. `movie=Laugh+Riot`.
    query: String,
}

#[derive(Serialize)]
struct HomeBody {
    movies: Vec<MovieCard>,
}

/// Form-encodes the query that preselects `movie` on the booking page.
fn booking_query(movie: &Movie) -> Result<String> {
    serde_urlencoded::to_string(&[("movie", movie.title)][..])
        .map_err(|e| AppError::Internal(format!("Booking link for {}: {}", movie.title, e)))
}

/// The landing page.
#[axum::debug_handler]
pub async fn index(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    render_public(&state, &cookies, "index", "Welcome", Empty {}).await
}

/// Lists the movies currently showing.
#[axum::debug_handler]
pub async fn home(
    State(state): State<AppState>,
    Extension(mut session): Extension<ActiveSession>,
) -> Result<Response> {
    let movies = CATALOGUE
        .iter()
        .map(|movie| {
            Ok(MovieCard {
                title: movie.title,
                genre: movie.genre,
                query: booking_query(movie)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    render_private(&state, &mut session, "home", "Now showing", HomeBody { movies }).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_query_escapes_reserved_characters() {
        let movie = Movie {
            title: "Fish & Chips + 100%",
            genre: "Comedy",
        };
        assert_eq!(
            booking_query(&movie).unwrap(),
            "movie=Fish+%26+Chips+%2B+100%25"
        );
    }

    #[test]
    fn catalogue_titles_encode_as_form_values() {
        let queries: Vec<String> = CATALOGUE.iter().map(|m| booking_query(m).unwrap()).collect();
        assert!(queries.contains(&"movie=Laugh+Riot".to_string()));
        assert!(queries.contains(&"movie=The+Grand+Premiere".to_string()));
    }
}
